//! The append-only chain.
//!
//! Appending mines a new block on top of the tip without inspecting the
//! transactions. Integrity is checked separately by [`Chain::validate`],
//! which never mutates the chain and can be rerun at any time.

use std::fmt;
use std::sync::Arc;

use kyc_core::{LedgerConfig, MAX_DIFFICULTY};
use kyc_crypto::CryptoProvider;
use serde::{Deserialize, Serialize};

use crate::block::{Block, GENESIS_PREV_HASH};
use crate::error::{ChainViolation, LedgerError};
use crate::mining::MiningBudget;
use crate::transaction::Transaction;

pub struct Chain {
    blocks: Vec<Block>,
    difficulty: u32,
    budget: MiningBudget,
    crypto: Arc<dyn CryptoProvider>,
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("len", &self.blocks.len())
            .field("difficulty", &self.difficulty)
            .field("tip", &self.tip().hash)
            .finish_non_exhaustive()
    }
}

fn check_difficulty(difficulty: u32) -> Result<(), LedgerError> {
    if difficulty > MAX_DIFFICULTY {
        return Err(LedgerError::InvalidDifficulty {
            difficulty,
            max: MAX_DIFFICULTY,
        });
    }
    Ok(())
}

fn check_genesis(block: &Block, crypto: &dyn CryptoProvider) -> Result<(), String> {
    if block.prev_hash != GENESIS_PREV_HASH {
        return Err(format!("links to {}", block.prev_hash));
    }
    if !block.transactions.is_empty() {
        return Err(format!("holds {} transactions", block.transactions.len()));
    }
    if block.hash != block.compute_hash(crypto) {
        return Err("stored hash does not match its content".into());
    }
    Ok(())
}

impl Chain {
    /// Create a chain holding only a fresh genesis block.
    pub fn new(difficulty: u32, crypto: Arc<dyn CryptoProvider>) -> Result<Self, LedgerError> {
        check_difficulty(difficulty)?;
        let genesis = Block::genesis(crypto.as_ref());
        tracing::info!(difficulty, genesis = %genesis.hash, "chain created");
        Ok(Self {
            blocks: vec![genesis],
            difficulty,
            budget: MiningBudget::unbounded(),
            crypto,
        })
    }

    /// Create a chain with the difficulty and mining limits from `config`.
    pub fn from_config(
        config: &LedgerConfig,
        crypto: Arc<dyn CryptoProvider>,
    ) -> Result<Self, LedgerError> {
        config.validate()?;
        Ok(Self::new(config.chain.difficulty, crypto)?
            .with_budget(MiningBudget::from_config(&config.mining)))
    }

    /// Reassemble a chain from existing blocks, as-is. Nothing is
    /// validated; call [`Chain::validate`] afterwards.
    pub fn from_blocks(
        difficulty: u32,
        blocks: Vec<Block>,
        crypto: Arc<dyn CryptoProvider>,
    ) -> Result<Self, LedgerError> {
        check_difficulty(difficulty)?;
        if blocks.is_empty() {
            return Err(LedgerError::EmptyChain);
        }
        Ok(Self {
            blocks,
            difficulty,
            budget: MiningBudget::unbounded(),
            crypto,
        })
    }

    /// Replace the mining budget used by [`Chain::append`].
    pub fn with_budget(mut self, budget: MiningBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn budget(&self) -> &MiningBudget {
        &self.budget
    }

    pub fn crypto(&self) -> &Arc<dyn CryptoProvider> {
        &self.crypto
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always `false`: a chain holds at least its genesis block.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn genesis(&self) -> &Block {
        &self.blocks[0]
    }

    pub fn tip(&self) -> &Block {
        &self.blocks[self.blocks.len() - 1]
    }

    /// All transactions in chain order.
    pub fn transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.blocks.iter().flat_map(|b| b.transactions.iter())
    }

    /// The first transaction with `id`, with the index of its block.
    pub fn find_transaction(&self, id: &str) -> Option<(u64, &Transaction)> {
        self.blocks.iter().find_map(|b| {
            b.transactions
                .iter()
                .find(|tx| tx.id() == Some(id))
                .map(|tx| (b.index, tx))
        })
    }

    /// Mine a block holding `transactions` on top of the tip and append it.
    ///
    /// Transactions are not validated here. If mining hits the budget the
    /// chain is left unchanged.
    pub fn append(&mut self, transactions: Vec<Transaction>) -> Result<&Block, LedgerError> {
        let tip = self.tip();
        let mut block = Block::new(
            tip.index + 1,
            tip.hash.clone(),
            transactions,
            self.crypto.as_ref(),
        );
        let attempts = match block.mine(self.difficulty, &self.budget, self.crypto.as_ref()) {
            Ok(attempts) => attempts,
            Err(e) => {
                tracing::warn!(index = block.index, error = %e, "mining failed; block discarded");
                return Err(e);
            }
        };
        tracing::info!(
            index = block.index,
            hash = %block.hash,
            txs = block.transactions.len(),
            attempts,
            "block appended"
        );
        self.blocks.push(block);
        Ok(self.tip())
    }

    /// Walk every block and report the first integrity rule broken.
    ///
    /// The genesis block must be empty, link to `"0"` and carry its own
    /// hash. For each later block, in order: link to predecessor,
    /// recomputed hash, proof of work, then each transaction's signature,
    /// id and signer role.
    pub fn validate(&self) -> Result<(), ChainViolation> {
        let crypto = self.crypto.as_ref();
        for (position, block) in self.blocks.iter().enumerate() {
            if block.index != position as u64 {
                return self.reject(ChainViolation::IndexMismatch {
                    position,
                    index: block.index,
                });
            }
            if position == 0 {
                if let Err(reason) = check_genesis(block, crypto) {
                    return self.reject(ChainViolation::BadGenesis { reason });
                }
                continue;
            }

            let prev = &self.blocks[position - 1];
            if block.prev_hash != prev.hash {
                return self.reject(ChainViolation::BrokenLink {
                    index: block.index,
                    expected: prev.hash.clone(),
                    found: block.prev_hash.clone(),
                });
            }

            let computed = block.compute_hash(crypto);
            if block.hash != computed {
                return self.reject(ChainViolation::HashMismatch {
                    index: block.index,
                    stored: block.hash.clone(),
                    computed,
                });
            }

            if !block.meets_difficulty(self.difficulty) {
                return self.reject(ChainViolation::InsufficientWork {
                    index: block.index,
                    difficulty: self.difficulty,
                });
            }

            for tx in &block.transactions {
                let tx_id = || tx.id().unwrap_or("<unsigned>").to_string();
                if !tx.verify_signature(crypto) {
                    return self.reject(ChainViolation::InvalidSignature {
                        index: block.index,
                        tx_id: tx_id(),
                    });
                }
                let derived = tx.derive_id(crypto).unwrap_or_default();
                if tx.id() != Some(derived.as_str()) {
                    return self.reject(ChainViolation::IdMismatch {
                        index: block.index,
                        tx_id: tx_id(),
                        derived,
                    });
                }
                if !tx.satisfies_role() {
                    return self.reject(ChainViolation::RoleMismatch {
                        index: block.index,
                        tx_id: tx_id(),
                        signer: tx.signer_name().unwrap_or_default().to_string(),
                        claimed: tx.actor().to_string(),
                    });
                }
            }
        }
        tracing::debug!(blocks = self.blocks.len(), "chain validated");
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    fn reject(&self, violation: ChainViolation) -> Result<(), ChainViolation> {
        tracing::warn!(
            index = violation.block_index(),
            check = violation.check_name(),
            "chain violation: {}",
            violation
        );
        Err(violation)
    }

    /// Capture the chain's blocks and difficulty for export.
    pub fn snapshot(&self) -> ChainSnapshot {
        ChainSnapshot {
            difficulty: self.difficulty,
            blocks: self.blocks.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String, LedgerError> {
        self.snapshot().to_json()
    }

    /// Load a chain exported with [`Chain::to_json`]. The result is not
    /// validated.
    pub fn from_json(json: &str, crypto: Arc<dyn CryptoProvider>) -> Result<Self, LedgerError> {
        ChainSnapshot::from_json(json)?.into_chain(crypto)
    }
}

/// Serializable form of a chain. Every field that feeds a hash or a
/// signature is stored verbatim, so a reloaded chain validates exactly
/// when the original did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSnapshot {
    pub difficulty: u32,
    pub blocks: Vec<Block>,
}

impl ChainSnapshot {
    pub fn to_json(&self) -> Result<String, LedgerError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, LedgerError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn into_chain(self, crypto: Arc<dyn CryptoProvider>) -> Result<Chain, LedgerError> {
        Chain::from_blocks(self.difficulty, self.blocks, crypto)
    }
}
