use kyc_core::CanonicalEncoder;
use kyc_crypto::CryptoProvider;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::mining::MiningBudget;
use crate::transaction::Transaction;

/// `prev_hash` of the genesis block.
pub const GENESIS_PREV_HASH: &str = "0";

/// Whether `hash` starts with `difficulty` `'0'` characters.
pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
    let difficulty = difficulty as usize;
    hash.len() >= difficulty && hash.bytes().take(difficulty).all(|b| b == b'0')
}

/// An ordered batch of transactions linked to its predecessor by hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    /// Creation time, milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub prev_hash: String,
    pub transactions: Vec<Transaction>,
    pub nonce: u64,
    pub hash: String,
}

impl Block {
    /// Create an unmined block (nonce 0) with its initial hash.
    pub fn new(
        index: u64,
        prev_hash: impl Into<String>,
        transactions: Vec<Transaction>,
        crypto: &dyn CryptoProvider,
    ) -> Self {
        Self::with_timestamp(
            index,
            chrono::Utc::now().timestamp_millis(),
            prev_hash,
            transactions,
            crypto,
        )
    }

    pub fn with_timestamp(
        index: u64,
        timestamp: i64,
        prev_hash: impl Into<String>,
        transactions: Vec<Transaction>,
        crypto: &dyn CryptoProvider,
    ) -> Self {
        let mut block = Self {
            index,
            timestamp,
            prev_hash: prev_hash.into(),
            transactions,
            nonce: 0,
            hash: String::new(),
        };
        block.hash = block.compute_hash(crypto);
        block
    }

    /// The empty block at index 0. Never mined.
    pub fn genesis(crypto: &dyn CryptoProvider) -> Self {
        Self::new(0, GENESIS_PREV_HASH, Vec::new(), crypto)
    }

    /// Ids of the contained transactions, in order. Unsigned
    /// transactions contribute an empty id.
    pub fn tx_ids(&self) -> Vec<&str> {
        self.transactions
            .iter()
            .map(|tx| tx.id().unwrap_or_default())
            .collect()
    }

    /// Hash over the header fields and the ordered transaction ids.
    pub fn compute_hash(&self, crypto: &dyn CryptoProvider) -> String {
        let header = CanonicalEncoder::new()
            .u64(self.index)
            .i64(self.timestamp)
            .str(&self.prev_hash)
            .u64(self.nonce)
            .str_list(&self.tx_ids())
            .finish();
        crypto.hash_digest(&header)
    }

    pub fn meets_difficulty(&self, difficulty: u32) -> bool {
        meets_difficulty(&self.hash, difficulty)
    }

    /// Search nonces until the hash meets `difficulty`, within `budget`.
    ///
    /// Returns the number of nonces tried. On error the nonce and hash
    /// are left at the last value tried.
    pub fn mine(
        &mut self,
        difficulty: u32,
        budget: &MiningBudget,
        crypto: &dyn CryptoProvider,
    ) -> Result<u64, LedgerError> {
        let mut guard = budget.start();
        while !self.meets_difficulty(difficulty) {
            guard.charge()?;
            self.nonce = self.nonce.wrapping_add(1);
            self.hash = self.compute_hash(crypto);
        }
        tracing::debug!(
            index = self.index,
            nonce = self.nonce,
            attempts = guard.attempts(),
            hash = %self.hash,
            "block mined"
        );
        Ok(guard.attempts())
    }
}
