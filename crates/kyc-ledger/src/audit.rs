//! Read-only queries over a chain.
//!
//! A replayed transaction (the same signed record appended twice) is
//! cryptographically sound and leaves the chain valid, so replays are
//! reported here rather than by [`Chain::validate`](crate::Chain::validate).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::chain::Chain;
use crate::transaction::Transaction;

/// A transaction id seen more than once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayFinding {
    pub tx_id: String,
    /// Index of every block holding the id, one entry per occurrence.
    pub block_indexes: Vec<u64>,
}

/// Every transaction id that occurs more than once, in order of first
/// appearance. Unsigned transactions have no id and are skipped.
pub fn find_replays(chain: &Chain) -> Vec<ReplayFinding> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut occurrences: Vec<ReplayFinding> = Vec::new();

    for block in chain.blocks() {
        for tx_id in block.transactions.iter().filter_map(Transaction::id) {
            match seen.get(tx_id) {
                Some(&slot) => occurrences[slot].block_indexes.push(block.index),
                None => {
                    seen.insert(tx_id, occurrences.len());
                    occurrences.push(ReplayFinding {
                        tx_id: tx_id.to_string(),
                        block_indexes: vec![block.index],
                    });
                }
            }
        }
    }

    let replays: Vec<_> = occurrences
        .into_iter()
        .filter(|f| f.block_indexes.len() > 1)
        .collect();
    for replay in &replays {
        tracing::warn!(tx_id = %replay.tx_id, blocks = ?replay.block_indexes, "replayed transaction");
    }
    replays
}

/// All transactions concerning `customer_id`, in chain order.
pub fn transactions_for_customer<'a>(chain: &'a Chain, customer_id: &str) -> Vec<&'a Transaction> {
    chain
        .transactions()
        .filter(|tx| tx.customer_id() == customer_id)
        .collect()
}
