//! KYC Chain Ledger — signed transactions, proof-of-work blocks, and the
//! append-only chain that binds them together.
//!
//! - [`transaction`]: the Upload / Verify / Share records and their
//!   canonical signing scheme
//! - [`block`]: ordered transaction batches with a proof-of-work search
//! - [`chain`]: the linear chain, its full revalidation, and snapshots
//! - [`mining`]: attempt / time / cancellation limits for the PoW search
//! - [`audit`]: read-only queries over a chain (replays, customer history)

pub mod audit;
pub mod block;
pub mod chain;
pub mod error;
pub mod mining;
pub mod transaction;

pub use audit::{find_replays, transactions_for_customer, ReplayFinding};
pub use block::{meets_difficulty, Block, GENESIS_PREV_HASH};
pub use chain::{Chain, ChainSnapshot};
pub use error::{ChainViolation, LedgerError};
pub use mining::MiningBudget;
pub use transaction::{
    KycShare, KycUpload, KycVerify, ModelBinding, SignerInfo, Transaction, TxPayload,
};
