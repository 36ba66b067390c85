//! KYC Chain Core — Fundamental types, canonical encoding, errors, and
//! configuration shared by every layer of the KYC ledger.

pub mod canonical;
pub mod config;
pub mod error;
pub mod types;

pub use canonical::CanonicalEncoder;
pub use config::{
    ChainConfig, LedgerConfig, LoggingConfig, MiningConfig, TrustedModelConfig, MAX_DIFFICULTY,
};
pub use error::CoreError;
pub use types::{ParticipantRole, TxKind};
