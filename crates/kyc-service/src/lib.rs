//! KYC Chain Service — participants, transaction authoring, and audits on
//! top of the ledger and attestation crates.

pub mod error;
pub mod participants;
pub mod service;
pub mod telemetry;

pub use error::ServiceError;
pub use participants::{Participant, ParticipantRegistry};
pub use service::KycService;
pub use telemetry::init_tracing;
