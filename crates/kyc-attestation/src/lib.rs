//! KYC Chain Attestation — off-chain risk assessments bound to uploads.
//!
//! An [`Attestation`] is signed by the assessing service, identified by
//! the hash of its canonical form, and kept in an [`AttestationStore`].
//! Verify transactions reference it only by that hash. The
//! [`ModelRegistry`] decides which (model, version) signers are trusted.

pub mod assessor;
pub mod attestation;
pub mod error;
pub mod registry;
pub mod store;

pub use assessor::{RiskAssessor, SimpleRiskService};
pub use attestation::{fingerprint, Attestation, AttestationBuilder};
pub use error::AttestationError;
pub use registry::{AttestationCheck, AttestationVerdict, ModelRegistry};
pub use store::AttestationStore;
