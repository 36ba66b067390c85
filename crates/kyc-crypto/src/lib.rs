//! KYC Chain Crypto — the cryptographic provider behind the ledger.
//!
//! Ed25519 signatures over canonical bytes and BLAKE3 hex digests, exposed
//! both as free functions and through the [`CryptoProvider`] trait that the
//! ledger, attestation, and service layers depend on.

pub mod error;
pub mod hashing;
pub mod keys;
pub mod provider;
pub mod signing;

pub use error::CryptoError;
pub use hashing::{hash, hash_hex, Hash};
pub use keys::{KeyPair, PublicKey};
pub use provider::{CryptoProvider, Ed25519Blake3};
pub use signing::{sign, verify, Signature};
