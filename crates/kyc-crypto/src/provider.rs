//! The cryptographic provider consumed by the ledger.
//!
//! Everything above this crate signs, verifies, and hashes through
//! [`CryptoProvider`] so the concrete primitives stay swappable.

use crate::error::CryptoError;
use crate::hashing;
use crate::keys::{KeyPair, PublicKey};
use crate::signing::{self, Signature};

/// Hash, sign, and verify operations plus key encoding.
///
/// All operations are deterministic and side-effect free apart from the
/// randomness in [`CryptoProvider::generate_key_pair`].
pub trait CryptoProvider: Send + Sync {
    /// Digest `data` and return it as lower-case hex.
    fn hash_digest(&self, data: &[u8]) -> String;

    /// Sign `data` with the secret half of `keypair`.
    fn sign(&self, data: &[u8], keypair: &KeyPair) -> Signature;

    /// Check `signature` over `data` against `public_key`.
    fn verify(&self, data: &[u8], signature: &Signature, public_key: &PublicKey) -> bool;

    /// Produce a fresh random key pair.
    fn generate_key_pair(&self) -> KeyPair;

    /// Render a public key in the textual form embedded in signed records.
    fn encode_public_key(&self, public_key: &PublicKey) -> String;

    /// Parse the textual form produced by [`CryptoProvider::encode_public_key`].
    fn decode_public_key(&self, encoded: &str) -> Result<PublicKey, CryptoError>;

    /// Render a signature in the textual form embedded in signed records.
    fn encode_signature(&self, signature: &Signature) -> String;

    /// Parse the textual form produced by [`CryptoProvider::encode_signature`].
    fn decode_signature(&self, encoded: &str) -> Result<Signature, CryptoError>;

    /// Verify a signature given in encoded form.
    ///
    /// Malformed keys or signatures yield `false`, never an error.
    fn verify_encoded(&self, data: &[u8], signature: &str, public_key: &str) -> bool {
        let Ok(public_key) = self.decode_public_key(public_key) else {
            return false;
        };
        let Ok(signature) = self.decode_signature(signature) else {
            return false;
        };
        self.verify(data, &signature, &public_key)
    }
}

/// Ed25519 signatures, BLAKE3 digests, hex text encodings.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Blake3;

impl CryptoProvider for Ed25519Blake3 {
    fn hash_digest(&self, data: &[u8]) -> String {
        hashing::hash_hex(data)
    }

    fn sign(&self, data: &[u8], keypair: &KeyPair) -> Signature {
        signing::sign(data, keypair)
    }

    fn verify(&self, data: &[u8], signature: &Signature, public_key: &PublicKey) -> bool {
        signing::verify(data, signature, public_key).is_ok()
    }

    fn generate_key_pair(&self) -> KeyPair {
        KeyPair::generate()
    }

    fn encode_public_key(&self, public_key: &PublicKey) -> String {
        public_key.to_hex()
    }

    fn decode_public_key(&self, encoded: &str) -> Result<PublicKey, CryptoError> {
        PublicKey::from_hex(encoded)
    }

    fn encode_signature(&self, signature: &Signature) -> String {
        signature.to_hex()
    }

    fn decode_signature(&self, encoded: &str) -> Result<Signature, CryptoError> {
        Signature::from_hex(encoded)
    }
}
