use dashmap::DashMap;
use std::sync::Arc;

use kyc_crypto::CryptoProvider;

use crate::attestation::Attestation;

/// Off-chain attestation storage keyed by content hash.
pub struct AttestationStore {
    entries: DashMap<String, Attestation>,
    crypto: Arc<dyn CryptoProvider>,
}

impl AttestationStore {
    pub fn new(crypto: Arc<dyn CryptoProvider>) -> Self {
        Self {
            entries: DashMap::new(),
            crypto,
        }
    }

    /// Store `attestation` and return its hash. The first attestation
    /// stored under a hash is kept; later puts with the same content are
    /// no-ops, even if their signature differs.
    pub fn put(&self, attestation: Attestation) -> String {
        let hash = attestation.hash(self.crypto.as_ref());
        tracing::debug!(hash = %hash, model_id = %attestation.model_id, "attestation stored");
        self.entries.entry(hash.clone()).or_insert(attestation);
        hash
    }

    pub fn get(&self, hash: &str) -> Option<Attestation> {
        self.entries.get(hash).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.entries.contains_key(hash)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
