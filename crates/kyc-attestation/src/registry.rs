use dashmap::DashMap;
use std::sync::Arc;

use kyc_core::TrustedModelConfig;
use kyc_crypto::{CryptoProvider, PublicKey};

use crate::attestation::Attestation;
use crate::error::AttestationError;

/// Outcome of checking an attestation against the registry.
#[derive(Debug, Clone)]
pub struct AttestationVerdict {
    /// Whether every check passed.
    pub valid: bool,
    /// Individual check results, in evaluation order.
    pub checks: Vec<AttestationCheck>,
}

impl AttestationVerdict {
    /// The first failed check, if any.
    pub fn first_failure(&self) -> Option<&AttestationCheck> {
        self.checks.iter().find(|c| !c.passed)
    }
}

/// One named registry check.
#[derive(Debug, Clone)]
pub struct AttestationCheck {
    pub name: String,
    pub passed: bool,
    pub detail: Option<String>,
}

impl AttestationCheck {
    fn new(name: &str, passed: bool, failure: impl FnOnce() -> String) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: (!passed).then(failure),
        }
    }
}

/// Trusted issuer key per (model id, model version).
pub struct ModelRegistry {
    trusted: DashMap<(String, String), String>,
    crypto: Arc<dyn CryptoProvider>,
}

impl ModelRegistry {
    pub fn new(crypto: Arc<dyn CryptoProvider>) -> Self {
        Self {
            trusted: DashMap::new(),
            crypto,
        }
    }

    /// Build a registry pre-loaded with the configured models.
    pub fn from_config(
        models: &[TrustedModelConfig],
        crypto: Arc<dyn CryptoProvider>,
    ) -> Result<Self, AttestationError> {
        let registry = Self::new(crypto);
        for model in models {
            registry.register_encoded(&model.model_id, &model.version, &model.public_key)?;
        }
        Ok(registry)
    }

    /// Trust `public_key` for attestations from `model_id`@`version`.
    /// Replaces any key registered earlier for the same pair.
    pub fn register(&self, model_id: &str, version: &str, public_key: &PublicKey) {
        let encoded = self.crypto.encode_public_key(public_key);
        self.insert(model_id, version, encoded);
    }

    /// Like [`ModelRegistry::register`] for a key in encoded form.
    pub fn register_encoded(
        &self,
        model_id: &str,
        version: &str,
        public_key: &str,
    ) -> Result<(), AttestationError> {
        let key = self.crypto.decode_public_key(public_key).map_err(|source| {
            AttestationError::InvalidModelKey {
                model_id: model_id.into(),
                version: version.into(),
                source,
            }
        })?;
        // Store the provider's own rendering so comparisons are exact.
        self.insert(model_id, version, self.crypto.encode_public_key(&key));
        Ok(())
    }

    fn insert(&self, model_id: &str, version: &str, encoded: String) {
        tracing::info!(model_id, version, public_key = %encoded, "model registered");
        self.trusted
            .insert((model_id.to_string(), version.to_string()), encoded);
    }

    /// The encoded key trusted for `model_id`@`version`.
    pub fn trusted_key(&self, model_id: &str, version: &str) -> Option<String> {
        self.trusted
            .get(&(model_id.to_string(), version.to_string()))
            .map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.trusted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trusted.is_empty()
    }

    /// Run every check on `attestation`.
    pub fn check(&self, attestation: &Attestation) -> AttestationVerdict {
        let mut checks = Vec::with_capacity(3);

        let trusted = self.trusted_key(&attestation.model_id, &attestation.model_version);
        checks.push(AttestationCheck::new(
            "model_registered",
            trusted.is_some(),
            || {
                format!(
                    "model {}@{} is not registered",
                    attestation.model_id, attestation.model_version
                )
            },
        ));

        let key_matches = trusted.as_deref() == Some(attestation.issuer_public_key.as_str());
        checks.push(AttestationCheck::new("issuer_key_matches", key_matches, || {
            "issuer key differs from the registered key".into()
        }));

        let sig_valid = attestation.verify_signature(self.crypto.as_ref());
        checks.push(AttestationCheck::new("signature_valid", sig_valid, || {
            "attestation signature verification failed".into()
        }));

        let valid = checks.iter().all(|c| c.passed);
        if !valid {
            tracing::warn!(
                model_id = %attestation.model_id,
                version = %attestation.model_version,
                failed = ?checks.iter().filter(|c| !c.passed).map(|c| c.name.as_str()).collect::<Vec<_>>(),
                "attestation rejected"
            );
        }
        AttestationVerdict { valid, checks }
    }

    /// Whether the attestation comes from its model's registered key and
    /// its signature holds.
    pub fn verify(&self, attestation: &Attestation) -> bool {
        self.check(attestation).valid
    }
}
