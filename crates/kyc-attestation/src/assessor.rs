use std::sync::Arc;

use kyc_crypto::{CryptoProvider, KeyPair, PublicKey};
use kyc_ledger::{Transaction, TxPayload};

use crate::attestation::{fingerprint, Attestation};
use crate::error::AttestationError;

const MIN_RISK: f64 = 0.05;
const MAX_RISK: f64 = 0.55;
const LOW_RISK_BELOW: f64 = 0.2;
const MEDIUM_RISK_BELOW: f64 = 0.5;

/// An external service that assesses uploads and signs its findings.
pub trait RiskAssessor: Send + Sync {
    /// Assess a signed upload transaction.
    fn attest(&self, upload: &Transaction) -> Result<Attestation, AttestationError>;

    fn model_id(&self) -> &str;

    fn model_version(&self) -> &str;

    /// Key the service signs attestations with.
    fn service_public_key(&self) -> PublicKey;
}

/// Deterministic stand-in model: the score is derived from the upload id,
/// so the same upload always gets the same assessment.
pub struct SimpleRiskService {
    model_id: String,
    model_version: String,
    keypair: KeyPair,
    crypto: Arc<dyn CryptoProvider>,
}

impl SimpleRiskService {
    /// Create a service with a freshly generated key.
    pub fn new(
        model_id: impl Into<String>,
        model_version: impl Into<String>,
        crypto: Arc<dyn CryptoProvider>,
    ) -> Self {
        let keypair = crypto.generate_key_pair();
        Self::with_keypair(model_id, model_version, keypair, crypto)
    }

    pub fn with_keypair(
        model_id: impl Into<String>,
        model_version: impl Into<String>,
        keypair: KeyPair,
        crypto: Arc<dyn CryptoProvider>,
    ) -> Self {
        Self {
            model_id: model_id.into(),
            model_version: model_version.into(),
            keypair,
            crypto,
        }
    }

    fn risk_for(&self, upload_id: &str) -> f64 {
        let digest = self.crypto.hash_digest(upload_id.as_bytes());
        let seed = digest
            .bytes()
            .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(u64::from(b)));
        let base = (seed % 1000) as f64 / 1000.0 * 0.5 + MIN_RISK;
        base.clamp(MIN_RISK, MAX_RISK)
    }
}

fn risk_band(risk: f64) -> &'static str {
    if risk < LOW_RISK_BELOW {
        "low_risk"
    } else if risk < MEDIUM_RISK_BELOW {
        "medium_risk"
    } else {
        "high_risk"
    }
}

impl RiskAssessor for SimpleRiskService {
    fn attest(&self, upload: &Transaction) -> Result<Attestation, AttestationError> {
        let TxPayload::Upload(fields) = &upload.payload else {
            return Err(AttestationError::NotAnUpload(upload.summary()));
        };
        let upload_id = upload.id().ok_or(AttestationError::UnsignedUpload)?;

        let risk = self.risk_for(upload_id);
        let attestation = Attestation::builder()
            .model(&self.model_id, &self.model_version)
            .fingerprint(fingerprint(fields, self.crypto.as_ref()))
            .risk(risk)
            .flag(risk_band(risk))
            .flag(format!("upload_ptr={}", fields.data_pointer))
            .issuer(&self.keypair)
            .sign(self.crypto.as_ref())?;

        tracing::info!(
            model_id = %self.model_id,
            version = %self.model_version,
            upload = %upload_id,
            risk = attestation.risk_score,
            "attestation issued"
        );
        Ok(attestation)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn model_version(&self) -> &str {
        &self.model_version
    }

    fn service_public_key(&self) -> PublicKey {
        self.keypair.public_key()
    }
}
