use kyc_core::CanonicalEncoder;
use kyc_crypto::{CryptoProvider, KeyPair};
use kyc_ledger::KycUpload;
use serde::{Deserialize, Serialize};

use crate::error::AttestationError;

/// Digest of the stable identifying fields of an upload. Binds an
/// attestation to one upload without carrying the raw document.
pub fn fingerprint(upload: &KycUpload, crypto: &dyn CryptoProvider) -> String {
    crypto.hash_digest(
        &CanonicalEncoder::new()
            .str(&upload.customer_id)
            .str(&upload.data_hash)
            .finish(),
    )
}

/// A signed risk assessment of one upload by one model version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attestation {
    pub model_id: String,
    pub model_version: String,
    pub input_fingerprint: String,
    /// In `[0, 1]`. Signed and hashed at six decimal places.
    pub risk_score: f64,
    pub flags: Vec<String>,
    /// Issuance time, milliseconds since the Unix epoch.
    pub issued_at: i64,
    /// Encoded issuer key, as produced by the crypto provider.
    pub issuer_public_key: String,
    pub signature: String,
}

impl Attestation {
    pub fn builder<'a>() -> AttestationBuilder<'a> {
        AttestationBuilder::default()
    }

    /// The signed bytes: every field except the signature.
    pub fn canonical(&self) -> Vec<u8> {
        canonical_bytes(
            &self.model_id,
            &self.model_version,
            &self.input_fingerprint,
            self.risk_score,
            &self.flags,
            self.issued_at,
            &self.issuer_public_key,
        )
    }

    /// Content hash. This is the only thing the chain stores.
    pub fn hash(&self, crypto: &dyn CryptoProvider) -> String {
        crypto.hash_digest(&self.canonical())
    }

    /// Check the self-signature against the declared issuer key. Says
    /// nothing about whether that key is trusted.
    pub fn verify_signature(&self, crypto: &dyn CryptoProvider) -> bool {
        crypto.verify_encoded(&self.canonical(), &self.signature, &self.issuer_public_key)
    }

    pub fn to_json(&self) -> Result<String, AttestationError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, AttestationError> {
        Ok(serde_json::from_str(json)?)
    }
}

fn canonical_bytes(
    model_id: &str,
    model_version: &str,
    input_fingerprint: &str,
    risk_score: f64,
    flags: &[String],
    issued_at: i64,
    issuer_public_key: &str,
) -> Vec<u8> {
    CanonicalEncoder::new()
        .str(model_id)
        .str(model_version)
        .str(input_fingerprint)
        .str(&format!("{:.6}", risk_score))
        .str_list(flags)
        .i64(issued_at)
        .str(issuer_public_key)
        .finish()
}

/// Collects attestation fields and signs them with the issuer key.
#[derive(Default)]
pub struct AttestationBuilder<'a> {
    model_id: Option<String>,
    model_version: Option<String>,
    input_fingerprint: Option<String>,
    risk_score: f64,
    flags: Vec<String>,
    issued_at: Option<i64>,
    issuer: Option<&'a KeyPair>,
}

impl<'a> AttestationBuilder<'a> {
    pub fn model(mut self, id: impl Into<String>, version: impl Into<String>) -> Self {
        self.model_id = Some(id.into());
        self.model_version = Some(version.into());
        self
    }

    pub fn fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.input_fingerprint = Some(fingerprint.into());
        self
    }

    pub fn risk(mut self, risk_score: f64) -> Self {
        self.risk_score = risk_score;
        self
    }

    pub fn flag(mut self, flag: impl Into<String>) -> Self {
        self.flags.push(flag.into());
        self
    }

    pub fn flags(mut self, flags: Vec<String>) -> Self {
        self.flags = flags;
        self
    }

    /// Defaults to the time of [`AttestationBuilder::sign`].
    pub fn issued_at(mut self, issued_at: i64) -> Self {
        self.issued_at = Some(issued_at);
        self
    }

    pub fn issuer(mut self, keypair: &'a KeyPair) -> Self {
        self.issuer = Some(keypair);
        self
    }

    /// Validate the collected fields and produce a signed attestation.
    pub fn sign(self, crypto: &dyn CryptoProvider) -> Result<Attestation, AttestationError> {
        let model_id = self.model_id.ok_or(AttestationError::MissingField("model_id"))?;
        let model_version = self
            .model_version
            .ok_or(AttestationError::MissingField("model_version"))?;
        let input_fingerprint = self
            .input_fingerprint
            .ok_or(AttestationError::MissingField("input_fingerprint"))?;
        let issuer = self.issuer.ok_or(AttestationError::MissingField("issuer"))?;
        if !(0.0..=1.0).contains(&self.risk_score) {
            return Err(AttestationError::RiskOutOfRange(self.risk_score));
        }
        let issued_at = self
            .issued_at
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis());
        let issuer_public_key = crypto.encode_public_key(&issuer.public_key());

        let canonical = canonical_bytes(
            &model_id,
            &model_version,
            &input_fingerprint,
            self.risk_score,
            &self.flags,
            issued_at,
            &issuer_public_key,
        );
        let signature = crypto.encode_signature(&crypto.sign(&canonical, issuer));

        Ok(Attestation {
            model_id,
            model_version,
            input_fingerprint,
            risk_score: self.risk_score,
            flags: self.flags,
            issued_at,
            issuer_public_key,
            signature,
        })
    }
}
