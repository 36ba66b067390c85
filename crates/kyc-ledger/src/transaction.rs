//! Signed ledger records.
//!
//! A [`Transaction`] wraps one of three payload variants together with the
//! signer identity. The bytes that get signed cover the transaction type,
//! its timestamp, the variant fields, and the declared signer key, so that
//! neither the content nor the claimed key can change without breaking
//! the signature. The id is derived from those bytes plus the signature
//! and is frozen at signing time.

use kyc_core::{CanonicalEncoder, TxKind};
use kyc_crypto::{CryptoProvider, KeyPair};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// A customer's document upload. The raw document stays off-chain; only
/// its digest and a locator are recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KycUpload {
    pub customer_id: String,
    pub data_hash: String,
    pub data_pointer: String,
}

/// Reference from a Verify transaction to an off-chain attestation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelBinding {
    pub model_id: String,
    pub model_version: String,
    pub attestation_hash: String,
}

/// A bank's verification decision about an earlier upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KycVerify {
    pub bank_id: String,
    pub customer_id: String,
    pub upload_tx_id: String,
    pub verified: bool,
    pub notes: String,
    /// Present when the decision was backed by a model attestation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelBinding>,
}

/// One institution sharing a verification result with another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KycShare {
    pub from_entity: String,
    pub to_entity: String,
    pub customer_id: String,
    pub verified_tx_id: String,
}

/// The closed set of ledger record kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TxPayload {
    Upload(KycUpload),
    Verify(KycVerify),
    Share(KycShare),
}

impl TxPayload {
    pub fn kind(&self) -> TxKind {
        match self {
            Self::Upload(_) => TxKind::Upload,
            Self::Verify(_) => TxKind::Verify,
            Self::Share(_) => TxKind::Share,
        }
    }

    /// The participant the record claims to act for. Chain validation
    /// requires this to equal the signer name.
    pub fn actor(&self) -> &str {
        match self {
            Self::Upload(u) => &u.customer_id,
            Self::Verify(v) => &v.bank_id,
            Self::Share(s) => &s.from_entity,
        }
    }

    pub fn customer_id(&self) -> &str {
        match self {
            Self::Upload(u) => &u.customer_id,
            Self::Verify(v) => &v.customer_id,
            Self::Share(s) => &s.customer_id,
        }
    }

    /// Variant fields in declaration order.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut enc = CanonicalEncoder::new();
        match self {
            Self::Upload(u) => {
                enc.str(&u.customer_id)
                    .str(&u.data_hash)
                    .str(&u.data_pointer);
            }
            Self::Verify(v) => {
                enc.str(&v.bank_id)
                    .str(&v.customer_id)
                    .str(&v.upload_tx_id)
                    .bool(v.verified)
                    .str(&v.notes);
                match &v.model {
                    Some(m) => {
                        enc.bool(true)
                            .str(&m.model_id)
                            .str(&m.model_version)
                            .str(&m.attestation_hash);
                    }
                    None => {
                        enc.bool(false);
                    }
                }
            }
            Self::Share(s) => {
                enc.str(&s.from_entity)
                    .str(&s.to_entity)
                    .str(&s.customer_id)
                    .str(&s.verified_tx_id);
            }
        }
        enc.finish()
    }
}

/// Who signed a transaction. Key and signature are kept in the
/// provider's textual encoding so that they reload byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerInfo {
    pub name: String,
    pub public_key: String,
    pub signature: String,
}

/// A ledger record. Unsigned until [`Transaction::sign_with`] is called;
/// the id exists only once signed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Creation time, milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub payload: TxPayload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer: Option<SignerInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Transaction {
    /// Create an unsigned transaction stamped with the current time.
    pub fn new(payload: TxPayload) -> Self {
        Self::with_timestamp(payload, chrono::Utc::now().timestamp_millis())
    }

    pub fn with_timestamp(payload: TxPayload, timestamp: i64) -> Self {
        Self {
            timestamp,
            payload,
            signer: None,
            id: None,
        }
    }

    pub fn upload(
        customer_id: impl Into<String>,
        data_hash: impl Into<String>,
        data_pointer: impl Into<String>,
    ) -> Self {
        Self::new(TxPayload::Upload(KycUpload {
            customer_id: customer_id.into(),
            data_hash: data_hash.into(),
            data_pointer: data_pointer.into(),
        }))
    }

    pub fn verify(
        bank_id: impl Into<String>,
        customer_id: impl Into<String>,
        upload_tx_id: impl Into<String>,
        verified: bool,
        notes: impl Into<String>,
        model: Option<ModelBinding>,
    ) -> Self {
        Self::new(TxPayload::Verify(KycVerify {
            bank_id: bank_id.into(),
            customer_id: customer_id.into(),
            upload_tx_id: upload_tx_id.into(),
            verified,
            notes: notes.into(),
            model,
        }))
    }

    pub fn share(
        from_entity: impl Into<String>,
        to_entity: impl Into<String>,
        customer_id: impl Into<String>,
        verified_tx_id: impl Into<String>,
    ) -> Self {
        Self::new(TxPayload::Share(KycShare {
            from_entity: from_entity.into(),
            to_entity: to_entity.into(),
            customer_id: customer_id.into(),
            verified_tx_id: verified_tx_id.into(),
        }))
    }

    pub fn kind(&self) -> TxKind {
        self.payload.kind()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn is_signed(&self) -> bool {
        self.signer.is_some()
    }

    pub fn signer_name(&self) -> Option<&str> {
        self.signer.as_ref().map(|s| s.name.as_str())
    }

    pub fn actor(&self) -> &str {
        self.payload.actor()
    }

    pub fn customer_id(&self) -> &str {
        self.payload.customer_id()
    }

    pub fn canonical_payload(&self) -> Vec<u8> {
        self.payload.canonical_bytes()
    }

    /// The exact bytes a signer holding `public_key` signs.
    pub fn canonical_data_for(&self, public_key: &str) -> Vec<u8> {
        CanonicalEncoder::new()
            .str(self.kind().as_str())
            .i64(self.timestamp)
            .bytes(&self.canonical_payload())
            .str(public_key)
            .finish()
    }

    /// Canonical data against the recorded signer key (empty if unsigned).
    pub fn canonical_data(&self) -> Vec<u8> {
        let public_key = self
            .signer
            .as_ref()
            .map(|s| s.public_key.as_str())
            .unwrap_or_default();
        self.canonical_data_for(public_key)
    }

    /// Attach a signature made over `canonical_data_for(public_key)` and
    /// freeze the id. A transaction can be signed only once.
    pub fn sign_with(
        &mut self,
        name: impl Into<String>,
        public_key: impl Into<String>,
        signature: impl Into<String>,
        crypto: &dyn CryptoProvider,
    ) -> Result<&str, LedgerError> {
        if let Some(tx_id) = &self.id {
            return Err(LedgerError::AlreadySigned {
                tx_id: tx_id.clone(),
            });
        }
        Ok(self.attach(name.into(), public_key.into(), signature.into(), crypto))
    }

    /// Replace an existing signature. The id changes.
    pub fn resign_with(
        &mut self,
        name: impl Into<String>,
        public_key: impl Into<String>,
        signature: impl Into<String>,
        crypto: &dyn CryptoProvider,
    ) -> &str {
        if let Some(old_id) = &self.id {
            tracing::warn!(tx_id = %old_id, kind = %self.kind(), "re-signing transaction; id will change");
        }
        self.attach(name.into(), public_key.into(), signature.into(), crypto)
    }

    /// Sign with a key pair held in-process.
    pub fn sign_as(
        &mut self,
        name: impl Into<String>,
        keypair: &KeyPair,
        crypto: &dyn CryptoProvider,
    ) -> Result<&str, LedgerError> {
        let public_key = crypto.encode_public_key(&keypair.public_key());
        let signature = crypto.sign(&self.canonical_data_for(&public_key), keypair);
        let signature = crypto.encode_signature(&signature);
        self.sign_with(name, public_key, signature, crypto)
    }

    fn attach(
        &mut self,
        name: String,
        public_key: String,
        signature: String,
        crypto: &dyn CryptoProvider,
    ) -> &str {
        self.signer = Some(SignerInfo {
            name,
            public_key,
            signature,
        });
        let id = self.derive_id(crypto).unwrap_or_default();
        tracing::info!(tx_id = %id, kind = %self.kind(), signer = ?self.signer_name(), "transaction signed");
        self.id.insert(id).as_str()
    }

    /// The id implied by the current content and signature, or `None` if
    /// unsigned. A stored id that differs from this has been rewritten.
    pub fn derive_id(&self, crypto: &dyn CryptoProvider) -> Option<String> {
        let signer = self.signer.as_ref()?;
        Some(
            crypto.hash_digest(
                &CanonicalEncoder::new()
                    .bytes(&self.canonical_data_for(&signer.public_key))
                    .str(&signer.signature)
                    .finish(),
            ),
        )
    }

    /// Check the signature against the current content. Unsigned or
    /// malformed transactions yield `false`.
    pub fn verify_signature(&self, crypto: &dyn CryptoProvider) -> bool {
        let Some(signer) = &self.signer else {
            return false;
        };
        crypto.verify_encoded(
            &self.canonical_data_for(&signer.public_key),
            &signer.signature,
            &signer.public_key,
        )
    }

    /// Whether the signer name equals the role the payload claims.
    pub fn satisfies_role(&self) -> bool {
        self.signer_name() == Some(self.actor())
    }

    /// One-line description for logs and audit output.
    pub fn summary(&self) -> String {
        let id = self.id().unwrap_or("unsigned");
        match &self.payload {
            TxPayload::Upload(u) => format!(
                "{}[{}] customer={} ptr={}",
                TxKind::Upload.label(),
                id,
                u.customer_id,
                u.data_pointer
            ),
            TxPayload::Verify(v) => {
                let mut line = format!(
                    "{}[{}] bank={} customer={} verified={}",
                    TxKind::Verify.label(),
                    id,
                    v.bank_id,
                    v.customer_id,
                    v.verified
                );
                if let Some(m) = &v.model {
                    line.push_str(&format!(
                        " ai={}@{} att={}",
                        m.model_id, m.model_version, m.attestation_hash
                    ));
                }
                line
            }
            TxPayload::Share(s) => format!(
                "{}[{}] {} → {} for {}",
                TxKind::Share.label(),
                id,
                s.from_entity,
                s.to_entity,
                s.customer_id
            ),
        }
    }
}
