//! Transaction authoring and audit queries.
//!
//! [`KycService`] signs transactions on behalf of registered participants,
//! consults an attached risk assessor for attested verifications, and
//! owns the chain those transactions are appended to.

use std::sync::Arc;

use kyc_attestation::{
    fingerprint, Attestation, AttestationError, AttestationStore, ModelRegistry, RiskAssessor,
};
use kyc_core::{LedgerConfig, ParticipantRole};
use kyc_crypto::{CryptoProvider, PublicKey};
use kyc_ledger::{
    audit, Block, Chain, ChainViolation, ModelBinding, ReplayFinding, Transaction, TxPayload,
};

use crate::error::ServiceError;
use crate::participants::{Participant, ParticipantRegistry};

pub struct KycService {
    crypto: Arc<dyn CryptoProvider>,
    participants: ParticipantRegistry,
    chain: Chain,
    assessor: Option<Arc<dyn RiskAssessor>>,
    registry: Option<Arc<ModelRegistry>>,
    attestations: AttestationStore,
}

impl KycService {
    /// Wrap an existing chain. The chain's crypto provider is used for
    /// everything the service signs or hashes.
    pub fn new(chain: Chain) -> Self {
        let crypto = chain.crypto().clone();
        Self {
            participants: ParticipantRegistry::new(),
            attestations: AttestationStore::new(crypto.clone()),
            assessor: None,
            registry: None,
            crypto,
            chain,
        }
    }

    /// Build a chain from `config` and pre-load its trusted models.
    pub fn from_config(
        config: &LedgerConfig,
        crypto: Arc<dyn CryptoProvider>,
    ) -> Result<Self, ServiceError> {
        let chain = Chain::from_config(config, crypto.clone())?;
        let mut service = Self::new(chain);
        if !config.models.is_empty() {
            service.registry = Some(Arc::new(ModelRegistry::from_config(&config.models, crypto)?));
        }
        Ok(service)
    }

    pub fn crypto(&self) -> &Arc<dyn CryptoProvider> {
        &self.crypto
    }

    // ---- Participants ----

    /// Register a participant under a fresh key pair.
    pub fn register(&self, name: &str, role: ParticipantRole) -> Result<PublicKey, ServiceError> {
        let participant = Participant::new(name, role, self.crypto.generate_key_pair());
        Ok(self.participants.register(participant)?.public_key())
    }

    pub fn participant(&self, name: &str) -> Result<Arc<Participant>, ServiceError> {
        self.participants.get(name)
    }

    pub fn participants(&self) -> &ParticipantRegistry {
        &self.participants
    }

    // ---- Risk assessment ----

    /// Attach a risk assessor and the registry its attestations are
    /// checked against. The assessor's key is registered for its model.
    pub fn attach_ai(&mut self, assessor: Arc<dyn RiskAssessor>, registry: Arc<ModelRegistry>) {
        registry.register(
            assessor.model_id(),
            assessor.model_version(),
            &assessor.service_public_key(),
        );
        tracing::info!(
            model_id = assessor.model_id(),
            version = assessor.model_version(),
            "risk assessor attached"
        );
        self.assessor = Some(assessor);
        self.registry = Some(registry);
    }

    pub fn model_registry(&self) -> Option<&Arc<ModelRegistry>> {
        self.registry.as_ref()
    }

    // ---- Transaction authoring ----

    /// Create an upload signed by `customer`. Only the digest of
    /// `raw_data` is recorded.
    pub fn create_upload_tx(
        &self,
        customer: &str,
        data_pointer: &str,
        raw_data: &[u8],
    ) -> Result<Transaction, ServiceError> {
        let data_hash = self.crypto.hash_digest(raw_data);
        self.signed_by(customer, Transaction::upload(customer, data_hash, data_pointer))
    }

    pub fn create_verify_tx(
        &self,
        bank: &str,
        customer: &str,
        upload_tx_id: &str,
        verified: bool,
        notes: &str,
    ) -> Result<Transaction, ServiceError> {
        self.signed_by(
            bank,
            Transaction::verify(bank, customer, upload_tx_id, verified, notes, None),
        )
    }

    /// Create a verification backed by an attestation of `upload`.
    ///
    /// `upload` must be a signed upload. The attestation must fingerprint
    /// that upload, carry a valid self-signature and pass the model
    /// registry. It is kept off-chain; the transaction records only
    /// its hash and model.
    pub fn create_verify_tx_with_ai(
        &self,
        bank: &str,
        upload: &Transaction,
        verified: bool,
        notes: &str,
    ) -> Result<Transaction, ServiceError> {
        let (Some(assessor), Some(registry)) = (&self.assessor, &self.registry) else {
            return Err(ServiceError::AiNotAttached);
        };
        let bank_participant = self.participants.get(bank)?;
        let TxPayload::Upload(fields) = &upload.payload else {
            return Err(AttestationError::NotAnUpload(upload.summary()).into());
        };
        let upload_id = upload.id().ok_or(AttestationError::UnsignedUpload)?;

        let attestation = assessor.attest(upload)?;
        if attestation.input_fingerprint != fingerprint(fields, self.crypto.as_ref()) {
            return Err(ServiceError::AttestationRejected(
                "attestation fingerprint does not match the upload".into(),
            ));
        }
        if !attestation.verify_signature(self.crypto.as_ref()) {
            return Err(ServiceError::AttestationRejected(
                "attestation signature is invalid".into(),
            ));
        }
        let verdict = registry.check(&attestation);
        if let Some(failure) = verdict.first_failure() {
            return Err(ServiceError::AttestationRejected(
                failure.detail.clone().unwrap_or_else(|| failure.name.clone()),
            ));
        }

        let binding = ModelBinding {
            model_id: attestation.model_id.clone(),
            model_version: attestation.model_version.clone(),
            attestation_hash: self.attestations.put(attestation),
        };
        let mut tx = Transaction::verify(
            bank,
            upload.customer_id(),
            upload_id,
            verified,
            notes,
            Some(binding),
        );
        bank_participant.sign(&mut tx, self.crypto.as_ref())?;
        Ok(tx)
    }

    pub fn create_share_tx(
        &self,
        from_entity: &str,
        to_entity: &str,
        customer: &str,
        verified_tx_id: &str,
    ) -> Result<Transaction, ServiceError> {
        self.signed_by(
            from_entity,
            Transaction::share(from_entity, to_entity, customer, verified_tx_id),
        )
    }

    fn signed_by(&self, name: &str, mut tx: Transaction) -> Result<Transaction, ServiceError> {
        self.participants
            .get(name)?
            .sign(&mut tx, self.crypto.as_ref())?;
        Ok(tx)
    }

    // ---- Chain ----

    /// Mine the transactions into a new block.
    pub fn append(&mut self, transactions: Vec<Transaction>) -> Result<&Block, ServiceError> {
        Ok(self.chain.append(transactions)?)
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn validate(&self) -> Result<(), ChainViolation> {
        self.chain.validate()
    }

    // ---- Audit ----

    /// Every transaction concerning `customer_id`, in chain order.
    pub fn audit_for_customer(&self, customer_id: &str) -> Vec<&Transaction> {
        audit::transactions_for_customer(&self.chain, customer_id)
    }

    pub fn find_replays(&self) -> Vec<ReplayFinding> {
        audit::find_replays(&self.chain)
    }

    pub fn attestation(&self, hash: &str) -> Option<Attestation> {
        self.attestations.get(hash)
    }

    /// Whether `tx` is a Verify whose attestation reference is intact.
    ///
    /// The referenced attestation must be stored, hash to the recorded
    /// value, name the recorded model, and pass the registry. When the
    /// referenced upload is on the chain, the attestation must also
    /// fingerprint that upload.
    pub fn verify_attestation_binding(&self, tx: &Transaction) -> bool {
        let TxPayload::Verify(verify) = &tx.payload else {
            return false;
        };
        let Some(binding) = &verify.model else {
            return false;
        };
        let Some(attestation) = self.attestations.get(&binding.attestation_hash) else {
            return false;
        };
        if attestation.hash(self.crypto.as_ref()) != binding.attestation_hash
            || attestation.model_id != binding.model_id
            || attestation.model_version != binding.model_version
        {
            return false;
        }
        if let Some((_, upload)) = self.chain.find_transaction(&verify.upload_tx_id) {
            let TxPayload::Upload(fields) = &upload.payload else {
                return false;
            };
            if fingerprint(fields, self.crypto.as_ref()) != attestation.input_fingerprint {
                return false;
            }
        }
        self.registry
            .as_ref()
            .is_some_and(|registry| registry.verify(&attestation))
    }
}
