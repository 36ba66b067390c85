use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

use kyc_core::ParticipantRole;
use kyc_crypto::{CryptoProvider, KeyPair, PublicKey};
use kyc_ledger::Transaction;

use crate::error::ServiceError;

/// A named ledger participant holding its own signing key.
#[derive(Debug)]
pub struct Participant {
    name: String,
    role: ParticipantRole,
    keypair: KeyPair,
}

impl Participant {
    pub fn new(name: impl Into<String>, role: ParticipantRole, keypair: KeyPair) -> Self {
        Self {
            name: name.into(),
            role,
            keypair,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> ParticipantRole {
        self.role
    }

    pub fn public_key(&self) -> PublicKey {
        self.keypair.public_key()
    }

    /// Sign `tx` under this participant's name.
    pub fn sign(
        &self,
        tx: &mut Transaction,
        crypto: &dyn CryptoProvider,
    ) -> Result<(), ServiceError> {
        tx.sign_as(&self.name, &self.keypair, crypto)?;
        Ok(())
    }
}

/// Name → participant lookup.
#[derive(Default)]
pub struct ParticipantRegistry {
    participants: DashMap<String, Arc<Participant>>,
}

impl ParticipantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a participant. Names are unique.
    pub fn register(&self, participant: Participant) -> Result<Arc<Participant>, ServiceError> {
        match self.participants.entry(participant.name.clone()) {
            Entry::Occupied(entry) => Err(ServiceError::DuplicateParticipant(entry.key().clone())),
            Entry::Vacant(entry) => {
                let participant = Arc::new(participant);
                entry.insert(participant.clone());
                tracing::info!(
                    name = %participant.name,
                    role = %participant.role,
                    public_key = %participant.public_key().to_hex(),
                    "participant registered"
                );
                Ok(participant)
            }
        }
    }

    pub fn get(&self, name: &str) -> Result<Arc<Participant>, ServiceError> {
        self.participants
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ServiceError::UnknownParticipant(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.participants.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .participants
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }
}
