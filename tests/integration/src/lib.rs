//! Shared fixtures for the KYC Chain integration tests.

use std::sync::Arc;

use kyc_core::ParticipantRole;
use kyc_crypto::{CryptoProvider, Ed25519Blake3};
use kyc_ledger::{Block, Chain};
use kyc_service::KycService;

pub fn crypto() -> Arc<dyn CryptoProvider> {
    Arc::new(Ed25519Blake3)
}

/// A service on a fresh chain with BankA, BankB (banks), Alice, Bob
/// (customers) and InsurerX (institution) registered.
pub fn demo_service(difficulty: u32) -> KycService {
    let chain = Chain::new(difficulty, crypto()).expect("difficulty within range");
    let service = KycService::new(chain);
    for (name, role) in [
        ("BankA", ParticipantRole::Bank),
        ("BankB", ParticipantRole::Bank),
        ("Alice", ParticipantRole::Customer),
        ("Bob", ParticipantRole::Customer),
        ("InsurerX", ParticipantRole::Institution),
    ] {
        service.register(name, role).expect("fresh participant");
    }
    service
}

/// A second copy of `chain` with `edit` applied to its blocks.
pub fn altered(chain: &Chain, edit: impl FnOnce(&mut Vec<Block>)) -> Chain {
    let mut blocks = chain.blocks().to_vec();
    edit(&mut blocks);
    Chain::from_blocks(chain.difficulty(), blocks, chain.crypto().clone())
        .expect("altered copy keeps a genesis block")
}
