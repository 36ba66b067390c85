//! Integration test: chain integrity under normal use and tampering.
//!
//! Every tampering scenario builds a second, altered copy of an honest
//! chain and checks that validation rejects it while the honest chain
//! keeps validating.

use kyc_integration_tests::{altered, demo_service};
use kyc_ledger::{
    audit, meets_difficulty, Chain, ChainViolation, MiningBudget, Transaction, TxPayload,
};
use kyc_service::KycService;

/// Alice uploads, BankA verifies, BankA shares with InsurerX; one block each.
fn happy_path() -> KycService {
    let mut svc = demo_service(2);
    let upload = svc
        .create_upload_tx("Alice", "kyc://alice/1", b"alice passport")
        .unwrap();
    let upload_id = upload.id().unwrap().to_string();
    svc.append(vec![upload]).unwrap();

    let verify = svc
        .create_verify_tx("BankA", "Alice", &upload_id, true, "documents match")
        .unwrap();
    let verify_id = verify.id().unwrap().to_string();
    svc.append(vec![verify]).unwrap();

    let share = svc
        .create_share_tx("BankA", "InsurerX", "Alice", &verify_id)
        .unwrap();
    svc.append(vec![share]).unwrap();
    svc
}

// =========================================================================
// Honest construction
// =========================================================================

#[test]
fn test_happy_path_validates() {
    let svc = happy_path();
    assert_eq!(svc.chain().len(), 4);
    assert!(svc.validate().is_ok());
    assert!(svc.chain().is_valid());
}

#[test]
fn test_links_and_work_prefix() {
    let svc = happy_path();
    let chain = svc.chain();
    for pair in chain.blocks().windows(2) {
        assert_eq!(pair[1].prev_hash, pair[0].hash);
        assert!(pair[1].hash.starts_with("00"));
        assert!(meets_difficulty(&pair[1].hash, chain.difficulty()));
    }
}

#[test]
fn test_validation_is_stateless() {
    let svc = happy_path();
    let before = svc.chain().snapshot();
    for _ in 0..3 {
        assert!(svc.validate().is_ok());
    }
    assert_eq!(svc.chain().snapshot(), before);
}

#[test]
fn test_audit_for_customer() {
    let mut svc = happy_path();
    let bob = svc.create_upload_tx("Bob", "kyc://bob/1", b"bob id").unwrap();
    svc.append(vec![bob]).unwrap();

    let alice = svc.audit_for_customer("Alice");
    assert_eq!(alice.len(), 3);
    let summaries: Vec<String> = alice.iter().map(|tx| tx.summary()).collect();
    assert!(summaries[0].starts_with("UPLOAD["));
    assert!(summaries[1].starts_with("VERIFY["));
    assert!(summaries[2].starts_with("SHARE["));
    assert_eq!(svc.audit_for_customer("Bob").len(), 1);
}

#[test]
fn test_rebuild_from_same_transactions() {
    let svc = happy_path();
    let mut rebuilt = Chain::new(svc.chain().difficulty(), svc.crypto().clone()).unwrap();
    for block in &svc.chain().blocks()[1..] {
        rebuilt.append(block.transactions.clone()).unwrap();
    }
    assert!(rebuilt.is_valid());
    let original: Vec<_> = svc.chain().transactions().map(|tx| tx.id()).collect();
    let copied: Vec<_> = rebuilt.transactions().map(|tx| tx.id()).collect();
    assert_eq!(original, copied);
}

// =========================================================================
// Tampering
// =========================================================================

#[test]
fn test_bank_id_overwrite_is_detected() {
    let svc = happy_path();
    let tampered = altered(svc.chain(), |blocks| {
        if let TxPayload::Verify(v) = &mut blocks[2].transactions[0].payload {
            v.bank_id = "BankZ".into();
        }
    });
    assert!(svc.chain().is_valid());
    assert!(matches!(
        tampered.validate(),
        Err(ChainViolation::InvalidSignature { index: 2, .. })
    ));
}

#[test]
fn test_impersonation_by_other_bank_is_detected() {
    let mut svc = demo_service(1);
    let upload = svc.create_upload_tx("Alice", "kyc://alice/1", b"doc").unwrap();
    let upload_id = upload.id().unwrap().to_string();
    svc.append(vec![upload]).unwrap();

    // BankB signs a decision that claims to come from BankA.
    let mut forged = kyc_ledger::Transaction::verify("BankA", "Alice", upload_id, true, "", None);
    svc.participant("BankB")
        .unwrap()
        .sign(&mut forged, svc.crypto().as_ref())
        .unwrap();
    assert!(forged.verify_signature(svc.crypto().as_ref()));
    svc.append(vec![forged]).unwrap();

    match svc.validate() {
        Err(ChainViolation::RoleMismatch {
            index,
            signer,
            claimed,
            ..
        }) => {
            assert_eq!(index, 2);
            assert_eq!(signer, "BankB");
            assert_eq!(claimed, "BankA");
        }
        other => panic!("expected role mismatch, got {:?}", other),
    }
}

#[test]
fn test_payload_tamper_is_detected() {
    let svc = happy_path();
    let tampered = altered(svc.chain(), |blocks| {
        if let TxPayload::Upload(u) = &mut blocks[1].transactions[0].payload {
            u.data_pointer = "kyc://mallory/1".into();
        }
    });
    let violation = tampered.validate().unwrap_err();
    assert_eq!(violation.check_name(), "signature_valid");
    assert_eq!(violation.block_index(), 1);
}

#[test]
fn test_signature_swap_is_detected() {
    let mut svc = demo_service(1);
    let first = svc.create_upload_tx("Alice", "kyc://alice/1", b"one").unwrap();
    let second = svc.create_upload_tx("Alice", "kyc://alice/2", b"two").unwrap();
    svc.append(vec![first, second]).unwrap();
    assert!(svc.validate().is_ok());

    let tampered = altered(svc.chain(), |blocks| {
        let txs = &mut blocks[1].transactions;
        let a = txs[0].signer.as_ref().unwrap().signature.clone();
        let b = txs[1].signer.as_ref().unwrap().signature.clone();
        txs[0].signer.as_mut().unwrap().signature = b;
        txs[1].signer.as_mut().unwrap().signature = a;
    });
    assert!(!tampered.is_valid());
    let crypto = svc.crypto().clone();
    for tx in &tampered.blocks()[1].transactions {
        assert!(!tx.verify_signature(crypto.as_ref()));
    }
}

#[test]
fn test_broken_link_is_detected() {
    let svc = happy_path();
    let tampered = altered(svc.chain(), |blocks| {
        blocks[3].prev_hash = blocks[1].hash.clone();
    });
    assert!(matches!(
        tampered.validate(),
        Err(ChainViolation::BrokenLink { index: 3, .. })
    ));
}

#[test]
fn test_dropped_transaction_is_detected() {
    let svc = happy_path();
    let tampered = altered(svc.chain(), |blocks| {
        blocks[2].transactions.clear();
    });
    assert!(matches!(
        tampered.validate(),
        Err(ChainViolation::HashMismatch { index: 2, .. })
    ));
}

#[test]
fn test_remining_does_not_repair_signature() {
    let svc = happy_path();
    let crypto = svc.crypto().clone();
    let difficulty = svc.chain().difficulty();
    let tampered = altered(svc.chain(), |blocks| {
        let last = blocks.last_mut().unwrap();
        if let TxPayload::Share(s) = &mut last.transactions[0].payload {
            s.to_entity = "DataBroker".into();
        }
        last.nonce = 0;
        last.hash = last.compute_hash(crypto.as_ref());
        last.mine(difficulty, &MiningBudget::unbounded(), crypto.as_ref())
            .unwrap();
    });
    let last = tampered.tip();
    assert!(last.meets_difficulty(difficulty));
    assert_eq!(last.hash, last.compute_hash(crypto.as_ref()));
    assert!(matches!(
        tampered.validate(),
        Err(ChainViolation::InvalidSignature { index: 3, .. })
    ));
}

#[test]
fn test_transaction_in_genesis_is_detected() {
    let svc = happy_path();
    let tampered = altered(svc.chain(), |blocks| {
        blocks[0].transactions.push(Transaction::verify(
            "BankA", "Alice", "upload-1", true, "", None,
        ));
    });
    assert!(matches!(
        tampered.validate(),
        Err(ChainViolation::BadGenesis { .. })
    ));
    // The honest copy still validates and Alice's history is unchanged.
    assert!(svc.validate().is_ok());
    assert_eq!(svc.audit_for_customer("Alice").len(), 3);
}

#[test]
fn test_relinked_genesis_is_detected() {
    let svc = happy_path();
    let crypto = svc.crypto().clone();
    let tampered = altered(svc.chain(), |blocks| {
        blocks[0].prev_hash = "ff".into();
        blocks[0].hash = blocks[0].compute_hash(crypto.as_ref());
    });
    let violation = tampered.validate().unwrap_err();
    assert_eq!(violation.block_index(), 0);
    assert_eq!(violation.check_name(), "genesis");
}

// =========================================================================
// Replay
// =========================================================================

#[test]
fn test_replay_keeps_chain_valid_but_is_audited() {
    let mut svc = happy_path();
    let first_upload = svc.chain().blocks()[1].transactions[0].clone();
    svc.append(vec![first_upload.clone()]).unwrap();

    assert!(svc.validate().is_ok());
    let replays = audit::find_replays(svc.chain());
    assert_eq!(replays.len(), 1);
    assert_eq!(replays[0].tx_id, first_upload.id().unwrap());
    assert_eq!(replays[0].block_indexes, vec![1, 4]);
}

#[test]
fn test_replay_under_rewritten_id_is_detected() {
    let mut svc = happy_path();
    let mut disguised = svc.chain().blocks()[1].transactions[0].clone();
    disguised.id = Some("f".repeat(64));
    svc.append(vec![disguised.clone()]).unwrap();

    // Without the id check the copy would pass as a fresh transaction.
    assert!(audit::find_replays(svc.chain()).is_empty());
    assert_ne!(
        disguised.derive_id(svc.crypto().as_ref()).as_deref(),
        disguised.id()
    );
    assert!(matches!(
        svc.validate(),
        Err(ChainViolation::IdMismatch { index: 4, .. })
    ));
}
