//! Integration test: configuration-driven construction, bounded mining,
//! and JSON snapshot export/import.

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use kyc_core::{LedgerConfig, ParticipantRole, TrustedModelConfig};
use kyc_crypto::KeyPair;
use kyc_integration_tests::{altered, crypto, demo_service};
use kyc_ledger::{Chain, ChainSnapshot, LedgerError, MiningBudget, TxPayload};
use kyc_service::KycService;

fn temp_config(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("kyc-integration-{}", std::process::id()))
        .join(name)
}

// =========================================================================
// Configuration
// =========================================================================

#[test]
fn test_service_from_saved_config() {
    let model_key = KeyPair::from_seed(&[81u8; 32]);
    let path = temp_config("ledger.toml");
    let mut config = LedgerConfig::default();
    config.chain.difficulty = 1;
    config.mining.max_attempts = Some(5_000_000);
    config.models.push(TrustedModelConfig {
        model_id: "kyc-doc-face".into(),
        version: "3.4.2".into(),
        public_key: model_key.public_key().to_hex(),
    });
    config.save(&path).unwrap();

    let loaded = LedgerConfig::load(&path).unwrap();
    let mut svc = KycService::from_config(&loaded, crypto()).unwrap();
    assert_eq!(svc.chain().difficulty(), 1);
    assert_eq!(
        svc.model_registry().unwrap().trusted_key("kyc-doc-face", "3.4.2"),
        Some(model_key.public_key().to_hex())
    );

    svc.register("Alice", ParticipantRole::Customer).unwrap();
    let upload = svc.create_upload_tx("Alice", "kyc://alice/1", b"doc").unwrap();
    svc.append(vec![upload]).unwrap();
    assert!(svc.validate().is_ok());

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_difficulty_above_ceiling_rejected() {
    let mut config = LedgerConfig::default();
    config.chain.difficulty = 65;
    assert!(KycService::from_config(&config, crypto()).is_err());
    assert!(matches!(
        Chain::new(65, crypto()),
        Err(LedgerError::InvalidDifficulty { difficulty: 65, max: 64 })
    ));
}

// =========================================================================
// Bounded mining
// =========================================================================

#[test]
fn test_attempt_budget_leaves_chain_unchanged() {
    let mut chain = Chain::new(40, crypto())
        .unwrap()
        .with_budget(MiningBudget::unbounded().with_max_attempts(100));
    let err = chain.append(vec![]).unwrap_err();
    assert!(matches!(err, LedgerError::MiningExhausted { attempts: 100 }));
    assert_eq!(chain.len(), 1);
    assert!(chain.is_valid());
}

#[test]
fn test_timeout_budget() {
    let mut chain = Chain::new(40, crypto())
        .unwrap()
        .with_budget(MiningBudget::unbounded().with_timeout(Duration::from_millis(20)));
    assert!(matches!(
        chain.append(vec![]),
        Err(LedgerError::MiningTimedOut { .. })
    ));
    assert_eq!(chain.len(), 1);
}

#[test]
fn test_cancelled_mining() {
    let cancel = Arc::new(AtomicBool::new(true));
    let mut chain = Chain::new(40, crypto())
        .unwrap()
        .with_budget(MiningBudget::unbounded().with_cancel_flag(cancel));
    assert!(matches!(
        chain.append(vec![]),
        Err(LedgerError::MiningCancelled { attempts: 0 })
    ));
}

// =========================================================================
// Snapshots
// =========================================================================

#[test]
fn test_snapshot_roundtrip_preserves_validity() {
    let mut svc = demo_service(2);
    let upload = svc.create_upload_tx("Alice", "kyc://alice/1", b"doc").unwrap();
    let verify = svc
        .create_verify_tx("BankA", "Alice", upload.id().unwrap(), true, "ok")
        .unwrap();
    svc.append(vec![upload]).unwrap();
    svc.append(vec![verify]).unwrap();

    let json = svc.chain().to_json().unwrap();
    let reloaded = Chain::from_json(&json, crypto()).unwrap();
    assert!(reloaded.is_valid());
    assert_eq!(reloaded.tip().hash, svc.chain().tip().hash);
    assert_eq!(reloaded.blocks(), svc.chain().blocks());
}

#[test]
fn test_snapshot_of_tampered_chain_is_invalid_after_reload() {
    let mut svc = demo_service(1);
    let verify = svc
        .create_verify_tx("BankA", "Alice", "upload-1", true, "ok")
        .unwrap();
    svc.append(vec![verify]).unwrap();

    let tampered = altered(svc.chain(), |blocks| {
        if let TxPayload::Verify(v) = &mut blocks[1].transactions[0].payload {
            v.verified = false;
        }
    });
    let snapshot: ChainSnapshot = serde_json::from_str(&tampered.to_json().unwrap()).unwrap();
    let reloaded = snapshot.into_chain(crypto()).unwrap();
    assert!(!reloaded.is_valid());
}

#[test]
fn test_corrupt_snapshot_is_an_error() {
    assert!(matches!(
        Chain::from_json("{\"difficulty\": 1}", crypto()),
        Err(LedgerError::Snapshot(_))
    ));
    assert!(matches!(
        Chain::from_json("{\"difficulty\": 1, \"blocks\": []}", crypto()),
        Err(LedgerError::EmptyChain)
    ));
}
