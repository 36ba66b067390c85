//! Integration test: AI-assisted verification across the attestation,
//! ledger and service crates.

use std::sync::Arc;

use kyc_attestation::{fingerprint, Attestation, ModelRegistry, RiskAssessor, SimpleRiskService};
use kyc_crypto::KeyPair;
use kyc_integration_tests::{altered, crypto, demo_service};
use kyc_ledger::{ChainViolation, TxPayload};
use kyc_service::{KycService, ServiceError};

const MODEL: &str = "kyc-doc-face";
const VERSION: &str = "3.4.2";

fn attach(svc: &mut KycService) -> (Arc<SimpleRiskService>, Arc<ModelRegistry>) {
    let assessor = Arc::new(SimpleRiskService::with_keypair(
        MODEL,
        VERSION,
        KeyPair::from_seed(&[71u8; 32]),
        crypto(),
    ));
    let registry = Arc::new(ModelRegistry::new(crypto()));
    svc.attach_ai(assessor.clone(), registry.clone());
    (assessor, registry)
}

// =========================================================================
// End to end
// =========================================================================

#[test]
fn test_ai_verify_end_to_end() {
    let mut svc = demo_service(2);
    attach(&mut svc);

    let upload = svc
        .create_upload_tx("Alice", "kyc://alice/1", b"alice passport")
        .unwrap();
    svc.append(vec![upload.clone()]).unwrap();

    let verify = svc
        .create_verify_tx_with_ai("BankA", &upload, true, "model assisted")
        .unwrap();
    svc.append(vec![verify.clone()]).unwrap();
    assert!(svc.validate().is_ok());

    let TxPayload::Verify(v) = &verify.payload else {
        panic!("expected verify payload");
    };
    let binding = v.model.as_ref().unwrap();
    assert_eq!(binding.model_id, MODEL);
    assert_eq!(binding.model_version, VERSION);

    let att = svc.attestation(&binding.attestation_hash).unwrap();
    let TxPayload::Upload(u) = &upload.payload else {
        panic!("expected upload payload");
    };
    assert_eq!(att.input_fingerprint, fingerprint(u, svc.crypto().as_ref()));
    assert!(att.flags.contains(&"upload_ptr=kyc://alice/1".to_string()));
    assert!(svc.verify_attestation_binding(&verify));

    let summary = verify.summary();
    assert!(summary.contains("ai=kyc-doc-face@3.4.2"));
    assert!(summary.contains(&binding.attestation_hash));
}

#[test]
fn test_ai_verify_then_bank_overwrite_is_detected() {
    let mut svc = demo_service(1);
    attach(&mut svc);
    let upload = svc.create_upload_tx("Alice", "kyc://alice/1", b"doc").unwrap();
    svc.append(vec![upload.clone()]).unwrap();
    let verify = svc
        .create_verify_tx_with_ai("BankA", &upload, true, "")
        .unwrap();
    svc.append(vec![verify]).unwrap();
    assert!(svc.validate().is_ok());

    let tampered = altered(svc.chain(), |blocks| {
        if let TxPayload::Verify(v) = &mut blocks[2].transactions[0].payload {
            v.bank_id = "BankZ".into();
        }
    });
    assert!(matches!(
        tampered.validate(),
        Err(ChainViolation::InvalidSignature { index: 2, .. })
    ));
}

#[test]
fn test_attestation_hash_swap_is_detected() {
    let mut svc = demo_service(1);
    attach(&mut svc);
    let upload = svc.create_upload_tx("Alice", "kyc://alice/1", b"doc").unwrap();
    svc.append(vec![upload.clone()]).unwrap();
    let verify = svc
        .create_verify_tx_with_ai("BankA", &upload, true, "")
        .unwrap();
    svc.append(vec![verify]).unwrap();

    // Point the on-chain reference at a different stored attestation.
    let other = svc.create_upload_tx("Alice", "kyc://alice/2", b"doc 2").unwrap();
    let other_verify = svc
        .create_verify_tx_with_ai("BankA", &other, true, "")
        .unwrap();
    let TxPayload::Verify(ov) = &other_verify.payload else {
        panic!("expected verify payload");
    };
    let other_hash = ov.model.as_ref().unwrap().attestation_hash.clone();

    let tampered = altered(svc.chain(), |blocks| {
        if let TxPayload::Verify(v) = &mut blocks[2].transactions[0].payload {
            if let Some(m) = v.model.as_mut() {
                m.attestation_hash = other_hash;
            }
        }
    });
    assert!(!tampered.is_valid());
    // The altered reference also no longer fingerprints the upload it names.
    assert!(!svc.verify_attestation_binding(&tampered.blocks()[2].transactions[0]));
}

#[test]
fn test_modified_attestation_content_changes_hash() {
    let mut svc = demo_service(1);
    attach(&mut svc);
    let upload = svc.create_upload_tx("Alice", "kyc://alice/1", b"doc").unwrap();
    let verify = svc
        .create_verify_tx_with_ai("BankA", &upload, true, "")
        .unwrap();
    let TxPayload::Verify(v) = &verify.payload else {
        panic!("expected verify payload");
    };
    let hash = &v.model.as_ref().unwrap().attestation_hash;

    let mut att = svc.attestation(hash).unwrap();
    att.risk_score = 0.01;
    assert_ne!(&att.hash(svc.crypto().as_ref()), hash);
}

// =========================================================================
// Registry gating
// =========================================================================

#[test]
fn test_unregistered_model_is_rejected() {
    let registry = ModelRegistry::new(crypto());
    let service_key = KeyPair::from_seed(&[72u8; 32]);
    let att = Attestation::builder()
        .model("unknown-model", "0.1")
        .fingerprint("fp")
        .risk(0.3)
        .issuer(&service_key)
        .sign(crypto().as_ref())
        .unwrap();
    assert!(att.verify_signature(crypto().as_ref()));
    assert!(!registry.verify(&att));
}

#[test]
fn test_rogue_signer_is_rejected() {
    let mut svc = demo_service(1);
    let (_, registry) = attach(&mut svc);

    let rogue = SimpleRiskService::with_keypair(
        MODEL,
        VERSION,
        KeyPair::from_seed(&[73u8; 32]),
        crypto(),
    );
    let upload = svc.create_upload_tx("Alice", "kyc://alice/1", b"doc").unwrap();
    let att = rogue.attest(&upload).unwrap();
    assert!(att.verify_signature(crypto().as_ref()));

    let verdict = registry.check(&att);
    assert!(!verdict.valid);
    assert_eq!(verdict.first_failure().unwrap().name, "issuer_key_matches");
}

#[test]
fn test_verify_with_ai_requires_attachment() {
    let svc = demo_service(1);
    let upload = svc.create_upload_tx("Alice", "kyc://alice/1", b"doc").unwrap();
    assert!(matches!(
        svc.create_verify_tx_with_ai("BankA", &upload, true, ""),
        Err(ServiceError::AiNotAttached)
    ));
}

#[test]
fn test_rotated_key_rejects_service() {
    let mut svc = demo_service(1);
    let (_, registry) = attach(&mut svc);
    registry.register(MODEL, VERSION, &KeyPair::from_seed(&[74u8; 32]).public_key());

    let upload = svc.create_upload_tx("Alice", "kyc://alice/1", b"doc").unwrap();
    assert!(matches!(
        svc.create_verify_tx_with_ai("BankA", &upload, true, ""),
        Err(ServiceError::AttestationRejected(_))
    ));
}
