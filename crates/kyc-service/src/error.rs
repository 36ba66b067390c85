use kyc_attestation::AttestationError;
use kyc_core::CoreError;
use kyc_ledger::LedgerError;

/// Errors reported to callers of the orchestration layer.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("unknown participant: {0}")]
    UnknownParticipant(String),

    #[error("participant already registered: {0}")]
    DuplicateParticipant(String),

    #[error("no risk assessment service attached")]
    AiNotAttached,

    #[error("attestation rejected: {0}")]
    AttestationRejected(String),

    #[error("tracing init failed: {0}")]
    Telemetry(String),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("attestation error: {0}")]
    Attestation(#[from] AttestationError),

    #[error("core error: {0}")]
    Core(#[from] CoreError),
}
