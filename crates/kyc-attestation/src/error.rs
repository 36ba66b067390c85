use kyc_crypto::CryptoError;

/// Attestation errors.
#[derive(Debug, thiserror::Error)]
pub enum AttestationError {
    #[error("attestation is missing required field: {0}")]
    MissingField(&'static str),

    #[error("risk score {0} is outside [0, 1]")]
    RiskOutOfRange(f64),

    #[error("transaction {0} is not an upload")]
    NotAnUpload(String),

    #[error("upload must be signed before it can be attested")]
    UnsignedUpload,

    #[error("invalid key for model {model_id}@{version}: {source}")]
    InvalidModelKey {
        model_id: String,
        version: String,
        #[source]
        source: CryptoError,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
