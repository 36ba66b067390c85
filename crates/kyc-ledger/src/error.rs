use kyc_core::CoreError;

/// Ledger errors: signing misuse, mining limits, snapshot I/O.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("transaction {tx_id} is already signed")]
    AlreadySigned { tx_id: String },

    #[error("difficulty {difficulty} exceeds the maximum of {max}")]
    InvalidDifficulty { difficulty: u32, max: u32 },

    #[error("mining gave up after {attempts} attempts")]
    MiningExhausted { attempts: u64 },

    #[error("mining timed out after {attempts} attempts ({elapsed_ms} ms)")]
    MiningTimedOut { attempts: u64, elapsed_ms: u64 },

    #[error("mining cancelled after {attempts} attempts")]
    MiningCancelled { attempts: u64 },

    #[error("a chain needs at least a genesis block")]
    EmptyChain,

    #[error("snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("core error: {0}")]
    Core(#[from] CoreError),
}

/// The first integrity rule a chain breaks, located precisely.
///
/// Structural failures (link, hash, work) and cryptographic failures
/// (signature, role) are reported through the same type so that chain
/// integrity stays a single predicate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainViolation {
    #[error("genesis block is malformed: {reason}")]
    BadGenesis { reason: String },

    #[error("block at position {position} carries index {index}")]
    IndexMismatch { position: usize, index: u64 },

    #[error("block {index} links to {found}, expected {expected}")]
    BrokenLink {
        index: u64,
        expected: String,
        found: String,
    },

    #[error("block {index} stores hash {stored} but hashes to {computed}")]
    HashMismatch {
        index: u64,
        stored: String,
        computed: String,
    },

    #[error("block {index} hash does not meet difficulty {difficulty}")]
    InsufficientWork { index: u64, difficulty: u32 },

    #[error("block {index}: transaction id {tx_id} does not match its content ({derived})")]
    IdMismatch {
        index: u64,
        tx_id: String,
        derived: String,
    },

    #[error("block {index}: transaction {tx_id} has an invalid signature")]
    InvalidSignature { index: u64, tx_id: String },

    #[error("block {index}: transaction {tx_id} signed by {signer} but claims {claimed}")]
    RoleMismatch {
        index: u64,
        tx_id: String,
        signer: String,
        claimed: String,
    },
}

impl ChainViolation {
    /// Index of the offending block.
    pub fn block_index(&self) -> u64 {
        match self {
            Self::BadGenesis { .. } => 0,
            Self::IndexMismatch { position, .. } => *position as u64,
            Self::BrokenLink { index, .. }
            | Self::HashMismatch { index, .. }
            | Self::InsufficientWork { index, .. }
            | Self::InvalidSignature { index, .. }
            | Self::IdMismatch { index, .. }
            | Self::RoleMismatch { index, .. } => *index,
        }
    }

    /// Id of the offending transaction, for transaction-level failures.
    pub fn tx_id(&self) -> Option<&str> {
        match self {
            Self::InvalidSignature { tx_id, .. }
            | Self::IdMismatch { tx_id, .. }
            | Self::RoleMismatch { tx_id, .. } => Some(tx_id),
            _ => None,
        }
    }

    /// Short machine-friendly name of the failed check.
    pub fn check_name(&self) -> &'static str {
        match self {
            Self::BadGenesis { .. } => "genesis",
            Self::IndexMismatch { .. } => "index",
            Self::BrokenLink { .. } => "prev_hash_link",
            Self::HashMismatch { .. } => "hash_integrity",
            Self::InsufficientWork { .. } => "proof_of_work",
            Self::InvalidSignature { .. } => "signature_valid",
            Self::IdMismatch { .. } => "tx_id_integrity",
            Self::RoleMismatch { .. } => "signer_role",
        }
    }
}
