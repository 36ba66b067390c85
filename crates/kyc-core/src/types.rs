use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Kinds of ledger transactions.
///
/// The kind is part of every transaction's signed bytes, so the wire tag
/// returned by [`TxKind::as_str`] must never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxKind {
    /// A customer uploads a pointer to (and digest of) their KYC documents.
    Upload,
    /// A bank records its decision about an uploaded document set.
    Verify,
    /// An institution shares a verification result with another entity.
    Share,
}

impl TxKind {
    /// Stable wire tag used in canonical encodings.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upload => "KYC_UPLOAD",
            Self::Verify => "KYC_VERIFY",
            Self::Share => "KYC_SHARE",
        }
    }

    /// Short label used in transaction summaries.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Upload => "UPLOAD",
            Self::Verify => "VERIFY",
            Self::Share => "SHARE",
        }
    }
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Business role a registered participant plays on the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParticipantRole {
    /// A bank that verifies customer documents.
    Bank,
    /// An end customer who uploads their own documents.
    Customer,
    /// Any other institution that receives shared verifications.
    Institution,
}

impl fmt::Display for ParticipantRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bank => write!(f, "BANK"),
            Self::Customer => write!(f, "CUSTOMER"),
            Self::Institution => write!(f, "INSTITUTION"),
        }
    }
}

impl FromStr for ParticipantRole {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BANK" => Ok(Self::Bank),
            "CUSTOMER" => Ok(Self::Customer),
            "INSTITUTION" => Ok(Self::Institution),
            other => Err(CoreError::UnknownRole(other.to_string())),
        }
    }
}
