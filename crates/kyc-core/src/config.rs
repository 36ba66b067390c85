//! Ledger configuration loading and management.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::CoreError;

/// Largest usable proof-of-work difficulty. Block hashes are 64 hex
/// characters, so a higher prefix requirement can never be met.
pub const MAX_DIFFICULTY: u32 = 64;

/// Full configuration for a KYC ledger instance.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LedgerConfig {
    /// Chain parameters.
    #[serde(default)]
    pub chain: ChainConfig,

    /// Proof-of-work search limits.
    #[serde(default)]
    pub mining: MiningConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Attestation models trusted from startup.
    #[serde(default)]
    pub models: Vec<TrustedModelConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Number of leading zero hex characters a block hash must have.
    #[serde(default = "default_difficulty")]
    pub difficulty: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MiningConfig {
    /// Give up after this many nonces. Unbounded when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u64>,
    /// Give up after this many milliseconds. Unbounded when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// A (model id, version) pair whose attestations are trusted, together
/// with the hex-encoded public key that must have signed them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustedModelConfig {
    pub model_id: String,
    pub version: String,
    pub public_key: String,
}

fn default_difficulty() -> u32 {
    3
}
fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "text".into()
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            difficulty: default_difficulty(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl MiningConfig {
    /// Wall-clock limit as a [`Duration`], if configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

impl LedgerConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<LedgerConfig>(&contents)?
        } else {
            tracing::debug!(path = %path.display(), "config file absent, using defaults");
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Save the current config to a TOML file.
    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        let contents = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Reject settings that could never produce a working ledger.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.chain.difficulty > MAX_DIFFICULTY {
            return Err(CoreError::InvalidDifficulty {
                difficulty: self.chain.difficulty,
                max: MAX_DIFFICULTY,
            });
        }
        if self.mining.max_attempts == Some(0) {
            return Err(CoreError::Config(
                "mining.max_attempts must be at least 1".into(),
            ));
        }
        match self.logging.format.as_str() {
            "text" | "json" => {}
            other => {
                return Err(CoreError::Config(format!(
                    "logging.format must be 'text' or 'json', got '{}'",
                    other
                )))
            }
        }
        for model in &self.models {
            if model.model_id.is_empty() || model.version.is_empty() {
                return Err(CoreError::Config(
                    "trusted model entries need a model_id and a version".into(),
                ));
            }
        }
        Ok(())
    }
}
