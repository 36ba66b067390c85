use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use kyc_core::MiningConfig;

use crate::error::LedgerError;

/// How often (in attempts) the wall clock is consulted while mining.
const CLOCK_CHECK_INTERVAL: u64 = 256;

/// Limits on a proof-of-work search.
///
/// The default budget is unbounded: mining runs until a nonce is found.
#[derive(Debug, Clone, Default)]
pub struct MiningBudget {
    /// Stop after this many nonces.
    pub max_attempts: Option<u64>,
    /// Stop after this much wall-clock time.
    pub timeout: Option<Duration>,
    /// Stop as soon as this flag becomes `true`.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl MiningBudget {
    /// A budget with no limits.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Build a budget from the `[mining]` config section.
    pub fn from_config(config: &MiningConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            timeout: config.timeout(),
            cancel: None,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u64) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Start tracking a search against this budget.
    pub(crate) fn start(&self) -> BudgetGuard<'_> {
        BudgetGuard {
            budget: self,
            started: Instant::now(),
            attempts: 0,
        }
    }
}

/// Per-search state for a [`MiningBudget`].
pub(crate) struct BudgetGuard<'a> {
    budget: &'a MiningBudget,
    started: Instant,
    attempts: u64,
}

impl BudgetGuard<'_> {
    /// Account for one more attempt, failing if any limit is hit.
    pub(crate) fn charge(&mut self) -> Result<(), LedgerError> {
        if let Some(cancel) = &self.budget.cancel {
            if cancel.load(Ordering::Relaxed) {
                return Err(LedgerError::MiningCancelled {
                    attempts: self.attempts,
                });
            }
        }
        if let Some(max) = self.budget.max_attempts {
            if self.attempts >= max {
                return Err(LedgerError::MiningExhausted {
                    attempts: self.attempts,
                });
            }
        }
        if let Some(timeout) = self.budget.timeout {
            if self.attempts % CLOCK_CHECK_INTERVAL == 0 {
                let elapsed = self.started.elapsed();
                if elapsed >= timeout {
                    return Err(LedgerError::MiningTimedOut {
                        attempts: self.attempts,
                        elapsed_ms: elapsed.as_millis() as u64,
                    });
                }
            }
        }
        self.attempts += 1;
        Ok(())
    }

    pub(crate) fn attempts(&self) -> u64 {
        self.attempts
    }
}
