//! Retry, timeout and signal thresholds for credential trials.

use std::time::Duration;
use wimap_core::ConnectionConfig;

/// Limits applied to every trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialSettings {
    /// Attempts per candidate credential
    pub max_retries: u32,
    /// Upper bound on one connection attempt
    pub attempt_timeout: Duration,
    /// Pause between retries of the same credential
    pub retry_backoff: Duration,
    /// Targets weaker than this are not attempted
    pub min_signal_dbm: i32,
}

impl Default for TrialSettings {
    fn default() -> Self {
        Self::from(&ConnectionConfig::default())
    }
}

impl From<&ConnectionConfig> for TrialSettings {
    fn from(config: &ConnectionConfig) -> Self {
        Self {
            max_retries: config.max_retries.max(1),
            attempt_timeout: Duration::from_secs(config.attempt_timeout_secs),
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
            min_signal_dbm: config.min_signal_dbm,
        }
    }
}
