//! Connector port: the platform layer that actually joins a network.
//!
//! The connector's accept/reject signal is authoritative. Infrastructure
//! failures (missing tools, driver errors) are reported as rejections so
//! they count as a failed attempt.

use crate::target::TrialTarget;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use wimap_core::Credential;

/// Result of one connection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptResult {
    /// The network accepted the credential
    Accepted,
    /// The network (or the platform) rejected the attempt
    Rejected,
    /// No answer within the attempt timeout
    TimedOut,
}

impl AttemptResult {
    /// True for `Accepted`.
    #[must_use]
    pub fn is_accepted(self) -> bool {
        self == Self::Accepted
    }
}

impl fmt::Display for AttemptResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accepted => f.write_str("accepted"),
            Self::Rejected => f.write_str("rejected"),
            Self::TimedOut => f.write_str("timed out"),
        }
    }
}

/// Joins networks on behalf of the trial engine.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Try to join `target` with `credential`, giving up after `timeout`.
    async fn attempt(
        &self,
        target: &TrialTarget,
        credential: &Credential,
        timeout: Duration,
    ) -> AttemptResult;

    /// Release whatever the connector holds for `target` (pending
    /// connection profiles, half-open associations). Best effort.
    async fn release(&self, target: &TrialTarget);
}
