//! In-process connector with known secrets, for demos and tests.

use crate::connector::{AttemptResult, Connector};
use crate::target::TrialTarget;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use wimap_core::{Bssid, Credential};

/// Connector that accepts exactly the configured credential per BSSID.
#[derive(Debug, Default)]
pub struct SimulatedConnector {
    secrets: HashMap<Bssid, Credential>,
    latency: Duration,
    attempts: Mutex<Vec<(Bssid, Credential)>>,
    released: Mutex<Vec<Bssid>>,
}

impl SimulatedConnector {
    /// Connector that rejects everything until secrets are added.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `credential` for `bssid`.
    #[must_use]
    pub fn with_secret(mut self, bssid: Bssid, credential: Credential) -> Self {
        self.secrets.insert(bssid, credential);
        self
    }

    /// Time each attempt takes before answering.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Attempts made so far, in order.
    #[must_use]
    pub fn attempts(&self) -> Vec<(Bssid, Credential)> {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of attempts made so far.
    #[must_use]
    pub fn attempt_count(&self) -> usize {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Targets released so far.
    #[must_use]
    pub fn released(&self) -> Vec<Bssid> {
        self.released
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Connector for SimulatedConnector {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn attempt(
        &self,
        target: &TrialTarget,
        credential: &Credential,
        _timeout: Duration,
    ) -> AttemptResult {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((target.bssid.clone(), credential.clone()));

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if self.secrets.get(&target.bssid) == Some(credential) {
            AttemptResult::Accepted
        } else {
            AttemptResult::Rejected
        }
    }

    async fn release(&self, target: &TrialTarget) {
        self.released
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(target.bssid.clone());
    }
}
