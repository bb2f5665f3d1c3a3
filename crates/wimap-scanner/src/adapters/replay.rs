//! Scripted scan source for fixtures, demos and tests.
//!
//! Steps are served in order; once the script runs out the last step
//! repeats. A fixture file is a JSON array of steps:
//!
//! ```json
//! [
//!   { "kind": "snapshot", "observations": [
//!       { "bssid": "aa:bb:cc:dd:ee:01", "ssid": "Home", "rssi": -52,
//!         "frequency_mhz": 2437, "capabilities": "[WPA2-PSK-CCMP][ESS]" } ] },
//!   { "kind": "failure", "reason": "device busy" }
//! ]
//! ```

use crate::error::{Result, ScanError};
use crate::observation::RawObservation;
use crate::source::{Readiness, ScanSource};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// One scripted scan result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplayStep {
    /// The scan succeeds with these sightings
    Snapshot {
        /// Sightings returned by the scan
        observations: Vec<RawObservation>,
    },
    /// The scan is rejected
    Failure {
        /// Rejection reason
        reason: String,
    },
}

/// Scan source that replays a script.
#[derive(Debug)]
pub struct ReplayScanSource {
    steps: Vec<ReplayStep>,
    cursor: AtomicUsize,
    readiness: Mutex<Readiness>,
    latency: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ReplayScanSource {
    /// Replay the given steps.
    #[must_use]
    pub fn new(steps: Vec<ReplayStep>) -> Self {
        Self {
            steps,
            cursor: AtomicUsize::new(0),
            readiness: Mutex::new(Readiness::Ready),
            latency: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Replay successful snapshots only.
    #[must_use]
    pub fn from_snapshots(snapshots: Vec<Vec<RawObservation>>) -> Self {
        Self::new(
            snapshots
                .into_iter()
                .map(|observations| ReplayStep::Snapshot { observations })
                .collect(),
        )
    }

    /// Load a JSON fixture file.
    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(ScanError::FixtureIo)?;
        let steps: Vec<ReplayStep> = serde_json::from_str(&contents)?;
        tracing::info!("Loaded {} replay steps from {}", steps.len(), path.display());
        Ok(Self::new(steps))
    }

    /// Simulate scan duration.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Change what `readiness` reports.
    pub fn set_readiness(&self, readiness: Readiness) {
        *self.readiness.lock().unwrap_or_else(PoisonError::into_inner) = readiness;
    }

    /// Number of scans requested so far.
    #[must_use]
    pub fn scan_count(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }

    /// Highest number of scans that were ever in flight at once.
    #[must_use]
    pub fn max_concurrent_scans(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn step(&self, index: usize) -> Option<&ReplayStep> {
        self.steps.get(index).or_else(|| self.steps.last())
    }
}

/// Counts a scan as in flight until it completes or is abandoned.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize, max: &AtomicUsize) -> Self {
        let now = counter.fetch_add(1, Ordering::SeqCst) + 1;
        max.fetch_max(now, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ScanSource for ReplayScanSource {
    fn name(&self) -> &str {
        "replay"
    }

    async fn readiness(&self) -> Readiness {
        *self.readiness.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn scan(&self) -> Result<Vec<RawObservation>> {
        let index = self.cursor.fetch_add(1, Ordering::SeqCst);
        let _in_flight = InFlight::enter(&self.in_flight, &self.max_in_flight);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match self.step(index) {
            Some(ReplayStep::Snapshot { observations }) => Ok(observations.clone()),
            Some(ReplayStep::Failure { reason }) => Err(ScanError::Rejected {
                reason: reason.clone(),
            }),
            None => Ok(Vec::new()),
        }
    }
}
