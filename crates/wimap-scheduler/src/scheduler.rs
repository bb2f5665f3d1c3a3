//! Scan scheduling loops.
//!
//! [`ScanScheduler`] owns at most one catalog task and at most one locator
//! task. The catalog task requests a scan immediately, then sleeps for the
//! configured interval between cycles. The locator task tracks the signal of
//! a single access point on a much shorter interval and leaves the catalog
//! alone. Both loops take the same scan permit for the whole scan wait, so a
//! new request is never issued while another is outstanding, including a
//! request from a task started right after `stop`. Every suspension point is
//! raced against a cancellation token so stopping takes effect without
//! waiting for the radio.

use crate::status::{ScanState, ScanStatus};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use wimap_core::{Bssid, ScanningConfig};
use wimap_scanner::{
    LocationProvider, RawObservation, Readiness, ReconciliationEngine, ScanError, ScanSource,
};

const STATUS_CAPACITY: usize = 64;

/// Periodic scan driver feeding a [`ReconciliationEngine`].
pub struct ScanScheduler {
    shared: Arc<Shared>,
    running: Mutex<Option<Running>>,
    locator: Mutex<Option<Locating>>,
}

struct Shared {
    engine: Arc<ReconciliationEngine>,
    source: Arc<dyn ScanSource>,
    location: Arc<dyn LocationProvider>,
    config: ScanningConfig,
    scan_permit: tokio::sync::Mutex<()>,
    state: watch::Sender<ScanState>,
    status: broadcast::Sender<ScanStatus>,
    locator_rssi: watch::Sender<Option<i32>>,
}

struct Running {
    cancel: CancellationToken,
    _task: JoinHandle<()>,
}

struct Locating {
    target: Bssid,
    running: Running,
}

impl ScanScheduler {
    /// Create an idle scheduler.
    #[must_use]
    pub fn new(
        engine: Arc<ReconciliationEngine>,
        source: Arc<dyn ScanSource>,
        location: Arc<dyn LocationProvider>,
        config: ScanningConfig,
    ) -> Self {
        let (state, _) = watch::channel(ScanState::Idle);
        let (status, _) = broadcast::channel(STATUS_CAPACITY);
        let (locator_rssi, _) = watch::channel(None);
        Self {
            shared: Arc::new(Shared {
                engine,
                source,
                location,
                config,
                scan_permit: tokio::sync::Mutex::new(()),
                state,
                status,
                locator_rssi,
            }),
            running: Mutex::new(None),
            locator: Mutex::new(None),
        }
    }

    /// Start scanning. Returns `false` if already scanning.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> bool {
        let mut running = self.lock_running();
        if running.is_some() {
            debug!("Scan scheduler already running");
            return false;
        }

        let cancel = CancellationToken::new();
        let task = tokio::spawn(run(Arc::clone(&self.shared), cancel.clone()));
        *running = Some(Running {
            cancel,
            _task: task,
        });
        self.shared.state.send_replace(ScanState::Scanning);
        info!(
            "Scanning started with {} source every {:?}",
            self.shared.source.name(),
            self.shared.config.interval()
        );
        true
    }

    /// Stop scanning, abandoning any in-flight scan wait. Returns `false` if
    /// already idle. The catalog is left untouched.
    pub fn stop(&self) -> bool {
        let Some(running) = self.lock_running().take() else {
            debug!("Scan scheduler already idle");
            return false;
        };
        running.cancel.cancel();
        self.shared.state.send_replace(ScanState::Idle);
        info!("Scanning stopped");
        true
    }

    /// True while the scheduler is running.
    #[must_use]
    pub fn is_scanning(&self) -> bool {
        *self.shared.state.borrow() == ScanState::Scanning
    }

    /// Track the signal of `target` on the locator interval.
    ///
    /// Replaces any target already being tracked. The reading starts from
    /// the catalogued signal, if any, and is updated after every scan that
    /// sees the target. Must be called from within a tokio runtime.
    pub fn start_locator(&self, target: Bssid) {
        let mut locator = self.lock_locator();
        if let Some(previous) = locator.take() {
            debug!("Locator retargeted from {}", previous.target);
            previous.running.cancel.cancel();
        }

        let initial = self.shared.engine.record(&target).map(|record| record.rssi);
        self.shared.locator_rssi.send_replace(initial);

        let cancel = CancellationToken::new();
        let task = tokio::spawn(locate(
            Arc::clone(&self.shared),
            target.clone(),
            cancel.clone(),
        ));
        info!(
            "Locator tracking {} every {:?}",
            target,
            self.shared.config.locator_interval()
        );
        *locator = Some(Locating {
            target,
            running: Running {
                cancel,
                _task: task,
            },
        });
    }

    /// Stop tracking. Returns `false` if no target was tracked.
    pub fn stop_locator(&self) -> bool {
        let Some(locating) = self.lock_locator().take() else {
            return false;
        };
        locating.running.cancel.cancel();
        self.shared.locator_rssi.send_replace(None);
        info!("Locator stopped tracking {}", locating.target);
        true
    }

    /// The access point being tracked, if any.
    #[must_use]
    pub fn locator_target(&self) -> Option<Bssid> {
        self.lock_locator()
            .as_ref()
            .map(|locating| locating.target.clone())
    }

    /// Observe the scanning state.
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<ScanState> {
        self.shared.state.subscribe()
    }

    /// Observe per-cycle statuses.
    #[must_use]
    pub fn subscribe_status(&self) -> broadcast::Receiver<ScanStatus> {
        self.shared.status.subscribe()
    }

    /// Observe the tracked target's latest signal in dBm. `None` while no
    /// target is tracked or before it has been seen.
    #[must_use]
    pub fn subscribe_locator(&self) -> watch::Receiver<Option<i32>> {
        self.shared.locator_rssi.subscribe()
    }

    /// The engine this scheduler feeds.
    #[must_use]
    pub fn engine(&self) -> &Arc<ReconciliationEngine> {
        &self.shared.engine
    }

    fn lock_running(&self) -> MutexGuard<'_, Option<Running>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_locator(&self) -> MutexGuard<'_, Option<Locating>> {
        self.locator.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ScanScheduler {
    fn drop(&mut self) {
        if let Some(running) = self.lock_running().take() {
            running.cancel.cancel();
        }
        if let Some(locating) = self.lock_locator().take() {
            locating.running.cancel.cancel();
        }
    }
}

impl std::fmt::Debug for ScanScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanScheduler")
            .field("source", &self.shared.source.name())
            .field("state", &*self.shared.state.borrow())
            .field("locator_target", &self.locator_target())
            .field("config", &self.shared.config)
            .finish_non_exhaustive()
    }
}

async fn run(shared: Arc<Shared>, cancel: CancellationToken) {
    let interval = shared.config.interval();
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = shared.cycle(&cancel) => {}
        }
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(interval) => {}
        }
    }
    debug!("Scan loop exited");
}

async fn locate(shared: Arc<Shared>, target: Bssid, cancel: CancellationToken) {
    let interval = shared.config.locator_interval();
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = shared.locate_once(&target, &cancel) => {}
        }
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(interval) => {}
        }
    }
    debug!("Locator loop for {} exited", target);
}

impl Shared {
    async fn cycle(&self, cancel: &CancellationToken) {
        let Some(raw) = self.scan_snapshot().await else {
            return;
        };

        // Stopped while the scan was completing; discard the snapshot.
        if cancel.is_cancelled() {
            return;
        }

        let location = self.location.current().await;
        let report = self.engine.ingest_raw(raw, location);

        if let Some(max_age) = self.config.stale_after() {
            let pruned = self.engine.prune_stale(max_age);
            if pruned > 0 {
                debug!("Pruned {} stale networks", pruned);
            }
        }

        self.publish(ScanStatus::Completed {
            reported: report.len(),
            catalogued: self.engine.catalog_len(),
            timestamp: wimap_core::Timestamp::now(),
        });
    }

    async fn locate_once(&self, target: &Bssid, cancel: &CancellationToken) {
        let Some(raw) = self.scan_snapshot().await else {
            return;
        };
        if cancel.is_cancelled() {
            return;
        }

        match strongest_sighting(&raw, target) {
            Some(rssi) => {
                trace!("Locator reading for {}: {} dBm", target, rssi);
                self.locator_rssi.send_replace(Some(rssi));
            }
            None => debug!("Locator target {} not visible in scan", target),
        }
    }

    /// One readiness-gated, permit-holding, time-bounded scan. Failures are
    /// published and yield `None`.
    async fn scan_snapshot(&self) -> Option<Vec<RawObservation>> {
        let readiness = self.source.readiness().await;
        if readiness != Readiness::Ready {
            warn!("Skipping scan: {}", readiness);
            self.publish(ScanStatus::unavailable(readiness));
            return None;
        }

        let _permit = self.scan_permit.lock().await;
        let timeout = self.config.scan_timeout();
        let result = tokio::time::timeout(timeout, self.source.scan())
            .await
            .unwrap_or(Err(ScanError::Timeout(timeout)));

        match result {
            Ok(raw) => Some(raw),
            Err(e) => {
                warn!("Scan failed, keeping catalog: {}", e);
                self.publish(ScanStatus::failed(&e));
                None
            }
        }
    }

    fn publish(&self, status: ScanStatus) {
        // No subscribers is fine
        let _ = self.status.send(status);
    }
}

fn strongest_sighting(raw: &[RawObservation], target: &Bssid) -> Option<i32> {
    raw.iter()
        .filter(|obs| {
            obs.bssid
                .as_deref()
                .and_then(|mac| Bssid::new(mac).ok())
                .is_some_and(|bssid| &bssid == target)
        })
        .map(|obs| obs.rssi)
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wimap_scanner::{NoLocation, ReplayScanSource, ReplayStep};

    fn sighting(mac: &str, ssid: &str, rssi: i32) -> RawObservation {
        RawObservation {
            bssid: Some(mac.to_string()),
            ssid: ssid.to_string(),
            rssi,
            frequency_mhz: 2437,
            capabilities: "[WPA2-PSK-CCMP][ESS]".to_string(),
            location: None,
        }
    }

    fn scheduler(source: Arc<ReplayScanSource>) -> ScanScheduler {
        ScanScheduler::new(
            Arc::new(ReconciliationEngine::new()),
            source,
            Arc::new(NoLocation),
            ScanningConfig::default(),
        )
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_scans_immediately() {
        let source = Arc::new(ReplayScanSource::from_snapshots(vec![vec![sighting(
            "aa:bb:cc:dd:ee:01",
            "Home",
            -50,
        )]]));
        let scheduler = scheduler(Arc::clone(&source));

        assert!(scheduler.start());
        settle().await;

        assert_eq!(source.scan_count(), 1);
        assert_eq!(scheduler.engine().current().len(), 1);
        assert!(scheduler.is_scanning());
    }

    #[tokio::test(start_paused = true)]
    async fn test_redundant_start_and_stop_are_noops() {
        let source = Arc::new(ReplayScanSource::new(Vec::new()));
        let scheduler = scheduler(Arc::clone(&source));

        assert!(!scheduler.stop());
        assert!(scheduler.start());
        assert!(!scheduler.start());
        settle().await;
        assert_eq!(source.scan_count(), 1);

        assert!(scheduler.stop());
        assert!(!scheduler.stop());
        assert!(!scheduler.is_scanning());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_publishes_status() {
        let source = Arc::new(ReplayScanSource::new(vec![ReplayStep::Failure {
            reason: "device busy".to_string(),
        }]));
        let scheduler = scheduler(Arc::clone(&source));
        let mut status = scheduler.subscribe_status();

        scheduler.start();
        let event = status.recv().await.expect("status event");

        assert_eq!(event.message(), "Scan failed: Scan rejected: device busy");
        assert!(scheduler.is_scanning());
    }

    #[test]
    fn test_strongest_sighting_matches_normalized_bssid() {
        let target = Bssid::new("aa:bb:cc:dd:ee:01").expect("valid bssid");
        let raw = vec![
            sighting("AA:BB:CC:DD:EE:01", "", -70),
            sighting("aa:bb:cc:dd:ee:02", "Other", -20),
            sighting("aa-bb-cc-dd-ee-01", "Home", -55),
            RawObservation {
                bssid: None,
                ..sighting("", "Ghost", -10)
            },
        ];

        assert_eq!(strongest_sighting(&raw, &target), Some(-55));
        assert_eq!(strongest_sighting(&raw[1..2], &target), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_locator_without_target() {
        let scheduler = scheduler(Arc::new(ReplayScanSource::new(Vec::new())));
        assert!(!scheduler.stop_locator());
        assert_eq!(scheduler.locator_target(), None);
        assert_eq!(*scheduler.subscribe_locator().borrow(), None);
    }
}
