//! Lock-guarded catalog with a published report.
//!
//! [`ReconciliationEngine`] owns the [`Catalog`] behind a mutex and publishes
//! every report through a `watch` channel. Publication happens while the
//! lock is held, so observers never see reports out of order.

use crate::observation::{NetworkObservation, NetworkRecord, RawObservation};
use crate::reconcile::Catalog;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use wimap_core::{Bssid, Credential, GeoPoint, Timestamp};

/// Snapshot of the reported networks, strongest first.
pub type CatalogSnapshot = Arc<[NetworkRecord]>;

/// Shared owner of the network catalog.
///
/// Cheap to share behind an `Arc`; every mutation is serialised.
#[derive(Debug)]
pub struct ReconciliationEngine {
    catalog: Mutex<Catalog>,
    report: watch::Sender<CatalogSnapshot>,
}

impl ReconciliationEngine {
    /// Create an engine with an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        let (report, _) = watch::channel(CatalogSnapshot::from(Vec::new()));
        Self {
            catalog: Mutex::new(Catalog::new()),
            report,
        }
    }

    /// Subscribe to reports. Drop the receiver to unsubscribe.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CatalogSnapshot> {
        self.report.subscribe()
    }

    /// The most recently published report.
    #[must_use]
    pub fn current(&self) -> CatalogSnapshot {
        self.report.borrow().clone()
    }

    /// Validate raw sightings and reconcile them as one snapshot.
    ///
    /// Sightings without a usable BSSID are dropped. `location` is attached
    /// to sightings that carry none.
    pub fn ingest_raw(
        &self,
        raw: Vec<RawObservation>,
        location: Option<GeoPoint>,
    ) -> CatalogSnapshot {
        let timestamp = Timestamp::now();
        let total = raw.len();

        let snapshot: Vec<NetworkObservation> = raw
            .into_iter()
            .filter_map(|sighting| {
                let bssid = sighting.bssid.clone();
                let obs = NetworkObservation::from_raw(sighting, location, timestamp);
                if obs.is_none() {
                    tracing::trace!("Dropping observation with unusable BSSID {:?}", bssid);
                }
                obs
            })
            .collect();

        if snapshot.len() < total {
            tracing::debug!(
                "Dropped {} of {} observations with unusable BSSIDs",
                total - snapshot.len(),
                total
            );
        }

        self.ingest(snapshot)
    }

    /// Reconcile one snapshot and publish the resulting report.
    pub fn ingest(&self, snapshot: Vec<NetworkObservation>) -> CatalogSnapshot {
        let mut catalog = self.lock();
        let report: CatalogSnapshot = catalog.reconcile(snapshot).into();
        tracing::debug!(
            "Reconciled snapshot: {} reported, {} catalogued",
            report.len(),
            catalog.len()
        );
        self.report.send_replace(report.clone());
        report
    }

    /// Empty the catalog and publish an empty report, atomically.
    pub fn clear(&self) {
        let mut catalog = self.lock();
        catalog.clear();
        self.report.send_replace(CatalogSnapshot::from(Vec::new()));
        tracing::info!("Network catalog cleared");
    }

    /// Remember a working credential for a catalogued network.
    ///
    /// If the network is in the current report, the report is republished
    /// with the credential attached. Returns `false` for unknown BSSIDs.
    pub fn remember_credential(&self, bssid: &Bssid, credential: Credential) -> bool {
        let mut catalog = self.lock();
        if !catalog.remember_credential(bssid, credential.clone()) {
            return false;
        }

        self.report.send_if_modified(|report| {
            let Some(pos) = report.iter().position(|r| &r.bssid == bssid) else {
                return false;
            };
            let mut updated = report.to_vec();
            updated[pos].credential = Some(credential);
            *report = updated.into();
            true
        });
        true
    }

    /// Forget networks not seen within `max_age`.
    pub fn prune_stale(&self, max_age: Duration) -> usize {
        let removed = self.lock().prune_stale(max_age, Timestamp::now());
        if removed > 0 {
            tracing::debug!("Pruned {} stale networks", removed);
        }
        removed
    }

    /// Copy of a catalogued record, reported or not.
    #[must_use]
    pub fn record(&self, bssid: &Bssid) -> Option<NetworkRecord> {
        self.lock().get(bssid).cloned()
    }

    /// Number of catalogued records.
    #[must_use]
    pub fn catalog_len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, Catalog> {
        self.catalog.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self::new()
    }
}
