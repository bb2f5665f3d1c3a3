//! Snapshot reconciliation.
//!
//! Turns noisy scan snapshots into a stable catalog in three steps:
//!
//! 1. [`dedup_snapshot`] picks one winner per BSSID inside a snapshot.
//! 2. [`merge_record`] folds each winner into the existing catalog entry.
//! 3. [`Catalog::reconcile`] reports the snapshot's BSSIDs, strongest first.
//!
//! Everything here is synchronous and lock-free; [`crate::ReconciliationEngine`]
//! adds the locking and publication.

use crate::observation::{NetworkObservation, NetworkRecord};
use std::collections::HashMap;
use std::time::Duration;
use wimap_core::{Bssid, Credential, Timestamp};

/// Collapse duplicate BSSIDs within one snapshot.
///
/// A named observation beats a hidden one; otherwise the stronger signal
/// wins; a remaining tie keeps the first observation. The output keeps
/// BSSIDs in order of first appearance, so running this on its own output
/// changes nothing.
#[must_use]
pub fn dedup_snapshot(snapshot: Vec<NetworkObservation>) -> Vec<NetworkObservation> {
    let mut winners: Vec<NetworkObservation> = Vec::with_capacity(snapshot.len());
    let mut index: HashMap<Bssid, usize> = HashMap::with_capacity(snapshot.len());

    for obs in snapshot {
        match index.get(&obs.bssid) {
            Some(&slot) => {
                if beats(&obs, &winners[slot]) {
                    winners[slot] = obs;
                }
            }
            None => {
                index.insert(obs.bssid.clone(), winners.len());
                winners.push(obs);
            }
        }
    }

    winners
}

fn beats(challenger: &NetworkObservation, holder: &NetworkObservation) -> bool {
    match (challenger.is_hidden(), holder.is_hidden()) {
        (false, true) => true,
        (true, false) => false,
        _ => challenger.rssi > holder.rssi,
    }
}

/// Fold a snapshot winner into the existing record for its BSSID.
///
/// The remembered credential always survives. Name handling:
///
/// - hidden record, named observation: the observation replaces everything.
/// - named record, hidden observation: name, channel and security stay;
///   signal and timestamp update; location updates only if one was observed.
/// - otherwise: signal, channel, security, timestamp and name update; the old
///   location survives only when the old signal was strictly stronger and the
///   observation carries no location.
#[must_use]
pub fn merge_record(existing: NetworkRecord, obs: NetworkObservation) -> NetworkRecord {
    let mut merged = existing;

    match (merged.is_hidden(), obs.is_hidden()) {
        (true, false) => {
            merged.ssid = obs.ssid;
            merged.channel = obs.channel;
            merged.security = obs.security;
            merged.location = obs.location;
        }
        (false, true) => {
            if obs.location.is_some() {
                merged.location = obs.location;
            }
        }
        _ => {
            let keep_location = merged.rssi > obs.rssi && obs.location.is_none();
            if !keep_location {
                merged.location = obs.location;
            }
            merged.ssid = obs.ssid;
            merged.channel = obs.channel;
            merged.security = obs.security;
        }
    }

    merged.rssi = obs.rssi;
    merged.last_seen = obs.timestamp;

    if obs.rssi > merged.peak_rssi {
        merged.peak_rssi = obs.rssi;
        if obs.location.is_some() {
            merged.peak_location = obs.location;
        }
    }

    merged
}

/// The backing catalog: at most one record per BSSID.
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    records: HashMap<Bssid, NetworkRecord>,
}

impl Catalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one observation, creating the record if needed.
    pub fn merge(&mut self, obs: NetworkObservation) -> &NetworkRecord {
        let bssid = obs.bssid.clone();
        let merged = match self.records.remove(&bssid) {
            Some(existing) => merge_record(existing, obs),
            None => NetworkRecord::from_observation(obs),
        };
        self.records.entry(bssid).or_insert(merged)
    }

    /// Run a full reconciliation pass and return the report for this snapshot.
    ///
    /// The report holds exactly the snapshot's BSSIDs, sorted by signal
    /// strength descending. Ties keep first-appearance order. Records missing
    /// from the snapshot stay in the catalog but are not reported.
    pub fn reconcile(&mut self, snapshot: Vec<NetworkObservation>) -> Vec<NetworkRecord> {
        let winners = dedup_snapshot(snapshot);
        let mut report: Vec<NetworkRecord> = winners
            .into_iter()
            .map(|obs| self.merge(obs).clone())
            .collect();

        // `sort_by` is stable, which preserves first-appearance order on ties
        report.sort_by(|a, b| b.rssi.cmp(&a.rssi));
        report
    }

    /// Look up a record.
    #[must_use]
    pub fn get(&self, bssid: &Bssid) -> Option<&NetworkRecord> {
        self.records.get(bssid)
    }

    /// Number of records, reported or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the catalog holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Attach a working credential to a record.
    ///
    /// Returns `false` if the BSSID is not catalogued.
    pub fn remember_credential(&mut self, bssid: &Bssid, credential: Credential) -> bool {
        match self.records.get_mut(bssid) {
            Some(record) => {
                record.credential = Some(credential);
                true
            }
            None => false,
        }
    }

    /// Remove records last seen more than `max_age` before `now`.
    ///
    /// Returns the number of records removed.
    pub fn prune_stale(&mut self, max_age: Duration, now: Timestamp) -> usize {
        let before = self.records.len();
        self.records.retain(|_, record| record.last_seen.age_at(now) <= max_age);
        before - self.records.len()
    }
}
