//! Credential-trial engine.
//!
//! Drives a [`TrialMachine`] against a [`Connector`], one trial per access
//! point at a time. Every wait (backoff, attempt) is raced against the
//! trial's cancellation token. Working credentials are written to the
//! [`CredentialStore`] and added to the shared candidate pool.

use crate::connector::{AttemptResult, Connector};
use crate::machine::{TrialMachine, TrialStep};
use crate::outcome::{ConnectionEvent, TrialOutcome};
use crate::settings::TrialSettings;
use crate::target::TrialTarget;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use wimap_core::{Bssid, Credential};
use wimap_vault::CredentialStore;

const EVENT_CAPACITY: usize = 256;

/// Runs credential searches.
pub struct TrialEngine {
    connector: Arc<dyn Connector>,
    store: Arc<dyn CredentialStore>,
    settings: TrialSettings,
    active: Mutex<HashMap<Bssid, CancellationToken>>,
    pool: Mutex<Vec<Credential>>,
    events: broadcast::Sender<ConnectionEvent>,
}

/// Clears the in-progress marker when the trial ends or its future is dropped.
struct ActiveTrial<'a> {
    active: &'a Mutex<HashMap<Bssid, CancellationToken>>,
    bssid: Bssid,
}

impl Drop for ActiveTrial<'_> {
    fn drop(&mut self) {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.bssid);
    }
}

impl TrialEngine {
    /// Create an engine with an empty candidate pool.
    #[must_use]
    pub fn new(
        connector: Arc<dyn Connector>,
        store: Arc<dyn CredentialStore>,
        settings: TrialSettings,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            connector,
            store,
            settings,
            active: Mutex::new(HashMap::new()),
            pool: Mutex::new(Vec::new()),
            events,
        }
    }

    /// Observe progress and completion events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events.subscribe()
    }

    /// Limits applied to every trial.
    #[must_use]
    pub fn settings(&self) -> TrialSettings {
        self.settings
    }

    /// Try `candidates` in order against `target`.
    ///
    /// Returns `None` without doing anything when a trial for the same
    /// BSSID is already running. Blank and repeated candidates are skipped.
    pub async fn connect(
        &self,
        target: TrialTarget,
        candidates: Vec<Credential>,
    ) -> Option<TrialOutcome> {
        self.connect_with(target, candidates, self.settings).await
    }

    /// Like [`Self::connect`], with limits for this trial only.
    pub async fn connect_with(
        &self,
        target: TrialTarget,
        candidates: Vec<Credential>,
        settings: TrialSettings,
    ) -> Option<TrialOutcome> {
        let (guard, cancel) = self.begin_trial(&target.bssid)?;
        let candidates = dedup_candidates(candidates);

        info!(
            "Starting credential trial for {} with {} candidates",
            target,
            candidates.len()
        );

        let mut machine = TrialMachine::new(candidates, settings);
        let outcome = self
            .drive(&target, &mut machine, settings.attempt_timeout, &cancel)
            .await;

        if let TrialOutcome::Connected { credential, .. } = &outcome {
            self.persist(&target.bssid, credential).await;
        }

        info!("Credential trial for {} finished: {}", target, outcome);
        drop(guard);
        self.emit(ConnectionEvent::Finished {
            bssid: target.bssid.clone(),
            outcome: outcome.clone(),
        });
        Some(outcome)
    }

    /// One-candidate trial with a credential entered by the user.
    pub async fn connect_manual(
        &self,
        target: TrialTarget,
        credential: Credential,
    ) -> Option<TrialOutcome> {
        self.connect(target, vec![credential]).await
    }

    /// Cancel the running trial for `bssid`. Returns `false` if none runs.
    pub fn cancel(&self, bssid: &Bssid) -> bool {
        match self.lock_active().get(bssid) {
            Some(token) => {
                info!("Cancelling credential trial for {}", bssid);
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// True while a trial for `bssid` runs.
    #[must_use]
    pub fn is_active(&self, bssid: &Bssid) -> bool {
        self.lock_active().contains_key(bssid)
    }

    /// Access points with a running trial.
    #[must_use]
    pub fn active(&self) -> Vec<Bssid> {
        let mut active: Vec<_> = self.lock_active().keys().cloned().collect();
        active.sort();
        active
    }

    /// Candidates for `bssid`: stored credentials (most recent first), then
    /// the pool, without repeats. A failing store falls back to the pool.
    pub async fn candidates_for(&self, bssid: &Bssid) -> Vec<Credential> {
        let mut candidates = match self.store.get(bssid).await {
            Ok(stored) => stored,
            Err(e) => {
                warn!("Failed to read stored credentials for {}: {}", bssid, e);
                Vec::new()
            }
        };
        candidates.extend(self.candidates());
        dedup_candidates(candidates)
    }

    /// Add a credential to the pool. Returns `false` for blanks and repeats.
    pub fn add_candidate(&self, credential: Credential) -> bool {
        if credential.is_blank() {
            return false;
        }
        let mut pool = self.lock_pool();
        if pool.contains(&credential) {
            return false;
        }
        pool.push(credential);
        true
    }

    /// Remove a credential from the pool.
    pub fn remove_candidate(&self, credential: &Credential) -> bool {
        let mut pool = self.lock_pool();
        let before = pool.len();
        pool.retain(|existing| existing != credential);
        pool.len() != before
    }

    /// Replace the pool.
    pub fn set_candidates(&self, candidates: Vec<Credential>) {
        *self.lock_pool() = dedup_candidates(candidates);
    }

    /// The pool, in insertion order.
    #[must_use]
    pub fn candidates(&self) -> Vec<Credential> {
        self.lock_pool().clone()
    }

    fn begin_trial(&self, bssid: &Bssid) -> Option<(ActiveTrial<'_>, CancellationToken)> {
        let mut active = self.lock_active();
        if active.contains_key(bssid) {
            debug!("Ignoring connect for {}: trial already running", bssid);
            return None;
        }
        let cancel = CancellationToken::new();
        active.insert(bssid.clone(), cancel.clone());
        Some((
            ActiveTrial {
                active: &self.active,
                bssid: bssid.clone(),
            },
            cancel,
        ))
    }

    async fn drive(
        &self,
        target: &TrialTarget,
        machine: &mut TrialMachine,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> TrialOutcome {
        let mut step = machine.begin(target);

        loop {
            let plan = match step {
                TrialStep::Done(outcome) => return outcome,
                TrialStep::Attempt(plan) => plan,
            };

            if let Some(notice) = plan.retry_notice() {
                self.progress(&target.bssid, notice);
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => return self.abort(target, machine).await,
                    () = tokio::time::sleep(plan.delay) => {}
                }
            }

            self.progress(&target.bssid, plan.progress_message());

            let result = tokio::select! {
                biased;
                () = cancel.cancelled() => return self.abort(target, machine).await,
                result = tokio::time::timeout(
                    timeout,
                    self.connector.attempt(target, &plan.credential, timeout),
                ) => result.unwrap_or(AttemptResult::TimedOut),
            };

            debug!(
                "Attempt {}/{} on {} via {}: {}",
                machine.attempts() + 1,
                machine.max_attempts(),
                target,
                self.connector.name(),
                result
            );
            step = machine.record(result);
        }
    }

    async fn abort(&self, target: &TrialTarget, machine: &mut TrialMachine) -> TrialOutcome {
        self.connector.release(target).await;
        machine.cancel()
    }

    async fn persist(&self, bssid: &Bssid, credential: &Credential) {
        if let Err(e) = self.store.put(bssid, credential).await {
            warn!("Failed to store working credential for {}: {}", bssid, e);
        }
        if self.add_candidate(credential.clone()) {
            debug!("Added working credential to the candidate pool");
        }
    }

    fn progress(&self, bssid: &Bssid, message: String) {
        debug!("{}: {}", bssid, message);
        self.emit(ConnectionEvent::Progress {
            bssid: bssid.clone(),
            message,
        });
    }

    fn emit(&self, event: ConnectionEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn lock_active(&self) -> MutexGuard<'_, HashMap<Bssid, CancellationToken>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_pool(&self) -> MutexGuard<'_, Vec<Credential>> {
        self.pool.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for TrialEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrialEngine")
            .field("connector", &self.connector.name())
            .field("settings", &self.settings)
            .field("active", &self.active())
            .finish_non_exhaustive()
    }
}

fn dedup_candidates(candidates: Vec<Credential>) -> Vec<Credential> {
    let mut unique: Vec<Credential> = Vec::with_capacity(candidates.len());
    for credential in candidates {
        if !credential.is_blank() && !unique.contains(&credential) {
            unique.push(credential);
        }
    }
    unique
}
