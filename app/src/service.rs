//! The service facade.
//!
//! [`WifiService`] wires the reconciliation engine, the scan scheduler and
//! the credential-trial engine together and exposes their observables.

use crate::error::{Result, ServiceError};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info};
use wimap_connect::{
    ConnectionEvent, Connector, TrialEngine, TrialOutcome, TrialSettings, TrialTarget,
};
use wimap_core::{AppConfig, Bssid, Credential};
use wimap_scanner::{
    CatalogSnapshot, LocationProvider, NetworkRecord, ReconciliationEngine, ScanSource,
};
use wimap_scheduler::{ScanScheduler, ScanState, ScanStatus};
use wimap_vault::CredentialStore;

/// Discovery and connection, behind one handle.
#[derive(Debug)]
pub struct WifiService {
    engine: Arc<ReconciliationEngine>,
    scheduler: ScanScheduler,
    trials: Arc<TrialEngine>,
}

impl WifiService {
    /// Assemble the service from its ports. Scanning starts idle.
    #[must_use]
    pub fn new(
        config: &AppConfig,
        source: Arc<dyn ScanSource>,
        location: Arc<dyn LocationProvider>,
        connector: Arc<dyn Connector>,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        let engine = Arc::new(ReconciliationEngine::new());
        let scheduler = ScanScheduler::new(
            Arc::clone(&engine),
            source,
            location,
            config.scanning.clone(),
        );
        let trials = Arc::new(TrialEngine::new(
            connector,
            store,
            TrialSettings::from(&config.connection),
        ));

        Self {
            engine,
            scheduler,
            trials,
        }
    }

    /// Catalog snapshots, one per completed scan and on clear.
    #[must_use]
    pub fn catalog(&self) -> watch::Receiver<CatalogSnapshot> {
        self.engine.subscribe()
    }

    /// Idle/Scanning state.
    #[must_use]
    pub fn scan_state(&self) -> watch::Receiver<ScanState> {
        self.scheduler.subscribe_state()
    }

    /// Per-cycle scan statuses.
    #[must_use]
    pub fn scan_status(&self) -> broadcast::Receiver<ScanStatus> {
        self.scheduler.subscribe_status()
    }

    /// Trial progress and results.
    #[must_use]
    pub fn connection_events(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.trials.subscribe()
    }

    /// Begin periodic scanning. Returns `false` if already scanning.
    pub fn start_scanning(&self) -> bool {
        self.scheduler.start()
    }

    /// Stop periodic scanning. Returns `false` if already idle.
    pub fn stop_scanning(&self) -> bool {
        self.scheduler.stop()
    }

    /// True while the scheduler runs.
    #[must_use]
    pub fn is_scanning(&self) -> bool {
        self.scheduler.is_scanning()
    }

    /// Follow the signal of a catalogued network on the locator interval.
    /// Replaces any network already being followed.
    pub fn start_locator(&self, bssid: &Bssid) -> Result<()> {
        if self.engine.record(bssid).is_none() {
            return Err(ServiceError::UnknownNetwork(bssid.clone()));
        }
        self.scheduler.start_locator(bssid.clone());
        Ok(())
    }

    /// Stop following. Returns `false` if nothing was followed.
    pub fn stop_locator(&self) -> bool {
        self.scheduler.stop_locator()
    }

    /// The network being followed, if any.
    #[must_use]
    pub fn locator_target(&self) -> Option<Bssid> {
        self.scheduler.locator_target()
    }

    /// Live signal of the followed network in dBm.
    #[must_use]
    pub fn locator_rssi(&self) -> watch::Receiver<Option<i32>> {
        self.scheduler.subscribe_locator()
    }

    /// Forget every catalogued network.
    pub fn clear_catalog(&self) {
        info!("Clearing network catalog");
        self.engine.clear();
    }

    /// Catalogued record for `bssid`, if any.
    #[must_use]
    pub fn network(&self, bssid: &Bssid) -> Option<NetworkRecord> {
        self.engine.record(bssid)
    }

    /// Join `bssid` trying stored credentials, then the candidate pool.
    ///
    /// `Ok(None)` means a trial for the network is already running.
    pub async fn connect(&self, bssid: &Bssid) -> Result<Option<TrialOutcome>> {
        let target = self.target(bssid)?;
        let candidates = self.trials.candidates_for(bssid).await;
        debug!("{} candidates for {}", candidates.len(), target);
        Ok(self.run_trial(target, candidates, self.trials.settings()).await)
    }

    /// Like [`Self::connect`], with retry and timeout limits for this trial.
    pub async fn connect_with(
        &self,
        bssid: &Bssid,
        settings: TrialSettings,
    ) -> Result<Option<TrialOutcome>> {
        let target = self.target(bssid)?;
        let candidates = self.trials.candidates_for(bssid).await;
        Ok(self.run_trial(target, candidates, settings).await)
    }

    /// Join `bssid` with a credential entered by the user.
    pub async fn connect_manual(
        &self,
        bssid: &Bssid,
        credential: Credential,
    ) -> Result<Option<TrialOutcome>> {
        let target = self.target(bssid)?;
        Ok(self
            .run_trial(target, vec![credential], self.trials.settings())
            .await)
    }

    /// Cancel the running trial for `bssid`. Returns `false` if none runs.
    pub fn cancel_connect(&self, bssid: &Bssid) -> bool {
        self.trials.cancel(bssid)
    }

    /// The trial engine, for candidate pool management.
    #[must_use]
    pub fn trials(&self) -> &Arc<TrialEngine> {
        &self.trials
    }

    fn target(&self, bssid: &Bssid) -> Result<TrialTarget> {
        let record = self
            .engine
            .record(bssid)
            .ok_or_else(|| ServiceError::UnknownNetwork(bssid.clone()))?;
        Ok(TrialTarget::new(
            record.bssid,
            record.ssid,
            record.rssi,
            record.security,
        ))
    }

    async fn run_trial(
        &self,
        target: TrialTarget,
        candidates: Vec<Credential>,
        settings: TrialSettings,
    ) -> Option<TrialOutcome> {
        let outcome = self
            .trials
            .connect_with(target.clone(), candidates, settings)
            .await?;
        if let TrialOutcome::Connected { credential, .. } = &outcome {
            self.engine
                .remember_credential(&target.bssid, credential.clone());
        }
        Some(outcome)
    }
}
