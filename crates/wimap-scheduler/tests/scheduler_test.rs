//! Scheduler timing behaviour under a paused clock.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wimap_core::{Bssid, GeoPoint, ScanningConfig};
use wimap_scanner::{
    FixedLocation, NoLocation, RawObservation, Readiness, ReconciliationEngine, ReplayScanSource,
    ReplayStep, ScanSource,
};
use wimap_scheduler::{ScanScheduler, ScanState, ScanStatus};

fn sighting(mac: &str, ssid: &str, rssi: i32) -> RawObservation {
    RawObservation {
        bssid: Some(mac.to_string()),
        ssid: ssid.to_string(),
        rssi,
        frequency_mhz: 5180,
        capabilities: "[WPA2-PSK-CCMP][ESS]".to_string(),
        location: None,
    }
}

fn build(source: &Arc<ReplayScanSource>, config: ScanningConfig) -> ScanScheduler {
    ScanScheduler::new(
        Arc::new(ReconciliationEngine::new()),
        Arc::clone(source) as Arc<dyn wimap_scanner::ScanSource>,
        Arc::new(NoLocation),
        config,
    )
}

async fn advance(secs: u64) {
    tokio::time::sleep(Duration::from_secs(secs) + Duration::from_millis(1)).await;
}

#[tokio::test(start_paused = true)]
async fn test_scans_repeat_every_interval() {
    let source = Arc::new(ReplayScanSource::new(Vec::new()));
    let scheduler = build(&source, ScanningConfig::default());

    scheduler.start();
    advance(0).await;
    assert_eq!(source.scan_count(), 1);

    advance(10).await;
    assert_eq!(source.scan_count(), 2);

    advance(20).await;
    assert_eq!(source.scan_count(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_slow_scans_never_overlap() {
    let source = Arc::new(ReplayScanSource::new(Vec::new()).with_latency(Duration::from_secs(15)));
    let scheduler = build(&source, ScanningConfig::default());

    scheduler.start();
    advance(60).await;

    // Scans at 0-15, 25-40, 50-65
    assert_eq!(source.scan_count(), 3);
    assert_eq!(source.max_concurrent_scans(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stop_abandons_in_flight_scan() {
    let source = Arc::new(
        ReplayScanSource::from_snapshots(vec![vec![sighting("aa:bb:cc:dd:ee:01", "Late", -40)]])
            .with_latency(Duration::from_secs(20)),
    );
    let scheduler = build(&source, ScanningConfig::default());
    let state = scheduler.subscribe_state();

    scheduler.start();
    advance(1).await;
    assert_eq!(*state.borrow(), ScanState::Scanning);

    assert!(scheduler.stop());
    assert_eq!(*state.borrow(), ScanState::Idle);

    advance(60).await;
    assert_eq!(source.scan_count(), 1);
    assert!(scheduler.engine().current().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_scan_timeout_keeps_catalog() {
    let source = Arc::new(ReplayScanSource::new(vec![
        ReplayStep::Snapshot {
            observations: vec![sighting("aa:bb:cc:dd:ee:02", "Kept", -55)],
        },
    ]));
    let config = ScanningConfig {
        scan_timeout_secs: 5,
        ..ScanningConfig::default()
    };
    let scheduler = build(&source, config.clone());
    scheduler.start();
    advance(0).await;
    assert_eq!(scheduler.engine().current().len(), 1);
    scheduler.stop();

    // Same engine, slower radio
    let slow = Arc::new(ReplayScanSource::new(Vec::new()).with_latency(Duration::from_secs(30)));
    let slow_scheduler = ScanScheduler::new(
        Arc::clone(scheduler.engine()),
        slow,
        Arc::new(NoLocation),
        config,
    );
    let mut status = slow_scheduler.subscribe_status();
    slow_scheduler.start();

    let event = status.recv().await.expect("status event");
    assert!(matches!(event, ScanStatus::Failed { .. }));
    assert!(event.message().contains("did not complete"));
    assert_eq!(slow_scheduler.engine().current().len(), 1);
    assert_eq!(slow_scheduler.engine().catalog_len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_scanning_resumes_when_radio_returns() {
    let source = Arc::new(ReplayScanSource::from_snapshots(vec![vec![sighting(
        "aa:bb:cc:dd:ee:03",
        "Back",
        -60,
    )]]));
    source.set_readiness(Readiness::RadioDisabled);
    let scheduler = build(&source, ScanningConfig::default());
    let mut status = scheduler.subscribe_status();

    scheduler.start();
    let event = status.recv().await.expect("status event");
    assert!(matches!(
        event,
        ScanStatus::Unavailable {
            readiness: Readiness::RadioDisabled,
            ..
        }
    ));
    assert_eq!(event.message(), "WiFi is disabled, waiting for it to be enabled");
    assert_eq!(source.scan_count(), 0);
    assert!(scheduler.is_scanning());

    source.set_readiness(Readiness::Ready);
    let event = status.recv().await.expect("status event");
    assert!(event.is_success());
    assert_eq!(source.scan_count(), 1);
    assert_eq!(scheduler.engine().current()[0].ssid, "Back");
}

#[tokio::test(start_paused = true)]
async fn test_location_attached_once_per_scan() {
    let source = Arc::new(ReplayScanSource::from_snapshots(vec![vec![
        sighting("aa:bb:cc:dd:ee:04", "One", -50),
        RawObservation {
            location: Some(GeoPoint::new(9.0, 9.0)),
            ..sighting("aa:bb:cc:dd:ee:05", "Two", -60)
        },
    ]]));
    let scheduler = ScanScheduler::new(
        Arc::new(ReconciliationEngine::new()),
        Arc::clone(&source) as Arc<dyn wimap_scanner::ScanSource>,
        Arc::new(FixedLocation(GeoPoint::new(1.5, 2.5))),
        ScanningConfig::default(),
    );

    scheduler.start();
    advance(0).await;

    let report = scheduler.engine().current();
    assert_eq!(report[0].location, Some(GeoPoint::new(1.5, 2.5)));
    assert_eq!(report[1].location, Some(GeoPoint::new(9.0, 9.0)));
}

#[tokio::test(start_paused = true)]
async fn test_restart_after_stop() {
    let source = Arc::new(ReplayScanSource::new(Vec::new()));
    let scheduler = build(&source, ScanningConfig::default());

    scheduler.start();
    advance(0).await;
    scheduler.stop();
    advance(30).await;
    assert_eq!(source.scan_count(), 1);

    assert!(scheduler.start());
    advance(0).await;
    assert_eq!(source.scan_count(), 2);
}

/// Radio that counts scans in flight, including abandoned ones.
#[derive(Default)]
struct CountingRadio {
    scans: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ScanSource for CountingRadio {
    fn name(&self) -> &str {
        "counting"
    }

    async fn readiness(&self) -> Readiness {
        Readiness::Ready
    }

    async fn scan(&self) -> wimap_scanner::Result<Vec<RawObservation>> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _in_flight = InFlight(&self.in_flight);

        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(Vec::new())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_quick_restart_never_overlaps_scans() {
    let radio = Arc::new(CountingRadio::default());
    let scheduler = ScanScheduler::new(
        Arc::new(ReconciliationEngine::new()),
        Arc::clone(&radio) as Arc<dyn ScanSource>,
        Arc::new(NoLocation),
        ScanningConfig::default(),
    );

    for _ in 0..300 {
        scheduler.start();
        tokio::time::sleep(Duration::from_millis(5)).await;
        scheduler.stop();
        scheduler.start();
        tokio::time::sleep(Duration::from_millis(5)).await;
        scheduler.stop();
    }

    assert!(radio.scans.load(Ordering::SeqCst) > 0);
    assert_eq!(radio.max_in_flight.load(Ordering::SeqCst), 1);
}

fn bssid(s: &str) -> Bssid {
    Bssid::new(s).expect("valid bssid")
}

async fn advance_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms + 1)).await;
}

#[tokio::test(start_paused = true)]
async fn test_locator_tracks_target_signal() {
    let target = "aa:bb:cc:dd:ee:10";
    let source = Arc::new(ReplayScanSource::from_snapshots(vec![
        vec![
            sighting(target, "Beacon", -70),
            sighting("aa:bb:cc:dd:ee:11", "Other", -40),
        ],
        vec![sighting(target, "Beacon", -60)],
        vec![sighting("aa:bb:cc:dd:ee:11", "Other", -41)],
        vec![sighting(target, "Beacon", -45)],
    ]));
    let scheduler = build(&source, ScanningConfig::default());
    let reading = scheduler.subscribe_locator();

    scheduler.start_locator(bssid(target));
    assert_eq!(*reading.borrow(), None);
    assert_eq!(scheduler.locator_target(), Some(bssid(target)));

    advance_ms(0).await;
    assert_eq!(*reading.borrow(), Some(-70));

    advance_ms(800).await;
    assert_eq!(*reading.borrow(), Some(-60));

    // Not visible: the last reading stands
    advance_ms(800).await;
    assert_eq!(*reading.borrow(), Some(-60));

    advance_ms(800).await;
    assert_eq!(*reading.borrow(), Some(-45));
    assert_eq!(source.scan_count(), 4);

    // Locator scans never touch the catalog
    assert_eq!(scheduler.engine().catalog_len(), 0);
    assert!(!scheduler.is_scanning());
}

#[tokio::test(start_paused = true)]
async fn test_locator_starts_from_catalogued_signal_and_stops() {
    let target = "aa:bb:cc:dd:ee:12";
    let source = Arc::new(ReplayScanSource::from_snapshots(vec![vec![sighting(
        target, "Home", -52,
    )]]));
    let scheduler = build(&source, ScanningConfig::default());
    scheduler.start();
    advance(0).await;
    scheduler.stop();

    let reading = scheduler.subscribe_locator();
    scheduler.start_locator(bssid(target));
    assert_eq!(*reading.borrow(), Some(-52));

    advance_ms(2000).await;
    let scans = source.scan_count();
    assert_eq!(scans, 4);

    assert!(scheduler.stop_locator());
    assert!(!scheduler.stop_locator());
    assert_eq!(*reading.borrow(), None);
    assert_eq!(scheduler.locator_target(), None);

    advance_ms(5000).await;
    assert_eq!(source.scan_count(), scans);
}

#[tokio::test(start_paused = true)]
async fn test_locator_retargets() {
    let source = Arc::new(ReplayScanSource::from_snapshots(vec![vec![
        sighting("aa:bb:cc:dd:ee:13", "First", -60),
        sighting("aa:bb:cc:dd:ee:14", "Second", -75),
    ]]));
    let scheduler = build(&source, ScanningConfig::default());
    let reading = scheduler.subscribe_locator();

    scheduler.start_locator(bssid("aa:bb:cc:dd:ee:13"));
    advance_ms(0).await;
    assert_eq!(*reading.borrow(), Some(-60));

    scheduler.start_locator(bssid("aa:bb:cc:dd:ee:14"));
    assert_eq!(*reading.borrow(), None);
    advance_ms(0).await;
    assert_eq!(*reading.borrow(), Some(-75));
    assert_eq!(scheduler.locator_target(), Some(bssid("aa:bb:cc:dd:ee:14")));
}

#[tokio::test(start_paused = true)]
async fn test_locator_and_catalog_scans_share_the_radio() {
    let target = "aa:bb:cc:dd:ee:15";
    let source = Arc::new(
        ReplayScanSource::from_snapshots(vec![vec![sighting(target, "Shared", -58)]])
            .with_latency(Duration::from_millis(500)),
    );
    let scheduler = build(&source, ScanningConfig::default());
    let reading = scheduler.subscribe_locator();

    scheduler.start();
    scheduler.start_locator(bssid(target));
    advance(30).await;

    assert!(source.scan_count() > 10);
    assert_eq!(source.max_concurrent_scans(), 1);
    assert_eq!(scheduler.engine().current().len(), 1);
    assert_eq!(*reading.borrow(), Some(-58));
}
