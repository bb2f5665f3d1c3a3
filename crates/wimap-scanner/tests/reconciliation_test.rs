//! End-to-end reconciliation scenarios through the public engine API.

use wimap_core::{Bssid, Credential, GeoPoint, SecurityClass, Timestamp};
use wimap_scanner::{
    dedup_snapshot, NetworkObservation, RawObservation, ReconciliationEngine, ReplayScanSource,
    ScanSource,
};

fn bssid(s: &str) -> Bssid {
    Bssid::new(s).expect("valid bssid")
}

fn observation(
    mac: &str,
    ssid: &str,
    rssi: i32,
    location: Option<GeoPoint>,
) -> NetworkObservation {
    NetworkObservation {
        bssid: bssid(mac),
        ssid: ssid.to_string(),
        rssi,
        channel: Some(1),
        security: SecurityClass::Wpa2,
        location,
        timestamp: Timestamp::now(),
    }
}

fn raw(mac: &str, ssid: &str, rssi: i32) -> RawObservation {
    RawObservation {
        bssid: Some(mac.to_string()),
        ssid: ssid.to_string(),
        rssi,
        frequency_mhz: 2437,
        capabilities: "[WPA2-PSK-CCMP][ESS]".to_string(),
        location: None,
    }
}

#[test]
fn test_hidden_then_named_duplicate_picks_named() {
    let winners = dedup_snapshot(vec![
        observation("aa:aa:aa:aa:aa:aa", "", -70, None),
        observation("aa:aa:aa:aa:aa:aa", "HomeNet", -80, None),
    ]);

    assert_eq!(winners.len(), 1);
    assert_eq!(winners[0].ssid, "HomeNet");
    assert_eq!(winners[0].rssi, -80);
}

#[test]
fn test_hidden_sighting_keeps_name_and_location() {
    let engine = ReconciliationEngine::new();
    engine.ingest(vec![observation(
        "bb:bb:bb:bb:bb:bb",
        "Office",
        -50,
        Some(GeoPoint::new(1.0, 1.0)),
    )]);

    let report = engine.ingest(vec![observation("bb:bb:bb:bb:bb:bb", "", -40, None)]);

    assert_eq!(report.len(), 1);
    assert_eq!(report[0].ssid, "Office");
    assert_eq!(report[0].rssi, -40);
    assert_eq!(report[0].location, Some(GeoPoint::new(1.0, 1.0)));
}

#[test]
fn test_known_name_never_regresses() {
    let engine = ReconciliationEngine::new();
    let mac = "cc:cc:cc:cc:cc:cc";
    engine.ingest(vec![observation(mac, "Stable", -60, None)]);

    for rssi in [-30, -90, -45, -70] {
        let report = engine.ingest(vec![
            observation(mac, "", rssi, None),
            observation(mac, "", rssi - 5, None),
        ]);
        assert_eq!(report[0].ssid, "Stable");
    }
}

#[test]
fn test_reported_signal_is_latest_snapshot() {
    let engine = ReconciliationEngine::new();
    let mac = "dd:dd:dd:dd:dd:dd";

    for rssi in [-40, -85, -62] {
        let report = engine.ingest(vec![observation(mac, "Net", rssi, None)]);
        assert_eq!(report[0].rssi, rssi);
    }

    let record = engine.record(&bssid(mac)).expect("catalogued");
    assert_eq!(record.peak_rssi, -40);
}

#[test]
fn test_credential_persists_across_gap() {
    let engine = ReconciliationEngine::new();
    let home = "ee:ee:ee:ee:ee:ee";
    engine.ingest(vec![observation(home, "Home", -50, None)]);
    assert!(engine.remember_credential(&bssid(home), Credential::new("letmein")));

    let gap = engine.ingest(vec![observation("ee:ee:ee:ee:ee:01", "Elsewhere", -50, None)]);
    assert!(gap.iter().all(|r| r.bssid != bssid(home)));

    let back = engine.ingest(vec![observation(home, "Home", -55, None)]);
    assert_eq!(back[0].credential, Some(Credential::new("letmein")));
}

#[test]
fn test_clear_empties_and_scanning_repopulates() {
    let engine = ReconciliationEngine::new();
    let rx = engine.subscribe();
    engine.ingest(vec![observation("ff:ff:ff:ff:ff:01", "One", -50, None)]);

    engine.clear();
    assert!(rx.borrow().is_empty());
    assert_eq!(engine.catalog_len(), 0);

    engine.ingest(vec![observation("ff:ff:ff:ff:ff:02", "Two", -50, None)]);
    assert_eq!(rx.borrow().len(), 1);
}

#[tokio::test]
async fn test_replayed_scans_flow_through_engine() {
    let source = ReplayScanSource::from_snapshots(vec![
        vec![
            raw("aa:bb:cc:00:00:01", "", -70),
            raw("aa:bb:cc:00:00:01", "Cafe", -75),
            raw("aa:bb:cc:00:00:02", "Library", -40),
            RawObservation {
                bssid: None,
                ..raw("aa:bb:cc:00:00:03", "Ghost", -30)
            },
        ],
        vec![raw("aa:bb:cc:00:00:01", "", -65)],
    ]);
    let engine = ReconciliationEngine::new();

    let first = engine.ingest_raw(source.scan().await.expect("first scan"), None);
    let names: Vec<_> = first.iter().map(|r| r.ssid.as_str()).collect();
    assert_eq!(names, vec!["Library", "Cafe"]);

    let second = engine.ingest_raw(source.scan().await.expect("second scan"), None);
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].ssid, "Cafe");
    assert_eq!(second[0].rssi, -65);
    assert_eq!(engine.catalog_len(), 2);
}
