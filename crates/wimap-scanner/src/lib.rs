//! WiMap Scanner - network discovery and catalog reconciliation.
//!
//! This crate turns raw radio scans into a stable catalog of networks.
//! Scan sources are pluggable; the reconciliation rules are pure and
//! independent of where the sightings came from.
//!
//! # Features
//!
//! - Intra-snapshot deduplication (named beats hidden, then strongest signal)
//! - Cross-snapshot merging that never loses a known network name
//! - Reports restricted to the latest snapshot, strongest first
//! - Remembered credentials that survive gaps in visibility
//! - Linux `iw` scanner and a JSON replay scanner
//!
//! # Example
//!
//! ```rust
//! use wimap_scanner::{RawObservation, ReconciliationEngine};
//!
//! let engine = ReconciliationEngine::new();
//! let report = engine.ingest_raw(
//!     vec![
//!         RawObservation {
//!             bssid: Some("aa:bb:cc:dd:ee:01".into()),
//!             ssid: String::new(),
//!             rssi: -70,
//!             frequency_mhz: 2412,
//!             capabilities: "[WPA2-PSK-CCMP][ESS]".into(),
//!             location: None,
//!         },
//!         RawObservation {
//!             bssid: Some("aa:bb:cc:dd:ee:01".into()),
//!             ssid: "HomeNet".into(),
//!             rssi: -80,
//!             frequency_mhz: 2412,
//!             capabilities: "[WPA2-PSK-CCMP][ESS]".into(),
//!             location: None,
//!         },
//!     ],
//!     None,
//! );
//!
//! assert_eq!(report.len(), 1);
//! assert_eq!(report[0].ssid, "HomeNet");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod adapters;
pub mod engine;
pub mod error;
pub mod location;
pub mod observation;
pub mod reconcile;
pub mod source;

pub use adapters::{IwScanSource, ReplayScanSource, ReplayStep};
pub use engine::{CatalogSnapshot, ReconciliationEngine};
pub use error::{Result, ScanError};
pub use location::{FixedLocation, LocationProvider, NoLocation, SharedLocation};
pub use observation::{NetworkObservation, NetworkRecord, RawObservation};
pub use reconcile::{dedup_snapshot, merge_record, Catalog};
pub use source::{Readiness, ScanSource};
