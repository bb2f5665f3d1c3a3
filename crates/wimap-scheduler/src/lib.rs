//! WiMap Scheduler - drives periodic scans into the reconciliation engine.
//!
//! A single background task requests one scan at a time, waits for it
//! (bounded by the configured timeout), and feeds successful snapshots to
//! the [`ReconciliationEngine`](wimap_scanner::ReconciliationEngine).
//! Observers follow the scanning state through a `watch` channel and
//! per-cycle statuses through a `broadcast` channel.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod scheduler;
pub mod status;

// Re-export commonly used types
pub use scheduler::ScanScheduler;
pub use status::{ScanState, ScanStatus};
