//! Concrete scan sources.

pub mod iw;
pub mod replay;

pub use iw::{parse_iw_scan_output, IwScanSource};
pub use replay::{ReplayScanSource, ReplayStep};
