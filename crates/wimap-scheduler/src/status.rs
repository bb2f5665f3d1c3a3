//! Scheduler state and per-cycle status events.

use serde::{Deserialize, Serialize};
use std::fmt;
use wimap_core::Timestamp;
use wimap_scanner::{Readiness, ScanError};

/// Whether the scheduler is running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanState {
    /// No scans are requested
    #[default]
    Idle,
    /// Scans are requested periodically
    Scanning,
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Scanning => f.write_str("scanning"),
        }
    }
}

/// Outcome of one scan cycle, published to status observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScanStatus {
    /// A snapshot was reconciled
    Completed {
        /// Networks in the published report
        reported: usize,
        /// Networks remaining in the catalog
        catalogued: usize,
        /// When the cycle finished
        timestamp: Timestamp,
    },
    /// The radio could not scan; the catalog is kept
    Unavailable {
        /// Why scanning is blocked
        readiness: Readiness,
        /// Human-readable explanation
        message: String,
        /// When the check ran
        timestamp: Timestamp,
    },
    /// The scan was requested but failed or timed out; the catalog is kept
    Failed {
        /// Human-readable explanation
        message: String,
        /// When the failure was observed
        timestamp: Timestamp,
    },
}

impl ScanStatus {
    pub(crate) fn unavailable(readiness: Readiness) -> Self {
        Self::Unavailable {
            readiness,
            message: readiness.status_message().unwrap_or_default().to_string(),
            timestamp: Timestamp::now(),
        }
    }

    pub(crate) fn failed(error: &ScanError) -> Self {
        Self::Failed {
            message: error.status_message(),
            timestamp: Timestamp::now(),
        }
    }

    /// Status line suitable for display.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Completed { reported, .. } => format!("Found {reported} networks"),
            Self::Unavailable { message, .. } | Self::Failed { message, .. } => message.clone(),
        }
    }

    /// True when the cycle produced a snapshot.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}
