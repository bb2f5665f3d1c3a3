//! Scan source port.
//!
//! Anything that can produce access-point sightings implements
//! [`ScanSource`]: the Linux `iw` adapter for real radios, the replay adapter
//! for fixtures and tests.

use crate::error::Result;
use crate::observation::RawObservation;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a scan can be requested right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    /// Radio on, permission held
    Ready,
    /// Radio switched off or interface down
    RadioDisabled,
    /// Caller lacks the privilege to scan
    PermissionDenied,
}

impl Readiness {
    /// Status line for observers, `None` when ready.
    #[must_use]
    pub fn status_message(self) -> Option<&'static str> {
        match self {
            Self::Ready => None,
            Self::RadioDisabled => Some("WiFi is disabled, waiting for it to be enabled"),
            Self::PermissionDenied => Some("Scan permission missing, grant it to resume scanning"),
        }
    }
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready => f.write_str("ready"),
            Self::RadioDisabled => f.write_str("radio disabled"),
            Self::PermissionDenied => f.write_str("permission denied"),
        }
    }
}

/// A producer of raw scan snapshots.
#[async_trait]
pub trait ScanSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Check radio state and permissions without scanning.
    async fn readiness(&self) -> Readiness;

    /// Request one scan and wait for its results.
    ///
    /// The returned snapshot may contain duplicates and malformed entries.
    async fn scan(&self) -> Result<Vec<RawObservation>>;
}
