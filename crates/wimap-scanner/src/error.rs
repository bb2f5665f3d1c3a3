use crate::source::Readiness;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Radio is disabled on {interface}")]
    RadioDisabled { interface: String },

    #[error("Permission denied while scanning: {reason}")]
    PermissionDenied { reason: String },

    #[error("Scan rejected: {reason}")]
    Rejected { reason: String },

    #[error("Scan did not complete within {0:?}")]
    Timeout(Duration),

    #[error("Failed to run scan process: {0}")]
    Process(#[from] std::io::Error),

    #[error("Failed to read replay fixture: {0}")]
    FixtureIo(std::io::Error),

    #[error("Invalid replay fixture: {0}")]
    Fixture(#[from] serde_json::Error),
}

impl ScanError {
    /// Human-readable status line for observers.
    #[must_use]
    pub fn status_message(&self) -> String {
        let readiness = match self {
            Self::RadioDisabled { .. } => Readiness::RadioDisabled,
            Self::PermissionDenied { .. } => Readiness::PermissionDenied,
            other => return format!("Scan failed: {other}"),
        };
        readiness.status_message().unwrap_or_default().to_string()
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
