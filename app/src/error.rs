//! Errors surfaced by the service facade.

use thiserror::Error;
use wimap_core::Bssid;

/// Failures of [`crate::WifiService`] operations.
///
/// Trial results themselves are values ([`wimap_connect::TrialOutcome`]);
/// only requests that cannot start a trial end up here.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The requested network is not in the catalog.
    #[error("network {0} is not in the catalog")]
    UnknownNetwork(Bssid),
}

/// Result alias for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;
