//! Location provider port.
//!
//! The scheduler samples the provider once per scan and attaches the fix to
//! sightings that arrive without one.

use async_trait::async_trait;
use tokio::sync::watch;
use wimap_core::GeoPoint;

/// Source of the device's current position.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Latest known fix, if any.
    async fn current(&self) -> Option<GeoPoint>;
}

/// Provider that never has a fix.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocation;

#[async_trait]
impl LocationProvider for NoLocation {
    async fn current(&self) -> Option<GeoPoint> {
        None
    }
}

/// Provider pinned to a single point.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub GeoPoint);

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn current(&self) -> Option<GeoPoint> {
        Some(self.0)
    }
}

/// Provider fed from elsewhere in the process, e.g. a GPS reader task.
#[derive(Debug)]
pub struct SharedLocation {
    fix: watch::Sender<Option<GeoPoint>>,
}

impl SharedLocation {
    /// Create a provider with no fix yet.
    #[must_use]
    pub fn new() -> Self {
        let (fix, _) = watch::channel(None);
        Self { fix }
    }

    /// Replace the current fix.
    pub fn update(&self, point: Option<GeoPoint>) {
        self.fix.send_replace(point);
    }
}

impl Default for SharedLocation {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LocationProvider for SharedLocation {
    async fn current(&self) -> Option<GeoPoint> {
        *self.fix.borrow()
    }
}
