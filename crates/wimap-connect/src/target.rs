//! The network a trial runs against.

use std::fmt;
use wimap_core::{Bssid, SecurityClass};

/// Identity and radio facts of the network being joined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialTarget {
    /// Access point identity
    pub bssid: Bssid,
    /// Network name (empty when hidden)
    pub ssid: String,
    /// Latest signal strength in dBm
    pub rssi: i32,
    /// Advertised security
    pub security: SecurityClass,
}

impl TrialTarget {
    /// Describe a target network.
    #[must_use]
    pub fn new(bssid: Bssid, ssid: impl Into<String>, rssi: i32, security: SecurityClass) -> Self {
        Self {
            bssid,
            ssid: ssid.into(),
            rssi,
            security,
        }
    }

    /// Name for logs and progress text.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.ssid.trim().is_empty() {
            self.bssid.as_str()
        } else {
            &self.ssid
        }
    }
}

impl fmt::Display for TrialTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_name(), self.bssid)
    }
}
