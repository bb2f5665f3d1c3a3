//! Observation and catalog record types.
//!
//! A [`RawObservation`] is what a scan source hands over. It is validated
//! into a [`NetworkObservation`], which the reconciliation engine folds
//! into a long-lived [`NetworkRecord`].

use serde::{Deserialize, Serialize};
use wimap_core::{channel_from_frequency, Bssid, Credential, GeoPoint, SecurityClass, Timestamp};

/// One unvalidated access-point sighting as reported by a scan source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    /// Hardware address; drivers occasionally omit or garble it
    #[serde(default)]
    pub bssid: Option<String>,
    /// Network name, empty when hidden
    #[serde(default)]
    pub ssid: String,
    /// Signal strength in dBm
    pub rssi: i32,
    /// Centre frequency in MHz
    #[serde(default)]
    pub frequency_mhz: u32,
    /// Capability flags, e.g. `[WPA2-PSK-CCMP][ESS]`
    #[serde(default)]
    pub capabilities: String,
    /// Where the sighting happened, if the source knows
    #[serde(default)]
    pub location: Option<GeoPoint>,
}

/// A validated sighting from a single snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkObservation {
    /// Identity key
    pub bssid: Bssid,
    /// Network name, empty when hidden
    pub ssid: String,
    /// Signal strength in dBm (higher is stronger)
    pub rssi: i32,
    /// 802.11 channel, if the frequency maps to one
    pub channel: Option<u16>,
    /// Security classification
    pub security: SecurityClass,
    /// Where the sighting happened
    pub location: Option<GeoPoint>,
    /// When the snapshot was taken
    pub timestamp: Timestamp,
}

impl NetworkObservation {
    /// Validate a raw sighting.
    ///
    /// Returns `None` when the BSSID is missing or malformed. `fallback_location`
    /// is used when the source did not attach one.
    #[must_use]
    pub fn from_raw(
        raw: RawObservation,
        fallback_location: Option<GeoPoint>,
        timestamp: Timestamp,
    ) -> Option<Self> {
        let bssid = Bssid::new(raw.bssid.as_deref()?).ok()?;

        Some(Self {
            bssid,
            ssid: raw.ssid,
            rssi: raw.rssi,
            channel: channel_from_frequency(raw.frequency_mhz),
            security: SecurityClass::from_capabilities(&raw.capabilities),
            location: raw.location.or(fallback_location),
            timestamp,
        })
    }

    /// Whether the network name is absent.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        is_hidden_ssid(&self.ssid)
    }
}

/// A catalog entry: the latest merged view of one BSSID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkRecord {
    /// Identity key
    pub bssid: Bssid,
    /// Best known network name, empty when never seen named
    pub ssid: String,
    /// Signal strength from the latest snapshot containing this BSSID
    pub rssi: i32,
    /// 802.11 channel
    pub channel: Option<u16>,
    /// Security classification
    pub security: SecurityClass,
    /// Location attached by the merge rules
    pub location: Option<GeoPoint>,
    /// Timestamp of the latest sighting
    pub last_seen: Timestamp,
    /// Timestamp of the first sighting
    pub first_seen: Timestamp,
    /// Strongest signal ever observed
    pub peak_rssi: i32,
    /// Location at which `peak_rssi` was observed
    pub peak_location: Option<GeoPoint>,
    /// Credential that last connected successfully
    #[serde(skip_serializing)]
    #[serde(default)]
    pub credential: Option<Credential>,
}

impl NetworkRecord {
    /// Build a fresh record from a first sighting.
    #[must_use]
    pub fn from_observation(obs: NetworkObservation) -> Self {
        Self {
            bssid: obs.bssid,
            ssid: obs.ssid,
            rssi: obs.rssi,
            channel: obs.channel,
            security: obs.security,
            location: obs.location,
            last_seen: obs.timestamp,
            first_seen: obs.timestamp,
            peak_rssi: obs.rssi,
            peak_location: obs.location,
            credential: None,
        }
    }

    /// Whether the network name is absent.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        is_hidden_ssid(&self.ssid)
    }

    /// Name for display, `<hidden>` when absent.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.is_hidden() {
            "<hidden>"
        } else {
            &self.ssid
        }
    }
}

/// Empty, whitespace-only and NUL-padded names count as hidden.
fn is_hidden_ssid(ssid: &str) -> bool {
    ssid.chars().all(|c| c.is_whitespace() || c == '\0')
}
