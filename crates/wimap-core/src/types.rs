//! Shared types used across WiMap.
//!
//! This module defines the network-identity newtype, the security
//! classification and the small value types carried by every observation.

use crate::error::WimapError;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Hardware address of an access point, the identity key of a network.
///
/// Stored in lowercase colon-separated form (`aa:bb:cc:dd:ee:ff`), so two
/// spellings of the same address compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Bssid(String);

impl Bssid {
    /// Create a new `Bssid` from a string.
    ///
    /// Accepts `:` or `-` separators in either case.
    ///
    /// # Errors
    /// Returns error if the value is not six hex octets.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, WimapError> {
        let normalized = raw.as_ref().trim().replace('-', ":").to_ascii_lowercase();
        Self::validate(&normalized)?;
        Ok(Self(normalized))
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(id: &str) -> Result<(), WimapError> {
        static MAC_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = MAC_REGEX
            .get_or_init(|| Regex::new(r"^[0-9a-f]{2}(:[0-9a-f]{2}){5}$").expect("valid regex"));

        if regex.is_match(id) {
            Ok(())
        } else {
            Err(WimapError::Validation(format!(
                "invalid BSSID: expected six hex octets, got '{id}'"
            )))
        }
    }
}

impl fmt::Display for Bssid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Bssid {
    type Err = WimapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Bssid {
    type Error = WimapError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Bssid> for String {
    fn from(bssid: Bssid) -> Self {
        bssid.0
    }
}

/// A network passphrase.
///
/// `Debug` and `Display` print a masked form so credentials never reach
/// logs by accident; use [`Credential::expose`] to get the secret.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    /// Wrap a passphrase.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// The secret itself.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the passphrase is empty or whitespace only.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// First three characters followed by `***`.
    #[must_use]
    pub fn masked(&self) -> String {
        let prefix: String = self.0.chars().take(3).collect();
        format!("{prefix}***")
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&self.masked()).finish()
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

impl From<&str> for Credential {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Credential {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Security classification derived from an access point's advertised
/// capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityClass {
    /// No authentication
    Open,
    /// Legacy WEP
    Wep,
    /// WPA (TKIP era)
    Wpa,
    /// WPA2 / RSN
    Wpa2,
    /// WPA3 / SAE
    Wpa3,
    /// Capabilities present but not recognised
    Unknown,
}

impl SecurityClass {
    /// Classify a capability string such as `[WPA2-PSK-CCMP][ESS]`.
    ///
    /// Strongest scheme wins. A blank string, or one carrying only `ESS` /
    /// `IBSS` flags, is open.
    #[must_use]
    pub fn from_capabilities(capabilities: &str) -> Self {
        let caps = capabilities.to_ascii_uppercase();

        if caps.contains("WPA3") || caps.contains("SAE") {
            return Self::Wpa3;
        }
        if caps.contains("WPA2") || caps.contains("RSN") {
            return Self::Wpa2;
        }
        if caps.contains("WPA") {
            return Self::Wpa;
        }
        if caps.contains("WEP") {
            return Self::Wep;
        }

        let only_mode_flags = caps
            .split(|c| c == '[' || c == ']')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .all(|token| token == "ESS" || token == "IBSS");

        if only_mode_flags {
            Self::Open
        } else {
            Self::Unknown
        }
    }

    /// Whether joining requires a credential.
    #[must_use]
    pub fn requires_credential(self) -> bool {
        self != Self::Open
    }

    /// Short human-readable label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Wep => "WEP",
            Self::Wpa => "WPA",
            Self::Wpa2 => "WPA2",
            Self::Wpa3 => "WPA3",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for SecurityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a point.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

/// Map a centre frequency in MHz to its 802.11 channel number.
///
/// Covers 2.4 GHz (1-14), 5 GHz and 6 GHz. Frequencies outside those
/// bands return `None`.
#[must_use]
pub fn channel_from_frequency(mhz: u32) -> Option<u16> {
    let channel = match mhz {
        2484 => 14,
        2412..=2472 => (mhz - 2407) / 5,
        5170..=5895 => (mhz - 5000) / 5,
        5955..=7115 => (mhz - 5950) / 5,
        _ => return None,
    };
    u16::try_from(channel).ok()
}

/// Wrapper around `chrono::DateTime<Utc>` for consistent timestamp handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a timestamp representing the current moment.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Create a timestamp from a `DateTime<Utc>`.
    #[must_use]
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Get the inner `DateTime<Utc>`.
    #[must_use]
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Parse a timestamp from an RFC3339 string.
    pub fn from_rfc3339(s: &str) -> Result<Self, WimapError> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| Self(dt.with_timezone(&Utc)))
            .map_err(|e| WimapError::Validation(format!("invalid timestamp: {e}")))
    }

    /// Format as RFC3339 string.
    #[must_use]
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }

    /// Get seconds since Unix epoch.
    #[must_use]
    pub fn timestamp(&self) -> i64 {
        self.0.timestamp()
    }

    /// Time elapsed between `self` and a later `now`; zero if `now` is earlier.
    #[must_use]
    pub fn age_at(&self, now: Timestamp) -> std::time::Duration {
        (now.0 - self.0).to_std().unwrap_or_default()
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

impl From<Timestamp> for DateTime<Utc> {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_bssid_valid() {
        let bssid = Bssid::new("AA:BB:CC:00:11:22").expect("valid bssid");
        assert_eq!(bssid.as_str(), "aa:bb:cc:00:11:22");

        let dashed = Bssid::new("aa-bb-cc-00-11-22").expect("dashed bssid");
        assert_eq!(bssid, dashed);
    }

    #[test]
    fn test_bssid_invalid() {
        let invalid = vec![
            "",
            "aa:bb:cc:dd:ee",
            "aa:bb:cc:dd:ee:ff:00",
            "gg:bb:cc:dd:ee:ff",
            "aabbccddeeff",
            "<unknown ssid>",
        ];

        for raw in invalid {
            assert!(Bssid::new(raw).is_err(), "Should fail for: {raw}");
        }
    }

    #[test]
    fn test_bssid_serde() {
        let bssid = Bssid::new("aa:bb:cc:dd:ee:ff").expect("valid bssid");
        let json = serde_json::to_string(&bssid).expect("serialize bssid");
        assert_eq!(json, "\"aa:bb:cc:dd:ee:ff\"");

        let bad: Result<Bssid, _> = serde_json::from_str("\"nope\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_security_from_capabilities() {
        let cases = [
            ("[WPA2-PSK-CCMP][RSN-PSK-CCMP][ESS]", SecurityClass::Wpa2),
            ("[WPA2-PSK-CCMP][WPA3-SAE-CCMP][ESS]", SecurityClass::Wpa3),
            ("[RSN-SAE-CCMP][ESS]", SecurityClass::Wpa3),
            ("[WPA-PSK-TKIP][ESS]", SecurityClass::Wpa),
            ("[WEP][ESS]", SecurityClass::Wep),
            ("[ESS]", SecurityClass::Open),
            ("[IBSS]", SecurityClass::Open),
            ("", SecurityClass::Open),
            ("[ESS][WPS]", SecurityClass::Unknown),
        ];

        for (caps, expected) in cases {
            assert_eq!(SecurityClass::from_capabilities(caps), expected, "caps: {caps}");
        }
    }

    #[test]
    fn test_security_requires_credential() {
        assert!(!SecurityClass::Open.requires_credential());
        assert!(SecurityClass::Wpa2.requires_credential());
        assert!(SecurityClass::Unknown.requires_credential());
        assert_eq!(SecurityClass::Wpa3.to_string(), "WPA3");
    }

    #[test]
    fn test_credential_masking() {
        let credential = Credential::new("hunter22");
        assert_eq!(credential.expose(), "hunter22");
        assert_eq!(credential.to_string(), "hun***");
        assert_eq!(format!("{credential:?}"), "Credential(\"hun***\")");
        assert!(Credential::new("  ").is_blank());
    }

    #[test]
    fn test_channel_from_frequency() {
        assert_eq!(channel_from_frequency(2412), Some(1));
        assert_eq!(channel_from_frequency(2437), Some(6));
        assert_eq!(channel_from_frequency(2472), Some(13));
        assert_eq!(channel_from_frequency(2484), Some(14));
        assert_eq!(channel_from_frequency(5180), Some(36));
        assert_eq!(channel_from_frequency(5825), Some(165));
        assert_eq!(channel_from_frequency(5955), Some(1));
        assert_eq!(channel_from_frequency(6115), Some(33));
        assert_eq!(channel_from_frequency(0), None);
        assert_eq!(channel_from_frequency(3000), None);
    }

    #[test]
    fn test_timestamp_rfc3339() {
        let ts = Timestamp::now();
        let parsed = Timestamp::from_rfc3339(&ts.to_rfc3339()).expect("parse RFC3339 timestamp");
        assert_eq!(ts.timestamp(), parsed.timestamp());
    }

    #[test]
    fn test_timestamp_age() {
        let earlier = Timestamp::from_rfc3339("2026-01-01T00:00:00Z").expect("parse");
        let later = Timestamp::from_rfc3339("2026-01-01T00:01:00Z").expect("parse");
        assert_eq!(earlier.age_at(later), Duration::from_secs(60));
        assert_eq!(later.age_at(earlier), Duration::ZERO);
    }
}
