//! Linux radio scanner backed by `iw dev <iface> scan`.
//!
//! Scanning needs `CAP_NET_ADMIN`; without it `iw` fails with
//! "Operation not permitted", which is reported as
//! [`ScanError::PermissionDenied`]. Radio state is read from sysfs.

use crate::error::{Result, ScanError};
use crate::observation::RawObservation;
use crate::source::{Readiness, ScanSource};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

const IFF_UP: u32 = 0x1;

/// Scan source that shells out to `iw`.
#[derive(Debug, Clone)]
pub struct IwScanSource {
    interface: String,
    sysfs_root: PathBuf,
    iw_binary: String,
}

impl IwScanSource {
    /// Scanner for the given wireless interface.
    #[must_use]
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            sysfs_root: PathBuf::from("/sys/class/net"),
            iw_binary: "iw".to_string(),
        }
    }

    /// Read interface state from a different sysfs root.
    #[must_use]
    pub fn with_sysfs_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.sysfs_root = root.into();
        self
    }

    /// Use a different `iw` executable.
    #[must_use]
    pub fn with_iw_binary(mut self, binary: impl Into<String>) -> Self {
        self.iw_binary = binary.into();
        self
    }

    /// Interface being scanned.
    #[must_use]
    pub fn interface(&self) -> &str {
        &self.interface
    }
}

#[async_trait]
impl ScanSource for IwScanSource {
    fn name(&self) -> &str {
        "iw"
    }

    async fn readiness(&self) -> Readiness {
        let iface_dir = self.sysfs_root.join(&self.interface);
        let Ok(flags) = tokio::fs::read_to_string(iface_dir.join("flags")).await else {
            tracing::debug!("Interface {} not present in sysfs", self.interface);
            return Readiness::RadioDisabled;
        };

        let up = u32::from_str_radix(flags.trim().trim_start_matches("0x"), 16)
            .map(|bits| bits & IFF_UP != 0)
            .unwrap_or(false);
        if !up {
            return Readiness::RadioDisabled;
        }

        // A soft or hard rfkill block keeps the interface flags up
        if rfkill_blocked(&iface_dir.join("phy80211")).await {
            Readiness::RadioDisabled
        } else {
            Readiness::Ready
        }
    }

    async fn scan(&self) -> Result<Vec<RawObservation>> {
        let output = Command::new(&self.iw_binary)
            .args(["dev", &self.interface, "scan"])
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(classify_failure(&self.interface, stderr));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let sightings = parse_iw_scan_output(&stdout);
        tracing::debug!(
            "iw scan on {} returned {} BSS entries",
            self.interface,
            sightings.len()
        );
        Ok(sightings)
    }
}

async fn rfkill_blocked(phy_dir: &Path) -> bool {
    let Ok(mut entries) = tokio::fs::read_dir(phy_dir).await else {
        return false;
    };

    let mut blocked = false;
    while let Ok(Some(entry)) = entries.next_entry().await {
        if !entry.file_name().to_string_lossy().starts_with("rfkill") {
            continue;
        }
        for state in ["soft", "hard"] {
            if let Ok(value) = tokio::fs::read_to_string(entry.path().join(state)).await {
                blocked |= value.trim() == "1";
            }
        }
    }
    blocked
}

fn classify_failure(interface: &str, stderr: String) -> ScanError {
    if stderr.contains("Operation not permitted") || stderr.contains("(-1)") {
        ScanError::PermissionDenied { reason: stderr }
    } else if stderr.contains("Network is down") || stderr.contains("(-100)") {
        ScanError::RadioDisabled {
            interface: interface.to_string(),
        }
    } else {
        ScanError::Rejected { reason: stderr }
    }
}

/// Fields gathered for one `BSS` stanza.
#[derive(Default)]
struct BssStanza {
    bssid: Option<String>,
    ssid: String,
    signal_dbm: Option<f64>,
    freq_mhz: u32,
    privacy: bool,
    wpa: bool,
    rsn: bool,
    sae: bool,
}

impl BssStanza {
    fn capabilities(&self) -> String {
        let mut caps = String::new();
        if self.sae {
            caps.push_str("[WPA3-SAE]");
        }
        if self.rsn {
            caps.push_str("[WPA2]");
        }
        if self.wpa {
            caps.push_str("[WPA]");
        }
        if self.privacy && !(self.rsn || self.wpa || self.sae) {
            caps.push_str("[WEP]");
        }
        caps.push_str("[ESS]");
        caps
    }

    fn finish(self) -> RawObservation {
        let capabilities = self.capabilities();
        #[allow(clippy::cast_possible_truncation)]
        let rssi = self.signal_dbm.map_or(-100, |dbm| dbm.round() as i32);
        RawObservation {
            bssid: self.bssid,
            ssid: self.ssid,
            rssi,
            frequency_mhz: self.freq_mhz,
            capabilities,
            location: None,
        }
    }
}

/// Parse the text output of `iw dev <iface> scan`.
///
/// Each stanza starts with `BSS aa:bb:cc:dd:ee:ff(on wlan0)` at column 0.
/// The BSSID text is kept as-is so malformed addresses are dropped later,
/// during validation.
#[must_use]
pub fn parse_iw_scan_output(output: &str) -> Vec<RawObservation> {
    let mut results = Vec::new();
    let mut current: Option<BssStanza> = None;

    for line in output.lines() {
        if let Some(rest) = line.strip_prefix("BSS ") {
            if let Some(stanza) = current.take() {
                results.push(stanza.finish());
            }
            let mac: String = rest
                .chars()
                .take_while(|c| !c.is_whitespace() && *c != '(')
                .collect();
            current = Some(BssStanza {
                bssid: (!mac.is_empty()).then_some(mac),
                ..BssStanza::default()
            });
            continue;
        }

        let Some(stanza) = current.as_mut() else {
            continue;
        };
        let trimmed = line.trim();

        if let Some(rest) = trimmed.strip_prefix("SSID:") {
            stanza.ssid = decode_ssid(rest.trim());
        } else if let Some(rest) = trimmed.strip_prefix("signal:") {
            stanza.signal_dbm = rest.split_whitespace().next().and_then(|n| n.parse().ok());
        } else if let Some(rest) = trimmed.strip_prefix("freq:") {
            stanza.freq_mhz = parse_freq_mhz(rest);
        } else if let Some(rest) = trimmed.strip_prefix("capability:") {
            stanza.privacy = rest.contains("Privacy");
        } else if trimmed.starts_with("RSN:") {
            stanza.rsn = true;
        } else if trimmed.starts_with("WPA:") {
            stanza.wpa = true;
        } else if trimmed.contains("Authentication suites:") && trimmed.contains("SAE") {
            stanza.sae = true;
        }
    }

    if let Some(stanza) = current.take() {
        results.push(stanza.finish());
    }

    results
}

/// Newer `iw` prints fractional frequencies such as `2412.0`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_freq_mhz(field: &str) -> u32 {
    field
        .split_whitespace()
        .next()
        .and_then(|n| n.parse::<f64>().ok())
        .filter(|mhz| *mhz > 0.0)
        .map_or(0, |mhz| mhz.round() as u32)
}

/// `iw` escapes non-printable bytes as `\xNN`; an all-NUL name is hidden.
fn decode_ssid(raw: &str) -> String {
    if raw.replace("\\x00", "").trim().is_empty() {
        String::new()
    } else {
        raw.to_string()
    }
}
