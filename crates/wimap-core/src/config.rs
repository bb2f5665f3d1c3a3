//! Configuration management for WiMap.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Lower bound for `scanning.locator_interval_ms`.
pub const MIN_LOCATOR_INTERVAL_MS: u64 = 100;

/// Allowed range for `connection.max_retries`.
pub const MAX_RETRIES_RANGE: (u32, u32) = (1, 10);

/// Allowed range for `connection.attempt_timeout_secs`.
pub const ATTEMPT_TIMEOUT_RANGE_SECS: (u64, u64) = (5, 60);

/// Allowed range for `connection.min_signal_dbm`.
pub const MIN_SIGNAL_RANGE_DBM: (i32, i32) = (-100, -30);

/// Main application configuration.
///
/// This is loaded from `~/.config/wimap/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// General application settings
    pub general: GeneralConfig,
    /// Scan scheduling settings
    pub scanning: ScanningConfig,
    /// Credential trial settings
    pub connection: ConnectionConfig,
    /// Credential vault settings
    pub vault: VaultConfig,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path, falling back to defaults if
    /// the file does not exist.
    pub fn load_from(config_path: &Path) -> ConfigResult<Self> {
        if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(config_path)?;
            let config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides, then clamp
    /// every value into its allowed range.
    ///
    /// Supports the following environment variables:
    /// - `WIMAP_SCAN_INTERVAL_SECS`: Override the scan interval
    /// - `WIMAP_INTERFACE`: Override the wireless interface name
    /// - `WIMAP_MAX_RETRIES`: Override retries per credential
    /// - `WIMAP_MIN_SIGNAL_DBM`: Override the weak-signal threshold
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config.validated())
    }

    /// Apply overrides from a variable lookup.
    ///
    /// Values that fail to parse are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secs) = lookup("WIMAP_SCAN_INTERVAL_SECS").and_then(|v| v.parse().ok()) {
            self.scanning.interval_secs = secs;
            tracing::debug!("Override scanning.interval_secs from env: {}", secs);
        }

        if let Some(interface) = lookup("WIMAP_INTERFACE").filter(|v| !v.trim().is_empty()) {
            tracing::debug!("Override scanning.interface from env: {}", interface);
            self.scanning.interface = interface;
        }

        if let Some(retries) = lookup("WIMAP_MAX_RETRIES").and_then(|v| v.parse().ok()) {
            self.connection.max_retries = retries;
            tracing::debug!("Override connection.max_retries from env: {}", retries);
        }

        if let Some(dbm) = lookup("WIMAP_MIN_SIGNAL_DBM").and_then(|v| v.parse().ok()) {
            self.connection.min_signal_dbm = dbm;
            tracing::debug!("Override connection.min_signal_dbm from env: {}", dbm);
        }
    }

    /// Return a copy with every bounded value clamped into range.
    #[must_use]
    pub fn validated(mut self) -> Self {
        self.scanning.interval_secs = self.scanning.interval_secs.max(1);
        self.scanning.scan_timeout_secs = self.scanning.scan_timeout_secs.max(1);
        self.scanning.locator_interval_ms = self
            .scanning
            .locator_interval_ms
            .max(MIN_LOCATOR_INTERVAL_MS);
        self.connection.max_retries = self
            .connection
            .max_retries
            .clamp(MAX_RETRIES_RANGE.0, MAX_RETRIES_RANGE.1);
        self.connection.attempt_timeout_secs = self
            .connection
            .attempt_timeout_secs
            .clamp(ATTEMPT_TIMEOUT_RANGE_SECS.0, ATTEMPT_TIMEOUT_RANGE_SECS.1);
        self.connection.min_signal_dbm = self
            .connection
            .min_signal_dbm
            .clamp(MIN_SIGNAL_RANGE_DBM.0, MIN_SIGNAL_RANGE_DBM.1);
        self
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to an explicit path.
    pub fn save_to(&self, config_path: &Path) -> ConfigResult<()> {
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "config_path".to_string(),
                reason: "no parent directory".to_string(),
            })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/wimap/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// Get the data directory path.
    ///
    /// Uses XDG base directories: `~/.local/share/wimap`
    pub fn data_dir() -> ConfigResult<PathBuf> {
        Ok(project_dirs()?.data_dir().to_path_buf())
    }
}

fn project_dirs() -> ConfigResult<ProjectDirs> {
    ProjectDirs::from("com", "wimap", "wimap").ok_or(ConfigError::NoConfigDir)
}

/// General application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_filter: "info,wimap=debug".to_string(),
        }
    }
}

/// Scan scheduling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanningConfig {
    /// Seconds between scan requests
    pub interval_secs: u64,
    /// Upper bound on a single scan wait
    pub scan_timeout_secs: u64,
    /// Wireless interface used by the radio scanner
    pub interface: String,
    /// Forget networks unseen for this many seconds (0 = never)
    pub stale_after_secs: u64,
    /// Milliseconds between scans while tracking a single network
    pub locator_interval_ms: u64,
}

impl ScanningConfig {
    /// Interval as a `Duration`.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Scan timeout as a `Duration`.
    #[must_use]
    pub fn scan_timeout(&self) -> Duration {
        Duration::from_secs(self.scan_timeout_secs)
    }

    /// Stale threshold, or `None` when pruning is disabled.
    #[must_use]
    pub fn stale_after(&self) -> Option<Duration> {
        (self.stale_after_secs > 0).then(|| Duration::from_secs(self.stale_after_secs))
    }

    /// Locator interval as a `Duration`.
    #[must_use]
    pub fn locator_interval(&self) -> Duration {
        Duration::from_millis(self.locator_interval_ms)
    }
}

impl Default for ScanningConfig {
    fn default() -> Self {
        Self {
            interval_secs: 10,
            scan_timeout_secs: 30,
            interface: "wlan0".to_string(),
            stale_after_secs: 0,
            locator_interval_ms: 800,
        }
    }
}

/// Credential trial settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Attempts per credential (1-10)
    pub max_retries: u32,
    /// Per-attempt timeout in seconds (5-60)
    pub attempt_timeout_secs: u64,
    /// Delay between retries of the same credential
    pub retry_backoff_ms: u64,
    /// Networks weaker than this are not attempted (-100 to -30)
    pub min_signal_dbm: i32,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            attempt_timeout_secs: 10,
            retry_backoff_ms: 2000,
            min_signal_dbm: -80,
        }
    }
}

/// Credential vault settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Persist working credentials in the encrypted vault
    pub enabled: bool,
    /// Argon2 memory cost in KB
    pub argon2_memory_kb: u32,
    /// Argon2 iteration count
    pub argon2_iterations: u32,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            argon2_memory_kb: 65_536, // 64 MB
            argon2_iterations: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.general.log_filter, "info,wimap=debug");
        assert_eq!(config.scanning.interval_secs, 10);
        assert_eq!(config.scanning.interface, "wlan0");
        assert_eq!(config.connection.max_retries, 3);
        assert_eq!(config.connection.attempt_timeout_secs, 10);
        assert_eq!(config.connection.retry_backoff_ms, 2000);
        assert_eq!(config.connection.min_signal_dbm, -80);
        assert!(config.vault.enabled);
        assert_eq!(config.scanning.stale_after(), None);
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("[scanning]"));
        assert!(toml_str.contains("[connection]"));
        assert!(toml_str.contains("[vault]"));

        let parsed: AppConfig = toml::from_str(&toml_str).expect("parse serialized config");
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_config_save_load() {
        let tmp = TempDir::new().expect("create temp dir");
        let config_path = tmp.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.scanning.interface = "wlp3s0".to_string();
        config.connection.max_retries = 5;

        config.save_to(&config_path).expect("save config");
        let loaded = AppConfig::load_from(&config_path).expect("load config");

        assert_eq!(loaded.scanning.interface, "wlp3s0");
        assert_eq!(loaded.connection.max_retries, 5);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let tmp = TempDir::new().expect("create temp dir");
        let loaded = AppConfig::load_from(&tmp.path().join("absent.toml")).expect("load config");
        assert_eq!(loaded, AppConfig::default());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("WIMAP_SCAN_INTERVAL_SECS", "20"),
            ("WIMAP_INTERFACE", "wlan1"),
            ("WIMAP_MAX_RETRIES", "not-a-number"),
            ("WIMAP_MIN_SIGNAL_DBM", "-70"),
        ]);

        let mut config = AppConfig::default();
        config.apply_env_overrides(|key| vars.get(key).map(ToString::to_string));

        assert_eq!(config.scanning.interval_secs, 20);
        assert_eq!(config.scanning.interface, "wlan1");
        assert_eq!(config.connection.max_retries, 3);
        assert_eq!(config.connection.min_signal_dbm, -70);
    }

    #[test]
    fn test_validated_clamps_ranges() {
        let mut config = AppConfig::default();
        config.connection.max_retries = 0;
        config.connection.attempt_timeout_secs = 600;
        config.connection.min_signal_dbm = -10;
        config.scanning.interval_secs = 0;
        config.scanning.locator_interval_ms = 5;

        let config = config.validated();
        assert_eq!(config.connection.max_retries, 1);
        assert_eq!(config.connection.attempt_timeout_secs, 60);
        assert_eq!(config.connection.min_signal_dbm, -30);
        assert_eq!(config.scanning.interval_secs, 1);
        assert_eq!(config.scanning.locator_interval_ms, 100);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[scanning]
interface = "wlan2"
stale_after_secs = 300

[connection]
max_retries = 2
"#;

        let config: AppConfig = toml::from_str(toml_str).expect("parse partial config");
        assert_eq!(config.scanning.interface, "wlan2");
        assert_eq!(config.scanning.stale_after(), Some(Duration::from_secs(300)));
        assert_eq!(config.connection.max_retries, 2);
        // These should be defaults
        assert_eq!(config.scanning.interval_secs, 10);
        assert_eq!(
            config.scanning.locator_interval(),
            Duration::from_millis(800)
        );
        assert_eq!(config.connection.min_signal_dbm, -80);
    }
}
