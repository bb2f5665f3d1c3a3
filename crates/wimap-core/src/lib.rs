//! WiMap Core - Foundation crate for the WiMap network mapper.
//!
//! This crate provides the shared types, error handling and configuration
//! that the scanning, connection and storage crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Shared newtypes and enums (`Bssid`, `Credential`, `SecurityClass`, `GeoPoint`, `Timestamp`)
//!
//! # Example
//!
//! ```rust
//! use wimap_core::{AppConfig, Bssid, SecurityClass};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default().validated();
//! assert_eq!(config.scanning.interval_secs, 10);
//!
//! let bssid = Bssid::new("AA:BB:CC:DD:EE:FF")?;
//! assert_eq!(bssid.as_str(), "aa:bb:cc:dd:ee:ff");
//!
//! assert_eq!(SecurityClass::from_capabilities("[WPA2-PSK-CCMP][ESS]"), SecurityClass::Wpa2);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{AppConfig, ConnectionConfig, GeneralConfig, ScanningConfig, VaultConfig};
pub use error::{ConfigError, ConfigResult, Result, WimapError};
pub use types::{channel_from_frequency, Bssid, Credential, GeoPoint, SecurityClass, Timestamp};
