//! Core error types for WiMap.
//!
//! This module defines the central error type shared by every subsystem.
//! Subsystem crates keep their own error enums and convert into this one at
//! the service boundary.

use thiserror::Error;

/// Central error type for WiMap operations.
#[derive(Error, Debug)]
pub enum WimapError {
    /// Configuration errors (file loading, parsing, validation)
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Radio scan errors (scan rejected, radio unavailable)
    #[error("scan error: {0}")]
    Scan(String),

    /// Credential storage errors (vault locked, database failure)
    #[error("credential store error: {0}")]
    CredentialStore(String),

    /// Connection errors (connector process failure)
    #[error("connection error: {0}")]
    Connection(String),

    /// Validation errors (invalid input, constraints)
    #[error("validation error: {0}")]
    Validation(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to determine config directory path
    #[error("could not determine config directory (XDG base directories not available)")]
    NoConfigDir,

    /// Failed to parse TOML
    #[error("failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config
    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// I/O error reading/writing config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Reason for invalidity
        reason: String,
    },
}

/// Result type alias using `WimapError`.
pub type Result<T> = std::result::Result<T, WimapError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WimapError::Validation("bad bssid".to_string());
        assert_eq!(err.to_string(), "validation error: bad bssid");

        let err = ConfigError::InvalidValue {
            field: "scanning.interval_secs".to_string(),
            reason: "must be positive".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid config value for scanning.interval_secs: must be positive"
        );
    }

    #[test]
    fn test_error_from_config() {
        let wimap_err: WimapError = ConfigError::NoConfigDir.into();
        assert!(matches!(wimap_err, WimapError::Config(_)));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let wimap_err: WimapError = io_err.into();
        assert!(matches!(wimap_err, WimapError::Io(_)));
    }
}
