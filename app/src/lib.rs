//! WiMap application shell.
//!
//! Thin layer over the `crates/` libraries: the [`WifiService`] facade and
//! tracing setup for the `wimap` binary.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod error;
pub mod service;

// Re-export commonly used types
pub use error::{Result, ServiceError};
pub use service::WifiService;

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins over `default_filter`. Call once per process.
pub fn init_tracing(default_filter: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}
