//! Connector implementations.

pub mod nmcli;
pub mod simulated;

pub use nmcli::NmcliConnector;
pub use simulated::SimulatedConnector;
