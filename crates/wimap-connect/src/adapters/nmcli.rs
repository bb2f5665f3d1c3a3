//! NetworkManager connector backed by `nmcli`.
//!
//! Each attempt runs `nmcli --wait <secs> device wifi connect <bssid>
//! password <credential>`. Exit status 0 means the network accepted the
//! credential. The credential is passed as an argument and never logged.

use crate::connector::{AttemptResult, Connector};
use crate::target::TrialTarget;
use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;
use wimap_core::Credential;

/// Connector that drives NetworkManager.
#[derive(Debug, Clone)]
pub struct NmcliConnector {
    binary: String,
    interface: Option<String>,
}

impl NmcliConnector {
    /// Connector using `nmcli` from `PATH` on any wireless interface.
    #[must_use]
    pub fn new() -> Self {
        Self {
            binary: "nmcli".to_string(),
            interface: None,
        }
    }

    /// Bind attempts to one interface.
    #[must_use]
    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interface = Some(interface.into());
        self
    }

    /// Use a different `nmcli` executable.
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    fn connect_args(
        &self,
        target: &TrialTarget,
        credential: &Credential,
        timeout: Duration,
    ) -> Vec<String> {
        let mut args = vec![
            "--wait".to_string(),
            timeout.as_secs().max(1).to_string(),
            "device".to_string(),
            "wifi".to_string(),
            "connect".to_string(),
            target.bssid.to_string(),
            "password".to_string(),
            credential.expose().to_string(),
        ];
        if let Some(interface) = &self.interface {
            args.push("ifname".to_string());
            args.push(interface.clone());
        }
        args
    }
}

impl Default for NmcliConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for NmcliConnector {
    fn name(&self) -> &str {
        "nmcli"
    }

    async fn attempt(
        &self,
        target: &TrialTarget,
        credential: &Credential,
        timeout: Duration,
    ) -> AttemptResult {
        let output = Command::new(&self.binary)
            .args(self.connect_args(target, credential, timeout))
            .kill_on_drop(true)
            .output()
            .await;

        match output {
            Ok(output) if output.status.success() => AttemptResult::Accepted,
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                tracing::debug!("nmcli refused {}: {}", target, stderr.trim());
                classify_failure(&stderr)
            }
            Err(e) => {
                tracing::warn!("Failed to run {}: {}", self.binary, e);
                AttemptResult::Rejected
            }
        }
    }

    async fn release(&self, target: &TrialTarget) {
        if target.ssid.trim().is_empty() {
            return;
        }
        let result = Command::new(&self.binary)
            .args(["connection", "delete", "id", target.ssid.as_str()])
            .kill_on_drop(true)
            .output()
            .await;
        match result {
            Ok(output) if output.status.success() => {
                tracing::debug!("Removed connection profile for {}", target);
            }
            Ok(_) => tracing::debug!("No connection profile to remove for {}", target),
            Err(e) => tracing::warn!("Failed to release {}: {}", target, e),
        }
    }
}

fn classify_failure(stderr: &str) -> AttemptResult {
    if stderr.contains("Timeout") || stderr.contains("timed out") {
        AttemptResult::TimedOut
    } else {
        AttemptResult::Rejected
    }
}
