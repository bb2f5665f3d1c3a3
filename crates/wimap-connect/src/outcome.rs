//! Terminal results of a credential trial and the events observers see.

use std::fmt;
use wimap_core::{Bssid, Credential};

/// How a trial ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrialOutcome {
    /// A credential was accepted
    Connected {
        /// The working credential
        credential: Credential,
        /// Attempts made, including the successful one
        attempts: u32,
    },
    /// Every candidate was rejected; manual entry is needed
    AllFailed {
        /// Attempts made
        attempts: u32,
    },
    /// The target was too weak to try
    WeakSignal {
        /// Target signal in dBm
        rssi: i32,
        /// Configured minimum in dBm
        threshold: i32,
    },
    /// The target needs no credential
    OpenNetwork,
    /// There was nothing to try; manual entry is needed
    ManualEntryRequired,
    /// The trial was cancelled
    Cancelled {
        /// Attempts completed before cancellation
        attempts: u32,
    },
}

impl TrialOutcome {
    /// True when a credential worked.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    /// True when the caller should ask the user for a credential.
    #[must_use]
    pub fn requires_manual_entry(&self) -> bool {
        matches!(self, Self::AllFailed { .. } | Self::ManualEntryRequired)
    }

    /// Connection attempts made.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Connected { attempts, .. }
            | Self::AllFailed { attempts }
            | Self::Cancelled { attempts } => *attempts,
            Self::WeakSignal { .. } | Self::OpenNetwork | Self::ManualEntryRequired => 0,
        }
    }
}

impl fmt::Display for TrialOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected {
                credential,
                attempts,
            } => write!(f, "connected with {} after {attempts} attempts", credential.masked()),
            Self::AllFailed { attempts } => write!(
                f,
                "all credentials failed after {attempts} attempts, manual entry required"
            ),
            Self::WeakSignal { rssi, threshold } => {
                write!(f, "signal too weak ({rssi} dBm < {threshold} dBm)")
            }
            Self::OpenNetwork => f.write_str("open network, no credential needed"),
            Self::ManualEntryRequired => {
                f.write_str("no candidate credentials, manual entry required")
            }
            Self::Cancelled { attempts } => write!(f, "cancelled after {attempts} attempts"),
        }
    }
}

/// Progress and completion events for connection observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Human-readable progress for an ongoing trial
    Progress {
        /// Target access point
        bssid: Bssid,
        /// Status line, e.g. "trying credential 2/5, attempt 1/3"
        message: String,
    },
    /// The trial ended
    Finished {
        /// Target access point
        bssid: Bssid,
        /// Terminal outcome
        outcome: TrialOutcome,
    },
}

impl ConnectionEvent {
    /// The access point the event concerns.
    #[must_use]
    pub fn bssid(&self) -> &Bssid {
        match self {
            Self::Progress { bssid, .. } | Self::Finished { bssid, .. } => bssid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_entry_outcomes() {
        assert!(TrialOutcome::AllFailed { attempts: 15 }.requires_manual_entry());
        assert!(TrialOutcome::ManualEntryRequired.requires_manual_entry());
        assert!(!TrialOutcome::OpenNetwork.requires_manual_entry());
        assert!(!TrialOutcome::Cancelled { attempts: 1 }.requires_manual_entry());
    }

    #[test]
    fn test_display_masks_credential() {
        let outcome = TrialOutcome::Connected {
            credential: Credential::new("supersecret"),
            attempts: 5,
        };
        let text = outcome.to_string();
        assert!(!text.contains("supersecret"));
        assert!(text.ends_with("after 5 attempts"));
        assert!(outcome.is_success());
        assert_eq!(outcome.attempts(), 5);
    }

    #[test]
    fn test_weak_signal_text() {
        let outcome = TrialOutcome::WeakSignal {
            rssi: -85,
            threshold: -80,
        };
        assert_eq!(outcome.to_string(), "signal too weak (-85 dBm < -80 dBm)");
        assert_eq!(outcome.attempts(), 0);
    }
}
