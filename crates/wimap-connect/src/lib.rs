//! WiMap Connect - credential-trial connection engine.
//!
//! Given a target network and an ordered set of candidate credentials, the
//! engine tries each candidate a bounded number of times, with a fixed
//! backoff between retries of the same credential and a timeout on every
//! attempt. The first accepted credential is persisted and reported.
//!
//! # Features
//!
//! - Explicit, pure [`TrialMachine`] for the retry/backoff rules
//! - One trial per access point; duplicate requests are ignored
//! - Prompt cancellation at every wait
//! - Progress text and terminal outcomes on a broadcast channel
//! - `nmcli` connector for NetworkManager hosts and a simulated connector
//!
//! # Example
//!
//! ```rust
//! use wimap_connect::{
//!     AttemptResult, TrialMachine, TrialOutcome, TrialSettings, TrialStep, TrialTarget,
//! };
//! use wimap_core::{Bssid, Credential, SecurityClass};
//!
//! let target = TrialTarget::new(
//!     Bssid::new("aa:bb:cc:dd:ee:01").unwrap(),
//!     "Home",
//!     -55,
//!     SecurityClass::Wpa2,
//! );
//! let mut machine = TrialMachine::new(vec![Credential::new("letmein")], TrialSettings::default());
//!
//! let TrialStep::Attempt(plan) = machine.begin(&target) else { unreachable!() };
//! assert_eq!(plan.progress_message(), "trying credential 1/1, attempt 1/3");
//!
//! let step = machine.record(AttemptResult::Accepted);
//! assert!(matches!(step, TrialStep::Done(TrialOutcome::Connected { attempts: 1, .. })));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod adapters;
pub mod connector;
pub mod engine;
pub mod machine;
pub mod outcome;
pub mod settings;
pub mod target;

// Re-export commonly used types
pub use adapters::{NmcliConnector, SimulatedConnector};
pub use connector::{AttemptResult, Connector};
pub use engine::TrialEngine;
pub use machine::{AttemptPlan, TrialMachine, TrialStep};
pub use outcome::{ConnectionEvent, TrialOutcome};
pub use settings::TrialSettings;
pub use target::TrialTarget;
