//! Pure state machine for the credential search.
//!
//! [`TrialMachine`] decides what happens next and never performs I/O or
//! waits; the engine drives it, performing each planned attempt and
//! feeding back the result. This keeps the retry bound, the backoff rule
//! and the terminal outcomes testable without a clock.

use crate::connector::AttemptResult;
use crate::outcome::TrialOutcome;
use crate::settings::TrialSettings;
use crate::target::TrialTarget;
use std::time::Duration;
use wimap_core::{Credential, SecurityClass};

/// One attempt the engine should make.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptPlan {
    /// Credential to try
    pub credential: Credential,
    /// Zero-based index of the candidate
    pub candidate: usize,
    /// Number of candidates in the search
    pub candidate_count: usize,
    /// One-based attempt number for this candidate
    pub attempt: u32,
    /// Attempts allowed per candidate
    pub max_retries: u32,
    /// Wait before the attempt (backoff between retries)
    pub delay: Duration,
}

impl AttemptPlan {
    /// Progress line, e.g. "trying credential 2/5, attempt 1/3".
    #[must_use]
    pub fn progress_message(&self) -> String {
        format!(
            "trying credential {}/{}, attempt {}/{}",
            self.candidate + 1,
            self.candidate_count,
            self.attempt,
            self.max_retries
        )
    }

    /// Notice published before a backoff, `None` when there is no wait.
    #[must_use]
    pub fn retry_notice(&self) -> Option<String> {
        (!self.delay.is_zero()).then(|| {
            format!(
                "credential {}/{} rejected, retrying in {:?}",
                self.candidate + 1,
                self.candidate_count,
                self.delay
            )
        })
    }
}

/// What the engine should do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrialStep {
    /// Make this attempt
    Attempt(AttemptPlan),
    /// The search is over
    Done(TrialOutcome),
}

/// Credential search state: current candidate, attempt counter, outcome.
#[derive(Debug, Clone)]
pub struct TrialMachine {
    candidates: Vec<Credential>,
    settings: TrialSettings,
    candidate: usize,
    attempt: u32,
    completed: u32,
    outcome: Option<TrialOutcome>,
}

impl TrialMachine {
    /// Prepare a search over `candidates`, tried in order.
    #[must_use]
    pub fn new(candidates: Vec<Credential>, settings: TrialSettings) -> Self {
        Self {
            candidates,
            settings: TrialSettings {
                max_retries: settings.max_retries.max(1),
                ..settings
            },
            candidate: 0,
            attempt: 0,
            completed: 0,
            outcome: None,
        }
    }

    /// Check preconditions and plan the first attempt.
    ///
    /// Weak signal, open network and an empty candidate set end the search
    /// before any attempt, in that order.
    pub fn begin(&mut self, target: &TrialTarget) -> TrialStep {
        if let Some(outcome) = &self.outcome {
            return TrialStep::Done(outcome.clone());
        }

        if target.rssi < self.settings.min_signal_dbm {
            return self.finish(TrialOutcome::WeakSignal {
                rssi: target.rssi,
                threshold: self.settings.min_signal_dbm,
            });
        }
        if target.security == SecurityClass::Open {
            return self.finish(TrialOutcome::OpenNetwork);
        }
        if self.candidates.is_empty() {
            return self.finish(TrialOutcome::ManualEntryRequired);
        }

        self.candidate = 0;
        self.attempt = 1;
        self.plan(Duration::ZERO)
    }

    /// Feed back the result of the planned attempt.
    pub fn record(&mut self, result: AttemptResult) -> TrialStep {
        if let Some(outcome) = &self.outcome {
            return TrialStep::Done(outcome.clone());
        }

        self.completed += 1;

        if result.is_accepted() {
            let credential = self.candidates[self.candidate].clone();
            return self.finish(TrialOutcome::Connected {
                credential,
                attempts: self.completed,
            });
        }

        if self.attempt < self.settings.max_retries {
            self.attempt += 1;
            return self.plan(self.settings.retry_backoff);
        }

        if self.candidate + 1 < self.candidates.len() {
            self.candidate += 1;
            self.attempt = 1;
            return self.plan(Duration::ZERO);
        }

        self.finish(TrialOutcome::AllFailed {
            attempts: self.completed,
        })
    }

    /// Abandon the search.
    pub fn cancel(&mut self) -> TrialOutcome {
        if let Some(outcome) = &self.outcome {
            return outcome.clone();
        }
        let outcome = TrialOutcome::Cancelled {
            attempts: self.completed,
        };
        self.outcome = Some(outcome.clone());
        outcome
    }

    /// Attempts completed so far.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.completed
    }

    /// Upper bound on attempts for this search.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        u32::try_from(self.candidates.len())
            .unwrap_or(u32::MAX)
            .saturating_mul(self.settings.max_retries)
    }

    /// The terminal outcome, once reached.
    #[must_use]
    pub fn outcome(&self) -> Option<&TrialOutcome> {
        self.outcome.as_ref()
    }

    fn plan(&self, delay: Duration) -> TrialStep {
        TrialStep::Attempt(AttemptPlan {
            credential: self.candidates[self.candidate].clone(),
            candidate: self.candidate,
            candidate_count: self.candidates.len(),
            attempt: self.attempt,
            max_retries: self.settings.max_retries,
            delay,
        })
    }

    fn finish(&mut self, outcome: TrialOutcome) -> TrialStep {
        self.outcome = Some(outcome.clone());
        TrialStep::Done(outcome)
    }
}
