//! Per-check outcome types.
//!
//! Each check produces a [`CheckResult`] recording what the first probe
//! saw and what remediation, if any, did about it.

use serde::Serialize;
use std::fmt;

/// What the first probe observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObservedState {
    Present,
    Missing,
    /// The probe could not run.
    Error,
}

/// Outcome of the fix action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RemediationOutcome {
    Succeeded,
    Failed,
    NotAttempted,
}

impl fmt::Display for ObservedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            ObservedState::Present => "PRESENT",
            ObservedState::Missing => "MISSING",
            ObservedState::Error => "ERROR",
        })
    }
}

impl fmt::Display for RemediationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            RemediationOutcome::Succeeded => "SUCCEEDED",
            RemediationOutcome::Failed => "FAILED",
            RemediationOutcome::NotAttempted => "NOT_ATTEMPTED",
        })
    }
}

/// The result of one capability check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub description: String,
    pub observed: ObservedState,
    pub remediation_attempted: bool,
    pub remediation: RemediationOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl CheckResult {
    pub fn new(name: &str, description: &str, observed: ObservedState) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            observed,
            remediation_attempted: false,
            remediation: RemediationOutcome::NotAttempted,
            detail: None,
        }
    }

    /// Record a remediation attempt.
    pub fn remediated(mut self, outcome: RemediationOutcome) -> Self {
        self.remediation_attempted = true;
        self.remediation = outcome;
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// State of the capability after the run.
    ///
    /// PRESENT if it was there or a fix put it there, ERROR if the probe
    /// could not run, MISSING otherwise.
    pub fn final_state(&self) -> ObservedState {
        match (self.observed, self.remediation) {
            (ObservedState::Present, _) => ObservedState::Present,
            (_, RemediationOutcome::Succeeded) => ObservedState::Present,
            (ObservedState::Error, _) => ObservedState::Error,
            (ObservedState::Missing, _) => ObservedState::Missing,
        }
    }

    pub fn is_present(&self) -> bool {
        self.final_state() == ObservedState::Present
    }
}
