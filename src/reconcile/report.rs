//! The ordered outcome of one reconciliation run.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::capabilities::{CheckResult, ObservedState, RemediationOutcome};
use crate::error::Result;
use crate::target::Target;

/// Results for every check, in the order the checks were given.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub target: Target,
    pub auto_fix: bool,
    pub generated_at: DateTime<Utc>,
    pub results: Vec<CheckResult>,
}

/// Counts over a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub total: usize,
    /// Final state PRESENT, fixed ones included.
    pub present: usize,
    /// Missing on first probe and fixed.
    pub fixed: usize,
    /// Final state MISSING.
    pub missing: usize,
    /// Fixes attempted that did not succeed.
    pub failed: usize,
    /// Final state ERROR.
    pub errors: usize,
}

#[derive(Serialize)]
struct ReportDocument<'a> {
    #[serde(flatten)]
    report: &'a Report,
    healthy: bool,
    summary: ReportSummary,
}

impl Report {
    pub fn new(target: Target, auto_fix: bool) -> Self {
        Self {
            target,
            auto_fix,
            generated_at: Utc::now(),
            results: Vec::new(),
        }
    }

    pub fn push(&mut self, result: CheckResult) {
        self.results.push(result);
    }

    /// Look up a result by check name.
    pub fn get(&self, name: &str) -> Option<&CheckResult> {
        self.results.iter().find(|r| r.name == name)
    }

    /// Whether every capability is present at the end of the run.
    pub fn is_healthy(&self) -> bool {
        self.results.iter().all(CheckResult::is_present)
    }

    /// 0 when healthy, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.is_healthy() {
            0
        } else {
            1
        }
    }

    /// Results whose final state is not PRESENT.
    pub fn problems(&self) -> impl Iterator<Item = &CheckResult> {
        self.results.iter().filter(|r| !r.is_present())
    }

    pub fn summary(&self) -> ReportSummary {
        let mut summary = ReportSummary {
            total: self.results.len(),
            ..Default::default()
        };
        for result in &self.results {
            match result.final_state() {
                ObservedState::Present => summary.present += 1,
                ObservedState::Missing => summary.missing += 1,
                ObservedState::Error => summary.errors += 1,
            }
            match result.remediation {
                RemediationOutcome::Succeeded => summary.fixed += 1,
                RemediationOutcome::Failed => summary.failed += 1,
                RemediationOutcome::NotAttempted => {}
            }
        }
        summary
    }

    /// Pretty JSON including the summary.
    pub fn to_json(&self) -> Result<String> {
        let document = ReportDocument {
            report: self,
            healthy: self.is_healthy(),
            summary: self.summary(),
        };
        serde_json::to_string_pretty(&document).map_err(|e| anyhow::Error::from(e).into())
    }
}

/// One-line description of a result, e.g. `xrdp-service fixed`.
pub fn status_line(result: &CheckResult) -> String {
    let state = match (result.observed, result.remediation) {
        (ObservedState::Present, _) => "present",
        (_, RemediationOutcome::Succeeded) => "fixed",
        (ObservedState::Missing, RemediationOutcome::Failed) => "fix failed",
        (ObservedState::Missing, RemediationOutcome::NotAttempted) => "missing",
        (ObservedState::Error, RemediationOutcome::Failed) => "error during fix",
        (ObservedState::Error, RemediationOutcome::NotAttempted) => "error",
    };
    match &result.detail {
        Some(detail) => format!("{} {} ({})", result.name, state, detail),
        None => format!("{} {}", result.name, state),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::HostStatus;

    fn target() -> Target {
        Target {
            project: "p".to_string(),
            name: "desk".to_string(),
            zone: "z".to_string(),
            address: Some("10.0.0.1".to_string()),
            status: HostStatus::Running,
        }
    }

    fn result(name: &str, observed: ObservedState) -> CheckResult {
        CheckResult::new(name, "", observed)
    }

    #[test]
    fn empty_report_is_healthy() {
        let report = Report::new(target(), false);
        assert!(report.is_healthy());
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn all_present_exits_zero() {
        let mut report = Report::new(target(), true);
        report.push(result("ssh", ObservedState::Present));
        report.push(result("xrdp", ObservedState::Missing).remediated(RemediationOutcome::Succeeded));
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn any_missing_exits_one() {
        let mut report = Report::new(target(), false);
        report.push(result("ssh", ObservedState::Present));
        report.push(result("xrdp", ObservedState::Missing));
        assert_eq!(report.exit_code(), 1);
        let problems: Vec<_> = report.problems().map(|r| r.name.as_str()).collect();
        assert_eq!(problems, vec!["xrdp"]);
    }

    #[test]
    fn any_error_exits_one() {
        let mut report = Report::new(target(), false);
        report.push(result("ssh", ObservedState::Error));
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn summary_counts() {
        let mut report = Report::new(target(), true);
        report.push(result("a", ObservedState::Present));
        report.push(result("b", ObservedState::Missing).remediated(RemediationOutcome::Succeeded));
        report.push(result("c", ObservedState::Missing).remediated(RemediationOutcome::Failed));
        report.push(result("d", ObservedState::Error).remediated(RemediationOutcome::Failed));
        report.push(result("e", ObservedState::Missing));

        let summary = report.summary();
        assert_eq!(summary.total, 5);
        assert_eq!(summary.present, 2);
        assert_eq!(summary.fixed, 1);
        assert_eq!(summary.missing, 2);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.errors, 1);
    }

    #[test]
    fn json_has_results_in_order_and_summary() {
        let mut report = Report::new(target(), false);
        report.push(result("ssh", ObservedState::Present));
        report.push(result("xrdp", ObservedState::Missing));
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(json["target"]["name"], "desk");
        assert_eq!(json["target"]["status"], "RUNNING");
        assert_eq!(json["auto_fix"], false);
        assert_eq!(json["healthy"], false);
        assert_eq!(json["results"][0]["name"], "ssh");
        assert_eq!(json["results"][1]["observed"], "MISSING");
        assert_eq!(json["summary"]["missing"], 1);
        assert!(json["generated_at"].is_string());
    }

    #[test]
    fn status_lines() {
        assert_eq!(status_line(&result("ssh", ObservedState::Present)), "ssh present");
        assert_eq!(
            status_line(&result("x", ObservedState::Missing).remediated(RemediationOutcome::Succeeded)),
            "x fixed"
        );
        assert_eq!(
            status_line(&result("x", ObservedState::Missing).with_detail("no automatic fix")),
            "x missing (no automatic fix)"
        );
        assert_eq!(
            status_line(&result("x", ObservedState::Error).remediated(RemediationOutcome::Failed)),
            "x error during fix"
        );
    }
}
