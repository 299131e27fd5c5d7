//! Probe, fix and re-probe each check in order.
//!
//! Per check:
//!
//! 1. Probe. PRESENT is recorded as is.
//! 2. MISSING without auto-fix, or without a fix action, is recorded as is.
//! 3. Otherwise run the fix, then probe again: PRESENT means SUCCEEDED,
//!    still MISSING means FAILED.
//!
//! A probe that cannot run is ERROR / NOT_ATTEMPTED. A fix or re-probe that
//! cannot run is ERROR / FAILED. Nothing stops the run.

use crate::capabilities::{
    CapabilityCheck, CapabilityProber, CheckResult, FixRunner, ObservedState, Presence,
    RemediationOutcome, Timeouts,
};
use crate::cloud::ControlPlane;
use crate::reconcile::report::{status_line, Report};
use crate::remote::RemoteShell;
use crate::target::Target;
use crate::ui::{SpinnerHandle, UserInterface};

pub const NO_AUTOMATIC_FIX: &str = "no automatic fix";

/// Drives checks against one target.
pub struct Reconciler<'a> {
    prober: CapabilityProber<'a>,
    fixer: FixRunner<'a>,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        shell: &'a dyn RemoteShell,
        cloud: &'a dyn ControlPlane,
        timeouts: Timeouts,
    ) -> Self {
        Self {
            prober: CapabilityProber::new(shell, cloud, timeouts.probe),
            fixer: FixRunner::new(shell, cloud, timeouts.fix),
        }
    }

    /// Run every check in order and collect the results.
    pub fn reconcile(
        &self,
        target: &Target,
        checks: &[CapabilityCheck],
        auto_fix: bool,
        ui: &mut dyn UserInterface,
    ) -> Report {
        let mut report = Report::new(target.clone(), auto_fix);

        for check in checks {
            let mut spinner = ui.start_spinner(&format!("Checking {}", check.name));
            let result = self.run_check(target, check, auto_fix, spinner.as_mut());
            finish(spinner.as_mut(), &result);
            report.push(result);
        }

        report
    }

    fn run_check(
        &self,
        target: &Target,
        check: &CapabilityCheck,
        auto_fix: bool,
        spinner: &mut dyn SpinnerHandle,
    ) -> CheckResult {
        let record = |observed| CheckResult::new(&check.name, &check.description, observed);

        let first = match self.prober.probe(target, check) {
            Ok(presence) => presence,
            Err(e) => {
                tracing::warn!("Probe for {} could not run: {}", check.name, e);
                return record(ObservedState::Error).with_detail(e.to_string());
            }
        };

        if first == Presence::Present {
            return record(ObservedState::Present);
        }
        if !auto_fix {
            return record(ObservedState::Missing);
        }
        let Some(fix) = &check.fix else {
            return record(ObservedState::Missing).with_detail(NO_AUTOMATIC_FIX);
        };

        spinner.set_message(&format!("Fixing {}", check.name));
        tracing::info!("Applying fix for {} on {}", check.name, target.name);
        let fix_message = match self.fixer.apply(target, fix) {
            Ok(output) if output.success => None,
            Ok(output) => {
                let message = output.message.unwrap_or_else(|| "non-zero exit".to_string());
                tracing::warn!("Fix for {} exited unsuccessfully: {}", check.name, message);
                Some(message)
            }
            Err(e) => {
                tracing::warn!("Fix for {} could not run: {}", check.name, e);
                return record(ObservedState::Error)
                    .remediated(RemediationOutcome::Failed)
                    .with_detail(e.to_string());
            }
        };

        spinner.set_message(&format!("Re-checking {}", check.name));
        match self.prober.probe(target, check) {
            Ok(Presence::Present) => {
                tracing::info!("Fixed {}", check.name);
                record(ObservedState::Missing).remediated(RemediationOutcome::Succeeded)
            }
            Ok(Presence::Missing) => {
                let result = record(ObservedState::Missing).remediated(RemediationOutcome::Failed);
                result.with_detail(
                    fix_message.unwrap_or_else(|| "still missing after fix".to_string()),
                )
            }
            Err(e) => {
                tracing::warn!("Re-probe for {} could not run: {}", check.name, e);
                record(ObservedState::Error)
                    .remediated(RemediationOutcome::Failed)
                    .with_detail(e.to_string())
            }
        }
    }
}

fn finish(spinner: &mut dyn SpinnerHandle, result: &CheckResult) {
    let line = status_line(result);
    match result.final_state() {
        ObservedState::Present => spinner.finish_success(&line),
        ObservedState::Missing if !result.remediation_attempted => spinner.finish_warning(&line),
        _ => spinner.finish_error(&line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::FixAction;
    use crate::cloud::{HostStatus, MockControlPlane};
    use crate::remote::{MockReply, MockShell};
    use crate::ui::{MockUI, SpinnerStatus};

    fn target() -> Target {
        Target {
            project: "p".to_string(),
            name: "desk".to_string(),
            zone: "z".to_string(),
            address: None,
            status: HostStatus::Running,
        }
    }

    fn checks() -> Vec<CapabilityCheck> {
        vec![
            CapabilityCheck::remote("ssh", "SSH reachable", "probe-ssh"),
            CapabilityCheck::remote("service-x", "Service X running", "probe-x")
                .with_script("fix-x"),
        ]
    }

    fn run(shell: &MockShell, checks: &[CapabilityCheck], auto_fix: bool) -> Report {
        let cloud = MockControlPlane::new();
        let mut ui = MockUI::new();
        Reconciler::new(shell, &cloud, Timeouts::default()).reconcile(&target(), checks, auto_fix, &mut ui)
    }

    fn outcome(report: &Report, name: &str) -> (ObservedState, RemediationOutcome) {
        let r = report.get(name).unwrap();
        (r.observed, r.remediation)
    }

    #[test]
    fn missing_service_is_fixed() {
        let shell = MockShell::new()
            .reply("probe-x", MockReply::Exit(1))
            .installs("fix-x", "probe-x");
        let report = run(&shell, &checks(), true);

        assert_eq!(
            outcome(&report, "ssh"),
            (ObservedState::Present, RemediationOutcome::NotAttempted)
        );
        assert_eq!(
            outcome(&report, "service-x"),
            (ObservedState::Missing, RemediationOutcome::Succeeded)
        );
        assert_eq!(report.get("service-x").unwrap().final_state(), ObservedState::Present);
        assert_eq!(shell.commands(), vec!["probe-ssh", "probe-x", "fix-x", "probe-x"]);
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn without_auto_fix_nothing_is_attempted() {
        let shell = MockShell::new().reply("probe-x", MockReply::Exit(1));
        let report = run(&shell, &checks(), false);

        assert_eq!(
            outcome(&report, "service-x"),
            (ObservedState::Missing, RemediationOutcome::NotAttempted)
        );
        assert!(report.results.iter().all(|r| !r.remediation_attempted));
        assert_eq!(shell.count("fix-x"), 0);
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn present_check_never_runs_fix() {
        let shell = MockShell::new();
        let report = run(&shell, &checks(), true);
        assert_eq!(shell.count("fix-x"), 0);
        assert!(report.is_healthy());
    }

    #[test]
    fn second_run_after_fix_is_idempotent() {
        let shell = MockShell::new()
            .reply("probe-x", MockReply::Exit(1))
            .installs("fix-x", "probe-x");
        run(&shell, &checks(), true);
        let second = run(&shell, &checks(), true);

        for result in &second.results {
            assert_eq!(result.observed, ObservedState::Present);
            assert_eq!(result.remediation, RemediationOutcome::NotAttempted);
        }
        assert_eq!(shell.count("fix-x"), 1);
    }

    #[test]
    fn fix_that_does_not_help_is_failed() {
        let shell = MockShell::new()
            .reply("probe-x", MockReply::Exit(1))
            .reply("fix-x", MockReply::Exit(100));
        let report = run(&shell, &checks(), true);

        let result = report.get("service-x").unwrap();
        assert_eq!(result.remediation, RemediationOutcome::Failed);
        assert!(result.remediation_attempted);
        assert_eq!(result.final_state(), ObservedState::Missing);
        assert_eq!(result.detail.as_deref(), Some("exit 100"));
    }

    #[test]
    fn nonzero_fix_exit_is_judged_by_reprobe() {
        let shell = MockShell::new()
            .replies("probe-x", vec![MockReply::Exit(1), MockReply::Exit(0)])
            .reply("fix-x", MockReply::Exit(2));
        let report = run(&shell, &checks(), true);
        assert_eq!(
            outcome(&report, "service-x"),
            (ObservedState::Missing, RemediationOutcome::Succeeded)
        );
    }

    #[test]
    fn missing_without_fix_action_says_so() {
        let shell = MockShell::new().reply("probe-ssh", MockReply::Exit(1));
        let report = run(&shell, &checks(), true);
        let ssh = report.get("ssh").unwrap();
        assert_eq!(ssh.remediation, RemediationOutcome::NotAttempted);
        assert!(!ssh.remediation_attempted);
        assert_eq!(ssh.detail.as_deref(), Some(NO_AUTOMATIC_FIX));
    }

    #[test]
    fn probe_error_is_recorded_and_run_continues() {
        let shell = MockShell::new()
            .reply("probe-ssh", MockReply::Unreachable)
            .reply("probe-x", MockReply::Exit(1))
            .installs("fix-x", "probe-x");
        let report = run(&shell, &checks(), true);

        assert_eq!(
            outcome(&report, "ssh"),
            (ObservedState::Error, RemediationOutcome::NotAttempted)
        );
        assert!(report.get("ssh").unwrap().detail.is_some());
        assert_eq!(
            outcome(&report, "service-x"),
            (ObservedState::Missing, RemediationOutcome::Succeeded)
        );
    }

    #[test]
    fn fix_error_is_error_failed() {
        let shell = MockShell::new()
            .reply("probe-x", MockReply::Exit(1))
            .reply("fix-x", MockReply::Unreachable);
        let report = run(&shell, &checks(), true);
        assert_eq!(
            outcome(&report, "service-x"),
            (ObservedState::Error, RemediationOutcome::Failed)
        );
        assert_eq!(shell.count("probe-x"), 1);
    }

    #[test]
    fn reprobe_error_is_error_failed() {
        let shell = MockShell::new().replies(
            "probe-x",
            vec![MockReply::Exit(1), MockReply::Unreachable],
        );
        let report = run(&shell, &checks(), true);
        assert_eq!(
            outcome(&report, "service-x"),
            (ObservedState::Error, RemediationOutcome::Failed)
        );
    }

    #[test]
    fn report_order_matches_input_order() {
        let checks: Vec<_> = ["c", "a", "b", "d"]
            .iter()
            .map(|n| CapabilityCheck::remote(n, "", format!("probe-{}", n)))
            .collect();
        let shell = MockShell::new().reply("probe-a", MockReply::Unreachable);
        let report = run(&shell, &checks, false);
        let names: Vec<_> = report.results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b", "d"]);
    }

    #[test]
    fn firewall_check_is_fixed_through_control_plane() {
        let rule = crate::cloud::FirewallRule {
            name: "vmdesk-allow-rdp".to_string(),
            port: 3389,
            source_range: "0.0.0.0/0".to_string(),
            target_tag: "remote-desktop".to_string(),
        };
        let checks = vec![CapabilityCheck::firewall("firewall-rdp", "", rule)];
        let shell = MockShell::new();
        let cloud = MockControlPlane::new().with_host("desk", "z", HostStatus::Running);
        let mut ui = MockUI::new();
        let report = Reconciler::new(&shell, &cloud, Timeouts::default())
            .reconcile(&target(), &checks, true, &mut ui);

        assert_eq!(
            outcome(&report, "firewall-rdp"),
            (ObservedState::Missing, RemediationOutcome::Succeeded)
        );
        assert!(cloud.has_rule("vmdesk-allow-rdp"));
        assert!(shell.commands().is_empty());
    }

    #[test]
    fn spinners_reflect_outcomes() {
        let shell = MockShell::new().reply("probe-x", MockReply::Exit(1));
        let cloud = MockControlPlane::new();
        let mut ui = MockUI::new();
        Reconciler::new(&shell, &cloud, Timeouts::default())
            .reconcile(&target(), &checks(), false, &mut ui);

        assert_eq!(
            ui.spinner_results(),
            vec![
                ("ssh present".to_string(), SpinnerStatus::Success),
                ("service-x missing".to_string(), SpinnerStatus::Warning),
            ]
        );
    }

    #[test]
    fn piped_fix_payload_reaches_remote() {
        let checks = vec![CapabilityCheck::remote("file", "", "probe-file").with_fix(
            FixAction::Piped {
                script: "install-file".to_string(),
                payload: crate::capabilities::Payload::file("contents"),
            },
        )];
        let shell = MockShell::new()
            .reply("probe-file", MockReply::Exit(1))
            .installs("install-file", "probe-file");
        let report = run(&shell, &checks, true);
        assert!(report.is_healthy());
        let install = shell
            .calls()
            .into_iter()
            .find(|c| c.command == "install-file")
            .unwrap();
        assert_eq!(install.stdin.as_deref(), Some("contents"));
    }
}
