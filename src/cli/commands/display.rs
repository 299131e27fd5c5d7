//! Report rendering shared by commands.

use crate::capabilities::{CheckResult, ObservedState, RemediationOutcome};
use crate::reconcile::{status_line, Report, NO_AUTOMATIC_FIX};
use crate::ui::{OutputMode, UserInterface};

/// Render a finished report.
///
/// Spinners already printed one line per check in normal and verbose mode,
/// so quiet mode repeats only the problems and verbose mode adds the
/// descriptions and raw outcomes.
pub fn show_report(report: &Report, ui: &mut dyn UserInterface) {
    match ui.output_mode() {
        OutputMode::Quiet => {
            for result in report.problems() {
                show_problem(result, ui);
            }
        }
        OutputMode::Verbose => {
            ui.message("");
            for result in &report.results {
                ui.message(&format!(
                    "  {:<22} {:<8} {:<14} {}",
                    result.name, result.observed, result.remediation, result.description
                ));
            }
        }
        OutputMode::Normal | OutputMode::Silent => {}
    }

    ui.message("");
    show_summary(report, ui);
    show_hints(report, ui);
}

fn show_problem(result: &CheckResult, ui: &mut dyn UserInterface) {
    let line = status_line(result);
    if result.final_state() == ObservedState::Missing && !result.remediation_attempted {
        ui.warning(&line);
    } else {
        ui.error(&line);
    }
}

/// One line with the counts, styled by overall health.
pub fn show_summary(report: &Report, ui: &mut dyn UserInterface) {
    let summary = report.summary();
    let line = format!(
        "{}/{} present on {} ({} fixed, {} missing, {} failed, {} errors)",
        summary.present,
        summary.total,
        report.target.name,
        summary.fixed,
        summary.missing,
        summary.failed,
        summary.errors
    );

    if report.is_healthy() {
        ui.success(&line);
    } else if summary.errors > 0 || summary.failed > 0 {
        ui.error(&line);
    } else {
        ui.warning(&line);
    }
}

fn show_hints(report: &Report, ui: &mut dyn UserInterface) {
    let fixable_missing = report.results.iter().any(|r| {
        r.final_state() == ObservedState::Missing
            && r.remediation == RemediationOutcome::NotAttempted
            && r.detail.is_none()
    });
    if !report.auto_fix && fixable_missing {
        ui.show_hint("Run `vmdesk doctor --fix` to install what is missing");
    }

    let password_unfixed = report
        .get("vnc-password")
        .is_some_and(|r| r.detail.as_deref() == Some(NO_AUTOMATIC_FIX));
    if password_unfixed {
        ui.show_hint("Set VMDESK_VNC_PASSWORD to let --fix set the VNC password");
    }

    if report.results.iter().any(|r| r.final_state() == ObservedState::Error) {
        ui.show_hint("Rerun with --debug to see the commands that failed");
    }
}
