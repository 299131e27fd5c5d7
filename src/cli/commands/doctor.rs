//! The `vmdesk doctor` command.
//!
//! Resolves the target VM, reconciles the capability catalog against it and
//! maps the report to an exit code:
//!
//! - 0 when every capability ends up present
//! - 1 when anything is missing, failed or errored
//! - 2 when no target could be resolved

use crate::capabilities::{build_catalog, select, CapabilityCheck, Timeouts};
use crate::cli::args::DoctorArgs;
use crate::config::VmdeskConfig;
use crate::error::{Result, VmdeskError};
use crate::reconcile::{Reconciler, Report};
use crate::target::{ResolveOptions, Target, TargetResolver};
use crate::ui::{NonInteractiveUI, OutputMode, UserInterface};

use super::dispatcher::{require_project, Backends, Command, CommandResult};
use super::display;

/// Exit code when the target cannot be resolved.
pub const EXIT_NO_TARGET: i32 = 2;

/// The doctor command implementation.
pub struct DoctorCommand {
    config: VmdeskConfig,
    args: DoctorArgs,
    backends: Backends,
}

impl DoctorCommand {
    /// Create a doctor command talking to the real cloud and ssh.
    pub fn new(config: VmdeskConfig, args: DoctorArgs) -> Self {
        let backends = Backends::from_config(&config);
        Self::with_backends(config, args, backends)
    }

    /// Create a doctor command with explicit collaborators.
    pub fn with_backends(config: VmdeskConfig, args: DoctorArgs, backends: Backends) -> Self {
        Self {
            config,
            args,
            backends,
        }
    }

    fn resolve_options(&self, project: String) -> ResolveOptions {
        ResolveOptions {
            project,
            host: self.args.host.clone(),
            zone: self.args.zone.clone().or_else(|| self.config.zone.clone()),
            name_pattern: self.config.name_pattern.clone(),
            start: self.args.start,
        }
    }

    fn checks(&self) -> Result<Vec<CapabilityCheck>> {
        let password = self
            .args
            .vnc_password
            .as_deref()
            .or(self.config.desktop.vnc_password.as_deref())
            .filter(|p| !p.is_empty());
        let catalog = build_catalog(&self.config, password)?;
        select(catalog, &self.args.only, &self.args.skip)
    }

    fn reconcile(&self, target: &Target, checks: &[CapabilityCheck], ui: &mut dyn UserInterface) -> Report {
        let reconciler = Reconciler::new(
            self.backends.shell.as_ref(),
            self.backends.cloud.as_ref(),
            Timeouts::from_config(&self.config.ssh),
        );

        if self.args.json {
            let mut silent = NonInteractiveUI::new(OutputMode::Silent);
            reconciler.reconcile(target, checks, self.args.fix, &mut silent)
        } else {
            reconciler.reconcile(target, checks, self.args.fix, ui)
        }
    }
}

impl Command for DoctorCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let project = require_project(&self.config)?;
        let checks = self.checks()?;
        let options = self.resolve_options(project);

        let target = match TargetResolver::new(self.backends.cloud.as_ref()).resolve(&options) {
            Ok(target) => target,
            Err(VmdeskError::NotFound { message }) => {
                ui.error(&format!("No target VM: {}", message));
                ui.show_hint("Pass --host NAME, or set name_pattern in .vmdesk/config.yml");
                return Ok(CommandResult::failure(EXIT_NO_TARGET));
            }
            Err(e) => return Err(e),
        };

        if !self.args.json {
            let mode = if self.args.fix { "fixing" } else { "checking" };
            ui.show_header(&format!("vmdesk doctor: {} {}", mode, target));
        }

        let report = self.reconcile(&target, &checks, ui);

        if self.args.json {
            ui.message(&report.to_json()?);
        } else {
            display::show_report(&report, ui);
        }

        Ok(CommandResult {
            success: report.is_healthy(),
            exit_code: report.exit_code(),
        })
    }
}
