//! Fix action execution.
//!
//! Payloads are written to a private local temp file that becomes the
//! remote command's stdin. The file is removed when the fix returns,
//! whether it succeeded or not.

use std::io::Write;
use std::time::Duration;

use crate::capabilities::check::{FixAction, Payload};
use crate::cloud::{ControlPlane, FirewallRule};
use crate::error::Result;
use crate::remote::{RemoteOutput, RemoteShell};
use crate::target::Target;

/// Result of running a fix that completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixOutput {
    pub success: bool,
    pub message: Option<String>,
}

impl FixOutput {
    fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    fn from_remote(output: RemoteOutput) -> Self {
        Self {
            success: output.success(),
            message: (!output.success()).then(|| match output.stderr_tail() {
                Some(tail) => format!("exit {}: {}", output.exit_code, tail),
                None => format!("exit {}", output.exit_code),
            }),
        }
    }
}

/// Applies fix actions to a target.
pub struct FixRunner<'a> {
    shell: &'a dyn RemoteShell,
    cloud: &'a dyn ControlPlane,
    timeout: Duration,
}

impl<'a> FixRunner<'a> {
    pub fn new(shell: &'a dyn RemoteShell, cloud: &'a dyn ControlPlane, timeout: Duration) -> Self {
        Self {
            shell,
            cloud,
            timeout,
        }
    }

    /// Run a fix. A fix that runs and exits non-zero is `Ok` with
    /// `success == false`; errors mean it could not run.
    pub fn apply(&self, target: &Target, fix: &FixAction) -> Result<FixOutput> {
        match fix {
            FixAction::Script(script) => {
                let output = self.shell.run(target, script, None, self.timeout)?;
                Ok(FixOutput::from_remote(output))
            }
            FixAction::Piped { script, payload } => self.apply_piped(target, script, payload),
            FixAction::Firewall(rule) => self.apply_firewall(target, rule),
        }
    }

    fn apply_piped(&self, target: &Target, script: &str, payload: &Payload) -> Result<FixOutput> {
        let mut staged = tempfile::Builder::new().prefix("vmdesk-").tempfile()?;
        staged.write_all(payload.contents().as_bytes())?;
        staged.flush()?;
        if !payload.is_secret() {
            tracing::debug!("staged {:?} at {}", payload, staged.path().display());
        }

        let output = self
            .shell
            .run(target, script, Some(staged.path()), self.timeout)?;
        Ok(FixOutput::from_remote(output))
    }

    fn apply_firewall(&self, target: &Target, rule: &FirewallRule) -> Result<FixOutput> {
        match self.cloud.describe_firewall_rule(&target.project, &rule.name)? {
            None => self.cloud.create_firewall_rule(&target.project, rule)?,
            Some(existing) if !rule.is_satisfied_by(&existing) => {
                self.cloud.update_firewall_rule(&target.project, rule)?
            }
            Some(_) => {}
        }
        self.cloud
            .add_host_tag(&target.project, &target.name, &target.zone, &rule.target_tag)?;
        Ok(FixOutput::ok())
    }
}
