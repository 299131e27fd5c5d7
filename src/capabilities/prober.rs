//! Read-only presence checks.

use std::time::Duration;

use crate::capabilities::check::{CapabilityCheck, Probe};
use crate::cloud::{ControlPlane, FirewallRule};
use crate::config::SshConfig;
use crate::error::Result;
use crate::remote::RemoteShell;
use crate::target::Target;

/// Extra time a probe gets beyond session setup.
const PROBE_GRACE: Duration = Duration::from_secs(60);

/// Whether a capability is in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Present,
    Missing,
}

/// Per-command deadlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub probe: Duration,
    pub fix: Duration,
}

impl Timeouts {
    pub fn from_config(ssh: &SshConfig) -> Self {
        Self {
            probe: (ssh.connect_timeout() + PROBE_GRACE).min(ssh.command_timeout()),
            fix: ssh.command_timeout(),
        }
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self::from_config(&SshConfig::default())
    }
}

/// Runs a check's probe against a target.
pub struct CapabilityProber<'a> {
    shell: &'a dyn RemoteShell,
    cloud: &'a dyn ControlPlane,
    timeout: Duration,
}

impl<'a> CapabilityProber<'a> {
    pub fn new(shell: &'a dyn RemoteShell, cloud: &'a dyn ControlPlane, timeout: Duration) -> Self {
        Self {
            shell,
            cloud,
            timeout,
        }
    }

    /// Observe whether `check` is present on `target`.
    ///
    /// A remote probe that runs and exits non-zero is `Missing`. Errors mean
    /// the probe itself could not run.
    pub fn probe(&self, target: &Target, check: &CapabilityCheck) -> Result<Presence> {
        match &check.probe {
            Probe::Remote(command) => {
                let output = self.shell.run(target, command, None, self.timeout)?;
                tracing::debug!("probe {} exited {}", check.name, output.exit_code);
                Ok(presence(output.success()))
            }
            Probe::Firewall(rule) => self.probe_firewall(target, rule),
        }
    }

    fn probe_firewall(&self, target: &Target, rule: &FirewallRule) -> Result<Presence> {
        match self.cloud.describe_firewall_rule(&target.project, &rule.name)? {
            None => {
                tracing::debug!("firewall rule {} does not exist", rule.name);
                return Ok(Presence::Missing);
            }
            Some(existing) if !rule.is_satisfied_by(&existing) => {
                tracing::debug!(
                    "firewall rule {} does not allow {} from {} to {}",
                    rule.name,
                    rule.allow_spec(),
                    rule.source_range,
                    rule.target_tag
                );
                return Ok(Presence::Missing);
            }
            Some(_) => {}
        }
        let tagged = self
            .cloud
            .describe_host(&target.project, &target.name, &target.zone)?
            .is_some_and(|host| host.tags.iter().any(|t| t == &rule.target_tag));
        if !tagged {
            tracing::debug!("{} lacks network tag {}", target.name, rule.target_tag);
        }
        Ok(presence(tagged))
    }
}

fn presence(present: bool) -> Presence {
    if present {
        Presence::Present
    } else {
        Presence::Missing
    }
}
