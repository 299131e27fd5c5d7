//! The `vmdesk hosts` command.

use serde::Serialize;

use crate::cli::args::HostsArgs;
use crate::cloud::{ControlPlane, HostInfo};
use crate::config::VmdeskConfig;
use crate::error::{Result, VmdeskError};
use crate::target::{ResolveOptions, TargetResolver};
use crate::ui::UserInterface;

use super::dispatcher::{require_project, Backends, Command, CommandResult};

#[derive(Serialize)]
struct HostEntry<'a> {
    #[serde(flatten)]
    host: &'a HostInfo,
    selected: bool,
}

/// Lists hosts and marks the one `doctor` would pick.
pub struct HostsCommand {
    config: VmdeskConfig,
    args: HostsArgs,
    cloud: Box<dyn ControlPlane>,
}

impl HostsCommand {
    pub fn new(config: VmdeskConfig, args: HostsArgs) -> Self {
        let cloud = Backends::from_config(&config).cloud;
        Self::with_cloud(config, args, cloud)
    }

    pub fn with_cloud(config: VmdeskConfig, args: HostsArgs, cloud: Box<dyn ControlPlane>) -> Self {
        Self { config, args, cloud }
    }

    fn selected(&self, options: &ResolveOptions) -> Result<Option<String>> {
        match TargetResolver::new(self.cloud.as_ref()).select(options) {
            Ok(host) => Ok(Some(host.name)),
            Err(VmdeskError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl Command for HostsCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let project = require_project(&self.config)?;
        let zone = self.args.zone.clone().or_else(|| self.config.zone.clone());
        let hosts = self.cloud.list_hosts(&project, zone.as_deref())?;

        let options = ResolveOptions {
            project: project.clone(),
            zone: zone.clone(),
            name_pattern: self.config.name_pattern.clone(),
            ..Default::default()
        };
        let selected = if hosts.is_empty() {
            None
        } else {
            self.selected(&options)?
        };
        let is_selected = |host: &HostInfo| selected.as_deref() == Some(host.name.as_str());

        if self.args.json {
            let entries: Vec<HostEntry<'_>> = hosts
                .iter()
                .map(|host| HostEntry {
                    host,
                    selected: is_selected(host),
                })
                .collect();
            let json = serde_json::to_string_pretty(&entries).map_err(anyhow::Error::from)?;
            ui.message(&json);
            return Ok(CommandResult::success());
        }

        let scope = match &zone {
            Some(zone) => format!("{}/{}", project, zone),
            None => project.clone(),
        };
        if hosts.is_empty() {
            ui.warning(&format!("No hosts in {}", scope));
            return Ok(CommandResult::success());
        }

        ui.show_header(&format!("Hosts in {}", scope));
        for host in &hosts {
            let marker = if is_selected(host) { "*" } else { " " };
            ui.message(&format!(
                "{} {:<30} {:<20} {:<12} {}",
                marker,
                host.name,
                host.zone,
                host.status,
                host.address.as_deref().unwrap_or("-")
            ));
        }

        match &selected {
            Some(_) => ui.show_hint("* marks the host `vmdesk doctor` would use"),
            None => ui.show_hint(&format!(
                "No host matches name_pattern '{}'; pass --host to doctor",
                self.config.name_pattern
            )),
        }
        Ok(CommandResult::success())
    }
}
