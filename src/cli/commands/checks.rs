//! The `vmdesk checks` command.

use serde::Serialize;

use crate::capabilities::{build_catalog, BUILTIN_CHECK_NAMES};
use crate::cli::args::ChecksArgs;
use crate::config::VmdeskConfig;
use crate::error::Result;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

#[derive(Debug, Serialize)]
struct CheckEntry<'a> {
    name: &'a str,
    description: &'a str,
    fixable: bool,
    builtin: bool,
}

/// Lists the effective catalog in run order.
pub struct ChecksCommand {
    config: VmdeskConfig,
    args: ChecksArgs,
}

impl ChecksCommand {
    pub fn new(config: VmdeskConfig, args: ChecksArgs) -> Self {
        Self { config, args }
    }
}

impl Command for ChecksCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let catalog = build_catalog(&self.config, self.config.desktop.vnc_password.as_deref())?;
        let entries: Vec<CheckEntry<'_>> = catalog
            .iter()
            .map(|check| CheckEntry {
                name: &check.name,
                description: &check.description,
                fixable: check.has_fix(),
                builtin: BUILTIN_CHECK_NAMES.contains(&check.name.as_str()),
            })
            .collect();

        if self.args.json {
            let json = serde_json::to_string_pretty(&entries).map_err(anyhow::Error::from)?;
            ui.message(&json);
            return Ok(CommandResult::success());
        }

        ui.show_header("Checks");
        for entry in &entries {
            let suffix = if entry.fixable { "" } else { "  (no automatic fix)" };
            ui.message(&format!("  {:<22} {}{}", entry.name, entry.description, suffix));
        }
        if !self.config.checks.skip.is_empty() {
            ui.show_hint(&format!(
                "Skipped by config: {}",
                self.config.checks.skip.join(", ")
            ));
        }
        Ok(CommandResult::success())
    }
}
