//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`Backends`] bundling the control plane and remote shell a command uses
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::path::{Path, PathBuf};

use crate::cli::args::{Cli, Commands, DoctorArgs};
use crate::cloud::{ControlPlane, GcloudControlPlane};
use crate::config::{load_config, validate, SshTransport, VmdeskConfig};
use crate::error::{Result, VmdeskError};
use crate::remote::{RemoteShell, SshExecutor};
use crate::ui::UserInterface;

/// Names the `gcloud` executable to use instead of the one on `PATH`.
pub const GCLOUD_ENV: &str = "VMDESK_GCLOUD";

/// Trait for command implementations.
///
/// Each CLI subcommand implements this trait to provide its execution logic.
pub trait Command {
    /// Execute the command.
    ///
    /// # Returns
    ///
    /// A [`CommandResult`] indicating success/failure and exit code.
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }
}

/// The external collaborators a command talks to.
pub struct Backends {
    pub cloud: Box<dyn ControlPlane>,
    pub shell: Box<dyn RemoteShell>,
}

impl Backends {
    /// `gcloud` control plane plus the configured ssh transport.
    pub fn from_config(config: &VmdeskConfig) -> Self {
        let mut cloud = GcloudControlPlane::new();
        let mut shell = SshExecutor::new(&config.ssh);

        if let Some(program) = std::env::var(GCLOUD_ENV).ok().filter(|p| !p.is_empty()) {
            tracing::debug!("Using {} as gcloud", program);
            cloud = cloud.with_program(program.clone());
            if config.ssh.transport == SshTransport::Gcloud {
                shell = shell.with_program(program);
            }
        }

        Self {
            cloud: Box::new(cloud),
            shell: Box::new(shell),
        }
    }
}

/// The configured project, or a validation error telling the user where to set one.
pub fn require_project(config: &VmdeskConfig) -> Result<String> {
    config
        .project
        .clone()
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| VmdeskError::ConfigValidationError {
            message: "no cloud project configured (pass --project, set VMDESK_PROJECT or add `project:` to .vmdesk/config.yml)".to_string(),
        })
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    work_dir: PathBuf,
}

impl CommandDispatcher {
    /// Create a new dispatcher rooted at `work_dir`.
    pub fn new(work_dir: PathBuf) -> Self {
        Self { work_dir }
    }

    /// Directory config discovery starts from.
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Load, override and validate configuration for this invocation.
    pub fn load_config(&self, cli: &Cli) -> Result<VmdeskConfig> {
        let mut config = load_config(&self.work_dir, cli.config.as_deref())?;
        if let Some(project) = &cli.project {
            config.project = Some(project.clone());
        }
        validate(&config)?;
        Ok(config)
    }

    /// Dispatch and execute a command.
    ///
    /// With no subcommand, `doctor` runs with its defaults.
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        match &cli.command {
            Some(Commands::Completions(args)) => {
                let cmd = super::completions::CompletionsCommand::new(args.clone());
                cmd.execute(ui)
            }
            Some(Commands::Checks(args)) => {
                let config = self.load_config(cli)?;
                let cmd = super::checks::ChecksCommand::new(config, args.clone());
                cmd.execute(ui)
            }
            Some(Commands::Hosts(args)) => {
                let config = self.load_config(cli)?;
                let cmd = super::hosts::HostsCommand::new(config, args.clone());
                cmd.execute(ui)
            }
            Some(Commands::Doctor(args)) => {
                let config = self.load_config(cli)?;
                let cmd = super::doctor::DoctorCommand::new(config, args.clone());
                cmd.execute(ui)
            }
            None => {
                let config = self.load_config(cli)?;
                let cmd = super::doctor::DoctorCommand::new(config, DoctorArgs::from_env());
                cmd.execute(ui)
            }
        }
    }
}
