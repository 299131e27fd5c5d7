//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// vmdesk - Diagnose and repair the remote-desktop stack of a cloud VM.
#[derive(Debug, Parser)]
#[command(name = "vmdesk")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Cloud project to operate in
    #[arg(short, long, global = true, env = "VMDESK_PROJECT")]
    pub project: Option<String>,

    /// Path to config file (overrides .vmdesk/config.yml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check the desktop stack on the VM, optionally fixing it (default)
    Doctor(DoctorArgs),

    /// List VMs in the project
    Hosts(HostsArgs),

    /// List the checks doctor would run
    Checks(ChecksArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `doctor` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct DoctorArgs {
    /// VM to check (default: first VM whose name matches name_pattern)
    #[arg(long, env = "VMDESK_HOST")]
    pub host: Option<String>,

    /// Zone of the VM
    #[arg(short, long, env = "VMDESK_ZONE")]
    pub zone: Option<String>,

    /// Apply fixes for missing capabilities
    #[arg(long)]
    pub fix: bool,

    /// Start the VM if it is stopped
    #[arg(long)]
    pub start: bool,

    /// Run only these checks (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,

    /// Skip these checks (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub skip: Vec<String>,

    /// VNC password to install when fixing vnc-password
    #[arg(long, env = "VMDESK_VNC_PASSWORD", hide_env_values = true)]
    pub vnc_password: Option<String>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

impl DoctorArgs {
    /// Defaults plus the values clap would have read from the environment.
    ///
    /// Used when `doctor` runs implicitly because no subcommand was given.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            host: var("VMDESK_HOST"),
            zone: var("VMDESK_ZONE"),
            vnc_password: var("VMDESK_VNC_PASSWORD"),
            ..Default::default()
        }
    }
}

/// Arguments for the `hosts` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct HostsArgs {
    /// Only list VMs in this zone
    #[arg(short, long, env = "VMDESK_ZONE")]
    pub zone: Option<String>,

    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `checks` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ChecksArgs {
    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
