//! Command-line interface for vmdesk.
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations

pub mod args;
pub mod commands;

pub use args::{ChecksArgs, Cli, Commands, CompletionsArgs, DoctorArgs, HostsArgs};
pub use commands::{Backends, Command, CommandDispatcher, CommandResult};
