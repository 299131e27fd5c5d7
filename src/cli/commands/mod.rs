//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results. Commands are
//! routed by [`CommandDispatcher`], which also loads and validates
//! configuration for every command that needs it.

pub mod checks;
pub mod completions;
pub mod dispatcher;
pub mod display;
pub mod doctor;
pub mod hosts;

pub use dispatcher::{require_project, Backends, Command, CommandDispatcher, CommandResult};
pub use doctor::{DoctorCommand, EXIT_NO_TARGET};
