//! Error types for vmdesk operations.
//!
//! This module defines [`VmdeskError`], the primary error type used throughout
//! the application, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - [`VmdeskError::NotFound`] is fatal: no target, no checks
//! - [`VmdeskError::RemoteExecution`] is recovered per check by the reconciler
//! - Use `anyhow::Error` (via `VmdeskError::Other`) for unexpected errors

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for vmdesk operations.
#[derive(Debug, Error)]
pub enum VmdeskError {
    /// No host could be resolved to operate on.
    #[error("No target host found: {message}")]
    NotFound { message: String },

    /// A remote session could not be established or did not finish in time.
    #[error("Remote execution on '{host}' failed: {message}")]
    RemoteExecution { host: String, message: String },

    /// A cloud control-plane command failed.
    #[error("Cloud command failed with exit code {code:?}: {command}: {message}")]
    CloudCommandFailed {
        command: String,
        code: Option<i32>,
        message: String,
    },

    /// Configuration file not found at expected location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid configuration structure or values.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VmdeskError {
    /// Whether this error should abort the whole run.
    ///
    /// Remote execution errors are per-check; everything else stops the run
    /// before any check executes.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, VmdeskError::RemoteExecution { .. })
    }
}

/// Result type alias for vmdesk operations.
pub type Result<T> = std::result::Result<T, VmdeskError>;
