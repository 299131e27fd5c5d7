//! Configuration validation rules.
//!
//! - Timeouts must be positive
//! - The name pattern must not be blank
//! - The VNC display must be in 1..=99 and ports non-zero and distinct
//! - An explicit VNC port must be the one the display listens on
//! - Custom check names must be non-empty, unique and not shadow built-ins
//! - Custom check commands may only use known template variables
//! - Skipped check names must exist

use crate::capabilities::catalog::BUILTIN_CHECK_NAMES;
use crate::config::interpolation::{extract_variables, TemplateVars};
use crate::config::schema::{VmdeskConfig, VNC_BASE_PORT};
use crate::error::{Result, VmdeskError};
use std::collections::HashSet;

/// Validation error with context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Rule identifier
    pub rule: String,
    /// Human-readable error message
    pub message: String,
}

impl ValidationError {
    fn new(rule: &str, message: String) -> Self {
        Self {
            rule: rule.to_string(),
            message,
        }
    }
}

/// Validate a configuration and return every problem found.
pub fn validate_config(config: &VmdeskConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    errors.extend(validate_target(config));
    errors.extend(validate_ssh(config));
    errors.extend(validate_desktop(config));
    errors.extend(validate_checks(config));
    errors
}

/// Validate and fold all problems into one `ConfigValidationError`.
pub fn validate(config: &VmdeskConfig) -> Result<()> {
    let errors = validate_config(config);
    if errors.is_empty() {
        return Ok(());
    }
    let message = errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ");
    Err(VmdeskError::ConfigValidationError { message })
}

fn validate_target(config: &VmdeskConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if config.name_pattern.trim().is_empty() {
        errors.push(ValidationError::new(
            "name-pattern",
            "name_pattern must not be empty".to_string(),
        ));
    }
    errors
}

fn validate_ssh(config: &VmdeskConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if config.ssh.connect_timeout == 0 {
        errors.push(ValidationError::new(
            "ssh-timeout",
            "ssh.connect_timeout must be greater than zero".to_string(),
        ));
    }
    if config.ssh.command_timeout < config.ssh.connect_timeout {
        errors.push(ValidationError::new(
            "ssh-timeout",
            "ssh.command_timeout must not be shorter than ssh.connect_timeout".to_string(),
        ));
    }
    errors
}

fn validate_desktop(config: &VmdeskConfig) -> Vec<ValidationError> {
    let desktop = &config.desktop;
    let mut errors = Vec::new();

    if !(1..=99).contains(&desktop.vnc_display) {
        errors.push(ValidationError::new(
            "vnc-display",
            format!(
                "desktop.vnc_display must be between 1 and 99, got {}",
                desktop.vnc_display
            ),
        ));
    }

    if desktop.user.trim().is_empty() {
        errors.push(ValidationError::new(
            "desktop-user",
            "desktop.user must not be empty".to_string(),
        ));
    }

    if let Some(port) = desktop.vnc_port {
        let expected = VNC_BASE_PORT + u16::from(desktop.vnc_display);
        if port != expected {
            errors.push(ValidationError::new(
                "vnc-port",
                format!(
                    "desktop.vnc_port is {} but display :{} listens on {}",
                    port, desktop.vnc_display, expected
                ),
            ));
        }
    }

    let ports = [
        ("rdp_port", desktop.rdp_port),
        ("vnc_port", desktop.vnc_port()),
        ("novnc_port", desktop.novnc_port),
    ];
    let mut seen = HashSet::new();
    for (field, port) in ports {
        if port == 0 {
            errors.push(ValidationError::new(
                "port",
                format!("desktop.{} must not be zero", field),
            ));
        } else if !seen.insert(port) {
            errors.push(ValidationError::new(
                "port",
                format!("desktop.{} reuses port {}", field, port),
            ));
        }
    }

    errors
}

fn validate_checks(config: &VmdeskConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut custom_names = HashSet::new();
    let vars = TemplateVars::from_config(config);

    for check in &config.checks.custom {
        let name = check.name.trim();
        if name.is_empty() {
            errors.push(ValidationError::new(
                "custom-check-name",
                "custom checks must have a name".to_string(),
            ));
            continue;
        }
        if BUILTIN_CHECK_NAMES.contains(&name) {
            errors.push(ValidationError::new(
                "custom-check-name",
                format!("custom check '{}' shadows a built-in check", name),
            ));
        }
        if !custom_names.insert(name.to_string()) {
            errors.push(ValidationError::new(
                "custom-check-name",
                format!("custom check '{}' is defined more than once", name),
            ));
        }
        if check.probe.trim().is_empty() {
            errors.push(ValidationError::new(
                "custom-check-probe",
                format!("custom check '{}' has an empty probe", name),
            ));
        }

        let mut referenced: Vec<String> = std::iter::once(&check.probe)
            .chain(check.fix.as_ref())
            .flat_map(|command| extract_variables(command))
            .filter(|var| vars.get(var).is_none())
            .collect();
        referenced.sort();
        referenced.dedup();
        for var in referenced {
            errors.push(ValidationError::new(
                "custom-check-variable",
                format!("custom check '{}' uses unknown variable '{}'", name, var),
            ));
        }
    }

    for skipped in &config.checks.skip {
        if !BUILTIN_CHECK_NAMES.contains(&skipped.as_str()) && !custom_names.contains(skipped) {
            errors.push(ValidationError::new(
                "unknown-check",
                format!("checks.skip names unknown check '{}'", skipped),
            ));
        }
    }

    errors
}
