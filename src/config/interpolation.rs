//! `${variable}` interpolation for fix-action templates.
//!
//! # Syntax
//!
//! - `${variable_name}` is replaced with the variable's value
//! - `$${escaped}` produces a literal `${escaped}`
//! - any other `$` is kept as-is, so `$HOME` passes through to the remote shell
//!
//! # Example
//!
//! ```
//! use vmdesk::config::{resolve_string, TemplateVars};
//!
//! let mut vars = TemplateVars::new();
//! vars.insert("user", "alice");
//! let line = resolve_string("sudo -u ${user} vncserver -list", &vars).unwrap();
//! assert_eq!(line, "sudo -u alice vncserver -list");
//! ```

use crate::config::schema::VmdeskConfig;
use crate::error::{Result, VmdeskError};
use std::collections::{BTreeMap, HashSet};

/// A segment of an interpolated string.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Literal text
    Literal(String),
    /// Variable reference: ${name}
    Variable(String),
}

/// Split a template into literal and variable segments.
pub fn parse_interpolation(input: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut chars = input.chars().peekable();
    let mut literal = String::new();

    while let Some(c) = chars.next() {
        if c != '$' {
            literal.push(c);
            continue;
        }
        match chars.peek() {
            Some('$') => {
                chars.next();
                if chars.peek() == Some(&'{') {
                    // $${...} is a literal ${...}
                    literal.push('$');
                    for c in chars.by_ref() {
                        literal.push(c);
                        if c == '}' {
                            break;
                        }
                    }
                } else {
                    literal.push_str("$$");
                }
            }
            Some('{') => {
                chars.next();
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                let mut name = String::new();
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                    name.push(c);
                }
                segments.push(Segment::Variable(name.trim().to_string()));
            }
            _ => literal.push(c),
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    segments
}

/// Unique variable names referenced by a template.
pub fn extract_variables(input: &str) -> HashSet<String> {
    parse_interpolation(input)
        .into_iter()
        .filter_map(|seg| match seg {
            Segment::Variable(name) => Some(name),
            Segment::Literal(_) => None,
        })
        .collect()
}

/// Variables available to templates.
#[derive(Debug, Clone, Default)]
pub struct TemplateVars {
    values: BTreeMap<String, String>,
}

impl TemplateVars {
    /// Create an empty variable set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Variables derived from the desktop configuration.
    pub fn from_config(config: &VmdeskConfig) -> Self {
        let desktop = &config.desktop;
        let home = if desktop.user == "root" {
            "/root".to_string()
        } else {
            format!("/home/{}", desktop.user)
        };

        let mut vars = Self::new();
        vars.insert("user", &desktop.user);
        vars.insert("home", &home);
        vars.insert("display", &desktop.vnc_display.to_string());
        vars.insert("geometry", &desktop.vnc_geometry);
        vars.insert("rdp_port", &desktop.rdp_port.to_string());
        vars.insert("vnc_port", &desktop.vnc_port().to_string());
        vars.insert("novnc_port", &desktop.novnc_port.to_string());
        vars
    }

    /// Set a variable, replacing any previous value.
    pub fn insert(&mut self, name: &str, value: &str) {
        self.values.insert(name.to_string(), value.to_string());
    }

    /// Look up a variable.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

/// Resolve every variable in a template.
///
/// # Errors
///
/// Returns `ConfigValidationError` if a variable is not defined.
pub fn resolve_string(input: &str, vars: &TemplateVars) -> Result<String> {
    let mut out = String::with_capacity(input.len());
    for segment in parse_interpolation(input) {
        match segment {
            Segment::Literal(text) => out.push_str(&text),
            Segment::Variable(name) => {
                let value = vars
                    .get(&name)
                    .ok_or_else(|| VmdeskError::ConfigValidationError {
                        message: format!("Unresolved template variable: ${{{}}}", name),
                    })?;
                out.push_str(value);
            }
        }
    }
    Ok(out)
}
