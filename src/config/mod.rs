//! Configuration loading, parsing, and validation for vmdesk.
//!
//! - Schema definitions in [`schema`]
//! - File discovery and loading in [`loader`]
//! - Layered merging in [`merger`]
//! - Validation in [`validator`]
//! - Template interpolation in [`interpolation`]
//!
//! # Example
//!
//! ```
//! use vmdesk::config::{load_config, validate};
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! let dir = temp.path().join(".vmdesk");
//! fs::create_dir_all(&dir).unwrap();
//! fs::write(dir.join("config.yml"), "project: my-project").unwrap();
//!
//! let config = load_config(temp.path(), None).unwrap();
//! validate(&config).unwrap();
//! assert_eq!(config.project.as_deref(), Some("my-project"));
//! ```
//!
//! # Configuration File Locations
//!
//! 1. User global config (`~/.vmdesk/config.yml`)
//! 2. Project config (`.vmdesk/config.yml`, or `--config PATH`)
//! 3. Local overrides (`.vmdesk/config.local.yml`)

pub mod interpolation;
pub mod loader;
pub mod merger;
pub mod schema;
pub mod validator;

pub use schema::{
    expand_home, ChecksConfig, CustomCheck, DesktopConfig, SshConfig, SshTransport, VmdeskConfig,
};

pub use loader::{load_config, load_config_value, parse_config, ConfigPaths};

pub use merger::{deep_merge, merge_layers};

pub use validator::{validate, validate_config, ValidationError};

pub use interpolation::{
    extract_variables, parse_interpolation, resolve_string, Segment, TemplateVars,
};
