//! Configuration file discovery and loading.
//!
//! Files are discovered in priority order and deep-merged before being
//! parsed into a [`VmdeskConfig`]. Having no file at all is fine: the
//! built-in defaults apply and the project can come from the command line.

use crate::config::merger::merge_layers;
use crate::config::schema::VmdeskConfig;
use crate::error::{Result, VmdeskError};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_DIR: &str = ".vmdesk";

/// Paths to configuration files in merge order (later overrides earlier).
///
/// 1. User global config (`~/.vmdesk/config.yml`)
/// 2. Project config (`.vmdesk/config.yml`)
/// 3. Local overrides (`.vmdesk/config.local.yml`)
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    /// User's global config
    pub user_global: Option<PathBuf>,

    /// Config in the working directory
    pub project: Option<PathBuf>,

    /// Uncommitted local overrides
    pub project_local: Option<PathBuf>,
}

impl ConfigPaths {
    /// Discover config files relative to `work_dir`.
    pub fn discover(work_dir: &Path) -> Self {
        Self {
            user_global: dirs::home_dir()
                .map(|home| home.join(CONFIG_DIR).join("config.yml"))
                .filter(|p| p.exists()),
            project: existing(work_dir.join(CONFIG_DIR).join("config.yml")),
            project_local: existing(work_dir.join(CONFIG_DIR).join("config.local.yml")),
        }
    }

    /// All existing paths in merge order.
    pub fn all_existing(&self) -> Vec<&PathBuf> {
        [&self.user_global, &self.project, &self.project_local]
            .into_iter()
            .flatten()
            .collect()
    }
}

fn existing(path: PathBuf) -> Option<PathBuf> {
    path.exists().then_some(path)
}

/// Read one config file as a raw YAML value (for merging).
///
/// An empty file is an empty mapping.
pub fn load_config_value(path: &Path) -> Result<serde_yaml::Value> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            VmdeskError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            VmdeskError::Io(e)
        }
    })?;

    if content.trim().is_empty() {
        return Ok(serde_yaml::Value::Mapping(Default::default()));
    }

    serde_yaml::from_str(&content).map_err(|e| VmdeskError::ConfigParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Parse YAML content into a [`VmdeskConfig`].
pub fn parse_config(content: &str, source_path: &Path) -> Result<VmdeskConfig> {
    serde_yaml::from_str(content).map_err(|e| VmdeskError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load the effective configuration.
///
/// With `config_override`, that file takes the place of the discovered
/// project config (global and local layers still apply) and must exist.
pub fn load_config(work_dir: &Path, config_override: Option<&Path>) -> Result<VmdeskConfig> {
    let mut paths = ConfigPaths::discover(work_dir);

    if let Some(path) = config_override {
        if !path.exists() {
            return Err(VmdeskError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        paths.project = Some(path.to_path_buf());
    }

    let mut layers = Vec::new();
    for path in paths.all_existing() {
        tracing::debug!("Loading config layer {}", path.display());
        layers.push(load_config_value(path)?);
    }

    let merged = merge_layers(&layers);
    let source = paths
        .project
        .clone()
        .unwrap_or_else(|| work_dir.join(CONFIG_DIR).join("config.yml"));

    serde_yaml::from_value(merged).map_err(|e| VmdeskError::ConfigParseError {
        path: source,
        message: format!("Failed to parse merged config: {}", e),
    })
}
