//! Configuration schema definitions for vmdesk.
//!
//! This module contains all the struct definitions that map to
//! the YAML configuration file format.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure for `.vmdesk/config.yml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VmdeskConfig {
    /// Cloud project identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    /// Zone used for direct lookups and the running-host fallback
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,

    /// Naming convention fragment used to auto-detect the VM
    #[serde(default = "default_name_pattern")]
    pub name_pattern: String,

    /// Remote shell settings
    pub ssh: SshConfig,

    /// Remote desktop stack settings
    pub desktop: DesktopConfig,

    /// Check selection and custom checks
    pub checks: ChecksConfig,
}

fn default_name_pattern() -> String {
    "desktop".to_string()
}

impl Default for VmdeskConfig {
    fn default() -> Self {
        Self {
            project: None,
            zone: None,
            name_pattern: default_name_pattern(),
            ssh: SshConfig::default(),
            desktop: DesktopConfig::default(),
            checks: ChecksConfig::default(),
        }
    }
}

/// How commands reach the target host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SshTransport {
    /// `gcloud compute ssh`, which manages keys and usernames itself
    #[default]
    Gcloud,
    /// Plain `ssh` against the host's network address
    Direct,
}

/// Remote shell settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SshConfig {
    /// Transport used to open sessions
    pub transport: SshTransport,

    /// Login user (direct transport)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Private key path; `~/` is expanded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_path: Option<PathBuf>,

    /// Seconds allowed for establishing a session
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Seconds allowed for a whole remote command, fixes included
    #[serde(default = "default_command_timeout")]
    pub command_timeout: u64,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            transport: SshTransport::default(),
            user: None,
            key_path: None,
            connect_timeout: default_connect_timeout(),
            command_timeout: default_command_timeout(),
        }
    }
}

impl SshConfig {
    /// Connection establishment timeout.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    /// Overall per-command deadline.
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout)
    }

    /// Key path with a leading `~/` expanded to the home directory.
    pub fn resolved_key_path(&self) -> Option<PathBuf> {
        self.key_path.as_deref().map(expand_home)
    }
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_command_timeout() -> u64 {
    600
}

/// Expand a leading `~/` using the current user's home directory.
pub fn expand_home(path: &std::path::Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}

/// Remote desktop stack settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DesktopConfig {
    /// Account that owns the desktop session
    pub user: String,

    /// X display number served by the VNC server
    pub vnc_display: u8,

    /// VNC screen geometry (WIDTHxHEIGHT)
    pub vnc_geometry: String,

    /// XRDP listening port
    pub rdp_port: u16,

    /// VNC listening port; defaults to 5900 + vnc_display
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vnc_port: Option<u16>,

    /// noVNC (websockify) listening port
    pub novnc_port: u16,

    /// Source range allowed through the firewall
    pub firewall_source: String,

    /// Network tag the firewall rules target
    pub network_tag: String,

    /// VNC password; prefer the VMDESK_VNC_PASSWORD environment variable
    #[serde(skip_serializing)]
    pub vnc_password: Option<String>,
}

/// Base of the VNC port range; display :N listens on `VNC_BASE_PORT + N`.
pub const VNC_BASE_PORT: u16 = 5900;

impl DesktopConfig {
    /// The port the VNC server for `vnc_display` listens on.
    pub fn vnc_port(&self) -> u16 {
        self.vnc_port
            .unwrap_or(VNC_BASE_PORT + u16::from(self.vnc_display))
    }
}

impl Default for DesktopConfig {
    fn default() -> Self {
        Self {
            user: "ubuntu".to_string(),
            vnc_display: 1,
            vnc_geometry: "1920x1080".to_string(),
            rdp_port: 3389,
            vnc_port: None,
            novnc_port: 6080,
            firewall_source: "0.0.0.0/0".to_string(),
            network_tag: "remote-desktop".to_string(),
            vnc_password: None,
        }
    }
}

/// Check selection and user-defined checks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChecksConfig {
    /// Checks to leave out of every run
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skip: Vec<String>,

    /// Project-specific checks appended after the built-in catalog
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub custom: Vec<CustomCheck>,
}

/// A user-defined check backed by remote commands.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomCheck {
    /// Unique check name
    pub name: String,

    /// Human-readable description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Remote probe command; exit 0 means present
    pub probe: String,

    /// Remote fix command; must be safe to run repeatedly
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix: Option<String>,
}
