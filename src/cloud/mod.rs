//! Cloud control plane access.
//!
//! The [`ControlPlane`] trait is the seam between vmdesk and the cloud: VM
//! listing, description, start and resume, plus firewall-rule lookup,
//! creation and update.
//! [`GcloudControlPlane`] drives the `gcloud` CLI; [`MockControlPlane`] keeps
//! state in memory for tests.
//!
//! Nothing here caches: every call reads remote state fresh.

pub mod gcloud;
pub mod mock;

pub use gcloud::GcloudControlPlane;
pub use mock::MockControlPlane;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;

/// Lifecycle state of a VM as reported by the control plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HostStatus {
    Provisioning,
    Staging,
    Running,
    Stopping,
    Stopped,
    Suspending,
    Suspended,
    Repairing,
    Terminated,
    #[serde(other)]
    Unknown,
}

impl HostStatus {
    /// Whether the host can accept SSH sessions.
    pub fn is_running(&self) -> bool {
        matches!(self, HostStatus::Running)
    }

    /// Whether the host is halted and can be started.
    pub fn is_startable(&self) -> bool {
        matches!(
            self,
            HostStatus::Stopped | HostStatus::Terminated | HostStatus::Suspended
        )
    }
}

impl fmt::Display for HostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HostStatus::Provisioning => "PROVISIONING",
            HostStatus::Staging => "STAGING",
            HostStatus::Running => "RUNNING",
            HostStatus::Stopping => "STOPPING",
            HostStatus::Stopped => "STOPPED",
            HostStatus::Suspending => "SUSPENDING",
            HostStatus::Suspended => "SUSPENDED",
            HostStatus::Repairing => "REPAIRING",
            HostStatus::Terminated => "TERMINATED",
            HostStatus::Unknown => "UNKNOWN",
        };
        f.pad(s)
    }
}

/// A VM as listed or described by the control plane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostInfo {
    pub name: String,
    pub zone: String,
    pub status: HostStatus,
    /// External address if present, else the internal one.
    pub address: Option<String>,
    /// Network tags (firewall rules target these).
    pub tags: Vec<String>,
}

/// An ingress firewall rule opening one TCP port to tagged hosts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FirewallRule {
    pub name: String,
    pub port: u16,
    pub source_range: String,
    pub target_tag: String,
}

impl FirewallRule {
    /// The `PROTOCOL:PORT` value for `--allow`.
    pub fn allow_spec(&self) -> String {
        format!("tcp:{}", self.port)
    }

    /// Whether an existing rule opens this port from this source to this tag.
    ///
    /// Extra ports, ranges or tags on the existing rule do not matter.
    pub fn is_satisfied_by(&self, existing: &FirewallRuleInfo) -> bool {
        let allow = self.allow_spec();
        existing.allowed.iter().any(|a| a == &allow || a == "tcp")
            && existing.source_ranges.iter().any(|r| r == &self.source_range)
            && existing.target_tags.iter().any(|t| t == &self.target_tag)
    }
}

/// A firewall rule as described by the control plane.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FirewallRuleInfo {
    pub name: String,
    /// `PROTOCOL:PORT` entries, or a bare `PROTOCOL` for all ports.
    pub allowed: Vec<String>,
    pub source_ranges: Vec<String>,
    pub target_tags: Vec<String>,
}

impl From<&FirewallRule> for FirewallRuleInfo {
    fn from(rule: &FirewallRule) -> Self {
        Self {
            name: rule.name.clone(),
            allowed: vec![rule.allow_spec()],
            source_ranges: vec![rule.source_range.clone()],
            target_tags: vec![rule.target_tag.clone()],
        }
    }
}

/// Operations vmdesk needs from the cloud.
pub trait ControlPlane {
    /// List hosts in listing order, optionally restricted to one zone.
    fn list_hosts(&self, project: &str, zone: Option<&str>) -> Result<Vec<HostInfo>>;

    /// Describe one host; `None` if it does not exist.
    fn describe_host(&self, project: &str, name: &str, zone: &str) -> Result<Option<HostInfo>>;

    /// Start a stopped or terminated host and wait for the operation to complete.
    fn start_host(&self, project: &str, name: &str, zone: &str) -> Result<()>;

    /// Resume a suspended host and wait for the operation to complete.
    fn resume_host(&self, project: &str, name: &str, zone: &str) -> Result<()>;

    /// Describe one firewall rule; `None` if it does not exist.
    fn describe_firewall_rule(&self, project: &str, rule_name: &str) -> Result<Option<FirewallRuleInfo>>;

    /// Create a firewall rule.
    fn create_firewall_rule(&self, project: &str, rule: &FirewallRule) -> Result<()>;

    /// Replace the port, source range and target tag of an existing rule.
    fn update_firewall_rule(&self, project: &str, rule: &FirewallRule) -> Result<()>;

    /// Add a network tag to a host. Adding a tag it already has is a no-op.
    fn add_host_tag(&self, project: &str, name: &str, zone: &str, tag: &str) -> Result<()>;
}
