//! The host a run operates on, and how it is found.

pub mod resolver;

pub use resolver::{ResolveOptions, TargetResolver};

use serde::Serialize;
use std::fmt;

use crate::cloud::{HostInfo, HostStatus};

/// A resolved VM, immutable for the rest of the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    pub project: String,
    pub name: String,
    pub zone: String,
    pub address: Option<String>,
    pub status: HostStatus,
}

impl Target {
    pub fn from_host(project: &str, host: HostInfo) -> Self {
        Self {
            project: project.to_string(),
            name: host.name,
            zone: host.zone,
            address: host.address,
            status: host.status,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}/{})", self.name, self.project, self.zone)
    }
}
