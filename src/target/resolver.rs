//! Target resolution.
//!
//! Resolution order:
//!
//! 1. An explicit host name. Described directly when a zone is known,
//!    otherwise looked up by exact name in the project listing.
//! 2. The first host in listing order, across all zones, whose name contains
//!    the name pattern (case-insensitive), whatever its status.
//! 3. The first running host in the configured zone.
//!
//! A resolved host that is not running is an error unless starting it was
//! requested. Suspended hosts are resumed rather than started.

use crate::cloud::{ControlPlane, HostInfo, HostStatus};
use crate::error::{Result, VmdeskError};
use crate::target::Target;

/// Inputs for one resolution.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    pub project: String,
    pub host: Option<String>,
    pub zone: Option<String>,
    pub name_pattern: String,
    /// Start the host if it is halted.
    pub start: bool,
}

/// Finds the VM a run operates on.
pub struct TargetResolver<'a> {
    cloud: &'a dyn ControlPlane,
}

impl<'a> TargetResolver<'a> {
    pub fn new(cloud: &'a dyn ControlPlane) -> Self {
        Self { cloud }
    }

    /// Resolve a target. Errors are fatal to the run.
    pub fn resolve(&self, options: &ResolveOptions) -> Result<Target> {
        let host = self.select(options)?;
        tracing::debug!("Resolved host {} in {} ({})", host.name, host.zone, host.status);

        let host = self.ensure_running(options, host)?;
        tracing::info!("Target: {} in {}/{}", host.name, options.project, host.zone);
        Ok(Target::from_host(&options.project, host))
    }

    /// The host resolution picks, whatever its status.
    pub fn select(&self, options: &ResolveOptions) -> Result<HostInfo> {
        match &options.host {
            Some(name) => self.find_named(options, name),
            None => self.find_by_pattern(options),
        }
    }

    fn find_named(&self, options: &ResolveOptions, name: &str) -> Result<HostInfo> {
        let project = &options.project;
        let found = match &options.zone {
            Some(zone) => self.cloud.describe_host(project, name, zone)?,
            None => self
                .cloud
                .list_hosts(project, None)?
                .into_iter()
                .find(|h| h.name == name),
        };

        found.ok_or_else(|| VmdeskError::NotFound {
            message: match &options.zone {
                Some(zone) => format!("host '{}' does not exist in {}/{}", name, project, zone),
                None => format!("host '{}' does not exist in project {}", name, project),
            },
        })
    }

    fn find_by_pattern(&self, options: &ResolveOptions) -> Result<HostInfo> {
        let project = &options.project;
        let hosts = self.cloud.list_hosts(project, None)?;

        let pattern = options.name_pattern.to_lowercase();
        if let Some(host) = hosts
            .iter()
            .find(|h| h.name.to_lowercase().contains(&pattern))
        {
            return Ok(host.clone());
        }

        let Some(zone) = &options.zone else {
            return Err(VmdeskError::NotFound {
                message: format!(
                    "no host name contains '{}' in project {} and no zone is configured",
                    options.name_pattern, project
                ),
            });
        };

        tracing::debug!(
            "No host matches '{}', falling back to the first running host in {}",
            options.name_pattern,
            zone
        );
        hosts
            .into_iter()
            .find(|h| &h.zone == zone && h.status.is_running())
            .ok_or_else(|| VmdeskError::NotFound {
                message: format!(
                    "no host name contains '{}' and no host is running in {}/{}",
                    options.name_pattern, project, zone
                ),
            })
    }

    fn ensure_running(&self, options: &ResolveOptions, host: HostInfo) -> Result<HostInfo> {
        if host.status.is_running() {
            return Ok(host);
        }

        if !options.start {
            return Err(VmdeskError::NotFound {
                message: format!(
                    "host '{}' is {}; rerun with --start to start it",
                    host.name, host.status
                ),
            });
        }
        if !host.status.is_startable() {
            return Err(VmdeskError::NotFound {
                message: format!(
                    "host '{}' is {} and cannot be started now",
                    host.name, host.status
                ),
            });
        }

        if host.status == HostStatus::Suspended {
            self.cloud
                .resume_host(&options.project, &host.name, &host.zone)?;
        } else {
            self.cloud
                .start_host(&options.project, &host.name, &host.zone)?;
        }
        let started = self
            .cloud
            .describe_host(&options.project, &host.name, &host.zone)?
            .ok_or_else(|| VmdeskError::NotFound {
                message: format!("host '{}' disappeared after starting", host.name),
            })?;

        if !started.status.is_running() {
            return Err(VmdeskError::NotFound {
                message: format!(
                    "host '{}' is {} after starting",
                    started.name, started.status
                ),
            });
        }
        Ok(started)
    }
}
