//! [`ControlPlane`] backed by the `gcloud` CLI.
//!
//! Read operations ask for `--format=json` and deserialize the output.
//! A describe that fails with a "not found" message becomes `Ok(None)` or
//! `Ok(false)`; every other non-zero exit is a `CloudCommandFailed`.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{ControlPlane, FirewallRule, FirewallRuleInfo, HostInfo, HostStatus};
use crate::error::{Result, VmdeskError};
use crate::shell::{execute, CommandOptions, CommandResult};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
const START_TIMEOUT: Duration = Duration::from_secs(300);

/// Control plane that shells out to `gcloud compute`.
#[derive(Debug, Clone)]
pub struct GcloudControlPlane {
    program: String,
    timeout: Duration,
}

impl Default for GcloudControlPlane {
    fn default() -> Self {
        Self::new()
    }
}

impl GcloudControlPlane {
    pub fn new() -> Self {
        Self {
            program: "gcloud".to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Use a different `gcloud` executable.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn run(&self, args: Vec<String>, timeout: Duration) -> Result<CommandResult> {
        let options = CommandOptions {
            timeout: Some(timeout),
            ..Default::default()
        };
        let result = execute(&self.program, &args, &options).map_err(|e| match e {
            VmdeskError::Io(io) => VmdeskError::CloudCommandFailed {
                command: self.display_command(&args),
                code: None,
                message: format!("could not run {}: {}", self.program, io),
            },
            other => other,
        })?;

        if result.timed_out {
            return Err(VmdeskError::CloudCommandFailed {
                command: self.display_command(&args),
                code: None,
                message: format!("timed out after {}s", timeout.as_secs()),
            });
        }
        Ok(result)
    }

    fn run_checked(&self, args: Vec<String>, timeout: Duration) -> Result<CommandResult> {
        let display = self.display_command(&args);
        let result = self.run(args, timeout)?;
        if !result.success {
            return Err(failure(display, &result));
        }
        Ok(result)
    }

    fn run_and_parse_json<T: DeserializeOwned>(&self, args: Vec<String>) -> Result<T> {
        let display = self.display_command(&args);
        let result = self.run_checked(args, self.timeout)?;
        serde_json::from_str(&result.stdout).map_err(|e| VmdeskError::CloudCommandFailed {
            command: display,
            code: result.exit_code,
            message: format!("unexpected output: {}", e),
        })
    }

    fn display_command(&self, args: &[String]) -> String {
        format!("{} {}", self.program, args.join(" "))
    }
}

impl ControlPlane for GcloudControlPlane {
    fn list_hosts(&self, project: &str, zone: Option<&str>) -> Result<Vec<HostInfo>> {
        let mut args = strings(&["compute", "instances", "list", "--format=json"]);
        args.push(format!("--project={}", project));
        if let Some(zone) = zone {
            args.push(format!("--zones={}", zone));
        }
        let instances: Vec<Instance> = self.run_and_parse_json(args)?;
        tracing::debug!("gcloud listed {} instance(s) in {}", instances.len(), project);
        Ok(instances.into_iter().map(Instance::into_host).collect())
    }

    fn describe_host(&self, project: &str, name: &str, zone: &str) -> Result<Option<HostInfo>> {
        let mut args = strings(&["compute", "instances", "describe", name, "--format=json"]);
        args.push(format!("--project={}", project));
        args.push(format!("--zone={}", zone));

        let display = self.display_command(&args);
        let result = self.run(args, self.timeout)?;
        if !result.success {
            if is_not_found(&result) {
                return Ok(None);
            }
            return Err(failure(display, &result));
        }
        let instance: Instance =
            serde_json::from_str(&result.stdout).map_err(|e| VmdeskError::CloudCommandFailed {
                command: display,
                code: result.exit_code,
                message: format!("unexpected output: {}", e),
            })?;
        Ok(Some(instance.into_host()))
    }

    fn start_host(&self, project: &str, name: &str, zone: &str) -> Result<()> {
        tracing::info!("Starting instance {} in {}", name, zone);
        self.run_checked(lifecycle_args("start", project, name, zone), START_TIMEOUT)?;
        Ok(())
    }

    fn resume_host(&self, project: &str, name: &str, zone: &str) -> Result<()> {
        tracing::info!("Resuming instance {} in {}", name, zone);
        self.run_checked(lifecycle_args("resume", project, name, zone), START_TIMEOUT)?;
        Ok(())
    }

    fn describe_firewall_rule(&self, project: &str, rule_name: &str) -> Result<Option<FirewallRuleInfo>> {
        let mut args = strings(&[
            "compute",
            "firewall-rules",
            "describe",
            rule_name,
            "--format=json",
        ]);
        args.push(format!("--project={}", project));

        let display = self.display_command(&args);
        let result = self.run(args, self.timeout)?;
        if !result.success {
            if is_not_found(&result) {
                return Ok(None);
            }
            return Err(failure(display, &result));
        }
        let rule: Firewall =
            serde_json::from_str(&result.stdout).map_err(|e| VmdeskError::CloudCommandFailed {
                command: display,
                code: result.exit_code,
                message: format!("unexpected output: {}", e),
            })?;
        Ok(Some(rule.into_info()))
    }

    fn create_firewall_rule(&self, project: &str, rule: &FirewallRule) -> Result<()> {
        let mut args = rule_args("create", project, rule);
        args.push("--direction=INGRESS".to_string());
        tracing::info!("Creating firewall rule {}", rule.name);
        self.run_checked(args, self.timeout)?;
        Ok(())
    }

    fn update_firewall_rule(&self, project: &str, rule: &FirewallRule) -> Result<()> {
        tracing::info!("Updating firewall rule {} to {}", rule.name, rule.allow_spec());
        self.run_checked(rule_args("update", project, rule), self.timeout)?;
        Ok(())
    }

    fn add_host_tag(&self, project: &str, name: &str, zone: &str, tag: &str) -> Result<()> {
        let mut args = strings(&["compute", "instances", "add-tags", name]);
        args.push(format!("--tags={}", tag));
        args.push(format!("--project={}", project));
        args.push(format!("--zone={}", zone));
        tracing::info!("Tagging instance {} with {}", name, tag);
        self.run_checked(args, self.timeout)?;
        Ok(())
    }
}

fn strings(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

fn lifecycle_args(op: &str, project: &str, name: &str, zone: &str) -> Vec<String> {
    let mut args = strings(&["compute", "instances", op, name, "--quiet"]);
    args.push(format!("--project={}", project));
    args.push(format!("--zone={}", zone));
    args
}

fn rule_args(op: &str, project: &str, rule: &FirewallRule) -> Vec<String> {
    let mut args = strings(&["compute", "firewall-rules", op, &rule.name, "--quiet"]);
    args.push(format!("--project={}", project));
    args.push(format!("--allow={}", rule.allow_spec()));
    args.push(format!("--source-ranges={}", rule.source_range));
    args.push(format!("--target-tags={}", rule.target_tag));
    args
}

fn is_not_found(result: &CommandResult) -> bool {
    let stderr = result.stderr.to_lowercase();
    stderr.contains("was not found") || stderr.contains("notfound")
}

fn failure(command: String, result: &CommandResult) -> VmdeskError {
    VmdeskError::CloudCommandFailed {
        command,
        code: result.exit_code,
        message: result
            .stderr_tail()
            .unwrap_or("no error output")
            .to_string(),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Instance {
    name: String,
    #[serde(default)]
    zone: String,
    status: HostStatus,
    #[serde(default)]
    network_interfaces: Vec<NetworkInterface>,
    #[serde(default)]
    tags: Option<Tags>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NetworkInterface {
    #[serde(rename = "networkIP")]
    network_ip: Option<String>,
    #[serde(default)]
    access_configs: Vec<AccessConfig>,
}

#[derive(Debug, Deserialize)]
struct AccessConfig {
    #[serde(rename = "natIP")]
    nat_ip: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Tags {
    #[serde(default)]
    items: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Firewall {
    name: String,
    #[serde(default)]
    allowed: Vec<Allowed>,
    #[serde(default)]
    source_ranges: Vec<String>,
    #[serde(default)]
    target_tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Allowed {
    #[serde(rename = "IPProtocol")]
    protocol: String,
    #[serde(default)]
    ports: Vec<String>,
}

impl Firewall {
    fn into_info(self) -> FirewallRuleInfo {
        let allowed = self
            .allowed
            .into_iter()
            .flat_map(|a| {
                let protocol = a.protocol.to_lowercase();
                if a.ports.is_empty() {
                    vec![protocol]
                } else {
                    a.ports
                        .into_iter()
                        .map(|port| format!("{}:{}", protocol, port))
                        .collect()
                }
            })
            .collect();

        FirewallRuleInfo {
            name: self.name,
            allowed,
            source_ranges: self.source_ranges,
            target_tags: self.target_tags,
        }
    }
}

impl Instance {
    fn into_host(self) -> HostInfo {
        // Zones come back as full resource URLs.
        let zone = self
            .zone
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();

        let address = self.network_interfaces.first().and_then(|nic| {
            nic.access_configs
                .iter()
                .find_map(|ac| ac.nat_ip.clone())
                .or_else(|| nic.network_ip.clone())
        });

        HostInfo {
            name: self.name,
            zone,
            status: self.status,
            address,
            tags: self.tags.map(|t| t.items).unwrap_or_default(),
        }
    }
}
