//! In-memory control plane for testing.

use std::cell::RefCell;
use std::collections::HashMap;

use super::{ControlPlane, FirewallRule, FirewallRuleInfo, HostInfo, HostStatus};
use crate::error::{Result, VmdeskError};

/// Control plane that keeps hosts and firewall rules in memory.
///
/// Mutating calls update the state, so a started host reads back as
/// running and a created rule reads back as described.
#[derive(Debug, Default)]
pub struct MockControlPlane {
    hosts: RefCell<Vec<HostInfo>>,
    rules: RefCell<HashMap<String, FirewallRuleInfo>>,
    failing: bool,
    calls: RefCell<Vec<String>>,
}

impl MockControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a host at the end of the listing.
    pub fn with_host(self, name: &str, zone: &str, status: HostStatus) -> Self {
        let last_octet = self.hosts.borrow().len() + 10;
        self.hosts.borrow_mut().push(HostInfo {
            name: name.to_string(),
            zone: zone.to_string(),
            status,
            address: Some(format!("10.0.0.{}", last_octet)),
            tags: Vec::new(),
        });
        self
    }

    /// Add a host exactly as given.
    pub fn with_host_info(self, host: HostInfo) -> Self {
        self.hosts.borrow_mut().push(host);
        self
    }

    /// Pre-create a firewall rule.
    pub fn with_rule(self, rule: &FirewallRule) -> Self {
        self.with_rule_info(FirewallRuleInfo::from(rule))
    }

    /// Pre-create a firewall rule exactly as given.
    pub fn with_rule_info(self, rule: FirewallRuleInfo) -> Self {
        self.rules.borrow_mut().insert(rule.name.clone(), rule);
        self
    }

    /// Make every call fail.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    /// Current state of a host.
    pub fn host(&self, name: &str) -> Option<HostInfo> {
        self.hosts.borrow().iter().find(|h| h.name == name).cloned()
    }

    /// Whether a rule exists.
    pub fn has_rule(&self, name: &str) -> bool {
        self.rules.borrow().contains_key(name)
    }

    /// Current state of a rule.
    pub fn rule(&self, name: &str) -> Option<FirewallRuleInfo> {
        self.rules.borrow().get(name).cloned()
    }

    /// Calls made so far, as `operation name` strings.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: String) -> Result<()> {
        self.calls.borrow_mut().push(call.clone());
        if self.failing {
            return Err(VmdeskError::CloudCommandFailed {
                command: call,
                code: Some(1),
                message: "mock control plane failure".to_string(),
            });
        }
        Ok(())
    }

    fn with_host_mut<T>(&self, name: &str, zone: &str, f: impl FnOnce(&mut HostInfo) -> T) -> Result<T> {
        let mut hosts = self.hosts.borrow_mut();
        let host = hosts
            .iter_mut()
            .find(|h| h.name == name && h.zone == zone)
            .ok_or_else(|| VmdeskError::CloudCommandFailed {
                command: format!("instance {}", name),
                code: Some(1),
                message: format!("The resource '{}' was not found", name),
            })?;
        Ok(f(host))
    }

    /// Move a host to running, failing like the cloud does when the
    /// operation does not apply to its current status.
    fn transition(&self, name: &str, zone: &str, op: &str, allowed: impl Fn(HostStatus) -> bool) -> Result<()> {
        let outcome = self.with_host_mut(name, zone, |h| {
            if allowed(h.status) {
                h.status = HostStatus::Running;
                Ok(())
            } else {
                Err(h.status)
            }
        })?;
        outcome.map_err(|status| VmdeskError::CloudCommandFailed {
            command: format!("instances {} {}", op, name),
            code: Some(1),
            message: format!("cannot {} an instance that is {}", op, status),
        })
    }
}

impl ControlPlane for MockControlPlane {
    fn list_hosts(&self, _project: &str, zone: Option<&str>) -> Result<Vec<HostInfo>> {
        self.record(format!("list {}", zone.unwrap_or("*")))?;
        Ok(self
            .hosts
            .borrow()
            .iter()
            .filter(|h| zone.is_none_or(|z| h.zone == z))
            .cloned()
            .collect())
    }

    fn describe_host(&self, _project: &str, name: &str, zone: &str) -> Result<Option<HostInfo>> {
        self.record(format!("describe {}", name))?;
        Ok(self
            .hosts
            .borrow()
            .iter()
            .find(|h| h.name == name && h.zone == zone)
            .cloned())
    }

    fn start_host(&self, _project: &str, name: &str, zone: &str) -> Result<()> {
        self.record(format!("start {}", name))?;
        self.transition(name, zone, "start", |s| {
            matches!(s, HostStatus::Stopped | HostStatus::Terminated)
        })
    }

    fn resume_host(&self, _project: &str, name: &str, zone: &str) -> Result<()> {
        self.record(format!("resume {}", name))?;
        self.transition(name, zone, "resume", |s| s == HostStatus::Suspended)
    }

    fn describe_firewall_rule(&self, _project: &str, rule_name: &str) -> Result<Option<FirewallRuleInfo>> {
        self.record(format!("describe-rule {}", rule_name))?;
        Ok(self.rule(rule_name))
    }

    fn create_firewall_rule(&self, _project: &str, rule: &FirewallRule) -> Result<()> {
        self.record(format!("create-rule {}", rule.name))?;
        self.rules
            .borrow_mut()
            .insert(rule.name.clone(), FirewallRuleInfo::from(rule));
        Ok(())
    }

    fn update_firewall_rule(&self, _project: &str, rule: &FirewallRule) -> Result<()> {
        self.record(format!("update-rule {}", rule.name))?;
        let mut rules = self.rules.borrow_mut();
        let existing = rules
            .get_mut(&rule.name)
            .ok_or_else(|| VmdeskError::CloudCommandFailed {
                command: format!("firewall-rules update {}", rule.name),
                code: Some(1),
                message: format!("The resource '{}' was not found", rule.name),
            })?;
        *existing = FirewallRuleInfo::from(rule);
        Ok(())
    }

    fn add_host_tag(&self, _project: &str, name: &str, zone: &str, tag: &str) -> Result<()> {
        self.record(format!("add-tag {} {}", name, tag))?;
        self.with_host_mut(name, zone, |h| {
            if !h.tags.iter().any(|t| t == tag) {
                h.tags.push(tag.to_string());
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_preserves_insertion_order() {
        let cloud = MockControlPlane::new()
            .with_host("b", "z1", HostStatus::Running)
            .with_host("a", "z1", HostStatus::Running);
        let names: Vec<_> = cloud
            .list_hosts("p", None)
            .unwrap()
            .into_iter()
            .map(|h| h.name)
            .collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn listing_filters_by_zone() {
        let cloud = MockControlPlane::new()
            .with_host("a", "z1", HostStatus::Running)
            .with_host("b", "z2", HostStatus::Running);
        let hosts = cloud.list_hosts("p", Some("z2")).unwrap();
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].name, "b");
    }

    #[test]
    fn start_marks_host_running() {
        let cloud = MockControlPlane::new().with_host("a", "z1", HostStatus::Terminated);
        cloud.start_host("p", "a", "z1").unwrap();
        assert_eq!(cloud.host("a").unwrap().status, HostStatus::Running);
    }

    #[test]
    fn start_rejects_suspended_host() {
        let cloud = MockControlPlane::new().with_host("a", "z1", HostStatus::Suspended);
        assert!(cloud.start_host("p", "a", "z1").is_err());
        cloud.resume_host("p", "a", "z1").unwrap();
        assert_eq!(cloud.host("a").unwrap().status, HostStatus::Running);
    }

    #[test]
    fn update_replaces_rule() {
        let mut rule = FirewallRule {
            name: "r".to_string(),
            port: 5901,
            source_range: "0.0.0.0/0".to_string(),
            target_tag: "rd".to_string(),
        };
        let cloud = MockControlPlane::new().with_rule(&rule);
        rule.port = 5903;
        cloud.update_firewall_rule("p", &rule).unwrap();
        assert_eq!(cloud.rule("r").unwrap().allowed, vec!["tcp:5903"]);
    }

    #[test]
    fn tags_are_not_duplicated() {
        let cloud = MockControlPlane::new().with_host("a", "z1", HostStatus::Running);
        cloud.add_host_tag("p", "a", "z1", "rd").unwrap();
        cloud.add_host_tag("p", "a", "z1", "rd").unwrap();
        assert_eq!(cloud.host("a").unwrap().tags, vec!["rd"]);
    }

    #[test]
    fn failing_mock_errors_and_records() {
        let cloud = MockControlPlane::new().failing();
        assert!(cloud.describe_firewall_rule("p", "r").is_err());
        assert_eq!(cloud.calls(), vec!["describe-rule r"]);
    }
}
