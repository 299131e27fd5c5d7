//! Capability check definitions.

use crate::cloud::FirewallRule;

/// How a capability's presence is observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    /// Remote command; exit 0 means present.
    Remote(String),
    /// The rule allows the port from the source to the tag, and the target
    /// carries the tag.
    Firewall(FirewallRule),
}

/// How a missing capability is put in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixAction {
    /// Remote script.
    Script(String),
    /// Remote script reading `payload` on stdin.
    Piped {
        script: String,
        payload: Payload,
    },
    /// Create the firewall rule and tag the target.
    Firewall(FirewallRule),
}

/// Content staged locally and streamed to a fix script.
#[derive(Clone, PartialEq, Eq)]
pub struct Payload {
    contents: String,
    secret: bool,
}

impl Payload {
    pub fn file(contents: impl Into<String>) -> Self {
        Self {
            contents: contents.into(),
            secret: false,
        }
    }

    /// A payload that must never be logged.
    pub fn secret(contents: impl Into<String>) -> Self {
        Self {
            contents: contents.into(),
            secret: true,
        }
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }

    pub fn is_secret(&self) -> bool {
        self.secret
    }
}

impl std::fmt::Debug for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.secret {
            f.write_str("Payload(<redacted>)")
        } else {
            write!(f, "Payload({} bytes)", self.contents.len())
        }
    }
}

/// A named capability with its probe and optional fix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityCheck {
    pub name: String,
    pub description: String,
    pub probe: Probe,
    pub fix: Option<FixAction>,
}

impl CapabilityCheck {
    /// A check probed by a remote command.
    pub fn remote(name: &str, description: &str, probe: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            probe: Probe::Remote(probe.into()),
            fix: None,
        }
    }

    /// A check that a firewall rule opens the port to the target.
    pub fn firewall(name: &str, description: &str, rule: FirewallRule) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            probe: Probe::Firewall(rule.clone()),
            fix: Some(FixAction::Firewall(rule)),
        }
    }

    pub fn with_fix(mut self, fix: FixAction) -> Self {
        self.fix = Some(fix);
        self
    }

    /// Fix by running a remote script.
    pub fn with_script(self, script: impl Into<String>) -> Self {
        self.with_fix(FixAction::Script(script.into()))
    }

    pub fn has_fix(&self) -> bool {
        self.fix.is_some()
    }
}
