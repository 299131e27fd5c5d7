//! The built-in capability catalog.
//!
//! Checks are declared in dependency order: packages before the files that
//! configure them, files before the services that read them. Custom checks
//! from configuration follow the built-ins.

use crate::capabilities::check::{CapabilityCheck, FixAction, Payload};
use crate::capabilities::templates;
use crate::cloud::FirewallRule;
use crate::config::{resolve_string, TemplateVars, VmdeskConfig};
use crate::error::{Result, VmdeskError};

/// Names of the built-in checks, in declaration order.
pub const BUILTIN_CHECK_NAMES: &[&str] = &[
    "ssh",
    "desktop-environment",
    "desktop-user",
    "xrdp-package",
    "xrdp-session",
    "xrdp-service",
    "vnc-package",
    "vnc-xstartup",
    "vnc-password",
    "vnc-service",
    "novnc-package",
    "novnc-service",
    "clipboard",
    "firewall-rdp",
    "firewall-vnc",
    "firewall-novnc",
];

const APT_INSTALL: &str = "sudo apt-get update -qq && sudo DEBIAN_FRONTEND=noninteractive apt-get install -y -qq";

fn apt_install(packages: &str) -> String {
    format!("{} {}", APT_INSTALL, packages)
}

/// Build the full catalog for a configuration.
///
/// `vnc_password` enables the fix for `vnc-password`; without it that check
/// can only be observed.
pub fn build_catalog(config: &VmdeskConfig, vnc_password: Option<&str>) -> Result<Vec<CapabilityCheck>> {
    let vars = TemplateVars::from_config(config);
    let r = |s: &str| resolve_string(s, &vars);
    let desktop = &config.desktop;

    let mut checks = vec![
        CapabilityCheck::remote("ssh", "SSH session can be opened", "true"),
        CapabilityCheck::remote(
            "desktop-environment",
            "XFCE desktop installed",
            "dpkg -s xfce4 >/dev/null 2>&1",
        )
        .with_script(apt_install("xfce4 xfce4-goodies dbus-x11")),
        CapabilityCheck::remote(
            "desktop-user",
            "Desktop user account exists",
            r("id -u ${user} >/dev/null 2>&1")?,
        )
        .with_script(r(
            "id -u ${user} >/dev/null 2>&1 || sudo useradd -m -s /bin/bash ${user}; sudo usermod -aG sudo ${user}",
        )?),
        CapabilityCheck::remote(
            "xrdp-package",
            "XRDP server installed",
            "dpkg -s xrdp >/dev/null 2>&1",
        )
        .with_script(format!("{} && sudo adduser xrdp ssl-cert", apt_install("xrdp"))),
        CapabilityCheck::remote(
            "xrdp-session",
            "XRDP starts an XFCE session",
            "grep -q startxfce4 /etc/xrdp/startwm.sh",
        )
        .with_fix(FixAction::Piped {
            script: "sudo tee /etc/xrdp/startwm.sh >/dev/null && sudo chmod 755 /etc/xrdp/startwm.sh && sudo systemctl restart xrdp".to_string(),
            payload: Payload::file(templates::render(templates::XRDP_STARTWM, &vars)?),
        }),
        CapabilityCheck::remote(
            "xrdp-service",
            "XRDP service running",
            "systemctl is-active --quiet xrdp",
        )
        .with_script("sudo systemctl enable --now xrdp"),
        CapabilityCheck::remote(
            "vnc-package",
            "TigerVNC server installed",
            "command -v vncserver >/dev/null 2>&1",
        )
        .with_script(apt_install("tigervnc-standalone-server tigervnc-common")),
        CapabilityCheck::remote(
            "vnc-xstartup",
            "VNC session startup script installed",
            r("sudo test -x ${home}/.vnc/xstartup")?,
        )
        .with_fix(FixAction::Piped {
            script: r("sudo -u ${user} mkdir -p ${home}/.vnc && sudo -u ${user} tee ${home}/.vnc/xstartup >/dev/null && sudo chmod 755 ${home}/.vnc/xstartup")?,
            payload: Payload::file(templates::render(templates::VNC_XSTARTUP, &vars)?),
        }),
        vnc_password_check(&vars, vnc_password)?,
        CapabilityCheck::remote(
            "vnc-service",
            "VNC server running",
            r("systemctl is-active --quiet vncserver@${display}")?,
        )
        .with_fix(FixAction::Piped {
            script: r("sudo tee /etc/systemd/system/vncserver@.service >/dev/null && sudo systemctl daemon-reload && sudo systemctl enable --now vncserver@${display}")?,
            payload: Payload::file(templates::render(templates::VNC_SERVICE_UNIT, &vars)?),
        }),
        CapabilityCheck::remote(
            "novnc-package",
            "noVNC web client installed",
            "test -d /usr/share/novnc && command -v websockify >/dev/null 2>&1",
        )
        .with_script(apt_install("novnc websockify")),
        CapabilityCheck::remote(
            "novnc-service",
            "noVNC proxy running",
            "systemctl is-active --quiet novnc",
        )
        .with_fix(FixAction::Piped {
            script: "sudo tee /etc/systemd/system/novnc.service >/dev/null && sudo systemctl daemon-reload && sudo systemctl enable --now novnc".to_string(),
            payload: Payload::file(templates::render(templates::NOVNC_SERVICE_UNIT, &vars)?),
        }),
        CapabilityCheck::remote(
            "clipboard",
            "Clipboard sync helper installed",
            "command -v autocutsel >/dev/null 2>&1",
        )
        .with_script(apt_install("autocutsel")),
    ];

    for (name, description, rule, port) in [
        ("firewall-rdp", "Firewall allows RDP", "vmdesk-allow-rdp", desktop.rdp_port),
        ("firewall-vnc", "Firewall allows VNC", "vmdesk-allow-vnc", desktop.vnc_port()),
        ("firewall-novnc", "Firewall allows noVNC", "vmdesk-allow-novnc", desktop.novnc_port),
    ] {
        let rule = FirewallRule {
            name: rule.to_string(),
            port,
            source_range: desktop.firewall_source.clone(),
            target_tag: desktop.network_tag.clone(),
        };
        checks.push(CapabilityCheck::firewall(name, description, rule));
    }

    for custom in &config.checks.custom {
        let description = custom
            .description
            .clone()
            .unwrap_or_else(|| format!("Custom check {}", custom.name));
        let mut check = CapabilityCheck::remote(&custom.name, &description, r(&custom.probe)?);
        if let Some(fix) = &custom.fix {
            check = check.with_script(r(fix)?);
        }
        checks.push(check);
    }

    select(checks, &[], &config.checks.skip)
}

fn vnc_password_check(vars: &TemplateVars, password: Option<&str>) -> Result<CapabilityCheck> {
    let check = CapabilityCheck::remote(
        "vnc-password",
        "VNC password set",
        resolve_string("sudo test -s ${home}/.vnc/passwd", vars)?,
    );
    let Some(password) = password.filter(|p| !p.is_empty()) else {
        return Ok(check);
    };
    Ok(check.with_fix(FixAction::Piped {
        script: resolve_string(
            "sudo -u ${user} mkdir -p ${home}/.vnc && vncpasswd -f | sudo -u ${user} tee ${home}/.vnc/passwd >/dev/null && sudo chmod 600 ${home}/.vnc/passwd",
            vars,
        )?,
        payload: Payload::secret(format!("{}\n", password)),
    }))
}

/// Narrow a catalog to `only` (if non-empty) minus `skip`, keeping order.
///
/// Naming a check that is not in the catalog is a configuration error.
pub fn select(checks: Vec<CapabilityCheck>, only: &[String], skip: &[String]) -> Result<Vec<CapabilityCheck>> {
    let unknown: Vec<&str> = only
        .iter()
        .chain(skip)
        .filter(|name| !checks.iter().any(|c| &c.name == *name))
        .map(String::as_str)
        .collect();
    if !unknown.is_empty() {
        return Err(VmdeskError::ConfigValidationError {
            message: format!("Unknown check(s): {}", unknown.join(", ")),
        });
    }

    Ok(checks
        .into_iter()
        .filter(|c| only.is_empty() || only.contains(&c.name))
        .filter(|c| !skip.contains(&c.name))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::check::Probe;
    use crate::config::CustomCheck;

    fn names(checks: &[CapabilityCheck]) -> Vec<&str> {
        checks.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn builtin_order_matches_names() {
        let checks = build_catalog(&VmdeskConfig::default(), None).unwrap();
        assert_eq!(names(&checks), BUILTIN_CHECK_NAMES);
    }

    #[test]
    fn ssh_check_has_no_fix() {
        let checks = build_catalog(&VmdeskConfig::default(), None).unwrap();
        assert!(!checks[0].has_fix());
    }

    #[test]
    fn vnc_password_fix_requires_password() {
        let config = VmdeskConfig::default();
        let without = build_catalog(&config, None).unwrap();
        let check = without.iter().find(|c| c.name == "vnc-password").unwrap();
        assert!(!check.has_fix());

        let with = build_catalog(&config, Some("s3cret")).unwrap();
        let check = with.iter().find(|c| c.name == "vnc-password").unwrap();
        match &check.fix {
            Some(FixAction::Piped { payload, script }) => {
                assert!(payload.is_secret());
                assert_eq!(payload.contents(), "s3cret\n");
                assert!(!script.contains("s3cret"));
            }
            other => panic!("unexpected fix {:?}", other),
        }
    }

    #[test]
    fn empty_password_is_no_password() {
        let checks = build_catalog(&VmdeskConfig::default(), Some("")).unwrap();
        let check = checks.iter().find(|c| c.name == "vnc-password").unwrap();
        assert!(!check.has_fix());
    }

    #[test]
    fn probes_use_configured_user_and_display() {
        let mut config = VmdeskConfig::default();
        config.desktop.user = "alice".to_string();
        config.desktop.vnc_display = 3;
        let checks = build_catalog(&config, None).unwrap();

        let user = checks.iter().find(|c| c.name == "desktop-user").unwrap();
        assert_eq!(user.probe, Probe::Remote("id -u alice >/dev/null 2>&1".to_string()));
        let vnc = checks.iter().find(|c| c.name == "vnc-service").unwrap();
        assert_eq!(
            vnc.probe,
            Probe::Remote("systemctl is-active --quiet vncserver@3".to_string())
        );
    }

    #[test]
    fn vnc_port_follows_display_everywhere() {
        let mut config = VmdeskConfig::default();
        config.desktop.vnc_display = 3;
        let checks = build_catalog(&config, None).unwrap();

        let firewall = checks.iter().find(|c| c.name == "firewall-vnc").unwrap();
        match &firewall.probe {
            Probe::Firewall(rule) => assert_eq!(rule.port, 5903),
            other => panic!("unexpected probe {:?}", other),
        }
        let novnc = checks.iter().find(|c| c.name == "novnc-service").unwrap();
        match &novnc.fix {
            Some(FixAction::Piped { payload, .. }) => {
                assert!(payload.contents().contains("6080 localhost:5903"));
            }
            other => panic!("unexpected fix {:?}", other),
        }
    }

    #[test]
    fn firewall_rules_follow_config() {
        let mut config = VmdeskConfig::default();
        config.desktop.rdp_port = 13389;
        config.desktop.network_tag = "desk".to_string();
        let checks = build_catalog(&config, None).unwrap();
        let rdp = checks.iter().find(|c| c.name == "firewall-rdp").unwrap();
        match &rdp.probe {
            Probe::Firewall(rule) => {
                assert_eq!(rule.name, "vmdesk-allow-rdp");
                assert_eq!(rule.port, 13389);
                assert_eq!(rule.target_tag, "desk");
            }
            other => panic!("unexpected probe {:?}", other),
        }
    }

    #[test]
    fn custom_checks_are_appended_and_interpolated() {
        let mut config = VmdeskConfig::default();
        config.checks.custom.push(CustomCheck {
            name: "docker".to_string(),
            description: None,
            probe: "id -nG ${user} | grep -qw docker".to_string(),
            fix: Some("sudo usermod -aG docker ${user}".to_string()),
        });
        let checks = build_catalog(&config, None).unwrap();
        let last = checks.last().unwrap();
        assert_eq!(last.name, "docker");
        assert_eq!(last.description, "Custom check docker");
        assert_eq!(
            last.probe,
            Probe::Remote("id -nG ubuntu | grep -qw docker".to_string())
        );
        assert_eq!(
            last.fix,
            Some(FixAction::Script("sudo usermod -aG docker ubuntu".to_string()))
        );
    }

    #[test]
    fn config_skip_removes_checks() {
        let mut config = VmdeskConfig::default();
        config.checks.skip = vec!["clipboard".to_string(), "firewall-vnc".to_string()];
        let checks = build_catalog(&config, None).unwrap();
        assert!(!names(&checks).contains(&"clipboard"));
        assert!(!names(&checks).contains(&"firewall-vnc"));
        assert_eq!(checks.len(), BUILTIN_CHECK_NAMES.len() - 2);
    }

    #[test]
    fn select_only_preserves_catalog_order() {
        let checks = build_catalog(&VmdeskConfig::default(), None).unwrap();
        let only = vec!["xrdp-service".to_string(), "ssh".to_string()];
        let selected = select(checks, &only, &[]).unwrap();
        assert_eq!(names(&selected), vec!["ssh", "xrdp-service"]);
    }

    #[test]
    fn select_unknown_name_is_error() {
        let checks = build_catalog(&VmdeskConfig::default(), None).unwrap();
        let err = select(checks, &["teleport".to_string()], &[]).unwrap_err();
        assert!(err.to_string().contains("teleport"));
    }
}
