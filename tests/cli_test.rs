//! Integration tests for the vmdesk binary.
// The cargo_bin function is marked deprecated in favor of cargo_bin! macro,
// but both work correctly. Suppressing until assert_cmd stabilizes the new API.
#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn setup_project(config: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    let vmdesk_dir = temp.path().join(".vmdesk");
    fs::create_dir_all(&vmdesk_dir).unwrap();
    fs::write(vmdesk_dir.join("config.yml"), config).unwrap();
    temp
}

/// A vmdesk invocation isolated from the caller's config and environment.
fn vmdesk(dir: &Path) -> Command {
    let mut cmd = Command::new(cargo_bin("vmdesk"));
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("VMDESK_PROJECT")
        .env_remove("VMDESK_ZONE")
        .env_remove("VMDESK_HOST")
        .env_remove("VMDESK_VNC_PASSWORD")
        .env_remove("VMDESK_GCLOUD");
    cmd
}

const PROJECT_CONFIG: &str = r#"
project: test-project
zone: us-central1-a
"#;

#[test]
fn cli_shows_help() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    vmdesk(temp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("remote-desktop"))
        .stdout(predicate::str::contains("doctor"));
    Ok(())
}

#[test]
fn cli_shows_version() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    vmdesk(temp.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[test]
fn checks_lists_catalog_without_project() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    vmdesk(temp.path())
        .arg("checks")
        .assert()
        .success()
        .stdout(predicate::str::contains("xrdp-service"))
        .stdout(predicate::str::contains("firewall-novnc"));
    Ok(())
}

#[test]
fn checks_json_includes_custom_checks() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_project(
        r#"
checks:
  skip: [clipboard]
  custom:
    - name: docker
      probe: command -v docker
"#,
    );
    let output = vmdesk(temp.path()).args(["checks", "--json"]).output()?;
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    let names: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|c| c["name"].as_str())
        .collect();
    assert_eq!(names.first(), Some(&"ssh"));
    assert_eq!(names.last(), Some(&"docker"));
    assert!(!names.contains(&"clipboard"));
    Ok(())
}

#[test]
fn invalid_config_exits_two() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_project("desktop:\n  vnc_display: 0\n");
    vmdesk(temp.path())
        .arg("checks")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("vnc_display"));
    Ok(())
}

#[test]
fn unparseable_config_exits_two() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_project("ssh: [not, a, map\n");
    vmdesk(temp.path()).arg("checks").assert().code(2);
    Ok(())
}

#[test]
fn doctor_without_project_exits_two() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    vmdesk(temp.path())
        .arg("doctor")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no cloud project configured"));
    Ok(())
}

#[test]
fn doctor_with_missing_gcloud_exits_two() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_project(PROJECT_CONFIG);
    vmdesk(temp.path())
        .env("VMDESK_GCLOUD", temp.path().join("no-such-gcloud"))
        .arg("doctor")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("could not run"));
    Ok(())
}

#[test]
fn unknown_only_check_exits_two() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_project(PROJECT_CONFIG);
    vmdesk(temp.path())
        .args(["doctor", "--only", "teleport"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("teleport"));
    Ok(())
}

#[test]
fn completions_generates_script() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    vmdesk(temp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("vmdesk"));
    Ok(())
}

#[cfg(unix)]
mod fake_gcloud {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    /// One running desktop VM; xrdp is not active, everything else succeeds.
    const SCRIPT: &str = r#"#!/bin/sh
case "$*" in
  *"instances list"*)
    echo '[{"name":"team-desktop","zone":"https://compute/zones/us-central1-a","status":"RUNNING","networkInterfaces":[{"networkIP":"10.0.0.5"}]}]'
    ;;
  *"instances describe"*)
    echo "ERROR: (gcloud.compute.instances.describe) The resource was not found" >&2
    exit 1
    ;;
  *"compute ssh"*)
    case "$*" in
      *"is-active --quiet xrdp"*) exit 3 ;;
      *) exit 0 ;;
    esac
    ;;
  *)
    echo "unexpected: $*" >&2
    exit 1
    ;;
esac
"#;

    fn project_with_gcloud() -> TempDir {
        let temp = setup_project(PROJECT_CONFIG);
        let script = temp.path().join("gcloud");
        fs::write(&script, SCRIPT).unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        temp
    }

    fn vmdesk_with_gcloud(temp: &TempDir) -> Command {
        let mut cmd = vmdesk(temp.path());
        cmd.env("VMDESK_GCLOUD", temp.path().join("gcloud"));
        cmd
    }

    #[test]
    fn healthy_checks_exit_zero() -> Result<(), Box<dyn std::error::Error>> {
        let temp = project_with_gcloud();
        vmdesk_with_gcloud(&temp)
            .args(["doctor", "--only", "ssh,desktop-environment"])
            .assert()
            .success()
            .stdout(predicate::str::contains("2/2 present on team-desktop"));
        Ok(())
    }

    #[test]
    fn missing_capability_exits_one() -> Result<(), Box<dyn std::error::Error>> {
        let temp = project_with_gcloud();
        vmdesk_with_gcloud(&temp)
            .args(["doctor", "--only", "ssh,xrdp-service"])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("--fix"));
        Ok(())
    }

    #[test]
    fn default_command_is_doctor() -> Result<(), Box<dyn std::error::Error>> {
        let temp = project_with_gcloud();
        // Without a subcommand every check runs; xrdp-service stays missing.
        vmdesk_with_gcloud(&temp).assert().code(1);
        Ok(())
    }

    #[test]
    fn json_report_is_parseable() -> Result<(), Box<dyn std::error::Error>> {
        let temp = project_with_gcloud();
        let output = vmdesk_with_gcloud(&temp)
            .args(["doctor", "--json", "--only", "ssh,xrdp-service"])
            .output()?;
        assert_eq!(output.status.code(), Some(1));

        let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
        assert_eq!(json["target"]["name"], "team-desktop");
        assert_eq!(json["target"]["zone"], "us-central1-a");
        assert_eq!(json["results"][0]["observed"], "PRESENT");
        assert_eq!(json["results"][1]["name"], "xrdp-service");
        assert_eq!(json["results"][1]["observed"], "MISSING");
        assert_eq!(json["results"][1]["remediation"], "NOT_ATTEMPTED");
        Ok(())
    }

    #[test]
    fn unmatched_host_exits_two() -> Result<(), Box<dyn std::error::Error>> {
        let temp = project_with_gcloud();
        vmdesk_with_gcloud(&temp)
            .args(["doctor", "--host", "ghost", "--only", "ssh"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("No target VM"))
            .stderr(predicate::str::contains("ghost"));
        Ok(())
    }

    #[test]
    fn hosts_marks_selected() -> Result<(), Box<dyn std::error::Error>> {
        let temp = project_with_gcloud();
        let output = vmdesk_with_gcloud(&temp).args(["hosts", "--json"]).output()?;
        assert!(output.status.success());

        let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
        assert_eq!(json[0]["name"], "team-desktop");
        assert_eq!(json[0]["selected"], true);
        assert_eq!(json[0]["address"], "10.0.0.5");
        Ok(())
    }
}
