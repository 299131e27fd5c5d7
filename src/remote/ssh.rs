//! SSH-based [`RemoteShell`].
//!
//! Two transports:
//!
//! - `gcloud`: `gcloud compute ssh NAME --zone Z --project P --command CMD`,
//!   which handles key distribution itself.
//! - `direct`: plain `ssh -i KEY USER@ADDRESS CMD` against the target's
//!   network address.
//!
//! Both run in batch mode with a connect timeout. Exit status 255 is ssh's
//! own failure code and is reported as a session error.

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{RemoteOutput, RemoteShell};
use crate::config::{SshConfig, SshTransport};
use crate::error::{Result, VmdeskError};
use crate::shell::{execute, CommandOptions};
use crate::target::Target;

const SSH_FAILURE_EXIT: i32 = 255;

/// Executes commands on a target over ssh.
#[derive(Debug, Clone)]
pub struct SshExecutor {
    transport: SshTransport,
    user: Option<String>,
    key_path: Option<PathBuf>,
    connect_timeout: Duration,
    program: Option<String>,
}

impl SshExecutor {
    pub fn new(config: &SshConfig) -> Self {
        Self {
            transport: config.transport,
            user: config.user.clone(),
            key_path: config.resolved_key_path(),
            connect_timeout: config.connect_timeout(),
            program: None,
        }
    }

    /// Override the executable (`gcloud` or `ssh` by default).
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = Some(program.into());
        self
    }

    fn program(&self) -> &str {
        match (&self.program, self.transport) {
            (Some(program), _) => program,
            (None, SshTransport::Gcloud) => "gcloud",
            (None, SshTransport::Direct) => "ssh",
        }
    }

    fn ssh_options(&self) -> Vec<String> {
        vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.connect_timeout.as_secs().max(1)),
            "-o".to_string(),
            "StrictHostKeyChecking=accept-new".to_string(),
        ]
    }

    /// Build the argument list for one command.
    pub fn build_args(&self, target: &Target, command: &str) -> Result<Vec<String>> {
        match self.transport {
            SshTransport::Gcloud => {
                let mut args = vec![
                    "compute".to_string(),
                    "ssh".to_string(),
                    target.name.clone(),
                    format!("--zone={}", target.zone),
                    format!("--project={}", target.project),
                    "--quiet".to_string(),
                ];
                if let Some(key) = &self.key_path {
                    args.push(format!("--ssh-key-file={}", key.display()));
                }
                args.push(format!("--command={}", command));
                args.push("--".to_string());
                args.extend(self.ssh_options());
                Ok(args)
            }
            SshTransport::Direct => {
                let address = target.address.as_deref().ok_or_else(|| {
                    VmdeskError::RemoteExecution {
                        host: target.name.clone(),
                        message: "host has no network address".to_string(),
                    }
                })?;
                let mut args = self.ssh_options();
                if let Some(key) = &self.key_path {
                    args.push("-i".to_string());
                    args.push(key.display().to_string());
                }
                let destination = match &self.user {
                    Some(user) => format!("{}@{}", user, address),
                    None => address.to_string(),
                };
                args.push(destination);
                args.push(command.to_string());
                Ok(args)
            }
        }
    }
}

impl RemoteShell for SshExecutor {
    fn run(
        &self,
        target: &Target,
        command: &str,
        stdin: Option<&Path>,
        timeout: Duration,
    ) -> Result<RemoteOutput> {
        let args = self.build_args(target, command)?;
        let options = CommandOptions {
            stdin: stdin.map(Path::to_path_buf),
            timeout: Some(timeout),
            ..Default::default()
        };

        let session_error = |message: String| VmdeskError::RemoteExecution {
            host: target.name.clone(),
            message,
        };

        let result = execute(self.program(), &args, &options)
            .map_err(|e| session_error(format!("could not start {}: {}", self.program(), e)))?;

        if result.timed_out {
            return Err(session_error(format!(
                "no response within {}s",
                timeout.as_secs()
            )));
        }

        let Some(exit_code) = result.exit_code else {
            return Err(session_error("session terminated by a signal".to_string()));
        };

        if exit_code == SSH_FAILURE_EXIT {
            let reason = result.stderr_tail().unwrap_or("connection failed");
            return Err(session_error(reason.to_string()));
        }

        Ok(RemoteOutput {
            exit_code,
            stdout: result.stdout,
            stderr: result.stderr,
        })
    }
}
