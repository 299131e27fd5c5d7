//! Remote command execution on a target.
//!
//! [`RemoteShell`] runs one command on the target over a fresh session and
//! reports its exit status and output. A command that runs and exits
//! non-zero is a normal result; only a session that could not be
//! established or finished is an error
//! ([`VmdeskError::RemoteExecution`](crate::error::VmdeskError::RemoteExecution)).

pub mod mock;
pub mod ssh;

pub use mock::{MockReply, MockShell};
pub use ssh::SshExecutor;

use std::path::Path;
use std::time::Duration;

use crate::error::Result;
use crate::target::Target;

/// Output of a remote command that ran to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl RemoteOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Last non-empty stderr line, for short diagnostics.
    pub fn stderr_tail(&self) -> Option<&str> {
        self.stderr.lines().rev().map(str::trim).find(|l| !l.is_empty())
    }
}

/// Runs commands on a target host.
pub trait RemoteShell {
    /// Run `command` on `target`, feeding `stdin` from a local file if given.
    ///
    /// The whole call, including session setup, is bounded by `timeout`.
    fn run(
        &self,
        target: &Target,
        command: &str,
        stdin: Option<&Path>,
        timeout: Duration,
    ) -> Result<RemoteOutput>;
}
