//! Local process execution with captured output and a deadline.
//!
//! Every remote operation in vmdesk is a local child process (`ssh`,
//! `gcloud`). This module spawns it, captures both output streams, feeds an
//! optional stdin file, and kills the child if it outlives its deadline.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::Result;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Result of executing a local command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code (None if killed by signal or by the deadline).
    pub exit_code: Option<i32>,

    /// Standard output.
    pub stdout: String,

    /// Standard error.
    pub stderr: String,

    /// Execution duration.
    pub duration: Duration,

    /// Whether the command exited with code 0.
    pub success: bool,

    /// Whether the command was killed for exceeding its deadline.
    pub timed_out: bool,
}

impl CommandResult {
    fn finished(status: ExitStatus, stdout: String, stderr: String, duration: Duration) -> Self {
        Self {
            exit_code: status.code(),
            stdout,
            stderr,
            duration,
            success: status.success(),
            timed_out: false,
        }
    }

    fn killed(duration: Duration) -> Self {
        Self {
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
            duration,
            success: false,
            timed_out: true,
        }
    }

    /// Last non-empty line of stderr, for short diagnostics.
    pub fn stderr_tail(&self) -> Option<&str> {
        self.stderr.lines().rev().map(str::trim).find(|l| !l.is_empty())
    }
}

/// Options for command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Environment variables (merged with system env).
    pub env: HashMap<String, String>,

    /// File whose contents become the child's stdin (None = empty stdin).
    pub stdin: Option<PathBuf>,

    /// Kill the child after this long (None = no deadline).
    pub timeout: Option<Duration>,
}

/// Execute `program` with `args` and capture its output.
///
/// A spawn failure is an `Io` error. A non-zero exit is a successful call
/// with `success == false`. Exceeding the deadline kills the child and
/// returns a result with `timed_out == true`.
pub fn execute(program: &str, args: &[String], options: &CommandOptions) -> Result<CommandResult> {
    let start = Instant::now();

    let mut cmd = Command::new(program);
    cmd.args(args);
    for (key, value) in &options.env {
        cmd.env(key, value);
    }
    match &options.stdin {
        Some(path) => cmd.stdin(Stdio::from(File::open(path)?)),
        None => cmd.stdin(Stdio::null()),
    };
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    tracing::debug!("exec: {} {}", program, args.join(" "));
    let mut child = cmd.spawn()?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let stdout_handle = thread::spawn(move || drain(stdout));
    let stderr_handle = thread::spawn(move || drain(stderr));

    let Some(status) = wait_with_deadline(&mut child, options.timeout)? else {
        // Grandchildren may still hold the pipes open; leave the readers detached.
        tracing::debug!("exec: {} killed after {:?}", program, start.elapsed());
        return Ok(CommandResult::killed(start.elapsed()));
    };

    let stdout = stdout_handle.join().unwrap_or_default();
    let stderr = stderr_handle.join().unwrap_or_default();
    let duration = start.elapsed();

    tracing::debug!(
        "exec: {} exited with {:?} in {:?}",
        program,
        status.code(),
        duration
    );
    Ok(CommandResult::finished(status, stdout, stderr, duration))
}

fn drain<R: Read>(stream: Option<R>) -> String {
    let mut buf = Vec::new();
    if let Some(mut stream) = stream {
        let _ = stream.read_to_end(&mut buf);
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Wait for the child, killing it once `timeout` elapses.
///
/// Returns `None` when the child was killed.
fn wait_with_deadline(child: &mut Child, timeout: Option<Duration>) -> Result<Option<ExitStatus>> {
    let Some(timeout) = timeout else {
        return Ok(Some(child.wait()?));
    };

    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    #[test]
    fn execute_successful_command() {
        let result = execute("sh", &sh("echo hello"), &CommandOptions::default()).unwrap();
        assert!(result.success);
        assert_eq!(result.exit_code, Some(0));
        assert!(result.stdout.contains("hello"));
        assert!(!result.timed_out);
    }

    #[test]
    fn execute_failing_command_is_not_an_error() {
        let result = execute("sh", &sh("echo oops >&2; exit 3"), &CommandOptions::default())
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.exit_code, Some(3));
        assert_eq!(result.stderr_tail(), Some("oops"));
    }

    #[test]
    fn execute_missing_program_is_io_error() {
        let err = execute(
            "definitely-not-a-real-program-vmdesk",
            &[],
            &CommandOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, crate::error::VmdeskError::Io(_)));
    }

    #[test]
    fn execute_with_env() {
        let mut options = CommandOptions::default();
        options
            .env
            .insert("VMDESK_TEST_VAR".to_string(), "my_value".to_string());
        let result = execute("sh", &sh("echo $VMDESK_TEST_VAR"), &options).unwrap();
        assert!(result.stdout.contains("my_value"));
    }

    #[test]
    fn execute_feeds_stdin_from_file() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "payload-line\n").unwrap();
        let options = CommandOptions {
            stdin: Some(temp.path().to_path_buf()),
            ..Default::default()
        };
        let result = execute("sh", &sh("cat"), &options).unwrap();
        assert_eq!(result.stdout, "payload-line\n");
    }

    #[test]
    fn execute_kills_on_deadline() {
        let options = CommandOptions {
            timeout: Some(Duration::from_millis(200)),
            ..Default::default()
        };
        let result = execute("sh", &sh("exec sleep 5"), &options).unwrap();
        assert!(result.timed_out);
        assert!(!result.success);
        assert!(result.exit_code.is_none());
        assert!(result.duration < Duration::from_secs(5));
    }

    #[test]
    fn execute_within_deadline_completes() {
        let options = CommandOptions {
            timeout: Some(Duration::from_secs(10)),
            ..Default::default()
        };
        let result = execute("sh", &sh("echo fast"), &options).unwrap();
        assert!(result.success);
        assert!(!result.timed_out);
    }
}
