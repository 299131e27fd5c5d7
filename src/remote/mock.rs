//! Scripted remote shell for testing.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{RemoteOutput, RemoteShell};
use crate::error::{Result, VmdeskError};
use crate::target::Target;

/// What a scripted command does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockReply {
    /// Command runs and exits with this status.
    Exit(i32),
    /// Command runs, prints to stdout and exits 0.
    Stdout(String),
    /// Session cannot be established.
    Unreachable,
}

/// A recorded call.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub command: String,
    /// Contents of the stdin file at call time.
    pub stdin: Option<String>,
    /// Path of the stdin file.
    pub stdin_path: Option<PathBuf>,
}

#[derive(Debug)]
struct Rule {
    pattern: String,
    queued: VecDeque<MockReply>,
    fallback: Option<MockReply>,
}

/// Remote shell with scripted replies.
///
/// Commands are matched exactly first, then by substring in the order rules
/// were added. Queued replies are used once each; after that the rule's
/// fixed reply applies, then the shell default (`Exit(0)`).
#[derive(Debug)]
pub struct MockShell {
    rules: RefCell<Vec<Rule>>,
    effects: Vec<(String, String)>,
    default: MockReply,
    calls: RefCell<Vec<MockCall>>,
}

impl Default for MockShell {
    fn default() -> Self {
        Self::new()
    }
}

impl MockShell {
    pub fn new() -> Self {
        Self {
            rules: RefCell::new(Vec::new()),
            effects: Vec::new(),
            default: MockReply::Exit(0),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Reply used for commands no rule matches.
    pub fn with_default(mut self, reply: MockReply) -> Self {
        self.default = reply;
        self
    }

    /// Always reply `reply` to `pattern`.
    pub fn reply(self, pattern: &str, reply: MockReply) -> Self {
        self.set_fallback(pattern, reply);
        self
    }

    /// Reply with each of `replies` once, in order.
    pub fn replies(self, pattern: &str, replies: Vec<MockReply>) -> Self {
        {
            let mut rules = self.rules.borrow_mut();
            match rules.iter_mut().find(|r| r.pattern == pattern) {
                Some(rule) => rule.queued.extend(replies),
                None => rules.push(Rule {
                    pattern: pattern.to_string(),
                    queued: replies.into(),
                    fallback: None,
                }),
            }
        }
        self
    }

    /// Running `fix` makes `probe` succeed from then on.
    pub fn installs(mut self, fix: &str, probe: &str) -> Self {
        self.effects.push((fix.to_string(), probe.to_string()));
        self
    }

    /// Every call made so far.
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.borrow().clone()
    }

    /// Commands run so far, in order.
    pub fn commands(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|c| c.command.clone()).collect()
    }

    /// How many times `command` ran.
    pub fn count(&self, command: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.command == command)
            .count()
    }

    fn set_fallback(&self, pattern: &str, reply: MockReply) {
        let mut rules = self.rules.borrow_mut();
        match rules.iter_mut().find(|r| r.pattern == pattern) {
            Some(rule) => rule.fallback = Some(reply),
            None => rules.push(Rule {
                pattern: pattern.to_string(),
                queued: VecDeque::new(),
                fallback: Some(reply),
            }),
        }
    }

    fn next_reply(&self, command: &str) -> MockReply {
        let mut rules = self.rules.borrow_mut();
        let index = rules
            .iter()
            .position(|r| r.pattern == command)
            .or_else(|| rules.iter().position(|r| command.contains(&r.pattern)));

        let Some(rule) = index.map(|i| &mut rules[i]) else {
            return self.default.clone();
        };
        rule.queued
            .pop_front()
            .or_else(|| rule.fallback.clone())
            .unwrap_or_else(|| self.default.clone())
    }
}

impl RemoteShell for MockShell {
    fn run(
        &self,
        target: &Target,
        command: &str,
        stdin: Option<&Path>,
        _timeout: Duration,
    ) -> Result<RemoteOutput> {
        self.calls.borrow_mut().push(MockCall {
            command: command.to_string(),
            stdin: stdin.and_then(|p| std::fs::read_to_string(p).ok()),
            stdin_path: stdin.map(Path::to_path_buf),
        });

        let reply = self.next_reply(command);
        if reply != MockReply::Unreachable {
            for (fix, probe) in &self.effects {
                if fix == command {
                    self.set_fallback(probe, MockReply::Exit(0));
                }
            }
        }

        match reply {
            MockReply::Exit(exit_code) => Ok(RemoteOutput {
                exit_code,
                ..Default::default()
            }),
            MockReply::Stdout(stdout) => Ok(RemoteOutput {
                exit_code: 0,
                stdout,
                stderr: String::new(),
            }),
            MockReply::Unreachable => Err(VmdeskError::RemoteExecution {
                host: target.name.clone(),
                message: "Connection timed out".to_string(),
            }),
        }
    }
}
