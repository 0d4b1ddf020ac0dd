// SPDX-License-Identifier: GPL-3.0-only

//! Privileged host command execution
//!
//! Every host command goes through a [`CommandRunner`]. Callers build an
//! unwrapped [`HostCommand`]; the runner applies the [`ExecutionContext`]
//! so that nothing else in the program ever concatenates `nsenter` or
//! `sudo` prefixes.

use std::fmt;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;
use which::which;

use crate::error::{Result, SysError};

/// Exit code search-style tools use for "nothing matched".
pub const NO_MATCH_EXIT_CODE: i32 = 1;

/// A program plus its arguments. Never passed through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostCommand {
    program: String,
    args: Vec<String>,
}

impl HostCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// Command line as shown to operators.
    pub fn render(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

impl fmt::Display for HostCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Successful result of a host command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    /// Trimmed standard output.
    Stdout(String),
    /// The command exited with [`NO_MATCH_EXIT_CODE`].
    NoMatch,
}

impl CommandOutput {
    pub fn is_no_match(&self) -> bool {
        matches!(self, CommandOutput::NoMatch)
    }

    /// Standard output, empty for [`CommandOutput::NoMatch`].
    pub fn into_stdout(self) -> String {
        match self {
            CommandOutput::Stdout(stdout) => stdout,
            CommandOutput::NoMatch => String::new(),
        }
    }
}

/// How commands reach the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionContext {
    /// Enter the mount, UTS, network and IPC namespaces of host PID 1.
    HostNamespace,
    /// Not root: elevate with sudo.
    Elevated,
    /// Root without namespace switching.
    Direct,
}

impl ExecutionContext {
    pub fn resolve(use_host_namespace: bool, is_root: bool) -> Self {
        match (use_host_namespace, is_root) {
            (true, true) => ExecutionContext::HostNamespace,
            (false, true) => ExecutionContext::Direct,
            (_, false) => ExecutionContext::Elevated,
        }
    }

    /// Resolve against the effective uid of this process.
    pub fn detect(use_host_namespace: bool) -> Self {
        Self::resolve(use_host_namespace, unsafe { libc::geteuid() } == 0)
    }

    pub fn wrap(&self, command: &HostCommand) -> HostCommand {
        match self {
            ExecutionContext::HostNamespace => HostCommand::new("nsenter")
                .args(["-t", "1", "-m", "-u", "-n", "-i", "--"])
                .arg(command.program())
                .args(command.arguments().iter().cloned()),
            ExecutionContext::Elevated => HostCommand::new("sudo")
                .arg(command.program())
                .args(command.arguments().iter().cloned()),
            ExecutionContext::Direct => command.clone(),
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            ExecutionContext::HostNamespace => "host namespaces (nsenter)",
            ExecutionContext::Elevated => "sudo",
            ExecutionContext::Direct => "direct",
        }
    }
}

/// Executes host commands.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command` once.
    ///
    /// Exit code 1 is reported as [`CommandOutput::NoMatch`]; any other
    /// non-zero exit, a spawn failure or a timeout is an error.
    async fn run(&self, command: &HostCommand) -> Result<CommandOutput>;
}

/// Production runner backed by `tokio::process`.
#[derive(Debug, Clone)]
pub struct HostExecutor {
    context: ExecutionContext,
    timeout: Duration,
}

impl HostExecutor {
    pub fn new(context: ExecutionContext, timeout: Duration) -> Self {
        Self { context, timeout }
    }
}

#[async_trait]
impl CommandRunner for HostExecutor {
    async fn run(&self, command: &HostCommand) -> Result<CommandOutput> {
        let wrapped = self.context.wrap(command);
        let rendered = wrapped.render();
        let program = which(wrapped.program())
            .map_err(|_| SysError::ProgramNotFound(wrapped.program().to_string()))?;

        debug!(
            command = %rendered,
            timeout_secs = self.timeout.as_secs(),
            "Running host command"
        );

        let child = Command::new(program)
            .args(wrapped.arguments())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SysError::Spawn {
                command: rendered.clone(),
                source,
            })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|source| SysError::Spawn {
                command: rendered.clone(),
                source,
            })?,
            Err(_) => {
                return Err(SysError::TimedOut {
                    command: rendered,
                    timeout: self.timeout,
                });
            }
        };

        classify(
            rendered,
            output.status.success(),
            output.status.code(),
            &output.stdout,
            &output.stderr,
        )
    }
}

fn classify(
    command: String,
    success: bool,
    code: Option<i32>,
    stdout: &[u8],
    stderr: &[u8],
) -> Result<CommandOutput> {
    if success {
        return Ok(CommandOutput::Stdout(
            String::from_utf8_lossy(stdout).trim().to_string(),
        ));
    }

    if code == Some(NO_MATCH_EXIT_CODE) {
        debug!(command = %command, "Command reported no match");
        return Ok(CommandOutput::NoMatch);
    }

    Err(SysError::Failed {
        command,
        code,
        stderr: String::from_utf8_lossy(stderr).trim().to_string(),
    })
}
