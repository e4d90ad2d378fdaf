//! Typed invocation of external tools.
//!
//! Every collaborator (firmware toolchain, manifest generator, package manager,
//! git) is run through [`ToolCommand`]. Each call gets an explicit working
//! directory and is awaited to completion before the next one starts.

use std::future::Future;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::Command;

use crate::error::{LaunchError, Result};

/// Number of trailing output lines kept as diagnostics for a failed tool.
pub const DIAGNOSTIC_LINES: usize = 10;

/// An external command: a program, its arguments and the directory to run it in.
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: String,
    args: Vec<String>,
    cwd: PathBuf,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
        }
    }

    /// Build from a configured prefix such as `["python3"]` or `["sh", "fake.sh"]`.
    pub fn from_prefix(prefix: &[String], cwd: impl Into<PathBuf>) -> Self {
        let mut parts = prefix.iter();
        let program = parts.next().cloned().unwrap_or_default();
        Self {
            program,
            args: parts.cloned().collect(),
            cwd: cwd.into(),
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

    /// Shell-like rendering for log lines.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args).current_dir(&self.cwd).kill_on_drop(true);
        command
    }

    fn spawn_error(&self, source: std::io::Error) -> LaunchError {
        LaunchError::Spawn {
            program: self.program.clone(),
            source,
        }
    }

    /// Run to completion with stdout and stderr captured.
    pub async fn output(&self) -> Result<ToolOutput> {
        tracing::debug!(cwd = %self.cwd.display(), "Running command: {}", self.display());

        let output = self
            .command()
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        Ok(ToolOutput {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Run attached to the terminal until the tool exits or `interrupt` resolves.
    ///
    /// On interrupt the tool gets `grace` to wind down on its own (a terminal
    /// Ctrl+C reaches the whole process group) before it is killed. Returns
    /// `None` when interrupted.
    pub async fn run_attached_until<F>(&self, interrupt: F, grace: Duration) -> Result<Option<ExitStatus>>
    where
        F: Future<Output = ()>,
    {
        tracing::debug!(cwd = %self.cwd.display(), "Running attached: {}", self.display());

        let mut child = self.command().spawn().map_err(|e| self.spawn_error(e))?;
        tokio::select! {
            status = child.wait() => Ok(Some(status?)),
            () = interrupt => {
                if tokio::time::timeout(grace, child.wait()).await.is_err() {
                    child.kill().await?;
                }
                Ok(None)
            }
        }
    }
}

/// Captured result of a finished tool.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    pub fn stdout_lines(&self) -> impl Iterator<Item = &str> {
        self.stdout.trim().lines().filter(|line| !line.is_empty())
    }

    /// Last [`DIAGNOSTIC_LINES`] lines of stderr, falling back to stdout when
    /// the tool wrote nothing to stderr.
    pub fn diagnostics(&self) -> Vec<String> {
        let source = if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        };
        tail_lines(source, DIAGNOSTIC_LINES)
    }
}

/// The last `n` non-blank lines of `text`.
pub fn tail_lines(text: &str, n: usize) -> Vec<String> {
    let lines: Vec<&str> = text.lines().filter(|line| !line.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].iter().map(|line| line.to_string()).collect()
}

/// Log diagnostics indented under a failure message.
pub fn log_diagnostics(lines: &[String]) {
    for line in lines {
        tracing::warn!("    {}", line);
    }
}
