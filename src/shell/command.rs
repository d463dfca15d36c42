//! Shell command execution.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{Result, UpsyncError};

use super::platform::{posix_shell, shell_flag};

/// Result of executing a shell command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code (None if killed by signal).
    pub exit_code: Option<i32>,

    /// Standard output.
    pub stdout: String,

    /// Standard error.
    pub stderr: String,

    /// Execution duration.
    pub duration: Duration,

    /// Whether command succeeded (exit code 0).
    pub success: bool,
}

impl CommandResult {
    /// Create a success result.
    pub fn success(stdout: String, stderr: String, duration: Duration) -> Self {
        Self {
            exit_code: Some(0),
            stdout,
            stderr,
            duration,
            success: true,
        }
    }

    /// Create a failure result.
    pub fn failure(
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
        duration: Duration,
    ) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
            duration,
            success: false,
        }
    }

    /// Stdout and stderr joined, for conflict scanning and error blocks.
    pub fn combined_output(&self) -> String {
        match (self.stdout.trim_end(), self.stderr.trim_end()) {
            ("", err) => err.to_string(),
            (out, "") => out.to_string(),
            (out, err) => format!("{}\n{}", out, err),
        }
    }

    /// Convert a non-zero exit into [`UpsyncError::CommandFailed`].
    pub fn into_checked(self, command: &str) -> Result<Self> {
        if self.success {
            Ok(self)
        } else {
            Err(UpsyncError::CommandFailed {
                command: command.to_string(),
                code: self.exit_code,
                output: self.combined_output(),
            })
        }
    }
}

/// Options for command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Working directory.
    pub cwd: Option<PathBuf>,

    /// Environment variables (merged with system env).
    pub env: HashMap<String, String>,

    /// Capture stdout (if false, inherits from parent).
    pub capture_stdout: bool,

    /// Capture stderr (if false, inherits from parent).
    pub capture_stderr: bool,

    /// Run through a login shell so profile-managed toolchains are on PATH.
    pub login: bool,
}

impl CommandOptions {
    /// Capture both streams in `cwd`.
    pub fn captured(cwd: &Path) -> Self {
        Self {
            cwd: Some(cwd.to_path_buf()),
            capture_stdout: true,
            capture_stderr: true,
            ..Default::default()
        }
    }
}

/// Execute a shell command.
///
/// Only fails if the shell cannot be spawned; a non-zero exit is reported
/// through [`CommandResult::success`].
pub async fn execute(command: &str, options: &CommandOptions) -> Result<CommandResult> {
    let start = Instant::now();

    let mut cmd = Command::new(posix_shell());
    cmd.arg(shell_flag(options.login));
    cmd.arg(command);
    cmd.stdin(Stdio::null());
    cmd.kill_on_drop(true);

    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }

    for (key, value) in &options.env {
        cmd.env(key, value);
    }

    if options.capture_stdout {
        cmd.stdout(Stdio::piped());
    } else {
        cmd.stdout(Stdio::inherit());
    }

    if options.capture_stderr {
        cmd.stderr(Stdio::piped());
    } else {
        cmd.stderr(Stdio::inherit());
    }

    debug!("Executing: {}", command);
    let output = cmd.output().await.map_err(|e| UpsyncError::CommandFailed {
        command: command.to_string(),
        code: None,
        output: e.to_string(),
    })?;

    let duration = start.elapsed();
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    if output.status.success() {
        Ok(CommandResult::success(stdout, stderr, duration))
    } else {
        Ok(CommandResult::failure(
            output.status.code(),
            stdout,
            stderr,
            duration,
        ))
    }
}

/// Run a command to completion in `cwd`, capturing its output.
///
/// Output is logged before anything is returned. A non-zero exit becomes
/// [`UpsyncError::CommandFailed`] carrying the captured output.
pub async fn run_sync(command: &str, cwd: &Path) -> Result<CommandResult> {
    let result = run_captured(command, cwd).await?;
    result.into_checked(command)
}

/// Run a command in `cwd` and return its outcome whatever the exit status.
///
/// Used where a non-zero exit needs inspection (merge conflicts) rather than
/// an immediate error.
pub async fn run_captured(command: &str, cwd: &Path) -> Result<CommandResult> {
    let mut options = CommandOptions::captured(cwd);
    // Merges must never open an editor for the commit message.
    options
        .env
        .insert("GIT_MERGE_AUTOEDIT".to_string(), "no".to_string());

    let result = execute(command, &options).await?;
    log_output(command, &result);
    Ok(result)
}

/// Failed commands log their full output at `warn`, successful ones at `debug`.
fn log_output(command: &str, result: &CommandResult) {
    if result.success {
        debug!(
            "{} exited with {:?} in {:?}",
            command, result.exit_code, result.duration
        );
        for line in result.stdout.lines() {
            debug!("  stdout: {}", line);
        }
        for line in result.stderr.lines() {
            debug!("  stderr: {}", line);
        }
        return;
    }

    warn!(
        "{} failed with {:?} after {:?}",
        command, result.exit_code, result.duration
    );
    for line in result.stdout.lines() {
        warn!("  stdout: {}", line);
    }
    for line in result.stderr.lines() {
        warn!("  stderr: {}", line);
    }
}
