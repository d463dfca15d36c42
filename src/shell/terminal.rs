//! Long-running commands in a user-visible terminal session.
//!
//! The session is not supervised. Completion is detected through a pair of
//! marker files the wrapped script touches on exit, polled until one appears
//! or the timeout elapses. Markers are removed on every exit path.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::TerminalConfig;
use crate::error::{Result, UpsyncError};

use super::platform::{posix_shell, shell_flag};

static MARKER_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Prefix shared by all marker file names.
pub const MARKER_PREFIX: &str = ".upsync-marker-";

/// Which marker the wrapped script left behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerOutcome {
    Success,
    Failure,
}

/// Success/failure sentinel files for one terminal invocation.
///
/// Dropping the pair deletes both files.
#[derive(Debug)]
pub struct MarkerPair {
    success: PathBuf,
    failure: PathBuf,
}

impl MarkerPair {
    /// Allocate a name unique to this process and invocation inside `dir`.
    pub fn new(dir: &Path) -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let seq = MARKER_COUNTER.fetch_add(1, Ordering::SeqCst);
        let stem = format!(
            "{}{}-{}-{}",
            MARKER_PREFIX,
            millis,
            std::process::id(),
            seq
        );

        Self {
            success: dir.join(format!("{}-success", stem)),
            failure: dir.join(format!("{}-failure", stem)),
        }
    }

    pub fn success_path(&self) -> &Path {
        &self.success
    }

    pub fn failure_path(&self) -> &Path {
        &self.failure
    }

    /// Remove both markers if present.
    pub fn clear(&self) {
        for path in [&self.success, &self.failure] {
            match std::fs::remove_file(path) {
                Ok(()) => debug!("Removed marker {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Could not remove marker {}: {}", path.display(), e),
            }
        }
    }

    /// Wrap `command` so it touches the marker matching its exit status.
    pub fn wrap(&self, command: &str) -> String {
        let success = self.success.to_string_lossy();
        let failure = self.failure.to_string_lossy();
        format!(
            "{}; if [ $? -eq 0 ]; then touch {}; else touch {}; fi",
            command,
            shell_words::quote(&success),
            shell_words::quote(&failure)
        )
    }

    /// Check which marker exists. Success wins if both are present.
    pub fn observe(&self) -> Option<MarkerOutcome> {
        if self.success.exists() {
            Some(MarkerOutcome::Success)
        } else if self.failure.exists() {
            Some(MarkerOutcome::Failure)
        } else {
            None
        }
    }
}

impl Drop for MarkerPair {
    fn drop(&mut self) {
        self.clear();
    }
}

/// What to open in the new terminal session.
#[derive(Debug, Clone)]
pub struct LaunchRequest {
    /// Wrapped script to run.
    pub script: String,
    /// Session name shown to the user.
    pub label: String,
    /// Working directory.
    pub cwd: PathBuf,
}

/// Opens a user-visible session running a script.
///
/// `launch` returns once the session is started; it does not wait for the
/// script to finish.
#[async_trait]
pub trait TerminalLauncher: Send + Sync {
    async fn launch(&self, request: &LaunchRequest) -> Result<()>;
}

/// Runs the script as a detached child sharing the current terminal.
#[derive(Debug, Clone, Default)]
pub struct ShellLauncher {
    /// Use a login shell so profile-managed tools are on PATH.
    pub login: bool,
}

#[async_trait]
impl TerminalLauncher for ShellLauncher {
    async fn launch(&self, request: &LaunchRequest) -> Result<()> {
        let child = Command::new(posix_shell())
            .arg(shell_flag(self.login))
            .arg(&request.script)
            .current_dir(&request.cwd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| UpsyncError::CommandFailed {
                command: request.label.clone(),
                code: None,
                output: e.to_string(),
            })?;

        debug!(
            "Started '{}' as pid {:?} in {}",
            request.label,
            child.id(),
            request.cwd.display()
        );
        Ok(())
    }
}

/// Opens the session through a user-supplied command template.
///
/// Placeholders `{label}`, `{cwd}` and `{script}` are substituted after the
/// template is split into words, so each stays a single argument.
/// Example: `tmux new-window -n {label} -c {cwd} {script}`.
#[derive(Debug, Clone)]
pub struct TemplateLauncher {
    pub template: String,
}

impl TemplateLauncher {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Expand the template into program and arguments.
    pub fn argv(&self, request: &LaunchRequest) -> Result<Vec<String>> {
        let words =
            shell_words::split(&self.template).map_err(|e| UpsyncError::ConfigValidationError {
                message: format!("terminal.launcher: {}", e),
            })?;
        if words.is_empty() {
            return Err(UpsyncError::ConfigValidationError {
                message: "terminal.launcher is empty".to_string(),
            });
        }

        let cwd = request.cwd.to_string_lossy();
        Ok(words
            .into_iter()
            .map(|w| {
                w.replace("{label}", &request.label)
                    .replace("{cwd}", &cwd)
                    .replace("{script}", &request.script)
            })
            .collect())
    }
}

#[async_trait]
impl TerminalLauncher for TemplateLauncher {
    async fn launch(&self, request: &LaunchRequest) -> Result<()> {
        let argv = self.argv(request)?;
        debug!("Launching terminal: {:?}", argv);

        let status = Command::new(&argv[0])
            .args(&argv[1..])
            .current_dir(&request.cwd)
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|e| UpsyncError::CommandFailed {
                command: argv.join(" "),
                code: None,
                output: e.to_string(),
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(UpsyncError::CommandFailed {
                command: argv.join(" "),
                code: status.code(),
                output: "terminal launcher exited with an error".to_string(),
            })
        }
    }
}

/// Runs commands in a terminal session and waits on their markers.
#[derive(Clone)]
pub struct TerminalRunner {
    launcher: Arc<dyn TerminalLauncher>,
    poll_interval: Duration,
    heartbeat: Duration,
    timeout: Duration,
}

impl std::fmt::Debug for TerminalRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalRunner")
            .field("poll_interval", &self.poll_interval)
            .field("heartbeat", &self.heartbeat)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for TerminalRunner {
    fn default() -> Self {
        Self::new(Arc::new(ShellLauncher::default()))
    }
}

impl TerminalRunner {
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
    pub const DEFAULT_HEARTBEAT: Duration = Duration::from_secs(10);
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30 * 60);

    pub fn new(launcher: Arc<dyn TerminalLauncher>) -> Self {
        Self {
            launcher,
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            heartbeat: Self::DEFAULT_HEARTBEAT,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Build from the `terminal` config section.
    pub fn from_config(config: &TerminalConfig) -> Self {
        let launcher: Arc<dyn TerminalLauncher> = match &config.launcher {
            Some(template) if !template.trim().is_empty() => {
                Arc::new(TemplateLauncher::new(template.clone()))
            }
            _ => Arc::new(ShellLauncher {
                login: config.login_shell,
            }),
        };

        Self::new(launcher)
            .with_poll_interval(Duration::from_millis(config.poll_interval_ms))
            .with_heartbeat(Duration::from_secs(config.heartbeat_secs))
            .with_timeout(Duration::from_secs(config.timeout_secs))
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_heartbeat(mut self, heartbeat: Duration) -> Self {
        self.heartbeat = heartbeat;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Launch `command` in a session named `label` and wait for it to finish.
    ///
    /// Returns the time spent waiting. A failure marker becomes
    /// [`UpsyncError::CommandFailed`]; no marker before the timeout becomes
    /// [`UpsyncError::Timeout`].
    pub async fn run_and_wait(&self, command: &str, label: &str, cwd: &Path) -> Result<Duration> {
        let markers = MarkerPair::new(cwd);
        markers.clear();

        let request = LaunchRequest {
            script: markers.wrap(command),
            label: label.to_string(),
            cwd: cwd.to_path_buf(),
        };
        self.launcher.launch(&request).await?;
        info!("Waiting for '{}' to finish in its terminal", label);

        let start = Instant::now();
        let mut last_heartbeat = start;
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let deadline = tokio::time::sleep(self.timeout);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                biased;

                _ = ticker.tick() => {
                    match markers.observe() {
                        Some(MarkerOutcome::Success) => {
                            markers.clear();
                            let elapsed = start.elapsed();
                            info!("'{}' finished after {:?}", label, elapsed);
                            return Ok(elapsed);
                        }
                        Some(MarkerOutcome::Failure) => {
                            markers.clear();
                            warn!("'{}' reported failure", label);
                            return Err(UpsyncError::CommandFailed {
                                command: command.to_string(),
                                code: None,
                                output: format!("'{}' failed; see its terminal for output", label),
                            });
                        }
                        None => {
                            if last_heartbeat.elapsed() >= self.heartbeat {
                                info!("Still waiting for '{}' ({:?} elapsed)", label, start.elapsed());
                                last_heartbeat = Instant::now();
                            }
                        }
                    }
                }
                _ = &mut deadline => {
                    markers.clear();
                    let elapsed = start.elapsed();
                    warn!("'{}' produced no marker within {:?}", label, self.timeout);
                    return Err(UpsyncError::Timeout {
                        command: command.to_string(),
                        elapsed,
                    });
                }
            }
        }
    }
}
