//! File-based control channel between `upsync continue|cancel` and a
//! running workflow.
//!
//! Layout under `<git-dir>/upsync/`:
//!
//! - `run.lock`: held by the running workflow
//! - `paused.json`: the pause currently waiting, if any
//! - `continue.request`: id of the pause to continue
//! - `cancel.request`: reason for cancelling

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::git;

use super::cancel::CancelToken;
use super::gate::{GateHandle, PauseNotice};

/// Directory name inside the git directory.
pub const CONTROL_DIR_NAME: &str = "upsync";

const LOCK_FILE: &str = "run.lock";
const PAUSE_FILE: &str = "paused.json";
const CONTINUE_FILE: &str = "continue.request";
const CANCEL_FILE: &str = "cancel.request";

/// A request dropped by another process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlRequest {
    /// Continue the pause with this id (any pause when `None`).
    Continue { pause_id: Option<u64> },
    /// Cancel the run.
    Cancel { reason: String },
}

/// Control files for one repository.
#[derive(Debug, Clone)]
pub struct ControlDir {
    root: PathBuf,
}

impl ControlDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Locate the control directory of the repository containing `cwd`.
    pub async fn discover(cwd: &Path) -> Result<Self> {
        Ok(Self::new(git::git_dir(cwd).await?.join(CONTROL_DIR_NAME)))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root.join(LOCK_FILE)
    }

    /// Whether a run currently holds the lock.
    pub fn is_running(&self) -> bool {
        self.lock_path().exists()
    }

    /// Remove requests and pause records left by an earlier run.
    pub fn reset(&self) {
        for name in [PAUSE_FILE, CONTINUE_FILE, CANCEL_FILE] {
            remove_quietly(&self.root.join(name));
        }
    }

    /// Publish `notice` for other processes. The record is removed on drop.
    pub fn record_pause(&self, notice: &PauseNotice) -> Result<PauseRecord> {
        std::fs::create_dir_all(&self.root)?;
        let path = self.root.join(PAUSE_FILE);
        let json = serde_json::to_string_pretty(notice).map_err(anyhow::Error::from)?;
        std::fs::write(&path, json)?;
        Ok(PauseRecord { path })
    }

    /// The pause the running workflow is waiting on, if any.
    pub fn current_pause(&self) -> Option<PauseNotice> {
        let content = std::fs::read_to_string(self.root.join(PAUSE_FILE)).ok()?;
        match serde_json::from_str(&content) {
            Ok(notice) => Some(notice),
            Err(e) => {
                warn!("Ignoring unreadable pause record: {}", e);
                None
            }
        }
    }

    /// Ask the running workflow to continue its current pause.
    ///
    /// Returns the pause that will be continued, or `None` if nothing is
    /// paused (no request is written then).
    pub fn request_continue(&self) -> Result<Option<PauseNotice>> {
        let Some(notice) = self.current_pause() else {
            return Ok(None);
        };
        std::fs::write(self.root.join(CONTINUE_FILE), notice.id.to_string())?;
        Ok(Some(notice))
    }

    /// Ask the running workflow to stop.
    pub fn request_cancel(&self, reason: &str) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::write(self.root.join(CANCEL_FILE), reason)?;
        Ok(())
    }

    /// Consume the oldest outstanding request. Cancellation wins.
    pub fn take_request(&self) -> Option<ControlRequest> {
        let cancel = self.root.join(CANCEL_FILE);
        if let Ok(reason) = std::fs::read_to_string(&cancel) {
            remove_quietly(&cancel);
            let reason = match reason.trim() {
                "" => "cancelled from another shell".to_string(),
                r => r.to_string(),
            };
            return Some(ControlRequest::Cancel { reason });
        }

        let cont = self.root.join(CONTINUE_FILE);
        if let Ok(content) = std::fs::read_to_string(&cont) {
            remove_quietly(&cont);
            return Some(ControlRequest::Continue {
                pause_id: content.trim().parse().ok(),
            });
        }

        None
    }

    /// Poll for requests and apply them to the gate until aborted.
    pub fn spawn_watcher(
        &self,
        handle: GateHandle,
        cancel: CancelToken,
        every: Duration,
    ) -> JoinHandle<()> {
        let dir = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                match dir.take_request() {
                    Some(ControlRequest::Continue { pause_id }) => {
                        let resolved = match pause_id {
                            Some(id) => handle.resolve_if(id),
                            None => handle.resolve_pending(),
                        };
                        if resolved {
                            info!("Continued from another shell");
                        } else {
                            debug!("Continue request matched no pending pause");
                        }
                    }
                    Some(ControlRequest::Cancel { reason }) => cancel.cancel(&reason),
                    None => {}
                }
            }
        })
    }
}

/// Published pause; deleting it on drop tells `upsync continue` nothing waits.
#[derive(Debug)]
pub struct PauseRecord {
    path: PathBuf,
}

impl Drop for PauseRecord {
    fn drop(&mut self) {
        remove_quietly(&self.path);
    }
}

fn remove_quietly(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!("Removed {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Could not remove {}: {}", path.display(), e),
    }
}
