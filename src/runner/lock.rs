//! One workflow run per repository.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Result, UpsyncError};

/// Exclusive run lock, released on drop.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    /// Create the lock file, failing with [`UpsyncError::RunInProgress`] if
    /// a live process holds it.
    ///
    /// A lock left behind by a process that is no longer running is removed
    /// and acquired again.
    pub fn acquire(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = match Self::create(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                if !Self::remove_if_stale(path)? {
                    return Err(UpsyncError::RunInProgress {
                        lock: path.to_path_buf(),
                    });
                }
                Self::create(path).map_err(|e| match e.kind() {
                    ErrorKind::AlreadyExists => UpsyncError::RunInProgress {
                        lock: path.to_path_buf(),
                    },
                    _ => e.into(),
                })?
            }
            Err(e) => return Err(e.into()),
        };
        writeln!(file, "{}", std::process::id())?;
        debug!("Acquired run lock {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    fn create(path: &Path) -> std::io::Result<std::fs::File> {
        OpenOptions::new().write(true).create_new(true).open(path)
    }

    /// Remove the lock at `path` if its holder is no longer running.
    fn remove_if_stale(path: &Path) -> Result<bool> {
        let Some(pid) = Self::holder(path) else {
            return Ok(false);
        };
        if is_process_running(pid) {
            return Ok(false);
        }

        warn!(
            "Removing stale run lock {} (PID {} no longer running)",
            path.display(),
            pid
        );
        match std::fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(true),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove the lock file without a guard, for exits that skip `Drop`.
    pub fn force_release(path: &Path) {
        match std::fs::remove_file(path) {
            Ok(()) => debug!("Force-released run lock {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Could not release run lock {}: {}", path.display(), e),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// PID recorded in an existing lock file.
    pub fn holder(path: &Path) -> Option<u32> {
        std::fs::read_to_string(path).ok()?.trim().parse().ok()
    }
}

/// Whether a process with `pid` exists.
pub fn is_process_running(pid: u32) -> bool {
    #[cfg(unix)]
    {
        // kill -0 probes for existence without signalling
        std::process::Command::new("kill")
            .arg("-0")
            .arg(pid.to_string())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    #[cfg(windows)]
    {
        std::process::Command::new("tasklist")
            .args(["/FI", &format!("PID eq {}", pid), "/NH"])
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .output()
            .ok()
            .and_then(|output| String::from_utf8(output.stdout).ok())
            .map(|s| s.contains(&pid.to_string()))
            .unwrap_or(false)
    }

    #[cfg(not(any(unix, windows)))]
    {
        let _ = pid;
        true
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!("Could not release run lock {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_until_released() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("upsync").join("run.lock");

        let lock = RunLock::acquire(&path).unwrap();
        assert_eq!(RunLock::holder(&path), Some(std::process::id()));

        let err = RunLock::acquire(&path).unwrap_err();
        assert!(matches!(err, UpsyncError::RunInProgress { .. }));

        drop(lock);
        assert!(!path.exists());
        assert!(RunLock::acquire(&path).is_ok());
    }

    #[test]
    fn lock_of_dead_process_is_reclaimed() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("upsync").join("run.lock");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "999999\n").unwrap();
        assert!(!is_process_running(999_999));

        let lock = RunLock::acquire(&path).unwrap();
        assert_eq!(RunLock::holder(&path), Some(std::process::id()));
        drop(lock);
        assert!(!path.exists());
    }

    #[test]
    fn lock_with_unreadable_holder_is_kept() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("run.lock");
        std::fs::write(&path, "").unwrap();

        let err = RunLock::acquire(&path).unwrap_err();
        assert!(matches!(err, UpsyncError::RunInProgress { .. }));
        assert!(path.exists());
    }

    #[test]
    fn force_release_removes_lock() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("run.lock");
        let lock = RunLock::acquire(&path).unwrap();
        std::mem::forget(lock);

        RunLock::force_release(&path);
        assert!(!path.exists());
        RunLock::force_release(&path);
    }
}
