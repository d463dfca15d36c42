//! Git repository queries and branch operations.
//!
//! Everything goes through the `git` CLI; exit status and text output are
//! the only contract.

pub mod branch;
pub mod conflicts;

pub use branch::{branch_exists, checkout_or_create, delete_local, CheckoutOutcome};
pub use conflicts::{
    has_conflicts, inspect, is_merge_command, list_conflicts, merge_review_guidance,
    output_indicates_conflict, resolution_guidance, ConflictState,
};

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Result, UpsyncError};
use crate::shell::{run_captured, run_sync};

/// Build a `git` command line with each argument shell-quoted.
pub fn git_command(args: &[&str]) -> String {
    format!("git {}", shell_words::join(args))
}

/// Absolute path of the repository's git directory.
pub async fn git_dir(cwd: &Path) -> Result<PathBuf> {
    let result = run_captured(&git_command(&["rev-parse", "--absolute-git-dir"]), cwd).await?;
    if !result.success {
        return Err(UpsyncError::NotARepository {
            path: cwd.to_path_buf(),
        });
    }
    Ok(PathBuf::from(result.stdout.trim()))
}

/// Whether `cwd` is inside a git work tree.
pub async fn is_repository(cwd: &Path) -> bool {
    run_captured(&git_command(&["rev-parse", "--is-inside-work-tree"]), cwd)
        .await
        .map(|r| r.success && r.stdout.trim() == "true")
        .unwrap_or(false)
}

/// Whether the work tree has staged, unstaged, or untracked changes.
pub async fn is_dirty(cwd: &Path) -> Result<bool> {
    let result = run_sync(&git_command(&["status", "--porcelain"]), cwd).await?;
    Ok(!result.stdout.trim().is_empty())
}

/// Name of the checked-out branch (`HEAD` when detached).
pub async fn current_branch(cwd: &Path) -> Result<String> {
    let result = run_sync(&git_command(&["rev-parse", "--abbrev-ref", "HEAD"]), cwd).await?;
    Ok(result.stdout.trim().to_string())
}

/// URL configured for `remote`, if the remote exists.
pub async fn remote_url(remote: &str, cwd: &Path) -> Result<Option<String>> {
    let result = run_captured(&git_command(&["remote", "get-url", remote]), cwd).await?;
    if result.success {
        Ok(Some(result.stdout.trim().to_string()))
    } else {
        debug!("Remote {} not configured", remote);
        Ok(None)
    }
}

/// Add `remote` with `url` unless it already exists. Returns `true` if added.
pub async fn ensure_remote(remote: &str, url: &str, cwd: &Path) -> Result<bool> {
    if let Some(existing) = remote_url(remote, cwd).await? {
        debug!("Remote {} already points at {}", remote, existing);
        return Ok(false);
    }
    run_sync(&git_command(&["remote", "add", remote, url]), cwd).await?;
    info!("Added remote {} -> {}", remote, url);
    Ok(true)
}
