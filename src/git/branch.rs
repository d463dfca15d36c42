//! Branch checkout and cleanup.

use std::path::Path;

use tracing::{info, warn};

use crate::error::Result;
use crate::shell::{run_captured, run_sync};

use super::git_command;

/// What [`checkout_or_create`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// The branch existed and was checked out.
    Existing,
    /// The branch was created from the base and checked out.
    Created,
}

/// Whether a local ref named `branch` resolves.
pub async fn branch_exists(branch: &str, cwd: &Path) -> Result<bool> {
    let result = run_captured(
        &git_command(&["rev-parse", "--verify", "--quiet", branch]),
        cwd,
    )
    .await?;
    Ok(result.success)
}

/// Check out `branch`, creating it from `base` if it does not exist.
pub async fn checkout_or_create(branch: &str, base: &str, cwd: &Path) -> Result<CheckoutOutcome> {
    if branch_exists(branch, cwd).await? {
        info!("Branch {} exists, checking it out", branch);
        run_sync(&git_command(&["checkout", branch]), cwd).await?;
        Ok(CheckoutOutcome::Existing)
    } else {
        info!("Creating branch {} from {}", branch, base);
        run_sync(&git_command(&["checkout", "-b", branch, base]), cwd).await?;
        Ok(CheckoutOutcome::Created)
    }
}

/// Force-delete a local branch. Failure is logged, never raised.
pub async fn delete_local(branch: &str, cwd: &Path) -> bool {
    match run_sync(&git_command(&["branch", "-D", branch]), cwd).await {
        Ok(_) => {
            info!("Deleted local branch {}", branch);
            true
        }
        Err(e) => {
            warn!(
                "Could not delete {} ({}); remove it later with `git branch -D {}`",
                branch, e, branch
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::current_branch;
    use crate::git::testing::init_repo;
    use tempfile::TempDir;

    #[tokio::test]
    async fn creates_then_reuses_branch() {
        let temp = TempDir::new().unwrap();
        init_repo(temp.path());

        let first = checkout_or_create("upgrade/test-250101", "main", temp.path())
            .await
            .unwrap();
        assert_eq!(first, CheckoutOutcome::Created);
        assert_eq!(
            current_branch(temp.path()).await.unwrap(),
            "upgrade/test-250101"
        );

        run_sync("git checkout main", temp.path()).await.unwrap();
        let second = checkout_or_create("upgrade/test-250101", "main", temp.path())
            .await
            .unwrap();
        assert_eq!(second, CheckoutOutcome::Existing);
        assert_eq!(
            current_branch(temp.path()).await.unwrap(),
            "upgrade/test-250101"
        );
    }

    #[tokio::test]
    async fn create_from_missing_base_fails() {
        let temp = TempDir::new().unwrap();
        init_repo(temp.path());

        assert!(checkout_or_create("feature", "no-such-base", temp.path())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn delete_local_is_best_effort() {
        let temp = TempDir::new().unwrap();
        init_repo(temp.path());
        run_sync("git branch scratch", temp.path()).await.unwrap();

        assert!(delete_local("scratch", temp.path()).await);
        assert!(!branch_exists("scratch", temp.path()).await.unwrap());
        assert!(!delete_local("scratch", temp.path()).await);
    }
}
