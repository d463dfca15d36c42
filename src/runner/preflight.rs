//! Checks before any workflow touches the working tree.

use std::path::Path;

use tracing::debug;

use crate::error::{Result, UpsyncError};
use crate::git;
use crate::ui::{ask_confirm, UserInterface};

/// Prompt key for continuing with uncommitted changes.
pub const DIRTY_TREE_KEY: &str = "dirty_tree";

/// Require a git repository, and confirmation if the tree is dirty.
pub async fn preflight(cwd: &Path, ui: &mut dyn UserInterface) -> Result<()> {
    if !git::is_repository(cwd).await {
        return Err(UpsyncError::NotARepository {
            path: cwd.to_path_buf(),
        });
    }

    if git::is_dirty(cwd).await? {
        ui.warning("The working tree has uncommitted changes");
        if !ask_confirm(ui, DIRTY_TREE_KEY, "Continue anyway?", false)? {
            return Err(UpsyncError::cancelled(
                "uncommitted changes in the working tree",
            ));
        }
    }

    debug!("Preflight passed for {}", cwd.display());
    Ok(())
}
