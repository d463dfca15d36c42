//! Continue and cancel commands.
//!
//! Both talk to the workflow running in the same repository through its
//! control files; neither waits for the run to react.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;

use crate::cli::args::CancelArgs;
use crate::error::Result;
use crate::runner::ControlDir;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult, EXIT_FAILURE};
use super::workflow::require_repository;

const NO_RUN: &str = "No upsync workflow is running in this repository";

/// The continue command implementation.
pub struct ContinueCommand {
    project_root: PathBuf,
}

impl ContinueCommand {
    pub fn new(project_root: &Path) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
        }
    }
}

#[async_trait(?Send)]
impl Command for ContinueCommand {
    async fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        require_repository(&self.project_root).await?;
        let control = ControlDir::discover(&self.project_root).await?;

        if !control.is_running() {
            ui.warning(NO_RUN);
            return Ok(CommandResult::failure(EXIT_FAILURE));
        }

        match control.request_continue()? {
            Some(notice) => {
                info!("Requested continue of pause {}", notice.id);
                ui.success(&format!("Continuing: {}", notice.title));
                Ok(CommandResult::success())
            }
            None => {
                ui.warning("The running workflow is not waiting for confirmation");
                Ok(CommandResult::failure(EXIT_FAILURE))
            }
        }
    }
}

/// The cancel command implementation.
pub struct CancelCommand {
    project_root: PathBuf,
    args: CancelArgs,
}

impl CancelCommand {
    pub fn new(project_root: &Path, args: CancelArgs) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            args,
        }
    }

    fn reason(&self) -> &str {
        self.args
            .reason
            .as_deref()
            .unwrap_or("cancelled from another shell")
    }
}

#[async_trait(?Send)]
impl Command for CancelCommand {
    async fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        require_repository(&self.project_root).await?;
        let control = ControlDir::discover(&self.project_root).await?;

        if !control.is_running() {
            ui.warning(NO_RUN);
            return Ok(CommandResult::failure(EXIT_FAILURE));
        }

        control.request_cancel(self.reason())?;
        info!("Requested cancel: {}", self.reason());
        ui.success("Cancellation requested; the run stops at its next check");
        Ok(CommandResult::success())
    }
}
