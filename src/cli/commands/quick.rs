//! Quick command implementation.
//!
//! The `upsync quick` command upgrades an environment's target branch.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Local;

use crate::cli::args::QuickArgs;
use crate::error::Result;
use crate::ui::UserInterface;
use crate::workflows::{quick_workflow, QuickInput, QuickParams};

use super::dispatcher::{Command, CommandResult};
use super::workflow::{load_run_config, require_repository, run_and_report};

/// The quick command implementation.
pub struct QuickCommand {
    project_root: PathBuf,
    config_path: Option<PathBuf>,
    args: QuickArgs,
}

impl QuickCommand {
    /// Create a new quick command.
    pub fn new(project_root: &Path, config_path: Option<&Path>, args: QuickArgs) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            config_path: config_path.map(Path::to_path_buf),
            args,
        }
    }

    fn input(&self) -> QuickInput {
        QuickInput {
            environment: self.args.env.clone(),
            suffix: self.args.suffix.clone(),
            target: self.args.target.clone(),
        }
    }
}

#[async_trait(?Send)]
impl Command for QuickCommand {
    async fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        require_repository(&self.project_root).await?;
        let config = load_run_config(&self.project_root, self.config_path.as_deref(), ui)?;

        let params = QuickParams::collect(ui, &config, &self.input(), Local::now())?;
        let workflow = quick_workflow(&self.project_root, &params);
        run_and_report(&workflow, &config, ui).await
    }
}
