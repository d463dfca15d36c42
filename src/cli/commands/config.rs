//! Config command implementation.
//!
//! The `upsync config` command shows resolved configuration.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::cli::args::ConfigArgs;
use crate::config::{find_project_root, ConfigPaths};
use crate::error::{Result, UpsyncError};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::workflow::load_run_config;

/// The config command implementation.
pub struct ConfigCommand {
    project_root: PathBuf,
    config_path: Option<PathBuf>,
    args: ConfigArgs,
}

impl ConfigCommand {
    /// Create a new config command.
    pub fn new(project_root: &Path, config_path: Option<&Path>, args: ConfigArgs) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            config_path: config_path.map(Path::to_path_buf),
            args,
        }
    }

    /// Get the project root path.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }
}

#[async_trait(?Send)]
impl Command for ConfigCommand {
    async fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let config = load_run_config(&self.project_root, self.config_path.as_deref(), ui)?;

        let config_root =
            find_project_root(&self.project_root).unwrap_or_else(|| self.project_root.clone());
        let paths =
            ConfigPaths::discover(&config_root).with_explicit(self.config_path.as_deref());
        let layers = paths.all();
        if layers.is_empty() {
            ui.message("# built-in defaults");
        } else {
            for path in &layers {
                ui.message(&format!("# {}", path.display()));
            }
        }
        ui.message("");

        if self.args.json {
            let json =
                serde_json::to_string_pretty(&config).map_err(|e| UpsyncError::Other(e.into()))?;
            ui.message(&json);
        } else {
            let yaml = serde_yaml::to_string(&config).map_err(|e| UpsyncError::Other(e.into()))?;
            ui.message(&yaml);
        }

        Ok(CommandResult::success())
    }
}
