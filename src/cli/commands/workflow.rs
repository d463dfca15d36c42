//! Shared plumbing for the workflow commands.

use std::path::Path;

use tracing::debug;

use crate::config::{find_project_root, load_config, validate, UpsyncConfig};
use crate::error::{Result, UpsyncError};
use crate::git::is_repository;
use crate::runner::run_workflow;
use crate::steps::Workflow;
use crate::ui::{OutputMode, UserInterface};

use super::dispatcher::CommandResult;

/// Load and validate the configuration that applies to `project_root`.
///
/// The configured default output mode only applies when no output flag was
/// given.
pub(crate) fn load_run_config(
    project_root: &Path,
    explicit: Option<&Path>,
    ui: &mut dyn UserInterface,
) -> Result<UpsyncConfig> {
    let config_root =
        find_project_root(project_root).unwrap_or_else(|| project_root.to_path_buf());
    debug!("Loading configuration for {}", config_root.display());

    let config = load_config(&config_root, explicit)?;
    validate(&config)?;

    if ui.output_mode() == OutputMode::Normal {
        ui.set_output_mode(config.settings.default_output.into());
    }
    Ok(config)
}

/// Fail before any prompt if `cwd` is not a repository.
pub(crate) async fn require_repository(cwd: &Path) -> Result<()> {
    if is_repository(cwd).await {
        Ok(())
    } else {
        Err(UpsyncError::NotARepository {
            path: cwd.to_path_buf(),
        })
    }
}

/// Run `workflow` and map its terminal state to an exit code.
pub(crate) async fn run_and_report(
    workflow: &Workflow,
    config: &UpsyncConfig,
    ui: &mut dyn UserInterface,
) -> Result<CommandResult> {
    let result = run_workflow(workflow, config, ui).await?;
    Ok(CommandResult::from_workflow(&result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CONFIG_DIR;
    use crate::ui::MockUI;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn defaults_without_config_files() {
        let temp = TempDir::new().unwrap();
        let mut ui = MockUI::new();
        let config = load_run_config(temp.path(), None, &mut ui).unwrap();
        assert_eq!(config, UpsyncConfig::default());
    }

    #[test]
    fn applies_default_output_only_in_normal_mode() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(CONFIG_DIR)).unwrap();
        fs::write(
            temp.path().join(CONFIG_DIR).join("config.yml"),
            "settings:\n  default_output: quiet\n",
        )
        .unwrap();

        let mut ui = MockUI::new();
        load_run_config(temp.path(), None, &mut ui).unwrap();
        assert_eq!(ui.output_mode(), OutputMode::Quiet);

        let mut ui = MockUI::new();
        ui.set_output_mode(OutputMode::Verbose);
        load_run_config(temp.path(), None, &mut ui).unwrap();
        assert_eq!(ui.output_mode(), OutputMode::Verbose);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(CONFIG_DIR)).unwrap();
        fs::write(
            temp.path().join(CONFIG_DIR).join("config.yml"),
            "terminal:\n  poll_interval_ms: 0\n",
        )
        .unwrap();

        let mut ui = MockUI::new();
        let err = load_run_config(temp.path(), None, &mut ui).unwrap_err();
        assert!(matches!(err, UpsyncError::ConfigValidationError { .. }));
    }

    #[tokio::test]
    async fn plain_directory_is_not_a_repository() {
        let temp = TempDir::new().unwrap();
        let err = require_repository(temp.path()).await.unwrap_err();
        assert!(matches!(err, UpsyncError::NotARepository { .. }));
    }
}
