//! Command dispatching.
//!
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::cli::args::{Cli, Commands, SyncCommands};
use crate::error::{Result, UpsyncError};
use crate::runner::{RunState, WorkflowResult};
use crate::ui::UserInterface;

/// Exit code for a failed workflow or command.
pub const EXIT_FAILURE: i32 = 1;
/// Exit code for invalid or unreadable configuration.
pub const EXIT_CONFIG: i32 = 2;
/// Exit code for a run stopped by the user.
pub const EXIT_CANCELLED: i32 = 130;

/// Trait for command implementations.
#[async_trait(?Send)]
pub trait Command {
    /// Execute the command.
    async fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug, PartialEq, Eq)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }

    /// Map a finished workflow to its exit code.
    ///
    /// A run that failed because the user declined to go on exits like an
    /// aborted one.
    pub fn from_workflow(result: &WorkflowResult) -> Self {
        let declined = result
            .error
            .as_ref()
            .is_some_and(UpsyncError::is_user_cancelled);
        match result.state {
            RunState::Completed => Self::success(),
            RunState::Aborted => Self::failure(EXIT_CANCELLED),
            _ if declined => Self::failure(EXIT_CANCELLED),
            _ => Self::failure(EXIT_FAILURE),
        }
    }
}

/// Exit code for an error that escaped a command.
pub fn exit_code_for(error: &UpsyncError) -> i32 {
    match error {
        UpsyncError::ConfigNotFound { .. }
        | UpsyncError::ConfigParseError { .. }
        | UpsyncError::ConfigValidationError { .. } => EXIT_CONFIG,
        UpsyncError::UserCancelled { .. } => EXIT_CANCELLED,
        _ => EXIT_FAILURE,
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    project_root: PathBuf,
    config_path: Option<PathBuf>,
}

impl CommandDispatcher {
    /// Create a new dispatcher for the given project root.
    pub fn new(project_root: PathBuf) -> Self {
        Self {
            project_root,
            config_path: None,
        }
    }

    /// Merge `path` over the discovered config files.
    pub fn with_config(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    /// Get the project root path.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Dispatch and execute a command.
    pub async fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let root = &self.project_root;
        let config = self.config_path.as_deref();

        match &cli.command {
            Commands::Quick(args) => {
                super::quick::QuickCommand::new(root, config, args.clone())
                    .execute(ui)
                    .await
            }
            Commands::Sync(args) => match &args.mode {
                SyncCommands::Standard(a) => {
                    super::sync::StandardCommand::new(root, config, a.clone())
                        .execute(ui)
                        .await
                }
                SyncCommands::Rebuild(a) => {
                    super::sync::RebuildCommand::new(root, config, a.clone())
                        .execute(ui)
                        .await
                }
                SyncCommands::SourcePush(a) => {
                    super::sync::SourcePushCommand::new(root, config, a.clone())
                        .execute(ui)
                        .await
                }
            },
            Commands::Continue(_) => super::control::ContinueCommand::new(root).execute(ui).await,
            Commands::Cancel(args) => {
                super::control::CancelCommand::new(root, args.clone())
                    .execute(ui)
                    .await
            }
            Commands::Config(args) => {
                super::config::ConfigCommand::new(root, config, args.clone())
                    .execute(ui)
                    .await
            }
            Commands::Completions(args) => {
                super::completions::CompletionsCommand::new(args.clone())
                    .execute(ui)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn command_result_success() {
        let result = CommandResult::success();
        assert!(result.success);
        assert_eq!(result.exit_code, 0);
    }

    #[test]
    fn command_result_failure() {
        let result = CommandResult::failure(1);
        assert!(!result.success);
        assert_eq!(result.exit_code, 1);
    }

    #[test]
    fn config_errors_exit_with_two() {
        let err = UpsyncError::ConfigValidationError {
            message: "x".to_string(),
        };
        assert_eq!(exit_code_for(&err), EXIT_CONFIG);
        assert_eq!(exit_code_for(&UpsyncError::cancelled("stop")), EXIT_CANCELLED);
        assert_eq!(
            exit_code_for(&UpsyncError::NotARepository {
                path: PathBuf::from("/tmp")
            }),
            EXIT_FAILURE
        );
    }

    fn finished(state: RunState, error: Option<UpsyncError>) -> WorkflowResult {
        WorkflowResult {
            title: "Quick upgrade".into(),
            state,
            entries: Vec::new(),
            total_steps: 3,
            error,
            duration: std::time::Duration::ZERO,
        }
    }

    #[test]
    fn workflow_states_map_to_exit_codes() {
        assert_eq!(
            CommandResult::from_workflow(&finished(RunState::Completed, None)),
            CommandResult::success()
        );
        assert_eq!(
            CommandResult::from_workflow(&finished(RunState::Aborted, None)).exit_code,
            EXIT_CANCELLED
        );
        let failed = finished(
            RunState::Failed,
            Some(UpsyncError::Timeout {
                command: "yarn upgrade".into(),
                elapsed: std::time::Duration::from_secs(90),
            }),
        );
        assert_eq!(CommandResult::from_workflow(&failed).exit_code, EXIT_FAILURE);
        let declined = finished(
            RunState::Failed,
            Some(UpsyncError::cancelled("unresolved merge conflicts")),
        );
        assert_eq!(
            CommandResult::from_workflow(&declined).exit_code,
            EXIT_CANCELLED
        );
    }

    #[test]
    fn dispatcher_creation() {
        let dispatcher = CommandDispatcher::new(PathBuf::from("/test"))
            .with_config(Some(PathBuf::from("/test/extra.yml")));
        assert_eq!(dispatcher.project_root(), Path::new("/test"));
    }
}
