//! Sync command implementations.
//!
//! `upsync sync standard`, `upsync sync rebuild` and `upsync sync
//! source-push` each collect their parameters and run one workflow.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Local;

use crate::cli::args::{RebuildArgs, SourcePushArgs, StandardArgs};
use crate::error::Result;
use crate::ui::UserInterface;
use crate::workflows::{
    rebuild_workflow, source_push_workflow, standard_workflow, RebuildInput, RebuildParams,
    SourcePushInput, SourcePushParams, StandardInput, StandardParams,
};

use super::dispatcher::{Command, CommandResult};
use super::workflow::{load_run_config, require_repository, run_and_report};

/// Where a sync command runs and which extra config file it merges.
#[derive(Debug, Clone)]
struct Location {
    project_root: PathBuf,
    config_path: Option<PathBuf>,
}

impl Location {
    fn new(project_root: &Path, config_path: Option<&Path>) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            config_path: config_path.map(Path::to_path_buf),
        }
    }
}

/// `upsync sync standard`.
pub struct StandardCommand {
    location: Location,
    args: StandardArgs,
}

impl StandardCommand {
    pub fn new(project_root: &Path, config_path: Option<&Path>, args: StandardArgs) -> Self {
        Self {
            location: Location::new(project_root, config_path),
            args,
        }
    }
}

#[async_trait(?Send)]
impl Command for StandardCommand {
    async fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let Location {
            project_root,
            config_path,
        } = &self.location;
        require_repository(project_root).await?;
        let config = load_run_config(project_root, config_path.as_deref(), ui)?;

        let input = StandardInput {
            base: self.args.base.clone(),
            upstream: self.args.upstream.clone(),
            feature: self.args.feature.clone(),
        };
        let params = StandardParams::collect(ui, &config, &input, None, Local::now())?;
        run_and_report(&standard_workflow(project_root, &params), &config, ui).await
    }
}

/// `upsync sync rebuild`.
pub struct RebuildCommand {
    location: Location,
    args: RebuildArgs,
}

impl RebuildCommand {
    pub fn new(project_root: &Path, config_path: Option<&Path>, args: RebuildArgs) -> Self {
        Self {
            location: Location::new(project_root, config_path),
            args,
        }
    }
}

#[async_trait(?Send)]
impl Command for RebuildCommand {
    async fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let Location {
            project_root,
            config_path,
        } = &self.location;
        require_repository(project_root).await?;
        let config = load_run_config(project_root, config_path.as_deref(), ui)?;

        let input = RebuildInput {
            base: self.args.base.clone(),
            branch: self.args.branch.clone(),
            previous: self.args.previous.clone(),
            final_base: self.args.final_base.clone(),
        };
        let params = RebuildParams::collect(ui, &config, &input, None, Local::now())?;
        run_and_report(&rebuild_workflow(project_root, &params), &config, ui).await
    }
}

/// `upsync sync source-push`.
pub struct SourcePushCommand {
    location: Location,
    args: SourcePushArgs,
}

impl SourcePushCommand {
    pub fn new(project_root: &Path, config_path: Option<&Path>, args: SourcePushArgs) -> Self {
        Self {
            location: Location::new(project_root, config_path),
            args,
        }
    }

    fn input(&self) -> SourcePushInput {
        // A relative target repository is taken relative to this one.
        let then_repo = self.args.then_repo.as_ref().map(|repo| {
            if repo.is_absolute() {
                repo.clone()
            } else {
                self.location.project_root.join(repo)
            }
        });
        SourcePushInput {
            base: self.args.base.clone(),
            target: self.args.target.clone(),
            remote_url: self.args.remote_url.clone(),
            then_repo,
            then: self.args.then,
        }
    }
}

#[async_trait(?Send)]
impl Command for SourcePushCommand {
    async fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let Location {
            project_root,
            config_path,
        } = &self.location;
        require_repository(project_root).await?;
        let config = load_run_config(project_root, config_path.as_deref(), ui)?;

        let params = SourcePushParams::collect(ui, &config, &self.input())?;
        run_and_report(&source_push_workflow(project_root, &params), &config, ui).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UpsyncError;
    use crate::ui::MockUI;
    use crate::workflows::SyncMode;
    use tempfile::TempDir;

    #[test]
    fn relative_then_repo_is_resolved_against_project() {
        let cmd = SourcePushCommand::new(
            Path::new("/work/source"),
            None,
            SourcePushArgs {
                then_repo: Some(PathBuf::from("../plus")),
                then: Some(SyncMode::Standard),
                ..Default::default()
            },
        );
        let input = cmd.input();
        assert_eq!(input.then_repo, Some(PathBuf::from("/work/source/../plus")));
        assert_eq!(input.then, Some(SyncMode::Standard));
    }

    #[test]
    fn absolute_then_repo_is_kept() {
        let cmd = SourcePushCommand::new(
            Path::new("/work/source"),
            None,
            SourcePushArgs {
                then_repo: Some(PathBuf::from("/work/plus")),
                ..Default::default()
            },
        );
        assert_eq!(cmd.input().then_repo, Some(PathBuf::from("/work/plus")));
    }

    #[tokio::test]
    async fn sync_commands_refuse_outside_a_repository() {
        let temp = TempDir::new().unwrap();
        let mut ui = MockUI::new();

        let standard = StandardCommand::new(temp.path(), None, StandardArgs::default());
        assert!(matches!(
            standard.execute(&mut ui).await,
            Err(UpsyncError::NotARepository { .. })
        ));

        let rebuild = RebuildCommand::new(temp.path(), None, RebuildArgs::default());
        assert!(matches!(
            rebuild.execute(&mut ui).await,
            Err(UpsyncError::NotARepository { .. })
        ));

        let push = SourcePushCommand::new(temp.path(), None, SourcePushArgs::default());
        assert!(matches!(
            push.execute(&mut ui).await,
            Err(UpsyncError::NotARepository { .. })
        ));
    }
}
