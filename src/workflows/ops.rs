//! In-process step operations shared by the workflows.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Local;
use tracing::{info, warn};

use crate::config::{load_config, validate};
use crate::error::{Result, UpsyncError};
use crate::git::{self, git_command, CheckoutOutcome};
use crate::runner::{run_workflow, RunState, StepContext};
use crate::steps::{StepAction, StepFlow, StepOperation};
use crate::ui::{ask_confirm, ask_input, ask_select, PromptOption};

use super::params::{
    RebuildInput, RebuildParams, SecondRemote, StandardInput, StandardParams, SyncMode,
};
use super::sync::{rebuild_workflow, standard_workflow};

/// Prompt key for the commit message.
pub const COMMIT_MESSAGE_KEY: &str = "commit_message";
/// Prompt key for what to do after an empty commit message.
pub const EMPTY_COMMIT_KEY: &str = "empty_commit_message";
/// Prompt key for running optional verification.
pub const RUN_VERIFICATION_KEY: &str = "run_verification";
/// Prompt key for a missing remote URL.
pub const REMOTE_URL_KEY: &str = "remote_url";

/// Check out a feature branch, creating it from `base` when missing.
#[derive(Debug, Clone)]
pub struct CheckoutFeature {
    pub branch: String,
    pub base: String,
}

#[async_trait(?Send)]
impl StepOperation for CheckoutFeature {
    async fn run(&self, ctx: &mut StepContext<'_>) -> Result<StepFlow> {
        match git::checkout_or_create(&self.branch, &self.base, ctx.cwd).await? {
            CheckoutOutcome::Existing => ctx
                .ui
                .message(&format!("Switched to existing branch {}", self.branch)),
            CheckoutOutcome::Created => ctx.ui.success(&format!(
                "Created {} from {}",
                self.branch, self.base
            )),
        }
        Ok(StepFlow::Continue)
    }
}

/// Delete a local branch; failure only warns.
#[derive(Debug, Clone)]
pub struct DeleteBranch {
    pub branch: String,
}

#[async_trait(?Send)]
impl StepOperation for DeleteBranch {
    async fn run(&self, ctx: &mut StepContext<'_>) -> Result<StepFlow> {
        if git::delete_local(&self.branch, ctx.cwd).await {
            ctx.ui.success(&format!("Deleted {}", self.branch));
        } else {
            ctx.ui.warning(&format!(
                "Could not delete {}; remove it later with `git branch -D {}`",
                self.branch, self.branch
            ));
        }
        Ok(StepFlow::Continue)
    }
}

/// Stage everything and commit with a user-confirmed message.
#[derive(Debug, Clone)]
pub struct CommitChanges {
    pub default_message: String,
}

#[async_trait(?Send)]
impl StepOperation for CommitChanges {
    async fn run(&self, ctx: &mut StepContext<'_>) -> Result<StepFlow> {
        if !git::is_dirty(ctx.cwd).await? {
            ctx.ui.message("Nothing to commit");
            return Ok(StepFlow::Continue);
        }
        ctx.run_sync(&git_command(&["add", "."])).await?;

        let message = loop {
            let message = ask_input(
                ctx.ui,
                COMMIT_MESSAGE_KEY,
                "Commit message:",
                Some(&self.default_message),
            )?;
            if !message.is_empty() {
                break message;
            }

            let empty = UpsyncError::EmptyInput {
                field: "commit message".to_string(),
            };
            ctx.ui.warning(&empty.to_string());
            let choice = ask_select(
                ctx.ui,
                EMPTY_COMMIT_KEY,
                "The commit message is empty. What next?",
                vec![
                    PromptOption::new("Enter it again", "retry"),
                    PromptOption::new("Skip the remaining steps", "skip"),
                    PromptOption::new("Abort the workflow", "abort"),
                ],
                "retry",
            )?;
            match choice.as_str() {
                "retry" => continue,
                "skip" => {
                    ctx.ui.warning("Stopping here; the remaining steps were skipped");
                    return Ok(StepFlow::Halt);
                }
                _ => return Err(empty),
            }
        };

        match ctx
            .run_sync(&git_command(&["commit", "-m", &message, "--no-verify"]))
            .await
        {
            Ok(_) => ctx.ui.success("Changes committed"),
            Err(e) => {
                warn!("Commit failed: {}", e);
                ctx.ui
                    .warning(&format!("Commit failed ({}); continuing without it", e));
            }
        }
        Ok(StepFlow::Continue)
    }
}

/// Ask whether to run the verification command; run it with retry if so.
#[derive(Debug, Clone)]
pub struct OptionalVerification {
    pub command: String,
    pub label: String,
}

#[async_trait(?Send)]
impl StepOperation for OptionalVerification {
    async fn run(&self, ctx: &mut StepContext<'_>) -> Result<StepFlow> {
        let question = format!("Run {} now? (usually takes 1-10 minutes)", self.label);
        if !ask_confirm(ctx.ui, RUN_VERIFICATION_KEY, &question, true)? {
            info!("Skipped {}", self.label);
            ctx.ui.message(&format!("Skipped {}", self.label));
            return Ok(StepFlow::Continue);
        }

        let action = StepAction::Terminal {
            command: self.command.clone(),
            label: self.label.clone(),
        };
        ctx.verify_with_retry(&self.label, &action).await
    }
}

/// Make sure the second remote exists, adding it when missing.
#[derive(Debug, Clone)]
pub struct EnsureRemote {
    pub remote: SecondRemote,
}

#[async_trait(?Send)]
impl StepOperation for EnsureRemote {
    async fn run(&self, ctx: &mut StepContext<'_>) -> Result<StepFlow> {
        let name = &self.remote.name;
        if let Some(url) = git::remote_url(name, ctx.cwd).await? {
            ctx.ui.message(&format!("Remote {} -> {}", name, url));
            return Ok(StepFlow::Continue);
        }

        let url = match &self.remote.url {
            Some(url) => url.clone(),
            None => ask_input(
                ctx.ui,
                REMOTE_URL_KEY,
                &format!("URL for remote {}:", name),
                None,
            )?,
        };
        if url.is_empty() {
            return Err(UpsyncError::EmptyInput {
                field: format!("URL for remote {}", name),
            });
        }

        git::ensure_remote(name, &url, ctx.cwd).await?;
        ctx.ui.success(&format!("Added remote {} -> {}", name, url));
        Ok(StepFlow::Continue)
    }
}

/// Fetch a branch and merge it, pausing on conflicts.
#[derive(Debug, Clone)]
pub struct FetchAndMerge {
    pub remote: String,
    pub branch: String,
}

#[async_trait(?Send)]
impl StepOperation for FetchAndMerge {
    async fn run(&self, ctx: &mut StepContext<'_>) -> Result<StepFlow> {
        ctx.run_sync(&git_command(&["fetch", &self.remote, &self.branch]))
            .await?;
        let tracking = format!("{}/{}", self.remote, self.branch);
        ctx.run_with_conflict_support(&git_command(&["merge", &tracking, "--no-verify"]))
            .await?;
        Ok(StepFlow::Continue)
    }
}

/// Continue with a standard or rebuild sync in another repository.
#[derive(Debug, Clone)]
pub struct Handoff {
    pub repo: PathBuf,
    pub mode: SyncMode,
    /// Branch the source push wrote; the default upstream / base there.
    pub pushed_branch: String,
    pub second_remote: SecondRemote,
}

#[async_trait(?Send)]
impl StepOperation for Handoff {
    async fn run(&self, ctx: &mut StepContext<'_>) -> Result<StepFlow> {
        let mut config = load_config(&self.repo, None)?;
        validate(&config)?;
        config.sync.remote_name = self.second_remote.name.clone();
        if self.second_remote.url.is_some() {
            config.sync.remote_url = self.second_remote.url.clone();
        }

        info!("Handing off to {} ({:?})", self.repo.display(), self.mode);
        ctx.ui
            .message(&format!("Continuing in {}", self.repo.display()));

        let now = Local::now();
        let workflow = match self.mode {
            SyncMode::Standard => {
                let params = StandardParams::collect(
                    ctx.ui,
                    &config,
                    &StandardInput::default(),
                    Some(&self.pushed_branch),
                    now,
                )?;
                standard_workflow(&self.repo, &params)
            }
            SyncMode::Rebuild => {
                let params = RebuildParams::collect(
                    ctx.ui,
                    &config,
                    &RebuildInput::default(),
                    Some(&self.pushed_branch),
                    now,
                )?;
                rebuild_workflow(&self.repo, &params)
            }
        };

        let mut result = run_workflow(&workflow, &config, ctx.ui).await?;
        match result.state {
            RunState::Completed => Ok(StepFlow::Continue),
            RunState::Aborted => Err(result
                .error
                .take()
                .unwrap_or_else(|| UpsyncError::cancelled("the handed-off run stopped early"))),
            _ => Err(result.error.take().unwrap_or_else(|| {
                UpsyncError::Other(anyhow::anyhow!("'{}' did not complete", workflow.title))
            })),
        }
    }
}
