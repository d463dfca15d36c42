//! Workflow parameters.
//!
//! Each workflow is built from a parameter set. Values given on the command
//! line are used as-is (after validation); anything missing is asked for,
//! with the configured default pre-filled.

use std::path::PathBuf;

use chrono::{DateTime, Local};

use crate::config::UpsyncConfig;
use crate::error::{Result, UpsyncError};
use crate::ui::{ask_confirm, ask_input, ask_select, PromptOption, UserInterface};

/// `YYMMDD`, or `YYMMDD HH:MM:SS` with `with_time`.
pub fn date_tag(now: DateTime<Local>, with_time: bool) -> String {
    if with_time {
        now.format("%y%m%d %H:%M:%S").to_string()
    } else {
        now.format("%y%m%d").to_string()
    }
}

/// Feature branch suffixes must be non-empty and contain no `/` or whitespace.
pub fn validate_suffix(suffix: &str) -> Result<()> {
    let message = if suffix.is_empty() {
        "must not be empty"
    } else if suffix.contains('/') {
        "must not contain '/'"
    } else if suffix.contains(char::is_whitespace) {
        "must not contain spaces"
    } else {
        return Ok(());
    };
    Err(UpsyncError::InvalidParameter {
        name: "branch suffix".to_string(),
        message: message.to_string(),
    })
}

/// Fill the `{date}` and `{source}` placeholders of a commit message template.
pub fn render_commit_message(template: &str, date: &str, source: &str) -> String {
    template.replace("{date}", date).replace("{source}", source)
}

/// Use `given`, or ask with `default` pre-filled. Blank answers are errors.
fn resolve_value(
    ui: &mut dyn UserInterface,
    key: &str,
    field: &str,
    given: Option<&str>,
    default: &str,
) -> Result<String> {
    let value = match given {
        Some(v) => v.trim().to_string(),
        None => ask_input(ui, key, &format!("{}:", capitalize(field)), Some(default))?,
    };
    if value.is_empty() {
        return Err(UpsyncError::EmptyInput {
            field: field.to_string(),
        });
    }
    Ok(value)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Values the user may pass for a quick upgrade.
#[derive(Debug, Clone, Default)]
pub struct QuickInput {
    pub environment: Option<String>,
    pub suffix: Option<String>,
    pub target: Option<String>,
}

/// Everything a quick upgrade run needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickParams {
    pub environment: String,
    pub remote: String,
    pub target_branch: String,
    pub source_branch: String,
    pub feature_branch: String,
    pub upgrade_command: String,
    pub test_command: String,
    pub commit_message: String,
}

impl QuickParams {
    /// Resolve parameters against `config`, asking for anything not given.
    pub fn collect(
        ui: &mut dyn UserInterface,
        config: &UpsyncConfig,
        input: &QuickInput,
        now: DateTime<Local>,
    ) -> Result<Self> {
        let quick = &config.quick;

        let environment = match &input.environment {
            Some(env) => env.clone(),
            None => {
                let options = quick
                    .environments
                    .iter()
                    .map(|(name, b)| {
                        PromptOption::new(format!("{} ({} <- {})", name, b.target, b.source), name)
                    })
                    .collect();
                ask_select(
                    ui,
                    ENVIRONMENT_KEY,
                    "Which environment do you want to upgrade?",
                    options,
                    &quick.default_environment,
                )?
            }
        };
        let branches =
            quick
                .environments
                .get(&environment)
                .ok_or_else(|| UpsyncError::InvalidParameter {
                    name: "environment".to_string(),
                    message: format!(
                        "'{}' is not configured (known: {})",
                        environment,
                        quick
                            .environments
                            .keys()
                            .map(String::as_str)
                            .collect::<Vec<_>>()
                            .join(", ")
                    ),
                })?;

        let suffix = match &input.suffix {
            Some(s) => s.clone(),
            None => ask_input(
                ui,
                SUFFIX_KEY,
                "Feature branch suffix:",
                Some(&date_tag(now, false)),
            )?,
        };
        validate_suffix(&suffix)?;

        let target_branch = match &input.target {
            Some(t) => resolve_value(ui, TARGET_KEY, "target branch", Some(t), &branches.target)?,
            None => {
                let question = format!("Merge the upgrade into {}?", branches.target);
                if ask_confirm(ui, CONFIRM_TARGET_KEY, &question, true)? {
                    branches.target.clone()
                } else {
                    resolve_value(ui, TARGET_KEY, "target branch", None, &branches.target)?
                }
            }
        };

        Ok(Self {
            feature_branch: format!("{}/{}-{}", quick.branch_prefix, environment, suffix),
            environment,
            remote: config.settings.remote.clone(),
            target_branch,
            source_branch: branches.source.clone(),
            upgrade_command: quick.upgrade_command.clone(),
            test_command: quick.test_command.clone(),
            commit_message: render_commit_message(
                &quick.commit_message,
                &date_tag(now, true),
                &branches.source,
            ),
        })
    }
}

/// Which workflow continues in the target repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SyncMode {
    /// Merge the pushed source branch into a feature branch and upgrade.
    Standard,
    /// Rebuild the upgrade branch from the pushed source branch.
    Rebuild,
}

/// Second remote shared by the sync workflows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondRemote {
    pub name: String,
    /// Added under `name` when the remote is missing.
    pub url: Option<String>,
}

/// Values the user may pass for a standard sync.
#[derive(Debug, Clone, Default)]
pub struct StandardInput {
    pub base: Option<String>,
    pub upstream: Option<String>,
    pub feature: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandardParams {
    pub remote: String,
    pub second_remote: SecondRemote,
    pub base_branch: String,
    pub upstream_branch: String,
    pub feature_branch: String,
    pub upgrade_command: String,
    pub test_command: String,
    pub conflict_rules: Vec<String>,
}

impl StandardParams {
    /// `upstream_hint` overrides the configured upstream default, e.g. with
    /// the branch a source push just wrote.
    pub fn collect(
        ui: &mut dyn UserInterface,
        config: &UpsyncConfig,
        input: &StandardInput,
        upstream_hint: Option<&str>,
        now: DateTime<Local>,
    ) -> Result<Self> {
        let sync = &config.sync;
        let base_branch = resolve_value(
            ui,
            BASE_KEY,
            "base branch",
            input.base.as_deref(),
            &sync.base_branch,
        )?;
        let upstream_branch = resolve_value(
            ui,
            UPSTREAM_KEY,
            "upstream branch",
            input.upstream.as_deref(),
            upstream_hint.unwrap_or(&sync.upstream_branch),
        )?;
        let feature_branch = resolve_value(
            ui,
            FEATURE_KEY,
            "feature branch",
            input.feature.as_deref(),
            &format!("{}{}", sync.feature_prefix, date_tag(now, false)),
        )?;

        Ok(Self {
            remote: config.settings.remote.clone(),
            second_remote: second_remote(config),
            base_branch,
            upstream_branch,
            feature_branch,
            upgrade_command: sync.upgrade_command.clone(),
            test_command: sync.test_command.clone(),
            conflict_rules: config.conflicts.rules.clone(),
        })
    }
}

/// Values the user may pass for a rebuild sync.
#[derive(Debug, Clone, Default)]
pub struct RebuildInput {
    pub base: Option<String>,
    pub branch: Option<String>,
    /// `Some("")` means "no previous branch" without asking.
    pub previous: Option<String>,
    pub final_base: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildParams {
    pub remote: String,
    pub second_remote: SecondRemote,
    pub base_branch: String,
    pub new_branch: String,
    pub previous_branch: Option<String>,
    pub final_base_branch: String,
    pub rebuild_command: String,
    pub test_command: String,
    pub conflict_rules: Vec<String>,
}

impl RebuildParams {
    /// `base_hint` overrides the configured base default (the rebuild
    /// starts from the pushed upstream branch).
    pub fn collect(
        ui: &mut dyn UserInterface,
        config: &UpsyncConfig,
        input: &RebuildInput,
        base_hint: Option<&str>,
        now: DateTime<Local>,
    ) -> Result<Self> {
        let sync = &config.sync;
        let base_branch = resolve_value(
            ui,
            BASE_KEY,
            "base branch",
            input.base.as_deref(),
            base_hint.unwrap_or(&sync.upstream_branch),
        )?;
        let new_branch = resolve_value(
            ui,
            FEATURE_KEY,
            "new upgrade branch",
            input.branch.as_deref(),
            &format!("{}{}", sync.feature_prefix, date_tag(now, false)),
        )?;
        let previous = match &input.previous {
            Some(p) => p.trim().to_string(),
            None => ask_input(
                ui,
                PREVIOUS_KEY,
                "Previous upgrade branch to merge (leave empty for none):",
                None,
            )?,
        };
        let final_base_branch = resolve_value(
            ui,
            FINAL_BASE_KEY,
            "final base branch",
            input.final_base.as_deref(),
            &sync.base_branch,
        )?;

        Ok(Self {
            remote: config.settings.remote.clone(),
            second_remote: second_remote(config),
            base_branch,
            new_branch,
            previous_branch: (!previous.is_empty()).then_some(previous),
            final_base_branch,
            rebuild_command: sync.rebuild_command.clone(),
            test_command: sync.test_command.clone(),
            conflict_rules: config.conflicts.rules.clone(),
        })
    }
}

/// Values the user may pass for a source push.
#[derive(Debug, Clone, Default)]
pub struct SourcePushInput {
    pub base: Option<String>,
    pub target: Option<String>,
    pub remote_url: Option<String>,
    pub then_repo: Option<PathBuf>,
    pub then: Option<SyncMode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePushParams {
    pub remote: String,
    pub second_remote: SecondRemote,
    pub base_branch: String,
    pub target_branch: String,
    /// Repository and workflow to continue with after the push.
    pub handoff: Option<(PathBuf, SyncMode)>,
}

impl SourcePushParams {
    pub fn collect(
        ui: &mut dyn UserInterface,
        config: &UpsyncConfig,
        input: &SourcePushInput,
    ) -> Result<Self> {
        let sync = &config.sync;
        let base_branch = resolve_value(
            ui,
            BASE_KEY,
            "base branch",
            input.base.as_deref(),
            &sync.base_branch,
        )?;
        let target_branch = resolve_value(
            ui,
            TARGET_KEY,
            "target branch",
            input.target.as_deref(),
            &sync.upstream_branch,
        )?;

        let mut second_remote = second_remote(config);
        if let Some(url) = &input.remote_url {
            second_remote.url = Some(url.clone());
        }

        let handoff = match &input.then_repo {
            Some(repo) => {
                let mode = match input.then {
                    Some(mode) => mode,
                    None => {
                        let choice = ask_select(
                            ui,
                            MODE_KEY,
                            "Which workflow should continue in the target repository?",
                            vec![
                                PromptOption::new("Standard sync (no script changes)", "standard"),
                                PromptOption::new("Rebuild (script or structure changes)", "rebuild"),
                            ],
                            "standard",
                        )?;
                        if choice == "rebuild" {
                            SyncMode::Rebuild
                        } else {
                            SyncMode::Standard
                        }
                    }
                };
                Some((repo.clone(), mode))
            }
            None => None,
        };

        Ok(Self {
            remote: config.settings.remote.clone(),
            second_remote,
            base_branch,
            target_branch,
            handoff,
        })
    }
}

fn second_remote(config: &UpsyncConfig) -> SecondRemote {
    SecondRemote {
        name: config.sync.remote_name.clone(),
        url: config.sync.remote_url.clone(),
    }
}

/// Prompt keys, also usable as `UPSYNC_PROMPT_<KEY>` overrides.
pub const ENVIRONMENT_KEY: &str = "environment";
pub const SUFFIX_KEY: &str = "suffix";
pub const CONFIRM_TARGET_KEY: &str = "confirm_target";
pub const TARGET_KEY: &str = "target_branch";
pub const BASE_KEY: &str = "base_branch";
pub const UPSTREAM_KEY: &str = "upstream_branch";
pub const FEATURE_KEY: &str = "feature_branch";
pub const PREVIOUS_KEY: &str = "previous_branch";
pub const FINAL_BASE_KEY: &str = "final_base_branch";
pub const MODE_KEY: &str = "then_mode";
