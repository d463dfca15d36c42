//! Configuration schema definitions for upsync.
//!
//! This module contains the struct definitions that map to the YAML
//! configuration file format. Every field has a default, so an empty file
//! (or no file at all) yields a usable configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root configuration structure for `.upsync/config.yml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpsyncConfig {
    /// Global settings
    pub settings: Settings,

    /// How terminal steps are launched and watched
    pub terminal: TerminalConfig,

    /// Quick upgrade defaults
    pub quick: QuickConfig,

    /// Standard / rebuild / source-push defaults
    pub sync: SyncConfig,

    /// Conflict resolution guidance
    pub conflicts: ConflictsConfig,
}

/// Global settings that apply to all workflows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Default output mode: verbose, normal, quiet, silent
    pub default_output: OutputSetting,

    /// Remote that feature and target branches are pulled from and pushed to
    pub remote: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_output: OutputSetting::Normal,
            remote: default_remote(),
        }
    }
}

fn default_remote() -> String {
    "origin".to_string()
}

/// Output verbosity as written in config files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputSetting {
    Verbose,
    #[default]
    Normal,
    Quiet,
    Silent,
}

/// Terminal step settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    /// Command template that opens a visible terminal.
    ///
    /// Placeholders: `{label}`, `{cwd}`, `{script}`. When unset, the script
    /// runs detached in a background shell.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launcher: Option<String>,

    /// Run the script in a login shell so profile PATH changes apply
    pub login_shell: bool,

    /// How often to look for completion markers
    pub poll_interval_ms: u64,

    /// How often to log that a terminal step is still running
    pub heartbeat_secs: u64,

    /// Give up on a terminal step after this long
    pub timeout_secs: u64,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            launcher: None,
            login_shell: true,
            poll_interval_ms: 500,
            heartbeat_secs: 10,
            timeout_secs: 30 * 60,
        }
    }
}

/// Branch pair for one quick-upgrade environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentBranches {
    /// Branch the upgrade lands on
    pub target: String,
    /// Branch the upgraded code is pulled from
    pub source: String,
}

impl EnvironmentBranches {
    pub fn new(target: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            source: source.into(),
        }
    }
}

/// Quick upgrade settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuickConfig {
    /// Environment name to branch pair
    pub environments: BTreeMap<String, EnvironmentBranches>,

    /// Environment used when none is given
    pub default_environment: String,

    /// Upgrade script, run in a terminal
    pub upgrade_command: String,

    /// Verification command, run in a terminal
    pub test_command: String,

    /// Feature branches are named `<prefix>/<env>-<suffix>`
    pub branch_prefix: String,

    /// Default commit message. Placeholders: `{date}`, `{source}`.
    pub commit_message: String,
}

impl Default for QuickConfig {
    fn default() -> Self {
        let mut environments = BTreeMap::new();
        environments.insert(
            "test".to_string(),
            EnvironmentBranches::new("test-220915", "plus-upgrade-test"),
        );
        environments.insert(
            "inte".to_string(),
            EnvironmentBranches::new("sprint-251225", "plus-upgrade-sprint"),
        );
        Self {
            environments,
            default_environment: "test".to_string(),
            upgrade_command: "node ./scripts/upgrade-bizcore.js".to_string(),
            test_command: "yarn test".to_string(),
            branch_prefix: "upgrade".to_string(),
            commit_message: "upgrade(CPYF-12595):{date} {source} branch code upgrade".to_string(),
        }
    }
}

/// Cross-repository sync settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Second remote that receives source pushes and final merges
    pub remote_name: String,

    /// URL used when the second remote has to be added
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,

    /// Branch upgrades start from and finally merge into
    pub base_branch: String,

    /// Branch the source repository pushes to on the second remote
    pub upstream_branch: String,

    /// Feature branches default to `<prefix><YYMMDD>`
    pub feature_prefix: String,

    /// Upgrade command for standard syncs
    pub upgrade_command: String,

    /// Upgrade command for rebuild syncs (commits its own changes)
    pub rebuild_command: String,

    /// Verification command
    pub test_command: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            remote_name: "plus".to_string(),
            remote_url: Some(
                "https://gitlab.rd.chanjet.com/cc_web/cc-front-biz-app-service-plus".to_string(),
            ),
            base_branch: "test-220915".to_string(),
            upstream_branch: "feat-test-250918".to_string(),
            feature_prefix: "feature/upgrade-test-".to_string(),
            upgrade_command: "yarn upgrade".to_string(),
            rebuild_command: "yarn upgrade --commit".to_string(),
            test_command: "yarn test".to_string(),
        }
    }
}

/// Conflict handling settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConflictsConfig {
    /// Resolution guidance shown, in order, while conflicts remain
    pub rules: Vec<String>,
}

impl Default for ConflictsConfig {
    fn default() -> Self {
        Self {
            rules: vec![
                "voucherconfig: keep the current branch's version first, overwrite it afterwards"
                    .to_string(),
                "bizSchemaManager / bizApplication: prefer the current branch".to_string(),
                "reference conflicts: compare and take the new branch where needed".to_string(),
            ],
        }
    }
}
