//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::workflows::SyncMode;

/// upsync - guided branch upgrade and sync workflows.
#[derive(Debug, Parser)]
#[command(name = "upsync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Extra config file, merged over .upsync/config.yml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Repository to work in (defaults to the current directory)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Show verbose output, including command output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Use defaults and UPSYNC_PROMPT_<KEY> overrides instead of prompting
    #[arg(long, global = true, env = "UPSYNC_NON_INTERACTIVE")]
    pub non_interactive: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Upgrade a target branch from its source branch via a feature branch
    Quick(QuickArgs),

    /// Sync an upgrade between the source and target repositories
    Sync(SyncArgs),

    /// Continue the paused workflow running in this repository
    Continue(ContinueArgs),

    /// Cancel the workflow running in this repository
    Cancel(CancelArgs),

    /// Show resolved configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `quick` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct QuickArgs {
    /// Environment to upgrade (as configured under quick.environments)
    #[arg(short, long, value_name = "ENV")]
    pub env: Option<String>,

    /// Feature branch suffix (defaults to today's YYMMDD)
    #[arg(long)]
    pub suffix: Option<String>,

    /// Target branch, overriding the environment's default
    #[arg(long)]
    pub target: Option<String>,
}

/// Arguments for the `sync` command.
#[derive(Debug, Clone, clap::Args)]
pub struct SyncArgs {
    #[command(subcommand)]
    pub mode: SyncCommands,
}

/// Sync scenarios.
#[derive(Debug, Clone, Subcommand)]
pub enum SyncCommands {
    /// Merge the pushed upstream branch into a feature branch and upgrade
    Standard(StandardArgs),

    /// Rebuild the upgrade branch from the pushed upstream branch
    Rebuild(RebuildArgs),

    /// Push the source base branch to the target repository's remote
    SourcePush(SourcePushArgs),
}

/// Arguments for `sync standard`.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct StandardArgs {
    /// Branch the upgrade starts from and merges into
    #[arg(long)]
    pub base: Option<String>,

    /// Branch pushed from the source repository
    #[arg(long)]
    pub upstream: Option<String>,

    /// Feature branch to upgrade on
    #[arg(long)]
    pub feature: Option<String>,
}

/// Arguments for `sync rebuild`.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct RebuildArgs {
    /// Branch the new upgrade branch starts from
    #[arg(long)]
    pub base: Option<String>,

    /// New upgrade branch
    #[arg(long)]
    pub branch: Option<String>,

    /// Previous upgrade branch to merge in (empty for none)
    #[arg(long)]
    pub previous: Option<String>,

    /// Branch the result is finally merged into
    #[arg(long)]
    pub final_base: Option<String>,
}

/// Arguments for `sync source-push`.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct SourcePushArgs {
    /// Branch to publish
    #[arg(long)]
    pub base: Option<String>,

    /// Branch to write on the second remote
    #[arg(long)]
    pub target: Option<String>,

    /// URL for the second remote if it has to be added
    #[arg(long)]
    pub remote_url: Option<String>,

    /// Target repository to continue in after the push
    #[arg(long, value_name = "PATH")]
    pub then_repo: Option<PathBuf>,

    /// Workflow to run in the target repository
    #[arg(long, value_enum, requires = "then_repo")]
    pub then: Option<SyncMode>,
}

/// Arguments for the `continue` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ContinueArgs {}

/// Arguments for the `cancel` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct CancelArgs {
    /// Reason recorded with the cancellation
    #[arg(long)]
    pub reason: Option<String>,
}

/// Arguments for the `config` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ConfigArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_quick_with_globals() {
        let cli = Cli::try_parse_from([
            "upsync",
            "quick",
            "--env",
            "inte",
            "--suffix",
            "hotfix",
            "--non-interactive",
            "-q",
        ])
        .unwrap();
        assert!(cli.non_interactive);
        assert!(cli.quiet);
        match cli.command {
            Commands::Quick(args) => {
                assert_eq!(args.env.as_deref(), Some("inte"));
                assert_eq!(args.suffix.as_deref(), Some("hotfix"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn parses_source_push_handoff() {
        let cli = Cli::try_parse_from([
            "upsync",
            "sync",
            "source-push",
            "--then-repo",
            "../plus",
            "--then",
            "rebuild",
        ])
        .unwrap();
        match cli.command {
            Commands::Sync(SyncArgs {
                mode: SyncCommands::SourcePush(args),
            }) => {
                assert_eq!(args.then_repo, Some(PathBuf::from("../plus")));
                assert_eq!(args.then, Some(SyncMode::Rebuild));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn then_requires_then_repo() {
        assert!(Cli::try_parse_from(["upsync", "sync", "source-push", "--then", "standard"]).is_err());
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["upsync"]).is_err());
    }
}
