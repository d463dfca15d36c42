//! Command-line interface for upsync.
//!
//! This module provides the CLI argument parsing using clap's derive macros
//! and command implementations.
//!
//! # Architecture
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations

pub mod args;
pub mod commands;

pub use args::{
    CancelArgs, Cli, Commands, ConfigArgs, ContinueArgs, QuickArgs, RebuildArgs,
    SourcePushArgs, StandardArgs, SyncArgs, SyncCommands,
};
pub use commands::{exit_code_for, Command, CommandDispatcher, CommandResult};
