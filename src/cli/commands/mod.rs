//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! # Architecture
//!
//! Commands are dispatched via [`CommandDispatcher`], which routes CLI
//! subcommands to their implementations. Workflow commands share config
//! loading and exit-code mapping through the `workflow` helpers.

pub mod completions;
pub mod config;
pub mod control;
pub mod dispatcher;
pub mod quick;
pub mod sync;
mod workflow;

pub use dispatcher::{
    exit_code_for, Command, CommandDispatcher, CommandResult, EXIT_CANCELLED, EXIT_CONFIG,
    EXIT_FAILURE,
};
