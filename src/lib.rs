//! upsync - guided branch upgrade and sync workflows for git repositories.
//!
//! upsync walks a developer through multi-step branch maintenance: pulling
//! and merging branches, running an upgrade script in a separate terminal,
//! committing, and pushing. It pauses when a person has to act (resolve
//! conflicts, review a merge) and can be continued or cancelled from another
//! shell.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Configuration loading, merging, and validation
//! - [`error`] - Error types and result aliases
//! - [`git`] - Repository queries, conflict inspection, and branch operations
//! - [`runner`] - Step sequencing, the suspension gate, and run control
//! - [`shell`] - Shell command execution and terminal launching
//! - [`steps`] - Step and workflow definitions
//! - [`ui`] - Interactive prompts, spinners, and terminal output
//! - [`workflows`] - The quick upgrade and sync workflows
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//! use upsync::steps::{Step, Workflow};
//!
//! let workflow = Workflow::new("Tidy up", Path::new("."))
//!     .step(Step::info("Starting"))
//!     .step(Step::shell("Fetch", "git fetch origin"))
//!     .step(Step::pause("Review the fetched branches"));
//! assert_eq!(workflow.len(), 3);
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod runner;
pub mod shell;
pub mod steps;
pub mod ui;
pub mod workflows;

pub use error::{Result, UpsyncError};
