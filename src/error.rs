//! Error types for upsync operations.
//!
//! This module defines [`UpsyncError`], the primary error type used throughout
//! the application, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Use `UpsyncError` for domain-specific errors that need distinct handling
//! - Use `anyhow::Error` (via `UpsyncError::Other`) for unexpected errors
//! - Conflicts are not errors; they are recovered inside the retry loops and
//!   only surface as [`UpsyncError::UserCancelled`] when the user aborts

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::ui::format_duration;

/// Core error type for upsync operations.
#[derive(Debug, Error)]
pub enum UpsyncError {
    /// Configuration file not found at expected location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid configuration structure or values.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// Shell command exited non-zero (or could not be spawned).
    #[error("Command failed with exit code {code:?}: {command}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        /// Captured stdout and stderr, or the spawn error.
        output: String,
    },

    /// A terminal command produced no completion marker in time.
    #[error("Timed out after {} waiting for: {command}", format_duration(*elapsed))]
    Timeout { command: String, elapsed: Duration },

    /// The user declined to continue.
    #[error("Cancelled: {reason}")]
    UserCancelled { reason: String },

    /// Required text input was left empty.
    #[error("No value entered for {field}")]
    EmptyInput { field: String },

    /// A pause was requested while another one is still outstanding.
    #[error("Workflow is already paused at '{title}'")]
    SuspensionPending { title: String },

    /// Another workflow run holds the repository lock.
    #[error("Another run is in progress (lock file {})", lock.display())]
    RunInProgress { lock: PathBuf },

    /// The working directory is not inside a git repository.
    #[error("Not a git repository: {}", path.display())]
    NotARepository { path: PathBuf },

    /// A workflow parameter failed validation.
    #[error("Invalid {name}: {message}")]
    InvalidParameter { name: String, message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl UpsyncError {
    /// Build a cancellation error.
    pub fn cancelled(reason: impl Into<String>) -> Self {
        Self::UserCancelled {
            reason: reason.into(),
        }
    }

    /// Whether this error came from the user choosing to stop.
    pub fn is_user_cancelled(&self) -> bool {
        matches!(self, Self::UserCancelled { .. })
    }

    /// Captured output for command failures, empty otherwise.
    pub fn output(&self) -> &str {
        match self {
            Self::CommandFailed { output, .. } => output,
            _ => "",
        }
    }
}

/// Result type alias for upsync operations.
pub type Result<T> = std::result::Result<T, UpsyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_not_found_displays_path() {
        let err = UpsyncError::ConfigNotFound {
            path: PathBuf::from("/foo/bar.yml"),
        };
        assert!(err.to_string().contains("/foo/bar.yml"));
    }

    #[test]
    fn config_parse_error_displays_path_and_message() {
        let err = UpsyncError::ConfigParseError {
            path: PathBuf::from("/config.yml"),
            message: "invalid syntax".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/config.yml"));
        assert!(msg.contains("invalid syntax"));
    }

    #[test]
    fn command_failed_displays_command_and_code() {
        let err = UpsyncError::CommandFailed {
            command: "git pull origin main".into(),
            code: Some(1),
            output: "fatal: refusing".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("git pull origin main"));
        assert!(msg.contains("1"));
        assert_eq!(err.output(), "fatal: refusing");
    }

    #[test]
    fn timeout_displays_elapsed() {
        let err = UpsyncError::Timeout {
            command: "yarn test".into(),
            elapsed: Duration::from_secs(90),
        };
        let msg = err.to_string();
        assert!(msg.contains("yarn test"));
        assert!(msg.contains("1.5m"));
    }

    #[test]
    fn user_cancelled_is_distinguishable() {
        let err = UpsyncError::cancelled("pause rejected");
        assert!(err.is_user_cancelled());
        assert!(err.to_string().contains("pause rejected"));

        let other = UpsyncError::EmptyInput {
            field: "commit message".into(),
        };
        assert!(!other.is_user_cancelled());
    }

    #[test]
    fn empty_input_displays_field() {
        let err = UpsyncError::EmptyInput {
            field: "commit message".into(),
        };
        assert!(err.to_string().contains("commit message"));
    }

    #[test]
    fn run_in_progress_displays_lock() {
        let err = UpsyncError::RunInProgress {
            lock: PathBuf::from("/repo/.git/upsync/run.lock"),
        };
        assert!(err.to_string().contains("run.lock"));
    }

    #[test]
    fn stderr_is_empty_for_other_variants() {
        let err = UpsyncError::SuspensionPending {
            title: "confirm".into(),
        };
        assert_eq!(err.output(), "");
    }

    #[test]
    fn io_error_converts_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: UpsyncError = io_err.into();
        assert!(matches!(err, UpsyncError::Io(_)));
    }

    #[test]
    fn result_type_alias_works() {
        fn returns_error() -> Result<()> {
            Err(UpsyncError::ConfigValidationError {
                message: "test".into(),
            })
        }
        assert!(returns_error().is_err());
    }
}
