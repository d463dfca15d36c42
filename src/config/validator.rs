//! Configuration validation rules.
//!
//! - Terminal poll interval and timeout must be non-zero
//! - At least one quick-upgrade environment must be defined
//! - The default environment must be one of them
//! - Environment branches and commands must not be blank

use crate::config::schema::UpsyncConfig;
use crate::error::{Result, UpsyncError};

/// Validation error with context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Rule identifier
    pub rule: String,
    /// Human-readable error message
    pub message: String,
}

impl ValidationError {
    fn new(rule: &str, message: impl Into<String>) -> Self {
        Self {
            rule: rule.to_string(),
            message: message.into(),
        }
    }
}

/// Validate a configuration and return all errors.
///
/// Collects every error rather than stopping at the first one.
pub fn validate_config(config: &UpsyncConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    errors.extend(validate_terminal(config));
    errors.extend(validate_quick(config));
    errors.extend(validate_sync(config));

    errors
}

fn validate_terminal(config: &UpsyncConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let terminal = &config.terminal;

    if terminal.poll_interval_ms == 0 {
        errors.push(ValidationError::new(
            "zero-poll-interval",
            "terminal.poll_interval_ms must be greater than zero",
        ));
    }
    if terminal.timeout_secs == 0 {
        errors.push(ValidationError::new(
            "zero-timeout",
            "terminal.timeout_secs must be greater than zero",
        ));
    }
    if let Some(launcher) = &terminal.launcher {
        if !launcher.contains("{script}") {
            errors.push(ValidationError::new(
                "launcher-without-script",
                "terminal.launcher must contain the {script} placeholder",
            ));
        }
    }

    errors
}

fn validate_quick(config: &UpsyncConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let quick = &config.quick;

    if quick.environments.is_empty() {
        errors.push(ValidationError::new(
            "no-environments",
            "quick.environments must define at least one environment",
        ));
    } else if !quick.environments.contains_key(&quick.default_environment) {
        errors.push(ValidationError::new(
            "unknown-default-environment",
            format!(
                "quick.default_environment '{}' is not one of: {}",
                quick.default_environment,
                quick
                    .environments
                    .keys()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        ));
    }

    for (name, branches) in &quick.environments {
        if branches.target.trim().is_empty() || branches.source.trim().is_empty() {
            errors.push(ValidationError::new(
                "blank-branch",
                format!("quick.environments.{} needs both target and source", name),
            ));
        }
    }

    for (field, value) in [
        ("quick.upgrade_command", &quick.upgrade_command),
        ("quick.test_command", &quick.test_command),
    ] {
        if value.trim().is_empty() {
            errors.push(ValidationError::new(
                "blank-command",
                format!("{} must not be empty", field),
            ));
        }
    }

    errors
}

fn validate_sync(config: &UpsyncConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let sync = &config.sync;

    if sync.remote_name.trim().is_empty() || sync.remote_name.contains(char::is_whitespace) {
        errors.push(ValidationError::new(
            "invalid-remote",
            format!("sync.remote_name '{}' is not a valid remote name", sync.remote_name),
        ));
    }

    errors
}

/// Validate and return the first error as an [`UpsyncError`].
pub fn validate(config: &UpsyncConfig) -> Result<()> {
    let errors = validate_config(config);
    if errors.is_empty() {
        return Ok(());
    }

    let message = errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ");
    Err(UpsyncError::ConfigValidationError { message })
}
