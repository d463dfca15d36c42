//! Interactive user interface components.
//!
//! This module provides:
//! - [`UserInterface`] trait for UI abstraction
//! - [`TerminalUI`] for interactive terminal usage
//! - [`NonInteractiveUI`] for CI/headless environments
//! - [`MockUI`] for tests
//! - Prompts, spinners, the pause indicator, and run summaries
//!
//! # Example
//!
//! ```
//! use upsync::ui::{create_ui, OutputMode};
//!
//! // Use non-interactive mode for testability
//! let mut ui = create_ui(false, OutputMode::Quiet);
//! ui.show_header("Quick upgrade");
//! ui.success("Upgrade complete!");
//! ```

pub mod mock;
pub mod non_interactive;
pub mod output;
pub mod progress;
pub mod prompts;
pub mod spinner;
pub mod terminal;
pub mod theme;

pub use mock::{MockSpinner, MockUI, PauseResponse};
pub use non_interactive::NonInteractiveUI;
pub use output::OutputMode;
pub use progress::format_duration;
pub use prompts::{ask_confirm, ask_input, ask_select, prompt_user};
pub use spinner::{PauseIndicator, ProgressSpinner};
pub use terminal::{create_ui, TerminalUI};
pub use theme::{should_use_colors, UpsyncTheme};

use std::time::Duration;

use crate::error::Result;
use crate::runner::gate::{GateHandle, PauseNotice};

/// Trait for user interface interactions.
///
/// This trait allows mocking the UI in tests.
pub trait UserInterface {
    /// Get the current output mode.
    fn output_mode(&self) -> OutputMode;

    /// Change the output mode (e.g. from config defaults).
    fn set_output_mode(&mut self, mode: OutputMode);

    /// Display a message to the user.
    fn message(&mut self, msg: &str);

    /// Display a success message.
    fn success(&mut self, msg: &str);

    /// Display a warning message.
    fn warning(&mut self, msg: &str);

    /// Display an error message.
    fn error(&mut self, msg: &str);

    /// Show a prompt and get user input.
    fn prompt(&mut self, prompt: &Prompt) -> Result<PromptResult>;

    /// Start a spinner for an operation.
    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle>;

    /// Show a header/banner.
    fn show_header(&mut self, title: &str);

    /// Show progress (e.g., "Step 3 of 7").
    fn show_progress(&mut self, current: usize, total: usize);

    /// Announce the step about to run. `index` is zero-based.
    fn show_step(&mut self, index: usize, total: usize, title: &str) {
        self.show_progress(index + 1, total);
        self.message(title);
    }

    /// Show a contextual hint.
    fn show_hint(&mut self, hint: &str);

    /// Show a failed command together with its output.
    fn show_error_block(&mut self, command: &str, output: &str, hint: Option<&str>);

    /// Start the persistent "paused" indicator. Dropping the handle clears it.
    fn start_pause_indicator(&mut self, notice: &PauseNotice) -> Box<dyn SpinnerHandle>;

    /// Offer the continue/cancel choice for a pause.
    ///
    /// Implementations answer through `handle`, either right away or later
    /// from another thread. They must not block until the user decides.
    fn notify_pause(&mut self, notice: &PauseNotice, handle: GateHandle);

    /// Show the end-of-run summary.
    fn show_run_summary(&mut self, summary: &RunSummary);

    /// Check if running in interactive mode.
    fn is_interactive(&self) -> bool;
}

/// Handle for controlling a spinner.
pub trait SpinnerHandle {
    /// Update the spinner message.
    fn set_message(&mut self, msg: &str);

    /// Mark the operation as successful.
    fn finish_success(&mut self, msg: &str);

    /// Mark the operation as failed.
    fn finish_error(&mut self, msg: &str);

    /// Mark as skipped.
    fn finish_skipped(&mut self, msg: &str);
}

/// A prompt to show to the user.
#[derive(Debug, Clone)]
pub struct Prompt {
    /// Unique key for the prompt (used for overrides and test lookup).
    pub key: String,
    /// The question to display.
    pub question: String,
    /// The type of prompt.
    pub prompt_type: PromptType,
    /// Default value if user just presses enter.
    pub default: Option<String>,
}

/// The type of prompt.
#[derive(Debug, Clone)]
pub enum PromptType {
    /// Yes/no confirmation.
    Confirm,
    /// Free-form text input.
    Input,
    /// Select one from a list of options.
    Select { options: Vec<PromptOption> },
}

/// An option in a select prompt.
#[derive(Debug, Clone)]
pub struct PromptOption {
    /// Display label.
    pub label: String,
    /// Value returned when selected.
    pub value: String,
}

impl PromptOption {
    /// Create an option.
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Result of a prompt.
#[derive(Debug, Clone)]
pub enum PromptResult {
    /// Boolean result from confirm.
    Bool(bool),
    /// String result from input or select.
    String(String),
}

impl PromptResult {
    /// Get as string.
    pub fn as_string(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::String(s) => s.clone(),
        }
    }

    /// Interpret the answer as a yes/no decision.
    ///
    /// Non-interactive overrides arrive as strings, so common spellings of
    /// "yes" count as `true`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::String(s) => match s.trim().to_lowercase().as_str() {
                "true" | "yes" | "y" | "1" => Some(true),
                "false" | "no" | "n" | "0" => Some(false),
                _ => None,
            },
        }
    }
}

/// Outcome of one step, as shown in the run summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    /// Step finished.
    Success,
    /// Step failed.
    Failed,
    /// Step stopped the workflow on purpose.
    Halted,
}

impl StatusKind {
    /// Plain icon for non-styled output.
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Success => "✓",
            Self::Failed => "✗",
            Self::Halted => "○",
        }
    }

    /// Icon styled with the theme.
    pub fn styled(&self, theme: &UpsyncTheme) -> String {
        match self {
            Self::Success => theme.success.apply_to(self.icon()).to_string(),
            Self::Failed => theme.error.apply_to(self.icon()).to_string(),
            Self::Halted => theme.dim.apply_to(self.icon()).to_string(),
        }
    }
}

/// One summary line.
#[derive(Debug, Clone)]
pub struct StepSummary {
    /// Step title.
    pub title: String,
    /// How the step ended.
    pub status: StatusKind,
    /// Wall time spent in the step.
    pub duration: Option<Duration>,
    /// Short note, e.g. how many failures were recovered.
    pub detail: Option<String>,
}

/// Summary of a finished run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Workflow title.
    pub title: String,
    /// Per-step lines, in execution order.
    pub step_results: Vec<StepSummary>,
    /// Steps in the workflow, run or not.
    pub total_steps: usize,
    /// Total wall time.
    pub total_duration: Duration,
    /// Terminal state label ("completed", "aborted", "failed").
    pub outcome: String,
    /// Whether the run completed.
    pub success: bool,
}
