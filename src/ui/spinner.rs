//! Progress spinners and the pause indicator.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use super::theme::UpsyncTheme;
use super::SpinnerHandle;

fn style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template).unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// A progress spinner for long-running operations.
pub struct ProgressSpinner {
    bar: ProgressBar,
}

impl ProgressSpinner {
    /// Create a new spinner with a message.
    pub fn new(message: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            style("{spinner:.cyan} {msg}").tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));

        Self { bar }
    }

    /// Create a spinner that doesn't show (for silent mode).
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    fn finish_with(&mut self, line: String) {
        self.bar.set_style(style("{msg}"));
        self.bar.finish_with_message(line);
    }
}

impl SpinnerHandle for ProgressSpinner {
    fn set_message(&mut self, msg: &str) {
        self.bar.set_message(msg.to_string());
    }

    fn finish_success(&mut self, msg: &str) {
        self.finish_with(UpsyncTheme::new().format_success(msg));
    }

    fn finish_error(&mut self, msg: &str) {
        self.finish_with(UpsyncTheme::new().format_error(msg));
    }

    fn finish_skipped(&mut self, msg: &str) {
        self.finish_with(UpsyncTheme::new().format_skipped(msg));
    }
}

/// Persistent status line shown while a workflow waits at a pause.
///
/// The line stays until the value is dropped, so it disappears on every
/// exit path of the wait, including cancellation.
pub struct PauseIndicator {
    bar: ProgressBar,
}

impl PauseIndicator {
    /// Show the indicator.
    pub fn new(title: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(style("{spinner:.yellow} {msg} {elapsed:.dim}").tick_chars("◐◓◑◒◒"));
        bar.set_message(format!("Paused: {} (upsync continue)", title));
        bar.enable_steady_tick(Duration::from_millis(500));
        Self { bar }
    }

    /// An indicator that draws nothing.
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }
}

impl SpinnerHandle for PauseIndicator {
    fn set_message(&mut self, msg: &str) {
        self.bar.set_message(msg.to_string());
    }

    fn finish_success(&mut self, _msg: &str) {
        self.bar.finish_and_clear();
    }

    fn finish_error(&mut self, _msg: &str) {
        self.bar.finish_and_clear();
    }

    fn finish_skipped(&mut self, _msg: &str) {
        self.bar.finish_and_clear();
    }
}

impl Drop for PauseIndicator {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}
