//! Mock UI implementation for testing.
//!
//! `MockUI` implements the `UserInterface` trait and captures all
//! interactions for later assertion. It can be configured with
//! pre-determined prompt and pause responses.
//!
//! # Example
//!
//! ```
//! use upsync::ui::{MockUI, UserInterface};
//!
//! let mut ui = MockUI::new();
//! ui.set_prompt_response("commit_message", "upgrade: sync");
//!
//! // Use ui in code under test...
//! ui.message("Checking out test-220915");
//! ui.success("Done!");
//!
//! // Assert on captured interactions
//! assert!(ui.has_message("test-220915"));
//! assert!(ui.successes().contains(&"Done!".to_string()));
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::Result;
use crate::runner::gate::{GateHandle, PauseNotice};

use super::{
    OutputMode, Prompt, PromptResult, PromptType, RunSummary, SpinnerHandle, UserInterface,
};

/// How [`MockUI`] answers a pause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PauseResponse {
    /// Resolve the pause immediately.
    Continue,
    /// Reject the pause with this reason.
    Cancel(String),
    /// Leave the pause for an external actor.
    Hold,
}

/// Mock UI implementation for testing.
///
/// Captures all UI interactions and allows pre-configured prompt responses.
/// Supports both single responses (via `set_prompt_response`) and queued
/// responses (via `queue_prompt_responses`) for keys asked multiple times.
/// Pauses are held for an external actor unless responses are configured.
#[derive(Debug, Default)]
pub struct MockUI {
    mode: OutputMode,
    interactive: bool,
    messages: Vec<String>,
    successes: Vec<String>,
    warnings: Vec<String>,
    errors: Vec<String>,
    headers: Vec<String>,
    hints: Vec<String>,
    progress: Vec<(usize, usize)>,
    steps: Vec<String>,
    spinners: Vec<String>,
    error_blocks: Vec<(String, String, Option<String>)>,
    summaries: Vec<RunSummary>,
    prompt_responses: HashMap<String, String>,
    prompt_queues: HashMap<String, VecDeque<String>>,
    prompts_shown: Vec<String>,
    /// Fallback response for any prompt key not in `prompt_responses` or `prompt_queues`.
    default_prompt_response: Option<String>,
    pauses: Vec<PauseNotice>,
    pause_queue: VecDeque<PauseResponse>,
    default_pause_response: Option<PauseResponse>,
    live_indicators: Arc<AtomicUsize>,
}

impl MockUI {
    /// Create a new MockUI with Normal output mode.
    pub fn new() -> Self {
        Self {
            mode: OutputMode::Normal,
            ..Default::default()
        }
    }

    /// Create a new MockUI with a specific output mode.
    pub fn with_mode(mode: OutputMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Set a response for a prompt key.
    pub fn set_prompt_response(&mut self, key: &str, response: &str) {
        self.prompt_responses
            .insert(key.to_string(), response.to_string());
    }

    /// Queue multiple responses for the same prompt key.
    ///
    /// Responses are returned in order. After the queue is exhausted,
    /// falls back to `set_prompt_response` or defaults.
    pub fn queue_prompt_responses(&mut self, key: &str, responses: Vec<&str>) {
        let queue = responses.into_iter().map(|s| s.to_string()).collect();
        self.prompt_queues.insert(key.to_string(), queue);
    }

    /// Set a default response for any prompt key not explicitly configured.
    pub fn set_default_prompt_response(&mut self, response: &str) {
        self.default_prompt_response = Some(response.to_string());
    }

    /// Queue answers for upcoming pauses, consumed in order.
    pub fn queue_pause_responses(&mut self, responses: Vec<PauseResponse>) {
        self.pause_queue.extend(responses);
    }

    /// Answer for pauses once the queue is empty (default: hold).
    pub fn set_default_pause_response(&mut self, response: PauseResponse) {
        self.default_pause_response = Some(response);
    }

    /// Set whether this mock behaves as interactive.
    pub fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    /// Get all captured messages.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Get all captured success messages.
    pub fn successes(&self) -> &[String] {
        &self.successes
    }

    /// Get all captured warning messages.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Get all captured error messages.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Get all captured headers.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Get all captured hints.
    pub fn hints(&self) -> &[String] {
        &self.hints
    }

    /// Get all captured progress updates.
    pub fn progress(&self) -> &[(usize, usize)] {
        &self.progress
    }

    /// Titles of announced steps, in order.
    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    /// Get all spinner messages that were started.
    pub fn spinners(&self) -> &[String] {
        &self.spinners
    }

    /// Get all prompts that were shown (by key).
    pub fn prompts_shown(&self) -> &[String] {
        &self.prompts_shown
    }

    /// How many times a prompt key was asked.
    pub fn prompt_count(&self, key: &str) -> usize {
        self.prompts_shown.iter().filter(|k| *k == key).count()
    }

    /// Pauses that were offered, in order.
    pub fn pauses(&self) -> &[PauseNotice] {
        &self.pauses
    }

    /// Pause indicators started and not yet dropped.
    pub fn live_pause_indicators(&self) -> usize {
        self.live_indicators.load(Ordering::SeqCst)
    }

    /// Check if a specific message was shown.
    pub fn has_message(&self, msg: &str) -> bool {
        self.messages.iter().any(|m| m.contains(msg))
    }

    /// Check if a specific success was shown.
    pub fn has_success(&self, msg: &str) -> bool {
        self.successes.iter().any(|m| m.contains(msg))
    }

    /// Check if a specific error was shown.
    pub fn has_error(&self, msg: &str) -> bool {
        self.errors.iter().any(|m| m.contains(msg))
    }

    /// Check if a specific hint was shown.
    pub fn has_hint(&self, msg: &str) -> bool {
        self.hints.iter().any(|m| m.contains(msg))
    }

    /// Check if a specific warning was shown.
    pub fn has_warning(&self, msg: &str) -> bool {
        self.warnings.iter().any(|m| m.contains(msg))
    }

    /// Get all captured error blocks as (command, output, hint).
    pub fn error_blocks(&self) -> &[(String, String, Option<String>)] {
        &self.error_blocks
    }

    /// Get all captured run summaries.
    pub fn summaries(&self) -> &[RunSummary] {
        &self.summaries
    }

    /// Clear all captured interactions.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.successes.clear();
        self.warnings.clear();
        self.errors.clear();
        self.headers.clear();
        self.hints.clear();
        self.progress.clear();
        self.steps.clear();
        self.spinners.clear();
        self.error_blocks.clear();
        self.summaries.clear();
        self.prompts_shown.clear();
        self.pauses.clear();
    }

    fn answer(prompt: &Prompt, response: &str) -> PromptResult {
        if matches!(prompt.prompt_type, PromptType::Confirm) {
            let val = matches!(response, "true" | "yes" | "y" | "1");
            return PromptResult::Bool(val);
        }
        PromptResult::String(response.to_string())
    }
}

impl UserInterface for MockUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn set_output_mode(&mut self, mode: OutputMode) {
        self.mode = mode;
    }

    fn message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }

    fn success(&mut self, msg: &str) {
        self.successes.push(msg.to_string());
    }

    fn warning(&mut self, msg: &str) {
        self.warnings.push(msg.to_string());
    }

    fn error(&mut self, msg: &str) {
        self.errors.push(msg.to_string());
    }

    fn prompt(&mut self, prompt: &Prompt) -> Result<PromptResult> {
        self.prompts_shown.push(prompt.key.clone());

        if let Some(queue) = self.prompt_queues.get_mut(&prompt.key) {
            if let Some(response) = queue.pop_front() {
                return Ok(Self::answer(prompt, &response));
            }
        }

        if let Some(response) = self.prompt_responses.get(&prompt.key) {
            return Ok(Self::answer(prompt, response));
        }

        if let Some(ref response) = self.default_prompt_response {
            return Ok(Self::answer(prompt, response));
        }

        if let Some(default) = &prompt.default {
            return Ok(Self::answer(prompt, default));
        }

        // Type-appropriate empty answer as a last resort
        if matches!(prompt.prompt_type, PromptType::Confirm) {
            return Ok(PromptResult::Bool(false));
        }
        Ok(PromptResult::String(String::new()))
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        self.spinners.push(message.to_string());
        Box::new(MockSpinner::new())
    }

    fn show_header(&mut self, title: &str) {
        self.headers.push(title.to_string());
    }

    fn show_progress(&mut self, current: usize, total: usize) {
        self.progress.push((current, total));
    }

    fn show_step(&mut self, index: usize, total: usize, title: &str) {
        self.progress.push((index + 1, total));
        self.steps.push(title.to_string());
    }

    fn show_hint(&mut self, hint: &str) {
        self.hints.push(hint.to_string());
    }

    fn show_error_block(&mut self, command: &str, output: &str, hint: Option<&str>) {
        self.error_blocks.push((
            command.to_string(),
            output.to_string(),
            hint.map(|h| h.to_string()),
        ));
        self.errors.push(command.to_string());
        if let Some(h) = hint {
            self.hints.push(h.to_string());
        }
    }

    fn start_pause_indicator(&mut self, _notice: &PauseNotice) -> Box<dyn SpinnerHandle> {
        self.live_indicators.fetch_add(1, Ordering::SeqCst);
        Box::new(MockPauseIndicator {
            live: Arc::clone(&self.live_indicators),
        })
    }

    fn notify_pause(&mut self, notice: &PauseNotice, handle: GateHandle) {
        self.pauses.push(notice.clone());
        let response = self
            .pause_queue
            .pop_front()
            .or_else(|| self.default_pause_response.clone())
            .unwrap_or(PauseResponse::Hold);
        match response {
            PauseResponse::Continue => {
                handle.resolve_pending();
            }
            PauseResponse::Cancel(reason) => {
                handle.reject_pending(&reason);
            }
            PauseResponse::Hold => {}
        }
    }

    fn show_run_summary(&mut self, summary: &RunSummary) {
        self.summaries.push(summary.clone());
        if summary.success {
            self.successes.push(format!("{} {}", summary.title, summary.outcome));
        } else {
            self.errors.push(format!("{} {}", summary.title, summary.outcome));
        }
    }

    fn is_interactive(&self) -> bool {
        self.interactive
    }
}

/// Pause indicator that tracks how many are alive.
struct MockPauseIndicator {
    live: Arc<AtomicUsize>,
}

impl SpinnerHandle for MockPauseIndicator {
    fn set_message(&mut self, _msg: &str) {}
    fn finish_success(&mut self, _msg: &str) {}
    fn finish_error(&mut self, _msg: &str) {}
    fn finish_skipped(&mut self, _msg: &str) {}
}

impl Drop for MockPauseIndicator {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Mock spinner that captures finish messages.
#[derive(Debug, Default)]
pub struct MockSpinner {
    messages: Vec<String>,
    finish_message: Option<String>,
    status: Option<SpinnerStatus>,
}

/// Status of a mock spinner when finished.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpinnerStatus {
    /// Finished successfully.
    Success,
    /// Finished with error.
    Error,
    /// Finished as skipped.
    Skipped,
}

impl MockSpinner {
    /// Create a new mock spinner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all messages set during spinning.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Get the final finish message.
    pub fn finish_message(&self) -> Option<&str> {
        self.finish_message.as_deref()
    }

    /// Get the final status.
    pub fn status(&self) -> Option<SpinnerStatus> {
        self.status
    }
}

impl SpinnerHandle for MockSpinner {
    fn set_message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }

    fn finish_success(&mut self, msg: &str) {
        self.finish_message = Some(msg.to_string());
        self.status = Some(SpinnerStatus::Success);
    }

    fn finish_error(&mut self, msg: &str) {
        self.finish_message = Some(msg.to_string());
        self.status = Some(SpinnerStatus::Error);
    }

    fn finish_skipped(&mut self, msg: &str) {
        self.finish_message = Some(msg.to_string());
        self.status = Some(SpinnerStatus::Skipped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::gate::SuspensionGate;

    #[test]
    fn mock_ui_captures_messages() {
        let mut ui = MockUI::new();

        ui.message("Hello");
        ui.success("Done");
        ui.warning("Be careful");
        ui.error("Oops");

        assert_eq!(ui.messages(), &["Hello"]);
        assert_eq!(ui.successes(), &["Done"]);
        assert_eq!(ui.warnings(), &["Be careful"]);
        assert_eq!(ui.errors(), &["Oops"]);
    }

    #[test]
    fn mock_ui_prompt_with_response() {
        let mut ui = MockUI::new();
        ui.set_prompt_response("commit_message", "upgrade: sync");

        let prompt = Prompt {
            key: "commit_message".to_string(),
            question: "Commit message".to_string(),
            prompt_type: PromptType::Input,
            default: None,
        };

        let result = ui.prompt(&prompt).unwrap();
        assert_eq!(result.as_string(), "upgrade: sync");
        assert_eq!(ui.prompts_shown(), &["commit_message"]);
    }

    #[test]
    fn mock_ui_queue_then_fallback() {
        let mut ui = MockUI::new();
        ui.queue_prompt_responses("action", vec!["rerun", "skip"]);
        ui.set_prompt_response("action", "abort");

        let prompt = Prompt {
            key: "action".to_string(),
            question: "Next?".to_string(),
            prompt_type: PromptType::Input,
            default: None,
        };

        assert_eq!(ui.prompt(&prompt).unwrap().as_string(), "rerun");
        assert_eq!(ui.prompt(&prompt).unwrap().as_string(), "skip");
        assert_eq!(ui.prompt(&prompt).unwrap().as_string(), "abort");
        assert_eq!(ui.prompt_count("action"), 3);
    }

    #[test]
    fn mock_ui_confirm_parses_bool() {
        let mut ui = MockUI::new();
        ui.set_prompt_response("dirty", "yes");
        let prompt = Prompt {
            key: "dirty".to_string(),
            question: "Continue?".to_string(),
            prompt_type: PromptType::Confirm,
            default: None,
        };
        assert_eq!(ui.prompt(&prompt).unwrap().as_bool(), Some(true));
    }

    #[test]
    fn mock_ui_holds_pause_by_default() {
        let gate = SuspensionGate::new();
        let pending = gate.suspend("Confirm merge", None).unwrap();
        let mut ui = MockUI::new();

        ui.notify_pause(pending.notice(), gate.handle());

        assert!(gate.handle().is_pending());
        assert_eq!(ui.pauses().len(), 1);
    }

    #[test]
    fn mock_ui_continues_pause_when_queued() {
        let gate = SuspensionGate::new();
        let pending = gate.suspend("Confirm merge", None).unwrap();
        let mut ui = MockUI::new();
        ui.queue_pause_responses(vec![PauseResponse::Continue]);

        ui.notify_pause(pending.notice(), gate.handle());

        assert!(!gate.handle().is_pending());
    }

    #[test]
    fn mock_pause_indicator_tracks_liveness() {
        let gate = SuspensionGate::new();
        let pending = gate.suspend("Confirm merge", None).unwrap();
        let mut ui = MockUI::new();

        let indicator = ui.start_pause_indicator(pending.notice());
        assert_eq!(ui.live_pause_indicators(), 1);
        drop(indicator);
        assert_eq!(ui.live_pause_indicators(), 0);
    }

    #[test]
    fn mock_ui_captures_steps() {
        let mut ui = MockUI::new();

        ui.show_step(0, 3, "Checkout main");
        ui.show_step(1, 3, "Pull main");

        assert_eq!(ui.progress(), &[(1, 3), (2, 3)]);
        assert_eq!(ui.steps(), &["Checkout main", "Pull main"]);
    }

    #[test]
    fn mock_ui_clear_resets() {
        let mut ui = MockUI::new();

        ui.message("test");
        ui.success("done");
        ui.clear();

        assert!(ui.messages().is_empty());
        assert!(ui.successes().is_empty());
    }

    #[test]
    fn mock_spinner_records_finish() {
        let mut spinner = MockSpinner::new();
        spinner.set_message("Pulling");
        spinner.finish_error("Pull failed");
        assert_eq!(spinner.status(), Some(SpinnerStatus::Error));
        assert_eq!(spinner.finish_message(), Some("Pull failed"));
        assert_eq!(spinner.messages(), &["Pulling"]);
    }
}
