//! Non-interactive UI for CI/headless environments.

use std::collections::HashMap;

use crate::error::{Result, UpsyncError};
use crate::runner::gate::{GateHandle, PauseNotice};

use super::progress::{format_duration, progress_bar};
use super::{
    OutputMode, PauseIndicator, Prompt, PromptResult, RunSummary, SpinnerHandle, UserInterface,
};

/// Prefix for environment variables that answer prompts.
pub const PROMPT_ENV_PREFIX: &str = "UPSYNC_PROMPT_";

/// Prompt key consulted for pauses (`UPSYNC_PROMPT_PAUSE=continue|cancel`).
pub const PAUSE_PROMPT_KEY: &str = "pause";

/// UI implementation for non-interactive mode.
///
/// Prompts are answered from `UPSYNC_PROMPT_<KEY>` variables or their
/// defaults. Pauses wait for `upsync continue` unless
/// `UPSYNC_PROMPT_PAUSE` decides them up front.
pub struct NonInteractiveUI {
    mode: OutputMode,
    env_overrides: HashMap<String, String>,
    is_ci: bool,
}

impl NonInteractiveUI {
    /// Create a new non-interactive UI.
    pub fn new(mode: OutputMode) -> Self {
        let env_overrides: HashMap<String, String> = std::env::vars()
            .filter(|(k, _)| k.starts_with(PROMPT_ENV_PREFIX))
            .collect();

        Self {
            mode,
            env_overrides,
            is_ci: crate::shell::is_ci(),
        }
    }

    /// Create with explicit overrides (for testing).
    pub fn with_overrides(mode: OutputMode, overrides: HashMap<String, String>) -> Self {
        Self {
            mode,
            env_overrides: overrides,
            is_ci: false,
        }
    }

    fn override_for(&self, key: &str) -> Option<&String> {
        let env_key = format!("{}{}", PROMPT_ENV_PREFIX, key.to_uppercase());
        self.env_overrides.get(&env_key)
    }
}

impl UserInterface for NonInteractiveUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn set_output_mode(&mut self, mode: OutputMode) {
        self.mode = mode;
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("{}", msg);
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("✓ {}", msg);
        }
    }

    fn warning(&mut self, msg: &str) {
        if self.mode.shows_status() {
            eprintln!("⚠ {}", msg);
        }
    }

    fn error(&mut self, msg: &str) {
        eprintln!("✗ {}", msg);
    }

    fn prompt(&mut self, prompt: &Prompt) -> Result<PromptResult> {
        if let Some(value) = self.override_for(&prompt.key) {
            return Ok(PromptResult::String(value.clone()));
        }

        if let Some(default) = &prompt.default {
            return Ok(PromptResult::String(default.clone()));
        }

        Err(UpsyncError::InvalidParameter {
            name: prompt.key.clone(),
            message: format!(
                "cannot prompt in non-interactive mode; set {}{}",
                PROMPT_ENV_PREFIX,
                prompt.key.to_uppercase()
            ),
        })
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        if self.mode.shows_spinners() {
            println!("  {}", message);
        }
        Box::new(NoopSpinner)
    }

    fn show_header(&mut self, title: &str) {
        if self.mode.shows_status() {
            println!("\n{}\n", title);
        }
    }

    fn show_progress(&mut self, current: usize, total: usize) {
        if self.is_ci {
            return;
        }
        if self.mode.shows_steps() {
            println!("  {} {}/{} steps", progress_bar(current, total, 16), current, total);
        }
    }

    fn show_step(&mut self, index: usize, total: usize, title: &str) {
        if self.mode.shows_steps() {
            println!("[{}/{}] {}", index + 1, total, title);
        }
    }

    fn show_hint(&mut self, hint: &str) {
        if self.mode.shows_status() {
            println!("  hint: {}", hint);
        }
    }

    fn show_error_block(&mut self, command: &str, output: &str, hint: Option<&str>) {
        eprintln!();
        eprintln!("    ┌─ Command ──────────────────────────");
        eprintln!("    │ {}", command);
        if !output.is_empty() {
            eprintln!("    ├─ Output ───────────────────────────");
            for line in output.lines() {
                eprintln!("    │ {}", line);
            }
        }
        eprintln!("    └────────────────────────────────────");
        if let Some(h) = hint {
            eprintln!();
            eprintln!("    Hint: {}", h);
        }
    }

    fn start_pause_indicator(&mut self, _notice: &PauseNotice) -> Box<dyn SpinnerHandle> {
        Box::new(PauseIndicator::hidden())
    }

    fn notify_pause(&mut self, notice: &PauseNotice, handle: GateHandle) {
        if self.mode.shows_status() {
            println!("⏸ Paused: {}", notice.title);
            if let Some(detail) = &notice.detail {
                for line in detail.lines() {
                    println!("  {}", line);
                }
            }
        }

        match self.override_for(PAUSE_PROMPT_KEY).map(|v| v.to_lowercase()) {
            Some(v) if v == "continue" || v == "yes" => {
                handle.resolve_pending();
            }
            Some(v) if v == "cancel" || v == "no" => {
                handle.reject_pending("cancelled by UPSYNC_PROMPT_PAUSE");
            }
            _ => {
                if self.mode.shows_status() {
                    println!("  Run `upsync continue` to resume or `upsync cancel` to stop.");
                }
            }
        }
    }

    fn show_run_summary(&mut self, summary: &RunSummary) {
        if !self.mode.shows_status() {
            return;
        }

        println!();
        println!("  ┌─ Summary ──────────────────────────");

        for step in &summary.step_results {
            let duration_str = step.duration.map(format_duration).unwrap_or_default();
            let detail_str = step.detail.as_deref().unwrap_or("");
            println!(
                "  │ {} {:<40} {} {}",
                step.status.icon(),
                step.title,
                duration_str,
                detail_str
            );
        }

        println!("  ├────────────────────────────────────");
        println!(
            "  │ {} · {}/{} steps · {}",
            summary.outcome,
            summary.step_results.len(),
            summary.total_steps,
            format_duration(summary.total_duration)
        );
        println!("  └────────────────────────────────────");
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

/// Spinner that prints nothing.
struct NoopSpinner;

impl SpinnerHandle for NoopSpinner {
    fn set_message(&mut self, _msg: &str) {}

    fn finish_success(&mut self, msg: &str) {
        println!("✓ {}", msg);
    }

    fn finish_error(&mut self, msg: &str) {
        eprintln!("✗ {}", msg);
    }

    fn finish_skipped(&mut self, msg: &str) {
        println!("○ {}", msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::gate::SuspensionGate;
    use crate::ui::PromptType;

    fn input_prompt(key: &str, default: Option<&str>) -> Prompt {
        Prompt {
            key: key.to_string(),
            question: "?".to_string(),
            prompt_type: PromptType::Input,
            default: default.map(String::from),
        }
    }

    #[test]
    fn prompt_uses_env_override() {
        let mut overrides = HashMap::new();
        overrides.insert("UPSYNC_PROMPT_SUFFIX".to_string(), "hotfix".to_string());
        let mut ui = NonInteractiveUI::with_overrides(OutputMode::Silent, overrides);

        let result = ui.prompt(&input_prompt("suffix", Some("250101"))).unwrap();
        assert_eq!(result.as_string(), "hotfix");
    }

    #[test]
    fn prompt_uses_default() {
        let mut ui = NonInteractiveUI::with_overrides(OutputMode::Silent, HashMap::new());
        let result = ui.prompt(&input_prompt("suffix", Some("250101"))).unwrap();
        assert_eq!(result.as_string(), "250101");
    }

    #[test]
    fn prompt_without_default_errors() {
        let mut ui = NonInteractiveUI::with_overrides(OutputMode::Silent, HashMap::new());
        let err = ui.prompt(&input_prompt("remote_url", None)).unwrap_err();
        assert!(err.to_string().contains("UPSYNC_PROMPT_REMOTE_URL"));
    }

    #[test]
    fn pause_left_pending_without_override() {
        let gate = SuspensionGate::new();
        let pending = gate.suspend("Resolve conflicts", Some("a.txt")).unwrap();
        let mut ui = NonInteractiveUI::with_overrides(OutputMode::Silent, HashMap::new());

        ui.notify_pause(pending.notice(), gate.handle());
        assert!(gate.handle().is_pending());
    }

    #[test]
    fn pause_override_continues() {
        let gate = SuspensionGate::new();
        let pending = gate.suspend("Resolve conflicts", None).unwrap();
        let mut overrides = HashMap::new();
        overrides.insert("UPSYNC_PROMPT_PAUSE".to_string(), "continue".to_string());
        let mut ui = NonInteractiveUI::with_overrides(OutputMode::Silent, overrides);

        ui.notify_pause(pending.notice(), gate.handle());
        assert!(!gate.handle().is_pending());
    }

    #[test]
    fn is_never_interactive() {
        let ui = NonInteractiveUI::with_overrides(OutputMode::Normal, HashMap::new());
        assert!(!ui.is_interactive());
    }
}
