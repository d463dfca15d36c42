//! Interactive terminal UI.

use console::Term;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use std::io::Write;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::error::Result;
use crate::runner::gate::{GateHandle, PauseNotice};

use super::progress::format_duration;
use super::{
    prompt_user, should_use_colors, NonInteractiveUI, OutputMode, PauseIndicator,
    ProgressSpinner, Prompt, PromptResult, RunSummary, SpinnerHandle, UpsyncTheme, UserInterface,
};

/// How often the pause key reader checks whether its pause is still open.
const KEY_POLL: Duration = Duration::from_millis(100);

/// Interactive terminal UI implementation.
pub struct TerminalUI {
    term: Term,
    theme: UpsyncTheme,
    mode: OutputMode,
    key_reader: Option<JoinHandle<()>>,
}

impl TerminalUI {
    /// Create a new terminal UI.
    pub fn new(mode: OutputMode) -> Self {
        let theme = if should_use_colors() {
            UpsyncTheme::new()
        } else {
            UpsyncTheme::plain()
        };

        Self {
            term: Term::stdout(),
            theme,
            mode,
            key_reader: None,
        }
    }

    /// Wait for the previous pause's key reader to stop.
    ///
    /// The reader exits within [`KEY_POLL`] of its pause being settled, so
    /// prompts that follow a pause never share stdin with it.
    fn settle_key_reader(&mut self) {
        if let Some(reader) = self.key_reader.take() {
            if reader.join().is_err() {
                tracing::warn!("Pause key reader panicked");
            }
        }
    }
}

impl Drop for TerminalUI {
    fn drop(&mut self) {
        self.settle_key_reader();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PauseKey {
    Continue,
    Cancel,
}

fn pause_key_action(key: &KeyEvent) -> Option<PauseKey> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(PauseKey::Cancel)
        }
        KeyCode::Enter | KeyCode::Char('c') => Some(PauseKey::Continue),
        KeyCode::Esc | KeyCode::Char('q') => Some(PauseKey::Cancel),
        _ => None,
    }
}

/// Raw mode for the lifetime of the guard.
struct RawMode;

impl RawMode {
    fn enable() -> std::io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        terminal::disable_raw_mode().ok();
    }
}

/// Read keys while the pause identified by `id` is still open.
///
/// Never blocks longer than [`KEY_POLL`], so a pause continued from another
/// shell releases the terminal promptly.
fn read_pause_keys(id: u64, handle: GateHandle) {
    let Ok(_raw) = RawMode::enable() else {
        return;
    };
    while handle.pending().map(|n| n.id) == Some(id) {
        match event::poll(KEY_POLL) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(_) => return,
        }
        let Ok(Event::Key(key)) = event::read() else {
            continue;
        };
        match pause_key_action(&key) {
            Some(PauseKey::Continue) => {
                handle.resolve_if(id);
                return;
            }
            Some(PauseKey::Cancel) => {
                handle.reject_if(id, "cancelled at pause prompt");
                return;
            }
            None => {}
        }
    }
}

impl UserInterface for TerminalUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn set_output_mode(&mut self, mode: OutputMode) {
        self.mode = mode;
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "{}", msg).ok();
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "{}", self.theme.format_success(msg)).ok();
        }
    }

    fn warning(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "{}", self.theme.format_warning(msg)).ok();
        }
    }

    fn error(&mut self, msg: &str) {
        writeln!(self.term, "{}", self.theme.format_error(msg)).ok();
    }

    fn prompt(&mut self, prompt: &Prompt) -> Result<PromptResult> {
        self.settle_key_reader();
        prompt_user(prompt, &self.term)
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        if self.mode.shows_spinners() {
            Box::new(ProgressSpinner::new(message))
        } else {
            Box::new(ProgressSpinner::hidden())
        }
    }

    fn show_header(&mut self, title: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "\n{}\n", self.theme.format_header(title)).ok();
        }
    }

    fn show_progress(&mut self, current: usize, total: usize) {
        if self.mode.shows_steps() {
            writeln!(
                self.term,
                "{}",
                self.theme.dim.apply_to(format!("[{}/{}]", current, total))
            )
            .ok();
        }
    }

    fn show_step(&mut self, index: usize, total: usize, title: &str) {
        if self.mode.shows_steps() {
            writeln!(self.term, "{}", self.theme.format_step(index, total, title)).ok();
        }
    }

    fn show_hint(&mut self, hint: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "  {}", self.theme.hint.apply_to(hint)).ok();
        }
    }

    fn show_error_block(&mut self, command: &str, output: &str, hint: Option<&str>) {
        let b = &self.theme.border;
        writeln!(
            self.term,
            "    {} {}",
            b.apply_to("┌─"),
            b.apply_to("Command ──────────────────────────")
        )
        .ok();
        writeln!(
            self.term,
            "    {} {}",
            b.apply_to("│"),
            self.theme.command.apply_to(command)
        )
        .ok();

        if !output.is_empty() {
            writeln!(
                self.term,
                "    {} {}",
                b.apply_to("├─"),
                b.apply_to("Output ───────────────────────────")
            )
            .ok();
            for line in output.lines() {
                writeln!(self.term, "    {} {}", b.apply_to("│"), line).ok();
            }
        }

        writeln!(
            self.term,
            "    {}",
            b.apply_to("└────────────────────────────────────")
        )
        .ok();

        if let Some(h) = hint {
            writeln!(self.term, "    {}", self.theme.hint.apply_to(h)).ok();
        }
    }

    fn start_pause_indicator(&mut self, notice: &PauseNotice) -> Box<dyn SpinnerHandle> {
        if self.mode.shows_spinners() {
            Box::new(PauseIndicator::new(&notice.title))
        } else {
            Box::new(PauseIndicator::hidden())
        }
    }

    fn notify_pause(&mut self, notice: &PauseNotice, handle: GateHandle) {
        writeln!(self.term, "\n{}", self.theme.format_paused(&notice.title)).ok();
        if let Some(detail) = &notice.detail {
            for line in detail.lines() {
                writeln!(self.term, "  {}", line).ok();
            }
        }
        writeln!(
            self.term,
            "  {}",
            self.theme
                .hint
                .apply_to("Enter to continue, Esc to cancel (or `upsync continue` from another shell)")
        )
        .ok();

        self.settle_key_reader();
        let id = notice.id;
        self.key_reader = Some(std::thread::spawn(move || read_pause_keys(id, handle)));
    }

    fn show_run_summary(&mut self, summary: &RunSummary) {
        if !self.mode.shows_status() {
            return;
        }

        let b = &self.theme.border;

        writeln!(self.term).ok();
        writeln!(
            self.term,
            "  {} {}",
            b.apply_to("┌─"),
            b.apply_to("Summary ──────────────────────────")
        )
        .ok();

        for step in &summary.step_results {
            let icon = step.status.styled(&self.theme);
            let right_side = match (&step.detail, step.duration) {
                (Some(detail), _) => self.theme.dim.apply_to(detail).to_string(),
                (None, Some(d)) => self.theme.duration.apply_to(format_duration(d)).to_string(),
                (None, None) => String::new(),
            };

            writeln!(
                self.term,
                "  {} {} {:<40} {}",
                b.apply_to("│"),
                icon,
                step.title,
                right_side,
            )
            .ok();
        }

        writeln!(
            self.term,
            "  {}",
            b.apply_to("├────────────────────────────────────")
        )
        .ok();
        let outcome = if summary.success {
            self.theme.success.apply_to(&summary.outcome).to_string()
        } else {
            self.theme.error.apply_to(&summary.outcome).to_string()
        };
        writeln!(
            self.term,
            "  {} {} {} {}/{} steps {} {}",
            b.apply_to("│"),
            outcome,
            self.theme.dim.apply_to("·"),
            summary.step_results.len(),
            summary.total_steps,
            self.theme.dim.apply_to("·"),
            self.theme
                .duration
                .apply_to(format_duration(summary.total_duration)),
        )
        .ok();
        writeln!(
            self.term,
            "  {}",
            b.apply_to("└────────────────────────────────────")
        )
        .ok();
    }

    fn is_interactive(&self) -> bool {
        self.term.is_term()
    }
}

/// Create the appropriate UI based on context.
pub fn create_ui(interactive: bool, mode: OutputMode) -> Box<dyn UserInterface> {
    if interactive && Term::stdout().is_term() {
        Box::new(TerminalUI::new(mode))
    } else {
        Box::new(NonInteractiveUI::new(mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_ui_output_mode() {
        let mut ui = TerminalUI::new(OutputMode::Quiet);
        assert_eq!(ui.output_mode(), OutputMode::Quiet);
        ui.set_output_mode(OutputMode::Verbose);
        assert_eq!(ui.output_mode(), OutputMode::Verbose);
    }

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn pause_keys_map_to_actions() {
        assert_eq!(
            pause_key_action(&press(KeyCode::Enter, KeyModifiers::NONE)),
            Some(PauseKey::Continue)
        );
        assert_eq!(
            pause_key_action(&press(KeyCode::Char('c'), KeyModifiers::NONE)),
            Some(PauseKey::Continue)
        );
        assert_eq!(
            pause_key_action(&press(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(PauseKey::Cancel)
        );
        assert_eq!(
            pause_key_action(&press(KeyCode::Esc, KeyModifiers::NONE)),
            Some(PauseKey::Cancel)
        );
        assert_eq!(pause_key_action(&press(KeyCode::Char('x'), KeyModifiers::NONE)), None);
    }

    #[test]
    fn key_releases_are_ignored() {
        let mut key = press(KeyCode::Enter, KeyModifiers::NONE);
        key.kind = KeyEventKind::Release;
        assert_eq!(pause_key_action(&key), None);
    }

    #[test]
    fn key_reader_stops_once_pause_is_settled_elsewhere() {
        let gate = crate::runner::gate::SuspensionGate::new();
        let pending = gate.suspend("Confirm merge", None).unwrap();
        let id = pending.notice().id;
        let handle = gate.handle();

        let reader = std::thread::spawn(move || read_pause_keys(id, handle));
        assert!(gate.handle().resolve_pending());
        reader.join().unwrap();
        drop(pending);
    }

    #[test]
    fn create_ui_non_interactive() {
        let ui = create_ui(false, OutputMode::Normal);
        assert!(!ui.is_interactive());
    }

    #[test]
    fn create_ui_respects_mode() {
        let ui = create_ui(false, OutputMode::Silent);
        assert_eq!(ui.output_mode(), OutputMode::Silent);
    }
}
