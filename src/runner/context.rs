//! Per-step execution context.
//!
//! Everything a step needs while it runs: the working directory, the UI,
//! the pause gate, the terminal runner, and the recovery loops built on
//! top of them.

use std::path::Path;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::{Result, UpsyncError};
use crate::git::{self, ConflictState};
use crate::shell::{self, CommandResult, TerminalRunner};
use crate::steps::{StepAction, StepFlow};
use crate::ui::UserInterface;

use super::cancel::CancelToken;
use super::control::{ControlDir, PauseRecord};
use super::gate::SuspensionGate;
use super::recovery::{
    prompt_conflict_action, prompt_verification_action, ConflictAction, VerificationAction,
};

/// Context handed to each step and [`StepOperation`](crate::steps::StepOperation).
pub struct StepContext<'a> {
    /// Working directory of the workflow.
    pub cwd: &'a Path,
    /// User interface.
    pub ui: &'a mut dyn UserInterface,
    gate: &'a SuspensionGate,
    terminal: &'a TerminalRunner,
    control: Option<&'a ControlDir>,
    cancel: Option<&'a CancelToken>,
    conflict_rules: &'a [String],
    failures: Vec<String>,
}

impl<'a> StepContext<'a> {
    pub fn new(
        cwd: &'a Path,
        ui: &'a mut dyn UserInterface,
        gate: &'a SuspensionGate,
        terminal: &'a TerminalRunner,
    ) -> Self {
        Self {
            cwd,
            ui,
            gate,
            terminal,
            control: None,
            cancel: None,
            conflict_rules: &[],
            failures: Vec::new(),
        }
    }

    /// Publish pauses under `control` so other shells can continue them.
    pub fn with_control(mut self, control: Option<&'a ControlDir>) -> Self {
        self.control = control;
        self
    }

    /// Refuse new pauses once `cancel` has fired.
    pub fn with_cancel(mut self, cancel: &'a CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Rules shown when a merge stops on conflicts.
    pub fn with_conflict_rules(mut self, rules: &'a [String]) -> Self {
        self.conflict_rules = rules;
        self
    }

    /// Failures recovered from since the last call.
    pub fn take_failures(&mut self) -> Vec<String> {
        std::mem::take(&mut self.failures)
    }

    /// Note a failure the workflow recovered from.
    pub fn record_failure(&mut self, failure: impl Into<String>) {
        let failure = failure.into();
        warn!("Recovered failure: {}", failure);
        self.failures.push(failure);
    }

    /// Suspend until the pause is continued or rejected.
    ///
    /// The pause indicator and the published pause record live exactly as
    /// long as the wait. A pause opened after cancellation was requested is
    /// rejected at once; the token only rejects pauses that already exist.
    pub async fn wait_for_continue(&mut self, title: &str, detail: Option<&str>) -> Result<()> {
        let pending = self.gate.suspend(title, detail)?;
        if let Some(cancel) = self.cancel.filter(|c| c.is_cancelled()) {
            info!("Not pausing for '{}': cancellation requested", title);
            drop(pending);
            return Err(UpsyncError::cancelled(
                cancel.reason().unwrap_or_else(|| "cancelled".to_string()),
            ));
        }
        let notice = pending.notice().clone();
        info!("Paused: {}", title);

        let _indicator = self.ui.start_pause_indicator(&notice);
        let _record: Option<PauseRecord> = match self.control {
            Some(control) => match control.record_pause(&notice) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("Could not publish pause: {}", e);
                    None
                }
            },
            None => None,
        };

        self.ui.notify_pause(&notice, self.gate.handle());
        pending.wait().await?;
        info!("Continued: {}", title);
        Ok(())
    }

    fn echo_command(&mut self, command: &str) {
        if self.ui.output_mode().shows_command_output() {
            self.ui.message(&format!("> {}", command));
        }
    }

    fn echo_output(&mut self, result: &CommandResult) {
        if self.ui.output_mode().shows_command_output() {
            let output = result.combined_output();
            if !output.is_empty() {
                self.ui.message(&output);
            }
        }
    }

    /// Run a command to completion; non-zero exit is an error.
    pub async fn run_sync(&mut self, command: &str) -> Result<CommandResult> {
        self.echo_command(command);
        let result = shell::run_captured(command, self.cwd).await?;
        self.echo_output(&result);
        if !result.success {
            warn!("{} exited with {:?}", command, result.exit_code);
        }
        result.into_checked(command)
    }

    /// Run a command in a terminal session and wait for it to finish.
    pub async fn run_in_terminal(&mut self, command: &str, label: &str) -> Result<Duration> {
        self.echo_command(command);
        let mut spinner = self
            .ui
            .start_spinner(&format!("Waiting for {} in its terminal...", label));
        match self.terminal.run_and_wait(command, label, self.cwd).await {
            Ok(elapsed) => {
                spinner.finish_success(&format!("{} finished", label));
                Ok(elapsed)
            }
            Err(e) => {
                spinner.finish_error(&format!("{} did not succeed", label));
                Err(e)
            }
        }
    }

    /// Run one command action.
    pub async fn run_action(&mut self, action: &StepAction) -> Result<StepFlow> {
        match action {
            StepAction::Shell(command) => {
                self.run_sync(command).await?;
                Ok(StepFlow::Continue)
            }
            StepAction::Terminal { command, label } => {
                self.run_in_terminal(command, label).await?;
                Ok(StepFlow::Continue)
            }
            StepAction::Operation(op) => op.run(self).await,
        }
    }

    /// Run a merge or pull, pausing for manual resolution on conflicts.
    ///
    /// A successful exit is only inspected when its output mentions a
    /// conflict. A failed `git pull`/`git merge`, or any failure mentioning
    /// a conflict, is inspected structurally; with no unmerged paths it is
    /// reported as a warning and the step completes. Other failures are
    /// errors.
    pub async fn run_with_conflict_support(&mut self, command: &str) -> Result<()> {
        self.echo_command(command);
        let result = shell::run_captured(command, self.cwd).await?;
        self.echo_output(&result);

        let mentions_conflict = git::output_indicates_conflict(&result.combined_output());
        if result.success && !mentions_conflict {
            return Ok(());
        }
        if !result.success && !mentions_conflict && !git::is_merge_command(command) {
            return result.into_checked(command).map(|_| ());
        }

        let state = git::inspect(self.cwd).await?;
        if state.is_clean() {
            if !result.success {
                warn!("{} failed without unmerged paths", command);
                self.ui.warning(&format!(
                    "{} failed, but no conflicted files were found; continuing",
                    command
                ));
                let stderr = result.stderr.trim();
                if !stderr.is_empty() {
                    self.ui.show_hint(stderr);
                }
            }
            return Ok(());
        }

        self.resolve_conflicts(state).await
    }

    /// Pause until `state`'s conflicts are resolved, forced past, or the
    /// user aborts.
    pub async fn resolve_conflicts(&mut self, mut state: ConflictState) -> Result<()> {
        loop {
            self.ui.warning(&format!(
                "Merge conflicts in {} file(s); resolve them manually",
                state.len()
            ));
            let detail = git::resolution_guidance(self.conflict_rules, &state);
            self.wait_for_continue("Resolve merge conflicts", Some(&detail))
                .await?;

            state = git::inspect(self.cwd).await?;
            if state.is_clean() {
                self.ui.success("Conflicts resolved");
                return Ok(());
            }

            match prompt_conflict_action(self.ui, state.len())? {
                ConflictAction::Recheck => continue,
                ConflictAction::Force => {
                    self.ui.warning(&format!(
                        "Continuing with {} unresolved file(s)",
                        state.len()
                    ));
                    self.record_failure(format!(
                        "forced past {} unresolved conflict(s)",
                        state.len()
                    ));
                    return Ok(());
                }
                ConflictAction::Abort => {
                    return Err(UpsyncError::cancelled("unresolved merge conflicts"))
                }
            }
        }
    }

    /// Run `action` until it passes, the user skips it, or the user aborts.
    ///
    /// Every failure is recorded, pauses for a fix, and then asks whether to
    /// re-run, skip, or abort. There is no retry limit.
    pub async fn verify_with_retry(&mut self, title: &str, action: &StepAction) -> Result<StepFlow> {
        loop {
            let err = match self.run_action(action).await {
                Ok(flow) => return Ok(flow),
                Err(e) if e.is_user_cancelled() => return Err(e),
                Err(e) => e,
            };

            self.record_failure(format!("{}: {}", title, err));
            self.ui.error(&format!("{} failed: {}", title, err));
            let detail = format!(
                "{}\nFix the failures in the working tree, then continue to choose re-run, skip, or abort.",
                err
            );
            self.wait_for_continue(&format!("Fix {}", title), Some(&detail))
                .await?;

            match prompt_verification_action(self.ui, title)? {
                VerificationAction::Rerun => continue,
                VerificationAction::Skip => {
                    self.ui.warning(&format!("{} skipped and marked as passed", title));
                    return Ok(StepFlow::Continue);
                }
                VerificationAction::Abort => {
                    return Err(UpsyncError::cancelled(format!("{} aborted after failure", title)))
                }
            }
        }
    }
}
