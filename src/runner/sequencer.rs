//! Ordered step execution.
//!
//! The sequencer walks a [`Workflow`] one step at a time:
//!
//! 1. stop with `Aborted` if cancellation was requested
//! 2. report `(index, total, title)`
//! 3. dispatch by kind, wrapping commands in their recovery loop
//!
//! Any unrecovered failure stops the run with `Failed`. It owns the single
//! [`SuspensionGate`] of the run and clears any orphaned pause on exit.

use std::fmt;
use std::time::{Duration, Instant};

use tracing::{error, info};

use crate::config::UpsyncConfig;
use crate::error::UpsyncError;
use crate::shell::TerminalRunner;
use crate::steps::{Recovery, Step, StepAction, StepFlow, StepKind, Workflow};
use crate::ui::{RunSummary, StatusKind, StepSummary, UserInterface};

use super::cancel::CancelToken;
use super::context::StepContext;
use super::control::ControlDir;
use super::gate::{GateHandle, SuspensionGate};

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Completed,
    Aborted,
    Failed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Aborted | Self::Failed)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
            Self::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Progress notification for one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepProgress {
    /// Zero-based position.
    pub index: usize,
    pub total: usize,
    pub title: String,
}

/// Record of one step that ran.
#[derive(Debug, Clone)]
pub struct StepEntry {
    pub index: usize,
    pub title: String,
    pub status: StatusKind,
    pub duration: Duration,
    /// Failures recovered from inside the step.
    pub recovered: Vec<String>,
    pub error: Option<String>,
}

/// Outcome of a run.
#[derive(Debug)]
pub struct WorkflowResult {
    pub title: String,
    pub state: RunState,
    pub entries: Vec<StepEntry>,
    pub total_steps: usize,
    /// Error that stopped the run, if any.
    pub error: Option<UpsyncError>,
    pub duration: Duration,
}

impl WorkflowResult {
    pub fn is_success(&self) -> bool {
        self.state == RunState::Completed
    }

    /// All failures recovered during the run, in order.
    pub fn recovered_failures(&self) -> Vec<&str> {
        self.entries
            .iter()
            .flat_map(|e| e.recovered.iter().map(String::as_str))
            .collect()
    }

    /// Summary for [`UserInterface::show_run_summary`].
    pub fn summary(&self) -> RunSummary {
        let step_results = self
            .entries
            .iter()
            .map(|e| StepSummary {
                title: e.title.clone(),
                status: e.status,
                duration: Some(e.duration),
                detail: match (&e.error, e.recovered.len()) {
                    (Some(err), _) => Some(err.clone()),
                    (None, 0) => None,
                    (None, n) => Some(format!("recovered {} failure(s)", n)),
                },
            })
            .collect();

        RunSummary {
            title: self.title.clone(),
            step_results,
            total_steps: self.total_steps,
            total_duration: self.duration,
            outcome: self.state.to_string(),
            success: self.is_success(),
        }
    }
}

/// Runs workflows step by step.
pub struct StepSequencer {
    gate: SuspensionGate,
    cancel: CancelToken,
    terminal: TerminalRunner,
    control: Option<ControlDir>,
    conflict_rules: Vec<String>,
    state: RunState,
}

impl Default for StepSequencer {
    fn default() -> Self {
        Self::new(TerminalRunner::default())
    }
}

impl StepSequencer {
    pub fn new(terminal: TerminalRunner) -> Self {
        let gate = SuspensionGate::new();
        let cancel = CancelToken::new(gate.handle());
        Self {
            gate,
            cancel,
            terminal,
            control: None,
            conflict_rules: Vec::new(),
            state: RunState::Idle,
        }
    }

    /// Build with the terminal settings and conflict rules from `config`.
    pub fn from_config(config: &UpsyncConfig) -> Self {
        Self::new(TerminalRunner::from_config(&config.terminal))
            .with_conflict_rules(config.conflicts.rules.clone())
    }

    pub fn with_control(mut self, control: ControlDir) -> Self {
        self.control = Some(control);
        self
    }

    pub fn with_conflict_rules(mut self, rules: Vec<String>) -> Self {
        self.conflict_rules = rules;
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Handle for actors that continue or reject pauses.
    pub fn gate_handle(&self) -> GateHandle {
        self.gate.handle()
    }

    /// Token that stops the run at the next step boundary.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Run `workflow` to a terminal state.
    pub async fn run(&mut self, workflow: &Workflow, ui: &mut dyn UserInterface) -> WorkflowResult {
        self.run_with_progress(workflow, ui, |_| {}).await
    }

    /// Run `workflow`, calling `on_progress` before each step starts.
    pub async fn run_with_progress(
        &mut self,
        workflow: &Workflow,
        ui: &mut dyn UserInterface,
        mut on_progress: impl FnMut(&StepProgress),
    ) -> WorkflowResult {
        let start = Instant::now();
        let total = workflow.len();
        let mut entries = Vec::with_capacity(total);
        let mut failure: Option<UpsyncError> = None;
        self.state = RunState::Running;
        info!("Starting '{}' ({} steps)", workflow.title, total);

        let mut ctx = StepContext::new(&workflow.cwd, ui, &self.gate, &self.terminal)
            .with_control(self.control.as_ref())
            .with_cancel(&self.cancel)
            .with_conflict_rules(&self.conflict_rules);

        let mut state = RunState::Completed;
        for (index, step) in workflow.steps.iter().enumerate() {
            if self.cancel.is_cancelled() {
                info!(
                    "Cancelled before '{}': {}",
                    step.title,
                    self.cancel.reason().unwrap_or_default()
                );
                state = RunState::Aborted;
                break;
            }

            let progress = StepProgress {
                index,
                total,
                title: step.title.clone(),
            };
            on_progress(&progress);
            ctx.ui.show_step(index, total, &step.title);
            info!(
                "[{}/{}] {} ({})",
                index + 1,
                total,
                step.title,
                step.kind.label()
            );

            let step_start = Instant::now();
            let outcome = run_step(&mut ctx, step).await;
            let recovered = ctx.take_failures();
            let duration = step_start.elapsed();

            match outcome {
                Ok(StepFlow::Continue) => entries.push(StepEntry {
                    index,
                    title: step.title.clone(),
                    status: StatusKind::Success,
                    duration,
                    recovered,
                    error: None,
                }),
                Ok(StepFlow::Halt) => {
                    info!("'{}' stopped the workflow", step.title);
                    entries.push(StepEntry {
                        index,
                        title: step.title.clone(),
                        status: StatusKind::Halted,
                        duration,
                        recovered,
                        error: None,
                    });
                    state = RunState::Aborted;
                    break;
                }
                Err(e) => {
                    error!("'{}' failed: {}", step.title, e);
                    report_failure(&mut *ctx.ui, step, &e);
                    entries.push(StepEntry {
                        index,
                        title: step.title.clone(),
                        status: StatusKind::Failed,
                        duration,
                        recovered,
                        error: Some(e.to_string()),
                    });
                    state = if e.is_user_cancelled() && self.cancel.is_cancelled() {
                        RunState::Aborted
                    } else {
                        RunState::Failed
                    };
                    failure = Some(e);
                    break;
                }
            }
        }
        drop(ctx);

        if let Some(orphan) = self.gate.abandon() {
            info!("Cleared orphaned pause '{}'", orphan.title);
        }
        self.state = state;
        info!("'{}' {}", workflow.title, state);

        WorkflowResult {
            title: workflow.title.clone(),
            state,
            entries,
            total_steps: total,
            error: failure,
            duration: start.elapsed(),
        }
    }
}

async fn run_step(ctx: &mut StepContext<'_>, step: &Step) -> crate::error::Result<StepFlow> {
    match &step.kind {
        StepKind::Info => {
            ctx.ui.message(&step.title);
            if let Some(detail) = &step.detail {
                for line in detail.lines() {
                    ctx.ui.message(&format!("  {}", line));
                }
            }
            Ok(StepFlow::Continue)
        }
        StepKind::Pause => {
            ctx.wait_for_continue(&step.title, step.detail.as_deref())
                .await?;
            match &step.on_continue {
                Some(op) => op.run(ctx).await,
                None => Ok(StepFlow::Continue),
            }
        }
        StepKind::Command { action, recovery } => match (recovery, action) {
            (Recovery::Conflicts, StepAction::Shell(command)) => {
                ctx.run_with_conflict_support(command).await?;
                Ok(StepFlow::Continue)
            }
            (Recovery::Conflicts, other) => match ctx.run_action(other).await {
                Err(e) if !e.is_user_cancelled() => {
                    let state = crate::git::inspect(ctx.cwd).await?;
                    if state.is_clean() {
                        return Err(e);
                    }
                    ctx.resolve_conflicts(state).await?;
                    Ok(StepFlow::Continue)
                }
                result => result,
            },
            (Recovery::Verification, action) => ctx.verify_with_retry(&step.title, action).await,
            (Recovery::None, action) => ctx.run_action(action).await,
        },
    }
}

fn report_failure(ui: &mut dyn UserInterface, step: &Step, err: &UpsyncError) {
    match (err, &step.kind) {
        (UpsyncError::CommandFailed { command, output, .. }, _) => {
            ui.show_error_block(command, output.trim_end(), None);
        }
        (UpsyncError::Timeout { .. }, StepKind::Command { .. }) => {
            ui.error(&err.to_string());
            ui.show_hint("Markers were cleaned up; re-run the workflow once the command finishes");
        }
        (e, _) if e.is_user_cancelled() => ui.warning(&e.to_string()),
        _ => ui.error(&format!("{}: {}", step.title, err)),
    }
}
