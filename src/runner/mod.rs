//! Workflow orchestration.
//!
//! - [`StepSequencer`] runs a [`Workflow`] step by step
//! - [`SuspensionGate`] is the single pause slot external actors resolve
//! - [`StepContext`] carries the conflict and verification retry loops
//! - [`run_workflow`] wraps a run with preflight, the run lock, the control
//!   file watcher, and Ctrl-C handling

pub mod cancel;
pub mod context;
pub mod control;
pub mod gate;
pub mod lock;
pub mod preflight;
pub mod recovery;
pub mod sequencer;

pub use cancel::CancelToken;
pub use context::StepContext;
pub use control::{ControlDir, ControlRequest};
pub use gate::{GateHandle, PauseNotice, PendingPause, SuspensionGate};
pub use lock::RunLock;
pub use preflight::preflight;
pub use recovery::{ConflictAction, VerificationAction};
pub use sequencer::{RunState, StepEntry, StepProgress, StepSequencer, WorkflowResult};

use std::time::Duration;

use tracing::{info, warn};

use crate::config::UpsyncConfig;
use crate::error::Result;
use crate::steps::Workflow;
use crate::ui::UserInterface;

/// Run `workflow` as the only run in its repository.
///
/// Fails before any step runs if preflight fails or another run holds the
/// lock. Otherwise the returned result carries the terminal state.
pub async fn run_workflow(
    workflow: &Workflow,
    config: &UpsyncConfig,
    ui: &mut dyn UserInterface,
) -> Result<WorkflowResult> {
    preflight(&workflow.cwd, ui).await?;

    let control = ControlDir::discover(&workflow.cwd).await?;
    let _lock = RunLock::acquire(&control.lock_path())?;
    control.reset();

    let mut sequencer = StepSequencer::from_config(config).with_control(control.clone());
    let cancel = sequencer.cancel_token();

    let watcher = control.spawn_watcher(
        sequencer.gate_handle(),
        cancel.clone(),
        Duration::from_millis(config.terminal.poll_interval_ms),
    );
    let interrupts = {
        let control = control.clone();
        let lock_path = control.lock_path();
        tokio::spawn(async move {
            let mut presses = 0;
            while tokio::signal::ctrl_c().await.is_ok() {
                presses += 1;
                if presses > 1 {
                    warn!("Interrupted twice, exiting");
                    // exit skips Drop, so release run state by hand
                    control.reset();
                    RunLock::force_release(&lock_path);
                    std::process::exit(130);
                }
                cancel.cancel("interrupted (Ctrl-C)");
            }
        })
    };

    ui.show_header(&workflow.title);
    let result = sequencer.run(workflow, ui).await;

    watcher.abort();
    interrupts.abort();
    control.reset();

    ui.show_run_summary(&result.summary());
    info!("'{}' finished: {}", workflow.title, result.state);
    Ok(result)
}
