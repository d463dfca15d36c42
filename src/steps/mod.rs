//! Workflow steps.
//!
//! A [`Workflow`] is an ordered list of [`Step`]s built per run from a
//! parameter set. Steps are immutable once built; the
//! [`StepSequencer`](crate::runner::StepSequencer) runs them in order.
//!
//! - `info` steps only report
//! - `pause` steps suspend until an external actor continues or cancels
//! - `command` steps run a shell command, a terminal session, or an
//!   in-process [`StepOperation`], optionally wrapped by a recovery loop
//!
//! # Example
//!
//! ```
//! use upsync::steps::{Step, Workflow};
//!
//! let workflow = Workflow::new("Sync", ".")
//!     .step(Step::shell("Check out main", "git checkout main"))
//!     .step(Step::shell("Pull main", "git pull origin main").conflict_aware())
//!     .step(Step::pause("Confirm merge").with_detail("Review the diff first"));
//!
//! assert_eq!(workflow.len(), 3);
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::Result;
use crate::runner::StepContext;

/// Whether the workflow should go on after an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepFlow {
    /// Proceed to the next step.
    Continue,
    /// Stop here without failing; remaining steps are not run.
    Halt,
}

/// In-process work done by a step, with full access to the run context.
#[async_trait(?Send)]
pub trait StepOperation {
    async fn run(&self, ctx: &mut StepContext<'_>) -> Result<StepFlow>;
}

/// What a command step executes.
pub enum StepAction {
    /// Run to completion, capturing output.
    Shell(String),
    /// Run in a user-visible terminal session and wait for its marker.
    Terminal { command: String, label: String },
    /// Run an in-process operation.
    Operation(Box<dyn StepOperation>),
}

impl fmt::Debug for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shell(cmd) => f.debug_tuple("Shell").field(cmd).finish(),
            Self::Terminal { command, label } => f
                .debug_struct("Terminal")
                .field("command", command)
                .field("label", label)
                .finish(),
            Self::Operation(_) => f.write_str("Operation(..)"),
        }
    }
}

/// Recovery loop wrapped around a command step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Recovery {
    /// Failure fails the workflow.
    #[default]
    None,
    /// Merge conflicts pause the workflow until resolved.
    Conflicts,
    /// Failure pauses for a fix, then offers re-run, skip, or abort.
    Verification,
}

/// The kind of a step.
#[derive(Debug)]
pub enum StepKind {
    Info,
    Pause,
    Command {
        action: StepAction,
        recovery: Recovery,
    },
}

impl StepKind {
    /// Lowercase label used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Pause => "pause",
            Self::Command { .. } => "command",
        }
    }
}

/// One workflow step.
pub struct Step {
    pub title: String,
    pub detail: Option<String>,
    pub kind: StepKind,
    /// Runs right after a pause is continued, before the next step.
    pub on_continue: Option<Box<dyn StepOperation>>,
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("title", &self.title)
            .field("detail", &self.detail)
            .field("kind", &self.kind)
            .field("on_continue", &self.on_continue.is_some())
            .finish()
    }
}

impl Step {
    fn new(title: impl Into<String>, kind: StepKind) -> Self {
        Self {
            title: title.into(),
            detail: None,
            kind,
            on_continue: None,
        }
    }

    /// A step that only reports its title and detail.
    pub fn info(title: impl Into<String>) -> Self {
        Self::new(title, StepKind::Info)
    }

    /// A step that waits for the user to continue.
    pub fn pause(title: impl Into<String>) -> Self {
        Self::new(title, StepKind::Pause)
    }

    /// Run a shell command to completion.
    pub fn shell(title: impl Into<String>, command: impl Into<String>) -> Self {
        Self::command(title, StepAction::Shell(command.into()))
    }

    /// Run a command in a terminal session named `label`.
    pub fn terminal(
        title: impl Into<String>,
        command: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self::command(
            title,
            StepAction::Terminal {
                command: command.into(),
                label: label.into(),
            },
        )
    }

    /// Run an in-process operation.
    pub fn operation(title: impl Into<String>, op: impl StepOperation + 'static) -> Self {
        Self::command(title, StepAction::Operation(Box::new(op)))
    }

    fn command(title: impl Into<String>, action: StepAction) -> Self {
        Self::new(
            title,
            StepKind::Command {
                action,
                recovery: Recovery::None,
            },
        )
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Recover from merge conflicts instead of failing.
    pub fn conflict_aware(self) -> Self {
        self.with_recovery(Recovery::Conflicts)
    }

    /// Offer re-run, skip, or abort when the command fails.
    pub fn verified(self) -> Self {
        self.with_recovery(Recovery::Verification)
    }

    fn with_recovery(mut self, recovery: Recovery) -> Self {
        if let StepKind::Command { recovery: r, .. } = &mut self.kind {
            *r = recovery;
        }
        self
    }

    /// Run `op` after this pause is continued.
    pub fn on_continue(mut self, op: impl StepOperation + 'static) -> Self {
        self.on_continue = Some(Box::new(op));
        self
    }

    /// Recovery tag for command steps, `None` otherwise.
    pub fn recovery(&self) -> Recovery {
        match &self.kind {
            StepKind::Command { recovery, .. } => *recovery,
            _ => Recovery::None,
        }
    }
}

/// An ordered list of steps run against one working directory.
#[derive(Debug)]
pub struct Workflow {
    pub title: String,
    pub cwd: PathBuf,
    pub steps: Vec<Step>,
}

impl Workflow {
    pub fn new(title: impl Into<String>, cwd: impl AsRef<Path>) -> Self {
        Self {
            title: title.into(),
            cwd: cwd.as_ref().to_path_buf(),
            steps: Vec::new(),
        }
    }

    /// Append a step.
    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Append a step when `cond` holds.
    pub fn step_if(self, cond: bool, step: impl FnOnce() -> Step) -> Self {
        if cond {
            self.step(step())
        } else {
            self
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn titles(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.title.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    #[async_trait(?Send)]
    impl StepOperation for Noop {
        async fn run(&self, _ctx: &mut StepContext<'_>) -> Result<StepFlow> {
            Ok(StepFlow::Continue)
        }
    }

    #[test]
    fn builders_set_kind_and_recovery() {
        let step = Step::shell("Pull", "git pull origin main").conflict_aware();
        assert_eq!(step.recovery(), Recovery::Conflicts);
        assert_eq!(step.kind.label(), "command");

        let step = Step::terminal("Tests", "npm test", "tests").verified();
        assert_eq!(step.recovery(), Recovery::Verification);
    }

    #[test]
    fn recovery_is_ignored_for_non_commands() {
        let step = Step::pause("Confirm").conflict_aware();
        assert_eq!(step.recovery(), Recovery::None);
        assert_eq!(step.kind.label(), "pause");
    }

    #[test]
    fn pause_with_continuation() {
        let step = Step::pause("Hand off").on_continue(Noop);
        assert!(step.on_continue.is_some());
        assert!(format!("{:?}", step).contains("on_continue: true"));
    }

    #[test]
    fn workflow_preserves_order() {
        let workflow = Workflow::new("Quick upgrade", "/repo")
            .step(Step::info("Workspace"))
            .step_if(false, || Step::info("skipped"))
            .step(Step::operation("Commit", Noop))
            .step_if(true, || Step::pause("Confirm"));

        assert_eq!(workflow.titles(), vec!["Workspace", "Commit", "Confirm"]);
        assert_eq!(workflow.cwd, PathBuf::from("/repo"));
    }
}
