//! Human-in-the-loop recovery choices.
//!
//! After a conflicted merge is continued but files are still unmerged, the
//! user picks recheck, force, or abort. After a verification command fails
//! and the fix pause is continued, the user picks re-run, skip, or abort.

use crate::error::Result;
use crate::ui::{ask_select, PromptOption, UserInterface};

/// Prompt key for the unresolved-conflicts choice.
pub const CONFLICT_ACTION_KEY: &str = "conflict_action";

/// Prompt key for the failed-verification choice.
pub const VERIFICATION_ACTION_KEY: &str = "verification_action";

/// What to do about conflicts that are still present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictAction {
    /// Pause again and re-inspect once continued.
    Recheck,
    /// Carry on with unmerged files.
    Force,
    /// Stop the workflow.
    Abort,
}

/// What to do about a failed verification command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationAction {
    /// Run the command again.
    Rerun,
    /// Treat the step as passed.
    Skip,
    /// Stop the workflow.
    Abort,
}

/// Ask how to proceed with `remaining` unmerged files.
pub fn prompt_conflict_action(
    ui: &mut dyn UserInterface,
    remaining: usize,
) -> Result<ConflictAction> {
    let options = vec![
        PromptOption::new("Recheck after fixing", "recheck"),
        PromptOption::new("Force continue", "force"),
        PromptOption::new("Abort", "abort"),
    ];
    let question = format!(
        "{} file(s) still have unresolved conflicts. How do you want to proceed?",
        remaining
    );

    let answer = ask_select(ui, CONFLICT_ACTION_KEY, &question, options, "recheck")?;
    Ok(match answer.as_str() {
        "force" => ConflictAction::Force,
        "abort" => ConflictAction::Abort,
        _ => ConflictAction::Recheck,
    })
}

/// Ask how to proceed after `title` failed.
pub fn prompt_verification_action(
    ui: &mut dyn UserInterface,
    title: &str,
) -> Result<VerificationAction> {
    let options = vec![
        PromptOption::new("Re-run", "rerun"),
        PromptOption::new("Skip (mark as passed)", "skip"),
        PromptOption::new("Abort", "abort"),
    ];
    let question = format!("{} failed. How do you want to proceed?", title);

    let answer = ask_select(ui, VERIFICATION_ACTION_KEY, &question, options, "rerun")?;
    Ok(match answer.as_str() {
        "skip" => VerificationAction::Skip,
        "abort" => VerificationAction::Abort,
        _ => VerificationAction::Rerun,
    })
}
