//! Quick upgrade: upgrade a feature branch off the target, then merge it back.

use std::path::Path;

use crate::git::git_command;
use crate::steps::{Step, Workflow};

use super::ops::{CheckoutFeature, CommitChanges, DeleteBranch, OptionalVerification};
use super::params::QuickParams;

pub const QUICK_TITLE: &str = "Quick upgrade";

/// Build the quick upgrade workflow for `cwd`.
pub fn quick_workflow(cwd: &Path, params: &QuickParams) -> Workflow {
    let QuickParams {
        environment,
        remote,
        target_branch: target,
        source_branch: source,
        feature_branch: feature,
        ..
    } = params;

    Workflow::new(QUICK_TITLE, cwd)
        .step(Step::info(format!("Workspace: {}", cwd.display())))
        .step(
            Step::info(format!("Environment: {}", environment.to_uppercase())).with_detail(
                format!(
                    "target branch: {}\nsource branch: {}\nfeature branch: {}",
                    target, source, feature
                ),
            ),
        )
        .step(Step::shell(
            format!("Check out target branch {}", target),
            git_command(&["checkout", target]),
        ))
        .step(Step::shell(
            format!("Update {}/{}", remote, target),
            git_command(&["pull", remote, target]),
        ))
        .step(Step::operation(
            format!("Create or switch to feature branch {}", feature),
            CheckoutFeature {
                branch: feature.clone(),
                base: target.clone(),
            },
        ))
        .step(
            Step::shell(
                format!("Merge source branch {}/{}", remote, source),
                git_command(&["pull", remote, source]),
            )
            .conflict_aware(),
        )
        .step(Step::terminal(
            "Run the upgrade script (follow progress in its terminal)",
            params.upgrade_command.clone(),
            "upgrade script",
        ))
        .step(Step::operation(
            "Commit the upgrade",
            CommitChanges {
                default_message: params.commit_message.clone(),
            },
        ))
        .step(
            Step::pause(format!("About to merge into {}", target)).with_detail(format!(
                "Confirm before continuing:\n  - {} has been upgraded\n  - its tests pass, or the risk is known\n\nThe next steps switch to {} and merge.",
                feature, target
            )),
        )
        .step(Step::shell(
            format!("Switch back to {}", target),
            git_command(&["checkout", target]),
        ))
        .step(Step::shell(
            format!("Update {}/{}", remote, target),
            git_command(&["pull", remote, target]),
        ))
        .step(
            Step::shell(
                format!("Merge {} into {}", feature, target),
                git_command(&["merge", feature]),
            )
            .conflict_aware(),
        )
        .step(Step::operation(
            format!("Run `{}` on {}", params.test_command, target),
            OptionalVerification {
                command: params.test_command.clone(),
                label: "unit tests".to_string(),
            },
        ))
        .step(Step::shell(
            format!("Push {} to {}", target, remote),
            git_command(&["push", remote, target]),
        ))
        .step(Step::operation(
            format!("Delete feature branch {}", feature),
            DeleteBranch {
                branch: feature.clone(),
            },
        ))
        .step(Step::info("Quick upgrade finished").with_detail(format!(
            "Next:\n  1. deploy the pre-{} environment\n  2. verify the features\n  3. watch the logs\n  4. roll back if anything is wrong",
            environment
        )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::{Recovery, StepKind};

    fn params() -> QuickParams {
        QuickParams {
            environment: "test".to_string(),
            remote: "origin".to_string(),
            target_branch: "test-220915".to_string(),
            source_branch: "plus-upgrade-test".to_string(),
            feature_branch: "upgrade/test-250918".to_string(),
            upgrade_command: "node ./scripts/upgrade-bizcore.js".to_string(),
            test_command: "yarn test".to_string(),
            commit_message: "upgrade: test".to_string(),
        }
    }

    #[test]
    fn step_order() {
        let workflow = quick_workflow(Path::new("/repo"), &params());
        assert_eq!(workflow.len(), 16);

        let titles = workflow.titles();
        assert_eq!(titles[2], "Check out target branch test-220915");
        assert_eq!(titles[5], "Merge source branch origin/plus-upgrade-test");
        assert_eq!(titles[8], "About to merge into test-220915");
        assert_eq!(titles[14], "Delete feature branch upgrade/test-250918");
    }

    #[test]
    fn merges_are_conflict_aware() {
        let workflow = quick_workflow(Path::new("/repo"), &params());
        let conflict_aware: Vec<_> = workflow
            .steps
            .iter()
            .filter(|s| s.recovery() == Recovery::Conflicts)
            .map(|s| s.title.as_str())
            .collect();
        assert_eq!(
            conflict_aware,
            vec![
                "Merge source branch origin/plus-upgrade-test",
                "Merge upgrade/test-250918 into test-220915"
            ]
        );
    }

    #[test]
    fn upgrade_runs_in_terminal() {
        let workflow = quick_workflow(Path::new("/repo"), &params());
        match &workflow.steps[6].kind {
            StepKind::Command {
                action: crate::steps::StepAction::Terminal { command, label },
                ..
            } => {
                assert_eq!(command, "node ./scripts/upgrade-bizcore.js");
                assert_eq!(label, "upgrade script");
            }
            other => panic!("expected terminal step, got {:?}", other),
        }
    }
}
