//! Cross-repository sync workflows.
//!
//! A source push publishes the base branch of the source repository to a
//! branch on the second remote. The target repository then either merges
//! that branch into a feature branch (standard) or rebuilds the upgrade
//! branch from it (rebuild).

use std::path::Path;

use crate::git::{git_command, merge_review_guidance};
use crate::steps::{Step, Workflow};

use super::ops::{
    CheckoutFeature, EnsureRemote, FetchAndMerge, Handoff, OptionalVerification,
};
use super::params::{RebuildParams, SourcePushParams, StandardParams};

pub const STANDARD_TITLE: &str = "Upgrade sync (standard)";
pub const REBUILD_TITLE: &str = "Upgrade sync (rebuild)";
pub const SOURCE_PUSH_TITLE: &str = "Upgrade sync (source push)";

fn push_to(remote: &str, branch: &str) -> Step {
    Step::shell(
        format!("Push {} to {}", branch, remote),
        git_command(&["push", remote, &format!("{}:{}", branch, branch)]),
    )
}

/// Merge the pushed upstream branch into a feature branch, upgrade, and
/// merge the result into the base branch.
pub fn standard_workflow(cwd: &Path, params: &StandardParams) -> Workflow {
    let StandardParams {
        remote,
        second_remote,
        base_branch: base,
        upstream_branch: upstream,
        feature_branch: feature,
        ..
    } = params;
    let pushes_twice = second_remote.name != *remote;

    Workflow::new(STANDARD_TITLE, cwd)
        .step(Step::info(format!("Workspace: {}", cwd.display())))
        .step_if(pushes_twice, || {
            Step::operation(
                format!("Make sure remote {} exists", second_remote.name),
                EnsureRemote {
                    remote: second_remote.clone(),
                },
            )
        })
        .step(Step::shell(
            format!("Check out base branch {}", base),
            git_command(&["checkout", base]),
        ))
        .step(Step::shell(
            format!("Update {}/{}", remote, base),
            git_command(&["pull", remote, base]),
        ))
        .step(Step::operation(
            format!("Create or switch to feature branch {}", feature),
            CheckoutFeature {
                branch: feature.clone(),
                base: base.clone(),
            },
        ))
        .step(
            Step::shell(
                format!("Merge upstream branch {}/{}", remote, upstream),
                git_command(&["pull", remote, upstream]),
            )
            .conflict_aware(),
        )
        .step(
            Step::pause("Review the merge")
                .with_detail(merge_review_guidance(&params.conflict_rules)),
        )
        .step(Step::shell(
            format!("Run the upgrade: {}", params.upgrade_command),
            params.upgrade_command.clone(),
        ))
        .step(Step::operation(
            format!("Run `{}`", params.test_command),
            OptionalVerification {
                command: params.test_command.clone(),
                label: "unit tests".to_string(),
            },
        ))
        .step(Step::shell(
            format!("Push {} to {}", feature, remote),
            git_command(&["push", remote, feature]),
        ))
        .step(Step::shell(
            format!("Switch back to {}", base),
            git_command(&["checkout", base]),
        ))
        .step(
            Step::shell(
                format!("Merge {} into {}", feature, base),
                git_command(&["merge", feature]),
            )
            .conflict_aware(),
        )
        .step(Step::shell(
            format!("Push {} to {}", base, remote),
            git_command(&["push", remote, base]),
        ))
        .step_if(pushes_twice, || push_to(&second_remote.name, base))
        .step(
            Step::pause("Sync finished")
                .with_detail("Deploy the pre-test environment or continue verifying by hand."),
        )
}

/// Rebuild the upgrade branch from the pushed base, carrying over the
/// previous upgrade branch if there is one.
pub fn rebuild_workflow(cwd: &Path, params: &RebuildParams) -> Workflow {
    let RebuildParams {
        remote,
        second_remote,
        base_branch: base,
        new_branch,
        previous_branch,
        final_base_branch: final_base,
        ..
    } = params;
    let pushes_twice = second_remote.name != *remote;

    let merge_previous = match previous_branch {
        Some(previous) => Step::operation(
            format!("Merge previous upgrade branch {}", previous),
            FetchAndMerge {
                remote: remote.clone(),
                branch: previous.clone(),
            },
        ),
        None => Step::info("No previous upgrade branch to merge"),
    };

    Workflow::new(REBUILD_TITLE, cwd)
        .step(Step::info(format!("Workspace: {}", cwd.display())))
        .step_if(pushes_twice, || {
            Step::operation(
                format!("Make sure remote {} exists", second_remote.name),
                EnsureRemote {
                    remote: second_remote.clone(),
                },
            )
        })
        .step(Step::shell(
            format!("Check out base branch {}", base),
            git_command(&["checkout", base]),
        ))
        .step(Step::shell(
            format!("Update {}/{}", remote, base),
            git_command(&["pull", remote, base]),
        ))
        .step(Step::operation(
            format!("Create or switch to upgrade branch {}", new_branch),
            CheckoutFeature {
                branch: new_branch.clone(),
                base: base.clone(),
            },
        ))
        .step(Step::shell(
            format!("Run the upgrade: {}", params.rebuild_command),
            params.rebuild_command.clone(),
        ))
        .step(merge_previous)
        .step(
            Step::pause("Review the merge")
                .with_detail(merge_review_guidance(&params.conflict_rules)),
        )
        .step(Step::operation(
            format!("Run `{}`", params.test_command),
            OptionalVerification {
                command: params.test_command.clone(),
                label: "unit tests".to_string(),
            },
        ))
        .step(Step::shell(
            format!("Push {} to {}", new_branch, remote),
            git_command(&["push", remote, new_branch]),
        ))
        .step(Step::shell(
            format!("Switch to final base branch {}", final_base),
            git_command(&["checkout", final_base]),
        ))
        .step(Step::shell(
            format!("Update {}/{}", remote, final_base),
            git_command(&["pull", remote, final_base]),
        ))
        .step(
            Step::shell(
                format!("Merge {} into {}", new_branch, final_base),
                git_command(&["merge", new_branch]),
            )
            .conflict_aware(),
        )
        .step(Step::shell(
            format!("Push {} to {}", final_base, remote),
            git_command(&["push", remote, final_base]),
        ))
        .step_if(pushes_twice, || push_to(&second_remote.name, final_base))
        .step(
            Step::pause("Sync finished")
                .with_detail("Deploy the pre-test environment and run regression checks as needed."),
        )
}

/// Publish the source base branch to the second remote, then optionally
/// continue in the target repository.
pub fn source_push_workflow(cwd: &Path, params: &SourcePushParams) -> Workflow {
    let SourcePushParams {
        remote,
        second_remote,
        base_branch: base,
        target_branch: target,
        handoff,
    } = params;

    let done = Step::pause("Source push finished");
    let done = match handoff {
        Some((repo, mode)) => done
            .with_detail(format!(
                "Continue to start the {} sync in {}.",
                format!("{:?}", mode).to_lowercase(),
                repo.display()
            ))
            .on_continue(Handoff {
                repo: repo.clone(),
                mode: *mode,
                pushed_branch: target.clone(),
                second_remote: second_remote.clone(),
            }),
        None => done.with_detail(format!(
            "Switch to the target repository and run `upsync sync standard --upstream {}` or `upsync sync rebuild --base {}`.",
            target, target
        )),
    };

    Workflow::new(SOURCE_PUSH_TITLE, cwd)
        .step(Step::info(format!("Workspace: {}", cwd.display())))
        .step(Step::operation(
            format!("Make sure remote {} exists", second_remote.name),
            EnsureRemote {
                remote: second_remote.clone(),
            },
        ))
        .step(Step::shell(
            format!("Fetch {}", remote),
            git_command(&["fetch", remote]),
        ))
        .step(Step::shell(
            format!("Check out base branch {}", base),
            git_command(&["checkout", base]),
        ))
        .step(Step::shell(
            format!("Update {}/{}", remote, base),
            git_command(&["pull", remote, base]),
        ))
        .step(Step::shell(
            format!("Push {} to {}/{}", base, second_remote.name, target),
            git_command(&[
                "push",
                &second_remote.name,
                &format!("{}:{}", base, target),
            ]),
        ))
        .step(done)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::{Recovery, StepAction, StepKind};
    use crate::workflows::params::{SecondRemote, SyncMode};
    use std::path::PathBuf;

    fn plus() -> SecondRemote {
        SecondRemote {
            name: "plus".to_string(),
            url: Some("https://example.com/plus.git".to_string()),
        }
    }

    fn shell_command(step: &Step) -> Option<&str> {
        match &step.kind {
            StepKind::Command {
                action: StepAction::Shell(cmd),
                ..
            } => Some(cmd),
            _ => None,
        }
    }

    fn standard() -> StandardParams {
        StandardParams {
            remote: "origin".to_string(),
            second_remote: plus(),
            base_branch: "test-220915".to_string(),
            upstream_branch: "feat-test-250918".to_string(),
            feature_branch: "feature/upgrade-test-250918".to_string(),
            upgrade_command: "yarn upgrade".to_string(),
            test_command: "yarn test".to_string(),
            conflict_rules: vec!["lockfiles: take theirs".to_string()],
        }
    }

    #[test]
    fn standard_pushes_base_to_both_remotes() {
        let workflow = standard_workflow(Path::new("/repo"), &standard());
        let commands: Vec<_> = workflow.steps.iter().filter_map(shell_command).collect();
        assert!(commands.contains(&"git push origin test-220915"));
        assert!(commands.contains(&"git push plus test-220915:test-220915"));
        assert_eq!(workflow.titles()[1], "Make sure remote plus exists");
    }

    #[test]
    fn review_pause_lists_configured_rules() {
        let workflow = standard_workflow(Path::new("/repo"), &standard());
        let review = workflow
            .steps
            .iter()
            .find(|s| s.title == "Review the merge")
            .unwrap();
        let detail = review.detail.as_deref().unwrap();
        assert!(detail.contains("(1) lockfiles: take theirs"));
        assert!(!detail.contains("voucherconfig"));
    }

    #[test]
    fn standard_skips_second_push_when_remotes_match() {
        let mut params = standard();
        params.second_remote.name = "origin".to_string();
        let workflow = standard_workflow(Path::new("/repo"), &params);
        let pushes = workflow
            .steps
            .iter()
            .filter_map(shell_command)
            .filter(|c| c.starts_with("git push"))
            .count();
        assert_eq!(pushes, 2);
        assert!(!workflow.titles().iter().any(|t| t.contains("Make sure remote")));
    }

    #[test]
    fn rebuild_merges_previous_branch_when_given() {
        let mut params = RebuildParams {
            remote: "origin".to_string(),
            second_remote: plus(),
            base_branch: "feat-test-250918".to_string(),
            new_branch: "feature/upgrade-test-250918".to_string(),
            previous_branch: Some("feature/upgrade-test-250801".to_string()),
            final_base_branch: "test-220915".to_string(),
            rebuild_command: "yarn upgrade --commit".to_string(),
            test_command: "yarn test".to_string(),
            conflict_rules: Vec::new(),
        };
        let workflow = rebuild_workflow(Path::new("/repo"), &params);
        assert!(workflow
            .titles()
            .contains(&"Merge previous upgrade branch feature/upgrade-test-250801"));
        let conflict_aware = workflow
            .steps
            .iter()
            .filter(|s| s.recovery() == Recovery::Conflicts)
            .count();
        assert_eq!(conflict_aware, 1);

        params.previous_branch = None;
        let workflow = rebuild_workflow(Path::new("/repo"), &params);
        assert!(workflow
            .titles()
            .contains(&"No previous upgrade branch to merge"));
    }

    #[test]
    fn source_push_hands_off_on_continue() {
        let params = SourcePushParams {
            remote: "origin".to_string(),
            second_remote: plus(),
            base_branch: "test-220915".to_string(),
            target_branch: "feat-test-250918".to_string(),
            handoff: Some((PathBuf::from("/work/plus"), SyncMode::Standard)),
        };
        let workflow = source_push_workflow(Path::new("/repo"), &params);
        let last = workflow.steps.last().unwrap();
        assert!(last.on_continue.is_some());

        let commands: Vec<_> = workflow.steps.iter().filter_map(shell_command).collect();
        assert!(commands.contains(&"git push plus test-220915:feat-test-250918"));
    }

    #[test]
    fn source_push_without_handoff_explains_next_step() {
        let params = SourcePushParams {
            remote: "origin".to_string(),
            second_remote: plus(),
            base_branch: "test-220915".to_string(),
            target_branch: "feat-test-250918".to_string(),
            handoff: None,
        };
        let workflow = source_push_workflow(Path::new("/repo"), &params);
        let last = workflow.steps.last().unwrap();
        assert!(last.on_continue.is_none());
        assert!(last.detail.as_deref().unwrap().contains("--upstream feat-test-250918"));
    }
}
