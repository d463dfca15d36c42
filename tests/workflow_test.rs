//! End-to-end workflow runs against real git repositories.

use std::path::Path;
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use upsync::config::UpsyncConfig;
use upsync::runner::recovery::{CONFLICT_ACTION_KEY, VERIFICATION_ACTION_KEY};
use upsync::runner::{run_workflow, ControlDir, RunState, StepSequencer};
use upsync::shell::{LaunchRequest, ShellLauncher, TerminalLauncher, TerminalRunner};
use upsync::steps::{Step, Workflow};
use upsync::ui::{MockUI, PauseResponse};
use upsync::UpsyncError;

fn git(dir: &Path, args: &[&str]) {
    let out = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap();
    assert!(
        out.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&out.stderr)
    );
}

fn configure(dir: &Path) {
    git(dir, &["config", "user.email", "dev@example.com"]);
    git(dir, &["config", "user.name", "Dev"]);
    git(dir, &["config", "commit.gpgsign", "false"]);
    git(dir, &["config", "pull.rebase", "false"]);
}

/// An upstream repository on `main` and a clone of it at `work`.
fn upstream_and_clone(root: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let upstream = root.join("upstream");
    let work = root.join("work");
    std::fs::create_dir_all(&upstream).unwrap();

    git(&upstream, &["init", "-q"]);
    git(&upstream, &["checkout", "-q", "-b", "main"]);
    configure(&upstream);
    std::fs::write(upstream.join("a.txt"), "base\n").unwrap();
    git(&upstream, &["add", "."]);
    git(&upstream, &["commit", "-q", "-m", "initial"]);

    git(
        root,
        &["clone", "-q", upstream.to_str().unwrap(), work.to_str().unwrap()],
    );
    configure(&work);
    (upstream, work)
}

fn commit_file(dir: &Path, content: &str, message: &str) {
    std::fs::write(dir.join("a.txt"), content).unwrap();
    git(dir, &["commit", "-q", "-am", message]);
}

#[tokio::test]
async fn pull_then_pause_continued_externally() {
    let temp = TempDir::new().unwrap();
    let (upstream, work) = upstream_and_clone(temp.path());
    commit_file(&upstream, "newer\n", "upstream change");

    let workflow = Workflow::new("Update", &work)
        .step(Step::shell("Check out main", "git checkout main"))
        .step(Step::shell("Pull origin/main", "git pull origin main").conflict_aware())
        .step(Step::pause("Review the update"));

    let mut ui = MockUI::new();
    let mut sequencer = StepSequencer::default();
    let handle = sequencer.gate_handle();
    let actor = tokio::spawn(async move {
        while !handle.is_pending() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(handle.resolve_pending());
    });

    let result = sequencer.run(&workflow, &mut ui).await;
    actor.await.unwrap();

    assert_eq!(result.state, RunState::Completed);
    assert_eq!(result.entries.len(), 3);
    assert_eq!(std::fs::read_to_string(work.join("a.txt")).unwrap(), "newer\n");
    assert_eq!(ui.pauses().len(), 1);
    assert_eq!(ui.live_pause_indicators(), 0);
}

#[tokio::test]
async fn conflicting_pull_waits_until_resolved() {
    let temp = TempDir::new().unwrap();
    let (upstream, work) = upstream_and_clone(temp.path());
    commit_file(&upstream, "theirs\n", "upstream change");
    commit_file(&work, "ours\n", "local change");

    let workflow = Workflow::new("Merge", &work)
        .step(Step::shell("Pull origin/main", "git pull origin main").conflict_aware())
        .step(Step::info("Merged"));

    let mut ui = MockUI::new();
    // First pause is continued without fixing anything, which leads to a
    // recheck; the second is left for the resolver below.
    ui.queue_pause_responses(vec![PauseResponse::Continue, PauseResponse::Hold]);
    ui.set_prompt_response(CONFLICT_ACTION_KEY, "recheck");

    let mut sequencer = StepSequencer::default();
    let handle = sequencer.gate_handle();
    let resolver_dir = work.clone();
    let resolver = tokio::spawn(async move {
        while !handle.is_pending() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        std::fs::write(resolver_dir.join("a.txt"), "merged\n").unwrap();
        git(&resolver_dir, &["add", "a.txt"]);
        git(&resolver_dir, &["commit", "-q", "--no-edit"]);
        assert!(handle.resolve_pending());
    });

    let result = sequencer.run(&workflow, &mut ui).await;
    resolver.await.unwrap();

    assert_eq!(result.state, RunState::Completed);
    assert_eq!(ui.pauses().len(), 2);
    let detail = ui.pauses()[0].detail.clone().unwrap_or_default();
    assert!(detail.contains("a.txt"));
    assert_eq!(ui.prompt_count(CONFLICT_ACTION_KEY), 1);
    assert!(ui.has_success("Conflicts resolved"));
    assert!(result.recovered_failures().is_empty());
}

#[tokio::test]
async fn unresolved_conflicts_can_be_aborted() {
    let temp = TempDir::new().unwrap();
    let (upstream, work) = upstream_and_clone(temp.path());
    commit_file(&upstream, "theirs\n", "upstream change");
    commit_file(&work, "ours\n", "local change");

    let workflow = Workflow::new("Merge", &work)
        .step(Step::shell("Pull origin/main", "git pull origin main").conflict_aware())
        .step(Step::info("never"));

    let mut ui = MockUI::new();
    ui.set_default_pause_response(PauseResponse::Continue);
    ui.set_prompt_response(CONFLICT_ACTION_KEY, "abort");

    let result = StepSequencer::default().run(&workflow, &mut ui).await;

    assert_eq!(result.state, RunState::Failed);
    assert!(matches!(result.error, Some(UpsyncError::UserCancelled { .. })));
    assert_eq!(result.entries.len(), 1);
}

/// Accepts the launch but never runs the script.
struct SilentLauncher;

#[async_trait]
impl TerminalLauncher for SilentLauncher {
    async fn launch(&self, _request: &LaunchRequest) -> upsync::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn terminal_step_without_markers_times_out() {
    let temp = TempDir::new().unwrap();
    let terminal = TerminalRunner::new(Arc::new(SilentLauncher))
        .with_poll_interval(Duration::from_millis(10))
        .with_heartbeat(Duration::from_millis(20))
        .with_timeout(Duration::from_millis(100));

    let workflow = Workflow::new("Upgrade", temp.path())
        .step(Step::terminal("Run the upgrade", "echo upgrading", "upgrade script"))
        .step(Step::info("never"));

    let mut ui = MockUI::new();
    let result = StepSequencer::new(terminal).run(&workflow, &mut ui).await;

    assert_eq!(result.state, RunState::Failed);
    assert!(matches!(result.error, Some(UpsyncError::Timeout { .. })));
    assert_eq!(result.entries.len(), 1);
    // Neither marker is left behind in the working directory.
    assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn failing_verification_is_retried_then_skipped() {
    let temp = TempDir::new().unwrap();
    let workflow = Workflow::new("Verify", temp.path())
        .step(Step::shell("Run unit tests", "echo failing >&2; false").verified())
        .step(Step::info("Done"));

    let mut ui = MockUI::new();
    ui.set_default_pause_response(PauseResponse::Continue);
    ui.queue_prompt_responses(VERIFICATION_ACTION_KEY, vec!["rerun", "skip"]);

    let result = StepSequencer::default().run(&workflow, &mut ui).await;

    assert_eq!(result.state, RunState::Completed);
    assert_eq!(result.recovered_failures().len(), 2);
    assert_eq!(ui.prompt_count(VERIFICATION_ACTION_KEY), 2);
    assert_eq!(ui.pauses().len(), 2);
    assert!(ui.has_warning("skipped"));
}

#[tokio::test]
async fn failing_terminal_verification_is_retried_then_skipped() {
    let temp = TempDir::new().unwrap();
    let terminal = TerminalRunner::new(Arc::new(ShellLauncher::default()))
        .with_poll_interval(Duration::from_millis(10))
        .with_timeout(Duration::from_secs(10));

    let workflow = Workflow::new("Verify", temp.path())
        .step(Step::terminal("Run unit tests", "false", "unit tests").verified())
        .step(Step::info("Done"));

    let mut ui = MockUI::new();
    ui.set_default_pause_response(PauseResponse::Continue);
    ui.queue_prompt_responses(VERIFICATION_ACTION_KEY, vec!["rerun", "skip"]);

    let result = StepSequencer::new(terminal).run(&workflow, &mut ui).await;

    assert_eq!(result.state, RunState::Completed);
    assert_eq!(result.recovered_failures().len(), 2);
    assert_eq!(ui.prompt_count(VERIFICATION_ACTION_KEY), 2);
    assert!(ui.has_warning("skipped"));
    // Each attempt cleaned up its marker pair.
    assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn pause_is_continued_through_control_files() {
    let temp = TempDir::new().unwrap();
    let (_upstream, work) = upstream_and_clone(temp.path());

    let mut config = UpsyncConfig::default();
    config.terminal.poll_interval_ms = 10;

    let workflow = Workflow::new("Controlled", &work)
        .step(Step::pause("Waiting for another shell"))
        .step(Step::shell("After", "touch after.txt"));

    let control = ControlDir::discover(&work).await.unwrap();
    let requester = {
        let control = control.clone();
        tokio::spawn(async move {
            loop {
                if control.is_running() {
                    if let Some(notice) = control.request_continue().unwrap() {
                        return notice.title;
                    }
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
    };

    let mut ui = MockUI::new();
    let result = run_workflow(&workflow, &config, &mut ui).await.unwrap();

    assert_eq!(requester.await.unwrap(), "Waiting for another shell");
    assert_eq!(result.state, RunState::Completed);
    assert!(work.join("after.txt").exists());
    assert!(!control.is_running());
    assert_eq!(ui.summaries().len(), 1);
}

#[tokio::test]
async fn second_run_in_same_repository_is_refused() {
    let temp = TempDir::new().unwrap();
    let (_upstream, work) = upstream_and_clone(temp.path());

    let control = ControlDir::discover(&work).await.unwrap();
    let _held = upsync::runner::RunLock::acquire(&control.lock_path()).unwrap();

    let workflow = Workflow::new("Blocked", &work).step(Step::info("never"));
    let mut ui = MockUI::new();
    let err = run_workflow(&workflow, &UpsyncConfig::default(), &mut ui)
        .await
        .unwrap_err();

    assert!(matches!(err, UpsyncError::RunInProgress { .. }));
}

#[tokio::test]
async fn lock_left_by_dead_run_is_reclaimed() {
    let temp = TempDir::new().unwrap();
    let (_upstream, work) = upstream_and_clone(temp.path());

    let control = ControlDir::discover(&work).await.unwrap();
    std::fs::create_dir_all(control.lock_path().parent().unwrap()).unwrap();
    std::fs::write(control.lock_path(), "999999\n").unwrap();

    let workflow = Workflow::new("After crash", &work).step(Step::info("runs"));
    let mut ui = MockUI::new();
    let result = run_workflow(&workflow, &UpsyncConfig::default(), &mut ui)
        .await
        .unwrap();

    assert_eq!(result.state, RunState::Completed);
    assert!(!control.lock_path().exists());
}
