//! Merge conflict inspection.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::Result;
use crate::shell::run_sync;

use super::git_command;

/// Text git prints when a merge or pull stops on conflicts.
static CONFLICT_OUTPUT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)CONFLICT|Automatic merge failed").expect("CONFLICT_OUTPUT must compile")
});

/// Commands whose failure may be a conflict rather than a hard error.
static MERGE_COMMAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bgit\s+(pull|merge)\b").expect("MERGE_COMMAND must compile")
});

/// Unmerged paths in a working tree at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictState {
    paths: Vec<String>,
}

impl ConflictState {
    pub fn new(paths: Vec<String>) -> Self {
        Self { paths }
    }

    pub fn is_clean(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Read the unmerged paths of the working tree.
pub async fn inspect(cwd: &Path) -> Result<ConflictState> {
    list_conflicts(cwd).await.map(ConflictState::new)
}

/// Repository-relative unmerged paths, in git's order.
pub async fn list_conflicts(cwd: &Path) -> Result<Vec<String>> {
    let result = run_sync(
        &git_command(&["diff", "--name-only", "--diff-filter=U"]),
        cwd,
    )
    .await?;
    Ok(result
        .stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect())
}

/// Whether any path is unmerged.
pub async fn has_conflicts(cwd: &Path) -> Result<bool> {
    Ok(!list_conflicts(cwd).await?.is_empty())
}

/// Whether command output mentions a conflict.
pub fn output_indicates_conflict(output: &str) -> bool {
    CONFLICT_OUTPUT.is_match(output)
}

/// Whether `command` is a `git pull` or `git merge`.
pub fn is_merge_command(command: &str) -> bool {
    MERGE_COMMAND.is_match(command)
}

/// Pause detail for a conflicted tree: the path list, then the numbered rules.
pub fn resolution_guidance(rules: &[String], state: &ConflictState) -> String {
    let mut out = String::from("Conflicted files:\n");
    for path in state.paths() {
        out.push_str(&format!("  - {}\n", path));
    }

    if !rules.is_empty() {
        out.push_str("\nResolution order:\n");
        for (i, rule) in rules.iter().enumerate() {
            out.push_str(&format!("  ({}) {}\n", i + 1, rule));
        }
    }

    out.push_str("\nResolve and commit the merge, then continue.");
    out
}

/// Detail for the review pause that follows a merge which may have
/// completed without conflicts.
pub fn merge_review_guidance(rules: &[String]) -> String {
    if rules.is_empty() {
        return "Check the merge result, then continue.".to_string();
    }

    let mut out = String::from("Check the merge result against the conflict rules:\n");
    for (i, rule) in rules.iter().enumerate() {
        out.push_str(&format!("  ({}) {}\n", i + 1, rule));
    }
    out.push_str("Then continue.");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::testing::{init_repo, make_conflict};
    use tempfile::TempDir;

    #[test]
    fn conflict_text_is_case_insensitive() {
        assert!(output_indicates_conflict(
            "CONFLICT (content): Merge conflict in a.txt"
        ));
        assert!(output_indicates_conflict(
            "automatic merge failed; fix conflicts and then commit the result."
        ));
        assert!(!output_indicates_conflict("Already up to date."));
    }

    #[test]
    fn merge_commands_are_recognised() {
        assert!(is_merge_command("git pull origin main"));
        assert!(is_merge_command("git merge upgrade/test-250101"));
        assert!(!is_merge_command("git push origin main"));
        assert!(!is_merge_command("git checkout merge-tool"));
    }

    #[test]
    fn guidance_lists_paths_then_rules() {
        let state = ConflictState::new(vec!["a.txt".into(), "b/c.json".into()]);
        let rules = vec!["Keep ours for config".to_string(), "Review references".to_string()];
        let text = resolution_guidance(&rules, &state);

        assert!(text.contains("  - a.txt\n  - b/c.json"));
        assert!(text.contains("(1) Keep ours for config"));
        assert!(text.contains("(2) Review references"));
        assert!(text.find("a.txt").unwrap() < text.find("(1)").unwrap());
    }

    #[test]
    fn review_guidance_numbers_rules() {
        let rules = vec!["Keep ours for config".to_string(), "Review references".to_string()];
        let text = merge_review_guidance(&rules);
        assert!(text.contains("(1) Keep ours for config"));
        assert!(text.contains("(2) Review references"));
        assert_eq!(merge_review_guidance(&[]), "Check the merge result, then continue.");
    }

    #[tokio::test]
    async fn clean_tree_has_no_conflicts() {
        let temp = TempDir::new().unwrap();
        init_repo(temp.path());

        assert!(!has_conflicts(temp.path()).await.unwrap());
        assert!(inspect(temp.path()).await.unwrap().is_clean());
    }

    #[tokio::test]
    async fn conflicted_tree_lists_paths_until_resolved() {
        let temp = TempDir::new().unwrap();
        init_repo(temp.path());
        make_conflict(temp.path());

        assert!(has_conflicts(temp.path()).await.unwrap());
        assert_eq!(list_conflicts(temp.path()).await.unwrap(), vec!["a.txt"]);
        // Repeated checks agree while nothing changes.
        assert_eq!(inspect(temp.path()).await.unwrap().len(), 1);

        std::fs::write(temp.path().join("a.txt"), "resolved\n").unwrap();
        crate::git::testing::git(temp.path(), &["add", "a.txt"]);
        assert!(!has_conflicts(temp.path()).await.unwrap());
    }
}
