//! Version-control hand-off after a fix run: stage, commit, optionally push.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::types::SymbolRef;

/// Result of a stage-and-commit request. Failure is data, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    /// Error output from the failing step.
    pub error: Option<String>,
    /// Combined output of the successful steps.
    pub output: Option<String>,
    /// Whether every step succeeded.
    pub success: bool,
}

impl CommitOutcome {
    /// A failed outcome carrying `error`.
    fn failed(error: String) -> Self {
        return Self {
            error: Some(error),
            output: None,
            success: false,
        };
    }
}

/// Records documentation changes in version control.
pub trait VersionControl: Sync {
    /// Stage `paths`, commit with a message naming `symbols`, and push if asked.
    fn stage_and_commit(&self, paths: &[PathBuf], symbols: &[SymbolRef], push: bool) -> CommitOutcome;
}

/// Shells out to the `git` binary in a working tree.
#[derive(Debug, Clone)]
pub struct GitCli {
    /// Working tree root.
    root: PathBuf,
}

impl GitCli {
    /// Git operations rooted at `root`.
    pub fn new(root: &Path) -> Self {
        return Self { root: root.to_path_buf() };
    }

    /// Run one git subcommand, returning stdout or a description of the failure.
    fn run(&self, args: &[&str], paths: &[PathBuf]) -> Result<String, String> {
        let output = Command::new("git")
            .args(args)
            .args(paths)
            .current_dir(&self.root)
            .output()
            .map_err(|e| return format!("failed to run git: {e}"))?;

        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("git {} failed: {}", args.first().unwrap_or(&""), stderr.trim()));
    }
}

/// Commit message listing the symbols whose docs changed.
pub fn commit_message(symbols: &[SymbolRef]) -> String {
    let mut message = match symbols {
        [only] => format!("docs: sync documentation for {only}"),
        _ => format!("docs: sync documentation for {} symbols", symbols.len()),
    };
    if symbols.len() > 1 {
        message.push('\n');
        for symbol in symbols {
            message.push_str(&format!("\n- {symbol}"));
        }
    }
    return message;
}

impl VersionControl for GitCli {
    fn stage_and_commit(&self, paths: &[PathBuf], symbols: &[SymbolRef], push: bool) -> CommitOutcome {
        if paths.is_empty() {
            return CommitOutcome::failed("nothing to commit".to_string());
        }

        let mut log = Vec::new();
        match self.run(&["add", "--"], paths) {
            Ok(out) => log.push(out),
            Err(e) => return CommitOutcome::failed(e),
        }

        let message = commit_message(symbols);
        match self.run(&["commit", "-m", message.as_str()], &[]) {
            Ok(out) => log.push(out),
            Err(e) => return CommitOutcome::failed(e),
        }

        if push {
            match self.run(&["push"], &[]) {
                Ok(out) => log.push(out),
                Err(e) => return CommitOutcome::failed(e),
            }
        }

        tracing::info!(files = paths.len(), push, "documentation changes committed");
        return CommitOutcome {
            error: None,
            output: Some(log.concat().trim().to_string()),
            success: true,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_names_single_symbol() {
        let message = commit_message(&[SymbolRef::new("src/a.ts", "f")]);
        assert_eq!(message, "docs: sync documentation for src/a.ts#f");
    }

    #[test]
    fn message_lists_many_symbols() {
        let message = commit_message(&[SymbolRef::new("a.rs", "f"), SymbolRef::new("b.rs", "g")]);
        assert!(message.starts_with("docs: sync documentation for 2 symbols\n\n"));
        assert!(message.contains("- a.rs#f"));
        assert!(message.contains("- b.rs#g"));
    }

    #[test]
    fn empty_path_list_fails_without_running_git() {
        let outcome = GitCli::new(Path::new(".")).stage_and_commit(&[], &[], false);
        assert!(!outcome.success);
        assert!(outcome.error.is_some());
    }

    #[test]
    fn outside_a_repository_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("doc.md"), "x").unwrap();

        let outcome = GitCli::new(dir.path()).stage_and_commit(&[PathBuf::from("doc.md")], &[], false);

        assert!(!outcome.success);
    }
}
