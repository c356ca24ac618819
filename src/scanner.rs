use std::path::{Component, Path, PathBuf};

use ignore::{DirEntry, WalkBuilder};

use crate::anchor::{self, Extraction};
use crate::config::Config;
use crate::error::Error;

/// Directories never descended into.
const SKIPPED_DIRS: &[&str] = &["node_modules", "target"];

/// Find every markdown file under `root` that the config's include/exclude
/// filters allow. Hidden directories, `node_modules`, `target`, and anything
/// `.gitignore` excludes are skipped. Paths are returned relative to `root`, sorted.
pub fn markdown_files(root: &Path, config: &Config) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = project_walk(root)
        .filter(|e| return e.file_type().is_some_and(|t| return t.is_file()))
        .filter(|e| return e.path().extension().is_some_and(|ext| return ext == "md"))
        .map(|e| return e.path().strip_prefix(root).unwrap_or(e.path()).to_path_buf())
        .filter(|rel| return config.should_scan(rel))
        .collect();
    files.sort();
    return files;
}

/// Every readable entry under `root`, honoring `.gitignore`, `.ignore`, and
/// `.git/info/exclude` whether or not `root` is inside a repository.
pub(crate) fn project_walk(root: &Path) -> impl Iterator<Item = DirEntry> {
    return WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .git_exclude(true)
        .git_global(false)
        .require_git(false)
        .filter_entry(|e| return e.depth() == 0 || !is_skipped_dir(e))
        .build()
        .filter_map(|res| match res {
            Ok(entry) => return Some(entry),
            Err(e) => {
                tracing::debug!(error = %e, "skipping unreadable entry");
                return None;
            },
        });
}

/// Extract anchors from every scanned markdown file.
/// Each extraction's `file` is relative to `root`.
///
/// # Errors
///
/// Returns `Error::Io` if any markdown file cannot be read.
pub fn scan(root: &Path, config: &Config) -> Result<Vec<Extraction>, Error> {
    let mut extractions = Vec::new();
    for relative in markdown_files(root, config) {
        let content = std::fs::read_to_string(root.join(&relative))?;
        let extraction = anchor::extract(&relative, &content);
        for message in extraction.messages() {
            tracing::warn!("{message}");
        }
        extractions.push(extraction);
    }
    tracing::debug!(files = extractions.len(), "markdown scan complete");
    return Ok(extractions);
}

/// Hidden directories and build/dependency output, ignored or not.
fn is_skipped_dir(entry: &DirEntry) -> bool {
    if !entry.file_type().is_some_and(|t| return t.is_dir()) {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    return name.starts_with('.') || SKIPPED_DIRS.iter().any(|d| return name == *d);
}

/// Resolve `.` and `..` lexically. `..` at the root is dropped; leading `..`
/// on a relative path is kept.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut kept: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match (component, kept.last()) {
            (Component::CurDir, _) | (Component::ParentDir, Some(Component::RootDir | Component::Prefix(_))) => {},
            (Component::ParentDir, Some(Component::Normal(_))) => {
                kept.pop();
            },
            (other, _) => kept.push(other),
        }
    }
    return kept.into_iter().collect();
}
