//! `docsync watch`: check once, then re-check whenever a tracked code file,
//! a markdown file, or the anchor map changes.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as _};

use crate::commands;
use crate::config::Config;
use crate::diagnostics;
use crate::error::Error;
use crate::map_store::{AnchorMapStore, MapEntry};

/// Quiet period after the last relevant event before re-checking.
const SETTLE: Duration = Duration::from_millis(100);

/// Directories to watch: parents of every tracked code and doc file, plus the map's.
fn watch_targets(root: &Path, entries: &[MapEntry], map_path: &Path) -> BTreeSet<PathBuf> {
    let files = entries
        .iter()
        .flat_map(|e| return [root.join(&e.code_ref.file_path), root.join(&e.doc_ref.file_path)])
        .chain(std::iter::once(map_path.to_path_buf()));
    return files.filter_map(|f| return f.parent().map(Path::to_path_buf)).collect();
}

/// Whether an event can change the outcome of `check`.
fn is_relevant(event: &Event, map_path: &Path) -> bool {
    if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)) {
        return false;
    }
    return event.paths.iter().any(|p| {
        if p == map_path {
            return true;
        }
        let ext = p.extension().and_then(|e| return e.to_str()).unwrap_or_default();
        return ext == "md" || crate::grammar::is_supported_extension(ext);
    });
}

/// Watcher forwarding relevant events to `tx`.
///
/// # Errors
///
/// Returns `Error::WatchFailed` if the platform watcher cannot start.
fn start_watcher(tx: Sender<()>, map_path: PathBuf) -> Result<RecommendedWatcher, Error> {
    let handler = move |res: notify::Result<Event>| match res {
        Ok(event) if is_relevant(&event, &map_path) => {
            let _ = tx.send(());
        },
        Ok(_) => {},
        Err(e) => tracing::warn!(error = %e, "watch event error"),
    };
    return notify::recommended_watcher(handler).map_err(|e| {
        return Error::WatchFailed { reason: e.to_string() };
    });
}

/// `root` in the absolute form notify reports event paths in.
fn canonical_root(root: &Path) -> PathBuf {
    return root.canonicalize().unwrap_or_else(|_| return root.to_path_buf());
}

/// The map's path as notify will report it.
fn absolute_map_path(root: &Path, map_path: &Path) -> PathBuf {
    return canonical_root(root).join(map_path);
}

/// Tracked directories under the current map. Entries that fail to load give none.
fn current_targets(root: &Path, map_path: &Path) -> BTreeSet<PathBuf> {
    let entries = AnchorMapStore::load(map_path).map(|s| return s.entries()).unwrap_or_default();
    return watch_targets(root, &entries, map_path);
}

/// Start watching directories in `wanted` that aren't watched yet.
fn extend_watch(watcher: &mut RecommendedWatcher, watched: &mut BTreeSet<PathBuf>, wanted: BTreeSet<PathBuf>) {
    for dir in wanted {
        if watched.contains(&dir) || !dir.is_dir() {
            continue;
        }
        match watcher.watch(&dir, RecursiveMode::NonRecursive) {
            Ok(()) => {
                tracing::debug!(dir = %dir.display(), "watching");
                watched.insert(dir);
            },
            Err(e) => tracing::warn!(dir = %dir.display(), error = %e, "cannot watch directory"),
        }
    }
}

/// Block until an event arrives, then drain events until `SETTLE` passes quietly.
/// Returns false once the watcher is gone.
fn wait_for_change(rx: &Receiver<()>) -> bool {
    if rx.recv().is_err() {
        return false;
    }
    while rx.recv_timeout(SETTLE).is_ok() {}
    return true;
}

/// Run `check`, reporting configuration errors instead of stopping.
fn check_once(root: &Path) -> ExitCode {
    return commands::check(root).unwrap_or_else(|e| {
        diagnostics::print_error(&e);
        return ExitCode::FAILURE;
    });
}

/// Entry point for `docsync watch`. Runs until interrupted.
///
/// # Errors
///
/// Returns config errors or `Error::WatchFailed`.
pub fn run(root: &Path) -> Result<ExitCode, Error> {
    let config = Config::load(root)?;
    let map_path = absolute_map_path(root, &config.map_path);

    let mut last = check_once(root);

    let (tx, rx) = crossbeam_channel::unbounded();
    let mut watcher = start_watcher(tx, map_path.clone())?;
    let mut watched = BTreeSet::new();
    let abs_root = canonical_root(root);
    extend_watch(&mut watcher, &mut watched, current_targets(&abs_root, &map_path));
    eprintln!("Watching {} directories (Ctrl+C to stop)", watched.len());

    while wait_for_change(&rx) {
        eprintln!();
        eprintln!("Change detected, checking again");
        last = check_once(root);
        // `fix` and `track` can introduce files in directories not seen before.
        extend_watch(&mut watcher, &mut watched, current_targets(&abs_root, &map_path));
    }
    return Ok(last);
}

#[cfg(test)]
mod tests {
    use notify::event::{CreateKind, ModifyKind};

    use super::*;
    use crate::types::{SignatureHash, SymbolRef};

    #[test]
    fn targets_cover_code_doc_and_map_directories() {
        let entries = vec![
            MapEntry::new("U1", SymbolRef::new("src/a.ts", "f"), SignatureHash("h".to_string()), None, "docs/api.md"),
            MapEntry::new("U2", SymbolRef::new("src/b.ts", "g"), SignatureHash("h".to_string()), None, "docs/api.md"),
        ];

        let dirs = watch_targets(Path::new("/p"), &entries, Path::new("/p/.docsync/map.json"));

        let expected: BTreeSet<PathBuf> =
            ["/p/.docsync", "/p/docs", "/p/src"].into_iter().map(PathBuf::from).collect();
        assert_eq!(dirs, expected);
    }

    #[test]
    fn map_path_matches_absolute_event_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let canonical = dir.path().canonicalize().unwrap();

        let map = absolute_map_path(&dir.path().join("sub/.."), Path::new(".docsync/map.json"));

        assert_eq!(map, canonical.join(".docsync/map.json"));
        let event = Event::new(EventKind::Modify(ModifyKind::Any)).add_path(canonical.join(".docsync/map.json"));
        assert!(is_relevant(&event, &map));
    }

    #[test]
    fn only_code_markdown_and_map_changes_are_relevant() {
        let map = Path::new("/p/.docsync/map.json");
        let event = |kind, path: &str| Event::new(kind).add_path(PathBuf::from(path));

        assert!(is_relevant(&event(EventKind::Modify(ModifyKind::Any), "/p/src/a.rs"), map));
        assert!(is_relevant(&event(EventKind::Create(CreateKind::File), "/p/docs/new.md"), map));
        assert!(is_relevant(&event(EventKind::Modify(ModifyKind::Any), "/p/.docsync/map.json"), map));
        assert!(!is_relevant(&event(EventKind::Modify(ModifyKind::Any), "/p/src/notes.txt"), map));
        assert!(!is_relevant(&event(EventKind::Access(notify::event::AccessKind::Any), "/p/src/a.rs"), map));
    }
}
