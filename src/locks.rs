//! Per-document mutual exclusion for concurrent injection.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::scanner::normalize_path;

/// Hands out one mutex per document path.
///
/// Paths are made absolute against the registry's root and normalized
/// lexically, so `docs/../docs/api.md` and `docs/api.md` share a lock.
/// Entries are created on first use and live for the registry's lifetime.
#[derive(Debug)]
pub struct LockRegistry {
    /// Lock per normalized absolute path.
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
    /// Base for relative paths.
    root: PathBuf,
}

impl LockRegistry {
    /// Registry resolving relative paths against `root`.
    pub fn new(root: &Path) -> Self {
        return Self {
            locks: Mutex::new(HashMap::new()),
            root: root.to_path_buf(),
        };
    }

    /// The lock guarding `path`, created if this is the first request for it.
    pub fn lock_for(&self, path: &Path) -> Arc<Mutex<()>> {
        let key = self.key(path);
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        return Arc::clone(locks.entry(key).or_default());
    }

    /// Run `f` while holding the lock for `path`.
    pub fn with_lock<T>(&self, path: &Path, f: impl FnOnce() -> T) -> T {
        let lock = self.lock_for(path);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        return f();
    }

    /// Number of distinct documents locked so far.
    pub fn len(&self) -> usize {
        return self.locks.lock().unwrap_or_else(PoisonError::into_inner).len();
    }

    /// Whether no lock has been handed out yet.
    pub fn is_empty(&self) -> bool {
        return self.len() == 0;
    }

    /// Normalized absolute form of `path`.
    fn key(&self, path: &Path) -> PathBuf {
        let absolute = if path.is_absolute() { path.to_path_buf() } else { self.root.join(path) };
        return normalize_path(&absolute);
    }
}
