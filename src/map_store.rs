//! Anchor map persistence: the single JSON file binding anchor ids to code
//! symbols and their last-known signature hashes.
//!
//! [`AnchorMapStore`] is the only owner of that file. Every read and write of
//! the map goes through it, so worker threads share one `&AnchorMapStore`
//! instead of opening the file themselves.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::atomic::write_atomic;
use crate::error::Error;
use crate::types::{SignatureHash, SymbolRef};

/// Schema version written to and accepted from the map file.
pub const MAP_VERSION: &str = "1.0.0";

/// Where a map entry's documentation lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocRef {
    /// Markdown file path, relative to the project root.
    pub file_path: PathBuf,
}

/// A single tracked anchor in the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapEntry {
    /// Anchor id, unique across the map.
    pub id: String,
    /// The documented code symbol.
    pub code_ref: SymbolRef,
    /// Signature hash recorded when the docs were last written.
    pub code_signature_hash: SignatureHash,
    /// Signature text recorded alongside the hash, used to describe what changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_signature_text: Option<String>,
    /// The markdown file holding the anchor.
    pub doc_ref: DocRef,
    /// When this entry was created or last updated.
    pub last_updated: DateTime<Utc>,
}

impl MapEntry {
    /// New entry stamped with the current time.
    pub fn new(
        id: impl Into<String>,
        code_ref: SymbolRef,
        hash: SignatureHash,
        signature_text: Option<String>,
        doc_file: impl Into<PathBuf>,
    ) -> Self {
        return Self {
            id: id.into(),
            code_ref,
            code_signature_hash: hash,
            code_signature_text: signature_text,
            doc_ref: DocRef { file_path: doc_file.into() },
            last_updated: Utc::now(),
        };
    }
}

/// Partial update merged into an existing entry. `None` fields are left alone.
#[derive(Debug, Clone, Default)]
pub struct EntryUpdate {
    /// Replacement code reference.
    pub code_ref: Option<SymbolRef>,
    /// Replacement signature hash.
    pub code_signature_hash: Option<SignatureHash>,
    /// Replacement signature text.
    pub code_signature_text: Option<String>,
    /// Replacement documentation file.
    pub doc_file: Option<PathBuf>,
}

/// The map file as a whole.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorMap {
    /// Schema version, always [`MAP_VERSION`] when written by this crate.
    pub version: String,
    /// Tracked entries in insertion order.
    pub entries: Vec<MapEntry>,
}

impl AnchorMap {
    /// An empty map at the current schema version.
    pub fn empty() -> Self {
        return Self {
            version: MAP_VERSION.to_string(),
            entries: Vec::new(),
        };
    }

    /// Parse a map from JSON, enforcing version and id uniqueness.
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` if the content is not valid map JSON,
    /// or `Error::MapCorrupt` if the version is unsupported or ids repeat.
    pub fn parse(content: &str) -> Result<Self, Error> {
        let map: Self = serde_json::from_str(content)?;
        if map.version != MAP_VERSION {
            return Err(Error::MapCorrupt {
                reason: format!("unsupported version {} (expected {MAP_VERSION})", map.version),
            });
        }
        enforce_unique_ids(&map.entries)?;
        return Ok(map);
    }
}

/// Guards the anchor map file and its in-memory copy.
///
/// Mutation methods take `&self`; the entries sit behind one mutex and
/// [`AnchorMapStore::save`] holds a second, dedicated flush mutex so that
/// concurrent flushes from different workers are serialized. The flush lock
/// is unrelated to the per-document locks held by the orchestrator.
#[derive(Debug)]
pub struct AnchorMapStore {
    /// Serializes `save()` calls.
    flush: Mutex<()>,
    /// In-memory copy of the map.
    map: Mutex<AnchorMap>,
    /// The JSON file on disk.
    path: PathBuf,
}

impl AnchorMapStore {
    /// Start an empty map that will be written to `path` on first save.
    pub fn create(path: impl Into<PathBuf>) -> Self {
        return Self::with_map(path.into(), AnchorMap::empty());
    }

    /// Read and parse the map file.
    ///
    /// # Errors
    ///
    /// Returns `Error::MapNotFound` if the file doesn't exist,
    /// `Error::Io` for other read failures,
    /// `Error::Json` if the content is invalid,
    /// or `Error::MapCorrupt` if invariants are violated.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let content = match std::fs::read_to_string(path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::MapNotFound { path: path.to_path_buf() });
            },
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };
        let map = AnchorMap::parse(&content)?;
        return Ok(Self::with_map(path.to_path_buf(), map));
    }

    /// Load the map if it exists, otherwise start an empty one.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`AnchorMapStore::load`], except `MapNotFound`.
    pub fn open_or_create(path: &Path) -> Result<Self, Error> {
        return match Self::load(path) {
            Err(Error::MapNotFound { .. }) => Ok(Self::create(path)),
            other => other,
        };
    }

    /// Wrap an already-parsed map.
    fn with_map(path: PathBuf, map: AnchorMap) -> Self {
        return Self {
            flush: Mutex::new(()),
            map: Mutex::new(map),
            path,
        };
    }

    /// Path of the JSON file this store writes.
    pub fn path(&self) -> &Path {
        return &self.path;
    }

    /// Snapshot of all entries in insertion order.
    pub fn entries(&self) -> Vec<MapEntry> {
        return self.lock_map().entries.clone();
    }

    /// Number of tracked entries.
    pub fn len(&self) -> usize {
        return self.lock_map().entries.len();
    }

    /// Whether the map tracks nothing.
    pub fn is_empty(&self) -> bool {
        return self.lock_map().entries.is_empty();
    }

    /// Clone of the entry with `id`, if tracked.
    pub fn get(&self, id: &str) -> Option<MapEntry> {
        return self.lock_map().entries.iter().find(|e| return e.id == id).cloned();
    }

    /// Whether an entry with `id` is tracked.
    pub fn contains(&self, id: &str) -> bool {
        return self.lock_map().entries.iter().any(|e| return e.id == id);
    }

    /// Track a new entry.
    ///
    /// # Errors
    ///
    /// Returns `Error::DuplicateId` if the id is already tracked.
    pub fn add_entry(&self, entry: MapEntry) -> Result<(), Error> {
        let mut map = self.lock_map();
        if map.entries.iter().any(|e| return e.id == entry.id) {
            return Err(Error::DuplicateId { id: entry.id });
        }
        map.entries.push(entry);
        return Ok(());
    }

    /// Merge `update` into the entry with `id` and refresh its timestamp.
    ///
    /// # Errors
    ///
    /// Returns `Error::EntryNotFound` if no entry has this id.
    pub fn update_entry(&self, id: &str, update: EntryUpdate) -> Result<(), Error> {
        let mut map = self.lock_map();
        let entry = map
            .entries
            .iter_mut()
            .find(|e| return e.id == id)
            .ok_or_else(|| return Error::EntryNotFound { id: id.to_string() })?;

        if let Some(code_ref) = update.code_ref {
            entry.code_ref = code_ref;
        }
        if let Some(hash) = update.code_signature_hash {
            entry.code_signature_hash = hash;
        }
        if let Some(text) = update.code_signature_text {
            entry.code_signature_text = Some(text);
        }
        if let Some(doc_file) = update.doc_file {
            entry.doc_ref.file_path = doc_file;
        }
        entry.last_updated = Utc::now();
        return Ok(());
    }

    /// Move an entry to a different anchor id, keeping its position.
    ///
    /// # Errors
    ///
    /// Returns `Error::EntryNotFound` if `old_id` is not tracked,
    /// or `Error::DuplicateId` if `new_id` already is.
    pub fn rekey_entry(&self, old_id: &str, new_id: &str) -> Result<(), Error> {
        if old_id == new_id {
            return Ok(());
        }
        let mut map = self.lock_map();
        if map.entries.iter().any(|e| return e.id == new_id) {
            return Err(Error::DuplicateId { id: new_id.to_string() });
        }
        let entry = map
            .entries
            .iter_mut()
            .find(|e| return e.id == old_id)
            .ok_or_else(|| return Error::EntryNotFound { id: old_id.to_string() })?;
        entry.id = new_id.to_string();
        entry.last_updated = Utc::now();
        return Ok(());
    }

    /// Stop tracking `id`. Returns whether anything was removed.
    pub fn remove_entry(&self, id: &str) -> bool {
        let mut map = self.lock_map();
        let before = map.entries.len();
        map.entries.retain(|e| return e.id != id);
        return map.entries.len() != before;
    }

    /// True iff `id` is tracked and its recorded hash differs from `current`.
    /// An untracked id is undocumented, not drifted.
    pub fn has_drift(&self, id: &str, current: &SignatureHash) -> bool {
        return self
            .lock_map()
            .entries
            .iter()
            .find(|e| return e.id == id)
            .is_some_and(|e| return &e.code_signature_hash != current);
    }

    /// Write the whole map to disk as pretty JSON, atomically.
    ///
    /// Calls from different threads are serialized. The snapshot is taken
    /// while holding the flush lock, so a later flush never writes older state.
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` if serialization fails, or `Error::Io` if the
    /// file cannot be written.
    pub fn save(&self) -> Result<(), Error> {
        let _flush = self.flush.lock().unwrap_or_else(PoisonError::into_inner);
        let mut content = {
            let map = self.lock_map();
            serde_json::to_string_pretty(&*map)?
        };
        content.push('\n');
        write_atomic(&self.path, content.as_bytes())?;
        tracing::debug!(path = %self.path.display(), "anchor map saved");
        return Ok(());
    }

    /// Lock the in-memory map. A panic in another holder leaves the entries
    /// vector intact, so a poisoned lock is recovered rather than propagated.
    fn lock_map(&self) -> MutexGuard<'_, AnchorMap> {
        return self.map.lock().unwrap_or_else(PoisonError::into_inner);
    }
}

/// Reject maps where two entries share an id.
///
/// # Errors
///
/// Returns `Error::MapCorrupt` naming the first repeated id.
fn enforce_unique_ids(entries: &[MapEntry]) -> Result<(), Error> {
    let mut seen = HashSet::new();
    for entry in entries {
        if !seen.insert(entry.id.as_str()) {
            return Err(Error::MapCorrupt {
                reason: format!("duplicate entry id `{}`", entry.id),
            });
        }
    }
    return Ok(());
}
