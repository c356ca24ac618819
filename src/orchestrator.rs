//! The fix pipeline: regenerate documentation for drifted entries with a
//! bounded worker pool, inject it under per-document locks, and persist the
//! map after every successful write.
//!
//! Each record moves through generation (with retry and placeholder fallback)
//! and then injection. Per-item failures become [`FixStatus::Failed`] outcomes;
//! nothing short of a panic stops the batch.

use std::path::{Path, PathBuf};

use crossbeam_channel::unbounded;

use crate::anchor::{self, Anchor};
use crate::config::DEFAULT_CONCURRENCY;
use crate::context::ProjectContext;
use crate::drift::DriftRecord;
use crate::error::Error;
use crate::generator::{ContentGenerator, GenerationRequest};
use crate::injector;
use crate::locks::LockRegistry;
use crate::map_store::{AnchorMapStore, EntryUpdate};
use crate::retry::{self, ContentSource, Generated, RetryPolicy};
use crate::types::SymbolRef;
use crate::vcs::{CommitOutcome, VersionControl};

/// Knobs for one fix run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixOptions {
    /// Hand modified files to version control after the run.
    pub auto_commit: bool,
    /// Worker pool width. Zero is treated as one.
    pub concurrency: usize,
    /// Preview only: no document writes, no map updates.
    pub dry_run: bool,
    /// Push after committing.
    pub push: bool,
    /// Generation retry policy.
    pub retry: RetryPolicy,
}

impl Default for FixOptions {
    fn default() -> Self {
        return Self {
            auto_commit: false,
            concurrency: DEFAULT_CONCURRENCY,
            dry_run: false,
            push: false,
            retry: RetryPolicy::default(),
        };
    }
}

/// Which injection path an outcome took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixAction {
    /// A new block was appended to the document.
    Insert,
    /// An existing block's content was replaced.
    Update,
}

/// Terminal state of one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixStatus {
    /// Injection or map persistence failed. The map entry keeps its old hash,
    /// so the record drifts again on the next check.
    Failed {
        /// Whether the new content already reached the document. True only
        /// when the map update or save failed after the write.
        document_written: bool,
        /// What went wrong.
        error: String,
    },
    /// Content was injected (or previewed).
    Succeeded {
        /// The block content written.
        content: String,
        /// Generator output or placeholder.
        source: ContentSource,
    },
}

/// Result for one drift record.
#[derive(Debug, Clone)]
pub struct FixOutcome {
    /// Path taken, when injection got that far.
    pub action: Option<FixAction>,
    /// Anchor id the entry is bound to after the fix.
    pub anchor_id: Option<String>,
    /// Documented symbol.
    pub code_ref: SymbolRef,
    /// Documentation file, relative to the project root.
    pub doc_file: PathBuf,
    /// Map entry id before the fix.
    pub entry_id: String,
    /// Generation error that forced a placeholder, if any.
    pub generation_error: Option<String>,
    /// Whether this was a dry-run preview.
    pub preview: bool,
    /// Final state.
    pub status: FixStatus,
}

impl FixOutcome {
    /// Whether content was injected or previewed.
    pub const fn is_success(&self) -> bool {
        return matches!(self.status, FixStatus::Succeeded { .. });
    }
}

/// Aggregate over all outcomes, in input order.
#[derive(Debug, Clone)]
pub struct FixResult {
    /// Outcomes that failed.
    pub failed_fixes: usize,
    /// One outcome per input record.
    pub fixes: Vec<FixOutcome>,
    /// Outcomes that succeeded, placeholders included.
    pub successful_fixes: usize,
    /// True iff nothing failed.
    pub success: bool,
    /// Number of records processed.
    pub total_fixes: usize,
}

impl FixResult {
    /// Count successes and failures.
    fn from_outcomes(fixes: Vec<FixOutcome>) -> Self {
        let successful_fixes = fixes.iter().filter(|f| return f.is_success()).count();
        let failed_fixes = fixes.len().saturating_sub(successful_fixes);
        return Self {
            failed_fixes,
            successful_fixes,
            success: failed_fixes == 0,
            total_fixes: fixes.len(),
            fixes,
        };
    }
}

/// A fix run's result plus the optional commit step.
#[derive(Debug, Clone)]
pub struct FixReport {
    /// Version-control result, when a commit was attempted.
    pub commit: Option<CommitOutcome>,
    /// Per-record outcomes.
    pub result: FixResult,
}

/// Drives generation and injection for a batch of drift records.
pub struct Orchestrator<'a> {
    /// Import graph and manifest data passed to the generator, if gathered.
    context: Option<&'a ProjectContext>,
    /// Content source.
    generator: &'a dyn ContentGenerator,
    /// Per-document locks for this run.
    locks: LockRegistry,
    /// Run settings.
    options: FixOptions,
    /// Project root; entry paths are relative to it.
    root: PathBuf,
    /// The anchor map.
    store: &'a AnchorMapStore,
    /// Commit collaborator, used only with `auto_commit`.
    vcs: Option<&'a dyn VersionControl>,
}

impl<'a> Orchestrator<'a> {
    /// A run over the project at `root`.
    pub fn new(
        root: &Path,
        store: &'a AnchorMapStore,
        generator: &'a dyn ContentGenerator,
        options: FixOptions,
    ) -> Self {
        return Self {
            context: None,
            generator,
            locks: LockRegistry::new(root),
            options,
            root: root.to_path_buf(),
            store,
            vcs: None,
        };
    }

    /// Attach the version-control collaborator used by `auto_commit`.
    #[must_use]
    pub fn with_vcs(mut self, vcs: &'a dyn VersionControl) -> Self {
        self.vcs = Some(vcs);
        return self;
    }

    /// Attach project context to every generation request.
    #[must_use]
    pub fn with_context(mut self, context: &'a ProjectContext) -> Self {
        self.context = Some(context);
        return self;
    }

    /// Fix every record: generate in parallel, then inject in parallel with
    /// same-document writes serialized. Outcomes keep the input order.
    pub fn run(&self, records: &[DriftRecord]) -> FixReport {
        let width = self.options.concurrency.max(1);
        tracing::info!(records = records.len(), width, dry_run = self.options.dry_run, "fix run started");

        let generated = run_pool(width, records, |record| return self.generate(record));
        tracing::debug!("generation phase complete");

        let pairs: Vec<(&DriftRecord, Generated)> = records.iter().zip(generated).collect();
        let fixes = run_pool(width, &pairs, |(record, generated)| {
            let doc = self.root.join(&record.entry.doc_ref.file_path);
            return self.locks.with_lock(&doc, || return self.inject(record, generated));
        });

        let result = FixResult::from_outcomes(fixes);
        tracing::info!(
            succeeded = result.successful_fixes,
            failed = result.failed_fixes,
            "fix run complete"
        );

        let commit = if self.options.auto_commit && !self.options.dry_run {
            self.commit(&result)
        } else {
            None
        };
        return FixReport { commit, result };
    }

    /// Phase 1 for one record: build the request and generate with fallback.
    fn generate(&self, record: &DriftRecord) -> Generated {
        let entry = &record.entry;
        let request = GenerationRequest {
            symbol_name: entry.code_ref.symbol_name.clone(),
            old_signature: record.old_signature.clone(),
            new_signature: record.current_signature.clone(),
            old_doc_text: self.current_block_text(record).unwrap_or_default(),
            file_path: Some(entry.code_ref.file_path.clone()),
            context: self.context.map(|c| return c.for_file(&entry.code_ref.file_path)),
        };
        return retry::generate_with_fallback(self.generator, &request, self.options.retry);
    }

    /// The block's current content, read without locking.
    fn current_block_text(&self, record: &DriftRecord) -> Option<String> {
        let doc_rel = &record.entry.doc_ref.file_path;
        let source = std::fs::read_to_string(self.root.join(doc_rel)).ok()?;
        let extraction = anchor::extract(doc_rel, &source);
        return extraction.find(&record.entry.id).map(|a| return a.content.clone());
    }

    /// Phase 2 for one record. Caller holds the document lock.
    fn inject(&self, record: &DriftRecord, generated: &Generated) -> FixOutcome {
        let entry = &record.entry;
        let mut outcome = FixOutcome {
            action: None,
            anchor_id: None,
            code_ref: entry.code_ref.clone(),
            doc_file: entry.doc_ref.file_path.clone(),
            entry_id: entry.id.clone(),
            generation_error: generated.error.as_ref().map(ToString::to_string),
            preview: self.options.dry_run,
            status: FixStatus::Failed { document_written: false, error: String::new() },
        };

        let (action, anchor_id) = match self.write_block(record, &generated.content) {
            Ok(written) => written,
            Err(e) => {
                tracing::warn!(id = %entry.id, doc = %entry.doc_ref.file_path.display(), error = %e, "injection failed");
                outcome.status = FixStatus::Failed { document_written: false, error: e.to_string() };
                return outcome;
            },
        };
        outcome.action = Some(action);
        outcome.anchor_id = Some(anchor_id.clone());

        let recorded = if self.options.dry_run { Ok(()) } else { self.record_fix(record, &anchor_id) };
        if let Err(e) = recorded {
            tracing::warn!(id = %entry.id, doc = %entry.doc_ref.file_path.display(), error = %e, "document written but map not updated");
            outcome.status = FixStatus::Failed { document_written: true, error: e.to_string() };
            return outcome;
        }
        outcome.status = FixStatus::Succeeded {
            content: generated.content.clone(),
            source: generated.source,
        };
        return outcome;
    }

    /// Pick the update or insert path and write (or preview) the block.
    ///
    /// # Errors
    ///
    /// Returns I/O or injector errors. The document is untouched on error.
    fn write_block(&self, record: &DriftRecord, content: &str) -> Result<(FixAction, String), Error> {
        let entry = &record.entry;
        let doc_rel = &entry.doc_ref.file_path;
        let doc = self.root.join(doc_rel);
        let write = !self.options.dry_run;

        let source = match std::fs::read_to_string(&doc) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(Error::Io(e)),
            Ok(s) => s,
        };
        let extraction = anchor::extract(doc_rel, &source);
        let existing = extraction
            .find(&entry.id)
            .or_else(|| return self.untracked_anchor_for(&extraction.anchors, &entry.code_ref));

        return match existing {
            Some(target) => {
                injector::inject_into_file(&doc, &target.id, content, write)?;
                Ok((FixAction::Update, target.id.clone()))
            },
            None => {
                let insertion = injector::insert_into_file(&doc, &entry.code_ref, content, write)?;
                Ok((FixAction::Insert, insertion.id))
            },
        };
    }

    /// Bind the entry to `anchor_id`, store the new signature, and save the map.
    ///
    /// # Errors
    ///
    /// Returns map errors from re-keying, updating, or saving.
    fn record_fix(&self, record: &DriftRecord, anchor_id: &str) -> Result<(), Error> {
        self.store.rekey_entry(&record.entry.id, anchor_id)?;
        self.store.update_entry(anchor_id, EntryUpdate {
            code_signature_hash: Some(record.current_hash.clone()),
            code_signature_text: Some(record.current_signature.signature_text.clone()),
            ..EntryUpdate::default()
        })?;
        return self.store.save();
    }

    /// An anchor documenting `symbol` that no other entry already owns.
    fn untracked_anchor_for<'x>(&self, anchors: &'x [Anchor], symbol: &SymbolRef) -> Option<&'x Anchor> {
        return anchors
            .iter()
            .find(|a| return &a.symbol == symbol && !self.store.contains(&a.id));
    }

    /// Hand modified documents and the map to version control.
    fn commit(&self, result: &FixResult) -> Option<CommitOutcome> {
        let vcs = self.vcs?;
        let mut paths: Vec<PathBuf> = result
            .fixes
            .iter()
            .filter(|f| return f.is_success())
            .map(|f| return f.doc_file.clone())
            .collect();
        if paths.is_empty() {
            return None;
        }
        paths.sort();
        paths.dedup();
        let map_path = self.store.path();
        paths.push(map_path.strip_prefix(&self.root).unwrap_or(map_path).to_path_buf());

        let symbols: Vec<SymbolRef> = result
            .fixes
            .iter()
            .filter(|f| return f.is_success())
            .map(|f| return f.code_ref.clone())
            .collect();

        let outcome = vcs.stage_and_commit(&paths, &symbols, self.options.push);
        if !outcome.success {
            tracing::warn!(error = outcome.error.as_deref().unwrap_or(""), "auto-commit failed");
        }
        return Some(outcome);
    }
}

/// Run `work` over `items` on `width` scoped threads pulling from a FIFO
/// queue. Results come back in input order.
fn run_pool<T, R, F>(width: usize, items: &[T], work: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync,
{
    let (task_tx, task_rx) = unbounded::<(usize, &T)>();
    let (result_tx, result_rx) = unbounded::<(usize, R)>();
    for task in items.iter().enumerate() {
        // Receiver is alive until the scope below ends.
        let _ = task_tx.send(task);
    }
    drop(task_tx);

    let workers = width.min(items.len()).max(1);
    std::thread::scope(|scope| {
        for _ in 0..workers {
            let task_rx = task_rx.clone();
            let result_tx = result_tx.clone();
            let work = &work;
            scope.spawn(move || {
                for (index, item) in task_rx {
                    let _ = result_tx.send((index, work(item)));
                }
            });
        }
    });
    drop(result_tx);

    let mut slots: Vec<Option<R>> = std::iter::repeat_with(|| return None).take(items.len()).collect();
    for (index, result) in result_rx {
        if let Some(slot) = slots.get_mut(index) {
            *slot = Some(result);
        }
    }
    return slots.into_iter().flatten().collect();
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::generator::{self, GenerationError, GenerationErrorKind};
    use crate::map_store::MapEntry;
    use crate::types::{CodeSignature, SignatureHash, SymbolKind};

    /// Echoes the symbol name, failing fatally for the listed symbols.
    struct EchoGenerator {
        failing: Vec<String>,
    }

    impl ContentGenerator for EchoGenerator {
        fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
            if self.failing.contains(&request.symbol_name) {
                return Err(GenerationError::new(GenerationErrorKind::Fatal, "model refused"));
            }
            std::thread::sleep(Duration::from_millis(5));
            Ok(format!("Docs for {}.", request.symbol_name))
        }
    }

    /// Records the paths it was asked to commit.
    struct RecordingVcs {
        calls: Mutex<Vec<Vec<PathBuf>>>,
        succeed: bool,
    }

    impl VersionControl for RecordingVcs {
        fn stage_and_commit(&self, paths: &[PathBuf], _symbols: &[SymbolRef], _push: bool) -> CommitOutcome {
            self.calls.lock().unwrap().push(paths.to_vec());
            CommitOutcome {
                error: (!self.succeed).then(|| "rejected".to_string()),
                output: None,
                success: self.succeed,
            }
        }
    }

    fn options() -> FixOptions {
        FixOptions {
            concurrency: 4,
            retry: RetryPolicy { delay: Duration::ZERO, max_attempts: 2 },
            ..FixOptions::default()
        }
    }

    fn block(id: &str, symbol: &str, body: &str) -> String {
        anchor::render_block(id, &SymbolRef::new("src/a.ts", symbol), body)
    }

    /// Project with one doc per entry in `docs`, all entries recorded at hash "old".
    fn project(docs: &[(&str, &str, &str)]) -> (tempfile::TempDir, AnchorMapStore, Vec<DriftRecord>) {
        let dir = tempfile::tempdir().unwrap();
        let store = AnchorMapStore::create(dir.path().join(".docsync/map.json"));
        let mut records = Vec::new();
        for (doc, id, symbol) in docs {
            let entry = MapEntry::new(
                *id,
                SymbolRef::new("src/a.ts", *symbol),
                SignatureHash("old".to_string()),
                None,
                *doc,
            );
            store.add_entry(entry.clone()).unwrap();
            records.push(DriftRecord {
                entry,
                old_signature: None,
                current_signature: CodeSignature {
                    hash: Some(SignatureHash("new".to_string())),
                    is_exported: true,
                    symbol_name: symbol.to_string(),
                    symbol_type: SymbolKind::Function,
                    signature_text: format!("function {symbol}(): void"),
                },
                current_hash: SignatureHash("new".to_string()),
                old_hash: SignatureHash("old".to_string()),
            });
        }
        store.save().unwrap();
        (dir, store, records)
    }

    fn write_doc(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn one_generation_failure_yields_placeholder_not_failure() {
        let (dir, store, records) = project(&[("a.md", "U1", "f"), ("b.md", "U2", "g"), ("c.md", "U3", "h")]);
        for (doc, id, symbol) in [("a.md", "U1", "f"), ("b.md", "U2", "g"), ("c.md", "U3", "h")] {
            write_doc(dir.path(), doc, &block(id, symbol, "stale"));
        }
        let generator = EchoGenerator { failing: vec!["g".to_string()] };

        let report = Orchestrator::new(dir.path(), &store, &generator, options()).run(&records);

        let result = report.result;
        assert_eq!(result.total_fixes, 3);
        assert_eq!(result.successful_fixes, 3);
        assert!(result.success);
        let ids: Vec<_> = result.fixes.iter().map(|f| f.entry_id.as_str()).collect();
        assert_eq!(ids, ["U1", "U2", "U3"]);
        let FixStatus::Succeeded { content, source } = &result.fixes[1].status else {
            panic!("expected success");
        };
        assert_eq!(*source, ContentSource::Placeholder);
        assert!(result.fixes[1].generation_error.is_some());
        let placeholder = generator::placeholder(&GenerationRequest {
            symbol_name: "g".to_string(),
            old_signature: None,
            new_signature: records[1].current_signature.clone(),
            old_doc_text: "stale".to_string(),
            file_path: Some(PathBuf::from("src/a.ts")),
            context: None,
        });
        assert_eq!(content, &placeholder);
        let b = std::fs::read_to_string(dir.path().join("b.md")).unwrap();
        assert!(b.contains(&placeholder));
        assert!(std::fs::read_to_string(dir.path().join("a.md")).unwrap().contains("Docs for f."));
    }

    #[test]
    fn concurrent_records_in_one_doc_lose_no_update() {
        let symbols: Vec<String> = (0..8).map(|i| format!("s{i}")).collect();
        let docs: Vec<(&str, String, &str)> =
            symbols.iter().enumerate().map(|(i, s)| ("api.md", format!("U{i}"), s.as_str())).collect();
        let layout: Vec<(&str, &str, &str)> = docs.iter().map(|(d, id, s)| (*d, id.as_str(), *s)).collect();
        let (dir, store, records) = project(&layout);
        let body: String = layout.iter().map(|(_, id, s)| block(id, s, "stale") + "\n").collect();
        write_doc(dir.path(), "api.md", &body);
        let generator = EchoGenerator { failing: Vec::new() };

        let report = Orchestrator::new(dir.path(), &store, &generator, options()).run(&records);

        assert!(report.result.success);
        let doc = std::fs::read_to_string(dir.path().join("api.md")).unwrap();
        for symbol in &symbols {
            assert!(doc.contains(&format!("Docs for {symbol}.")), "lost update for {symbol}");
        }
        assert!(!doc.contains("stale"));
        let reloaded = AnchorMapStore::load(store.path()).unwrap();
        assert!(reloaded.entries().iter().all(|e| e.code_signature_hash.as_str() == "new"));
    }

    #[test]
    fn dry_run_previews_without_touching_disk() {
        let (dir, store, records) = project(&[("a.md", "U1", "f")]);
        let original = block("U1", "f", "stale");
        write_doc(dir.path(), "a.md", &original);
        let map_before = std::fs::read_to_string(store.path()).unwrap();
        let generator = EchoGenerator { failing: Vec::new() };
        let opts = FixOptions { dry_run: true, auto_commit: true, ..options() };
        let vcs = RecordingVcs { calls: Mutex::new(Vec::new()), succeed: true };

        let report = Orchestrator::new(dir.path(), &store, &generator, opts).with_vcs(&vcs).run(&records);

        assert!(report.result.success);
        assert!(report.result.fixes[0].is_success());
        assert!(report.result.fixes[0].preview);
        assert_eq!(std::fs::read_to_string(dir.path().join("a.md")).unwrap(), original);
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), map_before);
        assert_eq!(store.get("U1").unwrap().code_signature_hash.as_str(), "old");
        assert!(report.commit.is_none());
        assert!(vcs.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn missing_anchor_takes_insert_path_and_rekeys() {
        let (dir, store, records) = project(&[("docs/new.md", "U1", "f")]);
        let generator = EchoGenerator { failing: Vec::new() };

        let report = Orchestrator::new(dir.path(), &store, &generator, options()).run(&records);

        let outcome = &report.result.fixes[0];
        assert_eq!(outcome.action, Some(FixAction::Insert));
        let new_id = outcome.anchor_id.clone().unwrap();
        assert_ne!(new_id, "U1");
        let doc = std::fs::read_to_string(dir.path().join("docs/new.md")).unwrap();
        let extraction = anchor::extract(Path::new("docs/new.md"), &doc);
        assert_eq!(extraction.find(&new_id).unwrap().content, "Docs for f.");
        let reloaded = AnchorMapStore::load(store.path()).unwrap();
        assert!(reloaded.get("U1").is_none());
        assert_eq!(reloaded.get(&new_id).unwrap().code_signature_hash.as_str(), "new");
    }

    #[test]
    fn anchor_with_same_code_ref_is_reused() {
        let (dir, store, records) = project(&[("a.md", "U1", "f")]);
        write_doc(dir.path(), "a.md", &block("OTHER", "f", "stale"));
        let generator = EchoGenerator { failing: Vec::new() };

        let report = Orchestrator::new(dir.path(), &store, &generator, options()).run(&records);

        let outcome = &report.result.fixes[0];
        assert_eq!(outcome.action, Some(FixAction::Update));
        assert_eq!(outcome.anchor_id.as_deref(), Some("OTHER"));
        assert!(store.contains("OTHER"));
        let doc = std::fs::read_to_string(dir.path().join("a.md")).unwrap();
        assert_eq!(doc.matches("docsync:start").count(), 1);
        assert!(doc.contains("Docs for f."));
    }

    #[test]
    fn injection_failure_is_isolated() {
        let (dir, store, records) = project(&[("broken", "U1", "f"), ("ok.md", "U2", "g")]);
        std::fs::create_dir_all(dir.path().join("broken")).unwrap();
        write_doc(dir.path(), "ok.md", &block("U2", "g", "stale"));
        let generator = EchoGenerator { failing: Vec::new() };

        let report = Orchestrator::new(dir.path(), &store, &generator, options()).run(&records);

        let result = report.result;
        assert!(!result.success);
        assert_eq!(result.failed_fixes, 1);
        assert_eq!(result.successful_fixes, 1);
        assert!(matches!(result.fixes[0].status, FixStatus::Failed { document_written: false, .. }));
        assert_eq!(store.get("U1").unwrap().code_signature_hash.as_str(), "old");
        assert_eq!(store.get("U2").unwrap().code_signature_hash.as_str(), "new");
    }

    #[test]
    fn map_save_failure_reports_written_document() {
        let (dir, store, records) = project(&[("a.md", "U1", "f")]);
        write_doc(dir.path(), "a.md", &block("U1", "f", "stale"));
        std::fs::remove_file(store.path()).unwrap();
        std::fs::create_dir(store.path()).unwrap();
        let generator = EchoGenerator { failing: Vec::new() };

        let report = Orchestrator::new(dir.path(), &store, &generator, options()).run(&records);

        let outcome = &report.result.fixes[0];
        assert!(!report.result.success);
        assert!(matches!(outcome.status, FixStatus::Failed { document_written: true, .. }));
        assert_eq!(outcome.action, Some(FixAction::Update));
        let doc = std::fs::read_to_string(dir.path().join("a.md")).unwrap();
        assert!(doc.contains("Docs for f."));
    }

    #[test]
    fn project_context_reaches_the_generator() {
        /// Reports the importers it was given.
        struct ContextEcho;
        impl ContentGenerator for ContextEcho {
            fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
                let importers = request.context.as_ref().map(|c| c.imported_by.clone()).unwrap_or_default();
                Ok(format!("Used by {importers:?}."))
            }
        }
        let (dir, store, records) = project(&[("a.md", "U1", "f")]);
        write_doc(dir.path(), "a.md", &block("U1", "f", "stale"));
        write_doc(dir.path(), "src/a.ts", "export function f(): void {}\n");
        write_doc(dir.path(), "src/main.ts", "import { f } from './a';\n");
        let context = ProjectContext::load(dir.path());

        let report = Orchestrator::new(dir.path(), &store, &ContextEcho, options())
            .with_context(&context)
            .run(&records);

        let FixStatus::Succeeded { content, .. } = &report.result.fixes[0].status else {
            panic!("expected success");
        };
        assert_eq!(content, "Used by [\"src/main.ts\"].");
    }

    #[test]
    fn commit_failure_does_not_change_success() {
        let (dir, store, records) = project(&[("a.md", "U1", "f")]);
        write_doc(dir.path(), "a.md", &block("U1", "f", "stale"));
        let generator = EchoGenerator { failing: Vec::new() };
        let vcs = RecordingVcs { calls: Mutex::new(Vec::new()), succeed: false };
        let opts = FixOptions { auto_commit: true, ..options() };

        let report = Orchestrator::new(dir.path(), &store, &generator, opts).with_vcs(&vcs).run(&records);

        assert!(report.result.success);
        assert!(!report.commit.unwrap().success);
        let calls = vcs.calls.lock().unwrap();
        assert_eq!(calls[0], vec![PathBuf::from("a.md"), PathBuf::from(".docsync/map.json")]);
    }

    #[test]
    fn pool_preserves_input_order() {
        let items: Vec<u64> = (0..20).collect();
        let out = run_pool(3, &items, |n| {
            std::thread::sleep(Duration::from_millis(20 - n));
            n * 2
        });
        assert_eq!(out, items.iter().map(|n| n * 2).collect::<Vec<_>>());
    }
}
