//! CLI command bodies: init, check, status, fix, track, prune.
//!
//! Each command returns the process exit code; only configuration-level
//! failures come back as `Err` and are rendered by `diagnostics`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::analyzer::{self, Analyzer as _, TreeSitterAnalyzer};
use crate::anchor;
use crate::atomic::write_atomic;
use crate::config::{self, Config};
use crate::context::ProjectContext;
use crate::drift::{self, DriftReport, MissingReason};
use crate::error::Error;
use crate::generator::{self, CommandGenerator, ContentGenerator, GenerationRequest, PlaceholderGenerator};
use crate::injector;
use crate::map_store::{AnchorMapStore, MapEntry};
use crate::orchestrator::{FixAction, FixOptions, FixReport, FixResult, FixStatus, Orchestrator};
use crate::retry::ContentSource;
use crate::scanner;
use crate::types::{CodeSignature, SymbolRef};
use crate::vcs::GitCli;

/// Flags accepted by `fix`.
#[derive(Debug, Clone, Copy, Default)]
#[allow(clippy::struct_excessive_bools, reason = "mirrors independent CLI flags")]
pub struct FixFlags {
    /// Commit modified docs and the map afterwards.
    pub auto_commit: bool,
    /// Preview only.
    pub dry_run: bool,
    /// Use placeholders instead of the configured generator.
    pub no_ai: bool,
    /// Push after committing.
    pub push: bool,
}

/// Load the anchor map named by the config.
///
/// # Errors
///
/// Returns `Error::MapNotFound`, `Error::Json`, or `Error::MapCorrupt`.
fn load_store(root: &Path, config: &Config) -> Result<AnchorMapStore, Error> {
    return AnchorMapStore::load(&root.join(&config.map_path));
}

/// Analyze `code_ref`'s file and find its signature.
///
/// # Errors
///
/// Returns analyzer errors, or `Error::SymbolNotFound` with suggestions.
fn signature_for(root: &Path, code_ref: &SymbolRef) -> Result<CodeSignature, Error> {
    let signatures = TreeSitterAnalyzer.analyze_file(&root.join(&code_ref.file_path))?;
    return match analyzer::find_signature(&signatures, &code_ref.symbol_name) {
        Some(signature) => Ok(signature.clone()),
        None => Err(Error::SymbolNotFound {
            file: code_ref.file_path.clone(),
            suggestions: analyzer::suggest_names(&signatures, &code_ref.symbol_name),
            symbol: code_ref.symbol_name.clone(),
        }),
    };
}

/// Entries whose anchor id no longer appears in their documentation file.
fn unanchored_entries(root: &Path, entries: &[MapEntry]) -> Vec<MapEntry> {
    let mut by_doc: HashMap<&Path, Vec<&MapEntry>> = HashMap::new();
    for entry in entries {
        by_doc.entry(entry.doc_ref.file_path.as_path()).or_default().push(entry);
    }

    let mut unanchored = Vec::new();
    for (doc, doc_entries) in by_doc {
        let content = std::fs::read_to_string(root.join(doc)).unwrap_or_default();
        let extraction = anchor::extract(doc, &content);
        unanchored.extend(
            doc_entries
                .into_iter()
                .filter(|e| return extraction.find(&e.id).is_none())
                .cloned(),
        );
    }
    unanchored.sort_by(|a, b| return a.id.cmp(&b.id));
    return unanchored;
}

/// Print one `MISSING` line per unresolvable entry.
fn print_missing(report: &DriftReport) {
    for missing in &report.missing {
        println!("MISSING {} ({})", missing.entry.code_ref, missing.reason);
    }
}

// ── init ───────────────────────────────────────────────────────────────

/// Scaffold `.docsync.toml` and the anchor map, then track every anchor
/// found in markdown that the map doesn't know yet. Existing entries keep
/// their recorded hashes.
///
/// # Errors
///
/// Returns errors from config editing, map loading, scanning, or saving.
pub fn init(root: &Path) -> Result<ExitCode, Error> {
    if scaffold_config(root)? {
        eprintln!("Wrote {}", config::CONFIG_FILE);
    }
    let config = Config::load(root)?;
    let store = AnchorMapStore::open_or_create(&root.join(&config.map_path))?;

    let mut cache: HashMap<PathBuf, Result<Vec<CodeSignature>, String>> = HashMap::new();
    let mut added = 0_usize;

    for extraction in scanner::scan(root, &config)? {
        for message in extraction.messages() {
            eprintln!("warning: {message}");
        }
        for found in &extraction.anchors {
            if store.contains(&found.id) || found.symbol.symbol_name.is_empty() {
                continue;
            }
            let file = found.symbol.file_path.clone();
            let signatures = cache.entry(file.clone()).or_insert_with(|| {
                return TreeSitterAnalyzer.analyze_file(&root.join(&file)).map_err(|e| return e.to_string());
            });
            let signature = match signatures {
                Err(reason) => {
                    println!("SKIP    {} ({reason})", found.symbol);
                    continue;
                },
                Ok(sigs) => analyzer::find_signature(sigs, &found.symbol.symbol_name),
            };
            let Some(signature) = signature else {
                println!("SKIP    {} (symbol not found)", found.symbol);
                continue;
            };
            let Some(hash) = signature.hash.clone() else {
                continue;
            };

            store.add_entry(MapEntry::new(
                found.id.clone(),
                found.symbol.clone(),
                hash,
                Some(signature.signature_text.clone()),
                extraction.file.clone(),
            ))?;
            println!("TRACK   {} -> {}", found.symbol, extraction.file.display());
            added = added.saturating_add(1);
        }
    }

    store.save()?;
    eprintln!("Tracking {} anchors ({added} new) in {}", store.len(), config.map_path.display());
    return Ok(ExitCode::SUCCESS);
}

/// Add default keys missing from `.docsync.toml`, preserving everything the
/// user wrote. Returns whether the file changed.
///
/// # Errors
///
/// Returns `Error::Io` on read/write failure or `Error::ParseFailed` if the
/// file isn't valid TOML.
fn scaffold_config(root: &Path) -> Result<bool, Error> {
    let config_path = root.join(config::CONFIG_FILE);
    let content = match std::fs::read_to_string(&config_path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(Error::Io(e)),
    };

    let mut doc: toml_edit::DocumentMut = content.parse().map_err(|e: toml_edit::TomlError| {
        return Error::ParseFailed {
            file: config_path.clone(),
            reason: e.to_string(),
        };
    })?;

    let concurrency = i64::try_from(config::DEFAULT_CONCURRENCY).unwrap_or(1);
    let mut changed = false;
    changed |= ensure_key(doc.as_table_mut(), "map_path", toml_edit::value(config::DEFAULT_MAP_PATH));
    changed |= ensure_key(doc.as_table_mut(), "concurrency", toml_edit::value(concurrency));
    changed |= ensure_section(&mut doc, "retry", &[
        ("max_attempts", toml_edit::value(3_i64)),
        ("delay_ms", toml_edit::value(1000_i64)),
    ]);
    changed |= ensure_section(&mut doc, "generator", &[("timeout_secs", toml_edit::value(60_i64))]);
    changed |= ensure_section(&mut doc, "commit", &[("push", toml_edit::value(false))]);

    if changed {
        write_atomic(&config_path, doc.to_string().as_bytes())?;
    }
    return Ok(changed);
}

/// Insert `key = value` if absent. Returns whether it was inserted.
fn ensure_key(table: &mut toml_edit::Table, key: &str, value: toml_edit::Item) -> bool {
    if table.contains_key(key) {
        return false;
    }
    table.insert(key, value);
    return true;
}

/// Make sure `[name]` exists and holds each default key.
/// A non-table value under `name` is left alone.
fn ensure_section(doc: &mut toml_edit::DocumentMut, name: &str, defaults: &[(&str, toml_edit::Item)]) -> bool {
    let mut changed = false;
    if !doc.contains_key(name) {
        doc[name] = toml_edit::Item::Table(toml_edit::Table::new());
        changed = true;
    }
    let Some(table) = doc.get_mut(name).and_then(toml_edit::Item::as_table_mut) else {
        return changed;
    };
    for (key, value) in defaults {
        changed |= ensure_key(table, key, value.clone());
    }
    return changed;
}

// ── check / status ─────────────────────────────────────────────────────

/// Compare every entry with the current code.
/// Exit 0 when nothing drifted or went missing, 1 otherwise.
///
/// # Errors
///
/// Returns config or map loading errors.
pub fn check(root: &Path) -> Result<ExitCode, Error> {
    let config = Config::load(root)?;
    let store = load_store(root, &config)?;
    let report = drift::detect(&store, &TreeSitterAnalyzer, root);

    for record in &report.drifts {
        println!("DRIFT   {} ({})", record.entry.code_ref, record.entry.doc_ref.file_path.display());
    }
    print_missing(&report);
    for entry in unanchored_entries(root, &store.entries()) {
        eprintln!(
            "warning: UNANCHORED {} (anchor {} not in {})",
            entry.code_ref,
            entry.id,
            entry.doc_ref.file_path.display()
        );
    }

    if report.is_clean() {
        println!("All {} anchors fresh", store.len());
        return Ok(ExitCode::SUCCESS);
    }
    println!();
    println!("{} drifted, {} missing", report.drifts.len(), report.missing.len());
    eprintln!();
    eprintln!("hint: run `docsync fix` to regenerate drifted sections");
    return Ok(ExitCode::from(1));
}

/// Print every entry as FRESH, DRIFT, or MISSING. Always exits 0.
///
/// # Errors
///
/// Returns config or map loading errors.
pub fn status(root: &Path) -> Result<ExitCode, Error> {
    let config = Config::load(root)?;
    let store = load_store(root, &config)?;
    let report = drift::detect(&store, &TreeSitterAnalyzer, root);

    for entry in &report.fresh {
        println!("FRESH   {} ({})", entry.code_ref, entry.doc_ref.file_path.display());
    }
    for record in &report.drifts {
        println!("DRIFT   {} ({})", record.entry.code_ref, record.entry.doc_ref.file_path.display());
    }
    print_missing(&report);
    return Ok(ExitCode::SUCCESS);
}

// ── fix ────────────────────────────────────────────────────────────────

/// Regenerate drifted sections. Exit 0 iff no item failed.
///
/// # Errors
///
/// Returns config or map loading errors.
pub fn fix(root: &Path, flags: FixFlags) -> Result<ExitCode, Error> {
    let config = Config::load(root)?;
    let store = load_store(root, &config)?;
    let report = drift::detect(&store, &TreeSitterAnalyzer, root);
    print_missing(&report);

    if report.drifts.is_empty() {
        println!("Nothing to fix");
        return Ok(ExitCode::SUCCESS);
    }

    let command_generator = config
        .generator
        .command
        .clone()
        .filter(|_| return !flags.no_ai)
        .map(|argv| return CommandGenerator::new(argv, root, config.generator.timeout));
    let generator: &dyn ContentGenerator = match &command_generator {
        Some(command) => command,
        None => {
            tracing::info!("no generator in use, writing placeholders");
            &PlaceholderGenerator
        },
    };

    let options = FixOptions {
        auto_commit: flags.auto_commit,
        concurrency: config.concurrency,
        dry_run: flags.dry_run,
        push: flags.push || config.commit.push,
        retry: config.retry,
    };
    // Placeholders never read the context.
    let project_context = command_generator.as_ref().map(|_| return ProjectContext::load(root));
    let git = GitCli::new(root);
    let mut orchestrator = Orchestrator::new(root, &store, generator, options).with_vcs(&git);
    if let Some(context) = &project_context {
        orchestrator = orchestrator.with_context(context);
    }
    let fix_report = orchestrator.run(&report.drifts);

    print_fix_report(&fix_report, &report);
    if fix_report.result.success {
        return Ok(ExitCode::SUCCESS);
    }
    return Ok(ExitCode::from(1));
}

/// Print one line per outcome, the commit result, and a summary.
fn print_fix_report(report: &FixReport, drift: &DriftReport) {
    let result = &report.result;
    for outcome in &result.fixes {
        let doc = outcome.doc_file.display();
        match &outcome.status {
            FixStatus::Failed { document_written: false, error } => {
                println!("FAILED  {} ({error})", outcome.code_ref);
            },
            FixStatus::Failed { document_written: true, error } => {
                println!("FAILED  {} written to {doc} but map not saved ({error})", outcome.code_ref);
            },
            FixStatus::Succeeded { source, .. } => {
                let label = if outcome.preview { "PREVIEW" } else { "FIXED  " };
                let verb = match outcome.action {
                    Some(FixAction::Insert) => "inserted into",
                    _ => "updated in",
                };
                let origin = match source {
                    ContentSource::Generated => "generated",
                    ContentSource::Placeholder => "placeholder",
                };
                println!("{label} {} {verb} {doc} ({origin})", outcome.code_ref);
            },
        }
        if let Some(error) = &outcome.generation_error {
            eprintln!("warning: generation for {} failed: {error}", outcome.code_ref);
        }
    }

    if let Some(commit) = &report.commit {
        if commit.success {
            eprintln!("Committed documentation changes");
        } else {
            eprintln!("warning: auto-commit failed: {}", commit.error.as_deref().unwrap_or("unknown error"));
        }
    }

    println!();
    println!("{}", fix_summary(result, drift));
}

/// Closing line of `fix`: outcome counts plus what detection found.
fn fix_summary(result: &FixResult, drift: &DriftReport) -> String {
    return format!(
        "{} fixed, {} failed (of {}), {} drifted, {} missing",
        result.successful_fixes,
        result.failed_fixes,
        result.total_fixes,
        drift.drifts.len(),
        drift.missing.len()
    );
}

// ── track ──────────────────────────────────────────────────────────────

/// Start documenting `code_ref` in `doc`: append a placeholder block and
/// record a map entry for it.
///
/// # Errors
///
/// Returns `Error::MalformedCodeRef`, `Error::SymbolNotFound`, analyzer
/// errors, or map and file errors.
pub fn track(root: &Path, doc: &Path, code_ref: &str) -> Result<ExitCode, Error> {
    let symbol = anchor::parse_code_ref(code_ref)?;
    let config = Config::load(root)?;
    let store = AnchorMapStore::open_or_create(&root.join(&config.map_path))?;

    if let Some(existing) = store
        .entries()
        .into_iter()
        .find(|e| return e.code_ref == symbol && e.doc_ref.file_path == doc)
    {
        println!("Already tracked: {symbol} in {} ({})", doc.display(), existing.id);
        return Ok(ExitCode::SUCCESS);
    }

    let signature = signature_for(root, &symbol)?;
    let Some(hash) = signature.hash.clone() else {
        return Err(Error::ParseFailed {
            file: symbol.file_path.clone(),
            reason: "analyzer produced no signature hash".to_string(),
        });
    };
    let content = generator::placeholder(&GenerationRequest {
        symbol_name: symbol.symbol_name.clone(),
        old_signature: None,
        new_signature: signature.clone(),
        old_doc_text: String::new(),
        file_path: Some(symbol.file_path.clone()),
        context: None,
    });

    let insertion = injector::insert_into_file(&root.join(doc), &symbol, &content, true)?;
    store.add_entry(MapEntry::new(
        insertion.id.clone(),
        symbol.clone(),
        hash,
        Some(signature.signature_text),
        doc,
    ))?;
    store.save()?;

    println!("TRACK   {symbol} -> {} ({})", doc.display(), insertion.id);
    return Ok(ExitCode::SUCCESS);
}

// ── prune ──────────────────────────────────────────────────────────────

/// Drop entries whose code file or symbol is gone, or whose anchor no
/// longer exists in its document. Entries that merely failed analysis are kept.
///
/// # Errors
///
/// Returns config, map loading, or save errors.
pub fn prune(root: &Path, dry_run: bool) -> Result<ExitCode, Error> {
    let config = Config::load(root)?;
    let store = load_store(root, &config)?;
    let report = drift::detect(&store, &TreeSitterAnalyzer, root);

    let mut doomed: Vec<(MapEntry, String)> = report
        .missing
        .into_iter()
        .filter(|m| return !matches!(m.reason, MissingReason::AnalysisFailed(_)))
        .map(|m| return (m.entry, m.reason.to_string()))
        .collect();
    for entry in unanchored_entries(root, &store.entries()) {
        if !doomed.iter().any(|(e, _)| return e.id == entry.id) {
            doomed.push((entry, "anchor removed".to_string()));
        }
    }

    if doomed.is_empty() {
        println!("Nothing to prune");
        return Ok(ExitCode::SUCCESS);
    }

    for (entry, reason) in &doomed {
        println!("PRUNE   {} {} ({reason})", entry.id, entry.code_ref);
        if !dry_run {
            store.remove_entry(&entry.id);
        }
    }

    if dry_run {
        println!();
        println!("{} entries would be pruned (dry run)", doomed.len());
    } else {
        store.save()?;
        println!();
        println!("Pruned {} entries", doomed.len());
    }
    return Ok(ExitCode::SUCCESS);
}
