//! Drift detection: compare every map entry's recorded signature hash with the
//! hash the analyzer reports for the code as it is now.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::analyzer::{self, Analyzer};
use crate::error::Error;
use crate::map_store::{AnchorMapStore, MapEntry};
use crate::types::{CodeSignature, SignatureHash};

/// An entry whose code signature changed since its docs were written.
#[derive(Debug, Clone)]
pub struct DriftRecord {
    /// The map entry as loaded.
    pub entry: MapEntry,
    /// Signature recorded at the last update, when its text was stored.
    /// Kind and export status are copied from the current signature.
    pub old_signature: Option<CodeSignature>,
    /// Signature the analyzer reports now.
    pub current_signature: CodeSignature,
    /// Hash of `current_signature`.
    pub current_hash: SignatureHash,
    /// Hash recorded in the map.
    pub old_hash: SignatureHash,
}

/// Why an entry's code could not be compared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissingReason {
    /// The file exists but could not be read or parsed.
    AnalysisFailed(String),
    /// The code file no longer exists.
    FileNotFound,
    /// The file exists but declares no symbol with the tracked name.
    SymbolNotFound,
}

impl fmt::Display for MissingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return match self {
            MissingReason::AnalysisFailed(reason) => write!(f, "analysis failed: {reason}"),
            MissingReason::FileNotFound => f.write_str("file not found"),
            MissingReason::SymbolNotFound => f.write_str("symbol not found"),
        };
    }
}

/// An entry whose code file or symbol could not be found.
#[derive(Debug, Clone)]
pub struct MissingInfo {
    /// The map entry as loaded.
    pub entry: MapEntry,
    /// What went wrong.
    pub reason: MissingReason,
}

/// Classification of every entry in the map.
#[derive(Debug, Clone, Default)]
pub struct DriftReport {
    /// Entries whose signature changed.
    pub drifts: Vec<DriftRecord>,
    /// Entries whose hash still matches.
    pub fresh: Vec<MapEntry>,
    /// Entries that could not be compared.
    pub missing: Vec<MissingInfo>,
}

impl DriftReport {
    /// Whether every entry is fresh.
    pub fn is_clean(&self) -> bool {
        return self.drifts.is_empty() && self.missing.is_empty();
    }
}

/// Outcome of analyzing one code file, cached per run.
enum FileAnalysis {
    /// Analysis failed for a reason other than a missing file.
    Failed(String),
    /// The file does not exist.
    Missing,
    /// Declared signatures.
    Signatures(Vec<CodeSignature>),
}

/// Classify every entry in `store` as fresh, drifted, or missing.
///
/// Code paths are resolved against `base`. Each code file is analyzed at most
/// once. Analysis errors are logged and reported per entry; they never abort
/// the scan.
pub fn detect(store: &AnchorMapStore, analyzer: &dyn Analyzer, base: &Path) -> DriftReport {
    let mut cache: HashMap<PathBuf, FileAnalysis> = HashMap::new();
    let mut report = DriftReport::default();

    for entry in store.entries() {
        let rel = entry.code_ref.file_path.clone();
        let analysis = cache.entry(rel).or_insert_with_key(|rel| return analyze(analyzer, base, rel));

        let signatures = match analysis {
            FileAnalysis::Missing => {
                report.missing.push(MissingInfo { entry, reason: MissingReason::FileNotFound });
                continue;
            },
            FileAnalysis::Failed(reason) => {
                let reason = MissingReason::AnalysisFailed(reason.clone());
                report.missing.push(MissingInfo { entry, reason });
                continue;
            },
            FileAnalysis::Signatures(signatures) => signatures,
        };

        let Some(current) = analyzer::find_signature(signatures, &entry.code_ref.symbol_name) else {
            report.missing.push(MissingInfo { entry, reason: MissingReason::SymbolNotFound });
            continue;
        };
        let Some(current_hash) = current.hash.clone() else {
            let reason = MissingReason::AnalysisFailed("analyzer reported no hash".to_string());
            report.missing.push(MissingInfo { entry, reason });
            continue;
        };

        if !store.has_drift(&entry.id, &current_hash) {
            report.fresh.push(entry);
            continue;
        }

        tracing::debug!(id = %entry.id, code_ref = %entry.code_ref, "signature drifted");
        let old_signature = entry.code_signature_text.as_ref().map(|text| {
            return CodeSignature {
                hash: Some(entry.code_signature_hash.clone()),
                is_exported: current.is_exported,
                symbol_name: entry.code_ref.symbol_name.clone(),
                symbol_type: current.symbol_type,
                signature_text: text.clone(),
            };
        });
        report.drifts.push(DriftRecord {
            old_hash: entry.code_signature_hash.clone(),
            old_signature,
            current_signature: current.clone(),
            current_hash,
            entry,
        });
    }

    tracing::info!(
        drifted = report.drifts.len(),
        fresh = report.fresh.len(),
        missing = report.missing.len(),
        "drift scan complete"
    );
    return report;
}

/// Analyze one code file relative to `base`.
fn analyze(analyzer: &dyn Analyzer, base: &Path, rel: &Path) -> FileAnalysis {
    let path = base.join(rel);
    if !path.is_file() {
        return FileAnalysis::Missing;
    }
    return match analyzer.analyze_file(&path) {
        Ok(signatures) => FileAnalysis::Signatures(signatures),
        Err(Error::FileNotFound { .. }) => FileAnalysis::Missing,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "code analysis failed");
            FileAnalysis::Failed(e.to_string())
        },
    };
}
