//! Project context for generators: the documented file's place in the import
//! graph and the project's package metadata.
//!
//! The graph is lexical. Relative `import`/`require` specifiers in JS/TS
//! files and `mod` declarations in Rust files become edges when the target
//! exists on disk; everything else (bare package names, `use` paths) is
//! ignored.

use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::scanner::{self, normalize_path};

/// Extensions whose import statements are followed.
const SCRIPT_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx"];

/// Suffixes tried, in order, when resolving a relative script specifier.
const SCRIPT_CANDIDATES: &[&str] = &["", ".ts", ".tsx", ".js", ".jsx", "/index.ts", "/index.js"];

/// `import ... from './x'`, `import './x'`, and `require('./x')`.
#[allow(clippy::expect_used, reason = "hardcoded pattern, validity is a compile-time invariant")]
static SCRIPT_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r#"(?:import\s+(?:[\w\s{},*]+from\s+)?|require\()['"]([^'"]+)['"]"#)
        .expect("valid import regex");
});

/// `mod name;` with optional visibility. Inline `mod name { .. }` is not a file edge.
#[allow(clippy::expect_used, reason = "hardcoded pattern, validity is a compile-time invariant")]
static RUST_MOD: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"(?m)^\s*(?:pub(?:\([^)]*\))?\s+)?mod\s+([A-Za-z_][A-Za-z0-9_]*)\s*;")
        .expect("valid mod regex");
});

/// Directed file-to-file import edges. Paths are relative to the project root.
#[derive(Debug, Clone, Default)]
pub struct ImportGraph {
    /// Importer to the files it imports.
    imports: BTreeMap<PathBuf, BTreeSet<PathBuf>>,
    /// Imported file to the files importing it.
    imported_by: BTreeMap<PathBuf, BTreeSet<PathBuf>>,
}

impl ImportGraph {
    /// Walk `root` (honoring `.gitignore`) and collect edges from every
    /// script and Rust file. Unreadable files contribute nothing.
    pub fn build(root: &Path) -> Self {
        let mut graph = Self::default();
        for entry in scanner::project_walk(root) {
            if !entry.file_type().is_some_and(|t| return t.is_file()) {
                continue;
            }
            let rel = entry.path().strip_prefix(root).unwrap_or(entry.path()).to_path_buf();
            if !follows_imports(&rel) {
                continue;
            }
            let source = match std::fs::read_to_string(entry.path()) {
                Ok(s) => s,
                Err(e) => {
                    tracing::debug!(file = %rel.display(), error = %e, "skipping unreadable file");
                    continue;
                },
            };
            for target in imports_in(root, &rel, &source) {
                graph.add_edge(&rel, &target);
            }
        }
        tracing::debug!(files = graph.imports.len(), "import graph built");
        return graph;
    }

    /// Record that `from` imports `to`.
    pub fn add_edge(&mut self, from: &Path, to: &Path) {
        self.imports.entry(from.to_path_buf()).or_default().insert(to.to_path_buf());
        self.imported_by.entry(to.to_path_buf()).or_default().insert(from.to_path_buf());
    }

    /// Files `file` imports, sorted.
    pub fn imports_of(&self, file: &Path) -> Vec<PathBuf> {
        return self.imports.get(file).map(|s| return s.iter().cloned().collect()).unwrap_or_default();
    }

    /// Files importing `file`, sorted.
    pub fn importers_of(&self, file: &Path) -> Vec<PathBuf> {
        return self.imported_by.get(file).map(|s| return s.iter().cloned().collect()).unwrap_or_default();
    }
}

/// Whether `path` is a file kind the graph reads.
fn follows_imports(path: &Path) -> bool {
    let ext = path.extension().and_then(|e| return e.to_str()).unwrap_or_default();
    return ext == "rs" || SCRIPT_EXTENSIONS.contains(&ext);
}

/// Resolved targets of every import in `source`, which lives at `file`.
fn imports_in(root: &Path, file: &Path, source: &str) -> Vec<PathBuf> {
    let dir = file.parent().unwrap_or_else(|| return Path::new(""));
    if file.extension().is_some_and(|e| return e == "rs") {
        let base = rust_module_dir(file);
        return RUST_MOD
            .captures_iter(source)
            .filter_map(|c| return c.get(1))
            .filter_map(|name| {
                let name = name.as_str();
                let candidates = [base.join(format!("{name}.rs")), base.join(name).join("mod.rs")];
                return candidates.into_iter().find(|c| return root.join(c).is_file());
            })
            .collect();
    }
    return SCRIPT_IMPORT
        .captures_iter(source)
        .filter_map(|c| return c.get(1))
        .map(|m| return m.as_str())
        .filter(|spec| return spec.starts_with('.'))
        .filter_map(|spec| return resolve_script(root, &normalize_path(&dir.join(spec))))
        .collect();
}

/// First existing candidate for a normalized relative specifier.
fn resolve_script(root: &Path, base: &Path) -> Option<PathBuf> {
    return SCRIPT_CANDIDATES
        .iter()
        .map(|suffix| {
            let mut path = OsString::from(base.as_os_str());
            path.push(suffix);
            return PathBuf::from(path);
        })
        .find(|candidate| return root.join(candidate).is_file());
}

/// Directory `mod` declarations in `file` resolve against.
fn rust_module_dir(file: &Path) -> PathBuf {
    let dir = file.parent().unwrap_or_else(|| return Path::new(""));
    let name = file.file_name().and_then(|n| return n.to_str()).unwrap_or_default();
    if matches!(name, "lib.rs" | "main.rs" | "mod.rs") {
        return dir.to_path_buf();
    }
    let stem = file.file_stem().unwrap_or_default();
    return dir.join(stem);
}

/// Name, version, and dependency names from the project manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageInfo {
    /// Runtime dependency names, sorted.
    pub dependencies: Vec<String>,
    /// Development dependency names, sorted.
    pub dev_dependencies: Vec<String>,
    /// Manifest file name the data came from.
    pub manifest: String,
    /// Package name.
    pub name: Option<String>,
    /// Package version.
    pub version: Option<String>,
}

/// The subset of `package.json` read.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageJson {
    /// `dependencies`, names to version specs.
    #[serde(default)]
    dependencies: BTreeMap<String, serde_json::Value>,
    /// `devDependencies`.
    #[serde(default)]
    dev_dependencies: BTreeMap<String, serde_json::Value>,
    /// `name`.
    name: Option<String>,
    /// `version`.
    version: Option<String>,
}

impl PackageInfo {
    /// Read `package.json`, falling back to `Cargo.toml`. A missing or
    /// malformed manifest yields `None`.
    pub fn load(root: &Path) -> Option<Self> {
        return Self::from_package_json(root).or_else(|| return Self::from_cargo_toml(root));
    }

    /// Metadata from `root/package.json`.
    fn from_package_json(root: &Path) -> Option<Self> {
        let text = std::fs::read_to_string(root.join("package.json")).ok()?;
        let raw: PackageJson = match serde_json::from_str(&text) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring malformed package.json");
                return None;
            },
        };
        return Some(Self {
            dependencies: raw.dependencies.into_keys().collect(),
            dev_dependencies: raw.dev_dependencies.into_keys().collect(),
            manifest: "package.json".to_string(),
            name: raw.name,
            version: raw.version,
        });
    }

    /// Metadata from `root/Cargo.toml`'s `[package]` and dependency tables.
    fn from_cargo_toml(root: &Path) -> Option<Self> {
        let text = std::fs::read_to_string(root.join("Cargo.toml")).ok()?;
        let table: toml::Table = match toml::from_str(&text) {
            Ok(table) => table,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring malformed Cargo.toml");
                return None;
            },
        };
        let package = table.get("package").and_then(toml::Value::as_table);
        let field = |key: &str| {
            return package
                .and_then(|p| return p.get(key))
                .and_then(toml::Value::as_str)
                .map(ToString::to_string);
        };
        let names = |key: &str| -> Vec<String> {
            let keys: BTreeSet<String> = table
                .get(key)
                .and_then(toml::Value::as_table)
                .map(|t| return t.keys().cloned().collect())
                .unwrap_or_default();
            return keys.into_iter().collect();
        };
        return Some(Self {
            dependencies: names("dependencies"),
            dev_dependencies: names("dev-dependencies"),
            manifest: "Cargo.toml".to_string(),
            name: field("name"),
            version: field("version"),
        });
    }
}

/// Context for one code file, serialized into generation requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileContext {
    /// Files importing this one.
    pub imported_by: Vec<PathBuf>,
    /// Files this one imports.
    pub imports: Vec<PathBuf>,
    /// Project manifest data, when one was found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<PackageInfo>,
    /// The file, relative to the project root.
    pub path: PathBuf,
}

/// Import graph plus manifest data, built once per fix run.
#[derive(Debug, Clone, Default)]
pub struct ProjectContext {
    /// File-level import edges.
    graph: ImportGraph,
    /// Manifest data.
    package: Option<PackageInfo>,
}

impl ProjectContext {
    /// Build the context for the project at `root`.
    pub fn load(root: &Path) -> Self {
        return Self {
            graph: ImportGraph::build(root),
            package: PackageInfo::load(root),
        };
    }

    /// Context for `file`, a path relative to the project root.
    pub fn for_file(&self, file: &Path) -> FileContext {
        let file = normalize_path(file);
        return FileContext {
            imported_by: self.graph.importers_of(&file),
            imports: self.graph.imports_of(&file),
            package: self.package.clone(),
            path: file,
        };
    }
}
