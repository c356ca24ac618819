/// Core domain types shared by the extractor, analyzer, map store, and orchestrator.
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A signature hash: 64 hex chars, always lowercase.
/// Newtype prevents mixing with arbitrary strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignatureHash(
    /// The hex-encoded SHA-256 digest string.
    pub String,
);

impl SignatureHash {
    /// Borrow the hex digest.
    pub fn as_str(&self) -> &str {
        return &self.0;
    }
}

impl fmt::Display for SignatureHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(&self.0);
    }
}

/// Identifies a code symbol: a file path plus a symbol name within it.
/// Displays as `path#symbol`, the same form used in anchor `code_ref` attributes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolRef {
    /// Code file path, relative to the project root.
    pub file_path: PathBuf,
    /// Bare or dot-qualified symbol name (`add`, `Config.validate`).
    pub symbol_name: String,
}

impl SymbolRef {
    /// Build a reference from its two parts.
    pub fn new(file_path: impl Into<PathBuf>, symbol_name: impl Into<String>) -> Self {
        return Self {
            file_path: file_path.into(),
            symbol_name: symbol_name.into(),
        };
    }
}

impl fmt::Display for SymbolRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "{}#{}", self.file_path.display(), self.symbol_name);
    }
}

/// The declaration kind of an analyzed symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    /// Class declaration (TypeScript, Python).
    Class,
    /// Constant or static item.
    Constant,
    /// Enum declaration.
    Enum,
    /// Free function.
    Function,
    /// Interface declaration (TypeScript, Go).
    Interface,
    /// Function declared inside an impl, class, or with a receiver.
    Method,
    /// Struct declaration.
    Struct,
    /// Trait declaration.
    Trait,
    /// Type alias.
    TypeAlias,
    /// Top-level variable binding (`const x = ...`).
    Variable,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SymbolKind::Class => "class",
            SymbolKind::Constant => "constant",
            SymbolKind::Enum => "enum",
            SymbolKind::Function => "function",
            SymbolKind::Interface => "interface",
            SymbolKind::Method => "method",
            SymbolKind::Struct => "struct",
            SymbolKind::Trait => "trait",
            SymbolKind::TypeAlias => "type alias",
            SymbolKind::Variable => "variable",
        };
        return f.write_str(name);
    }
}

/// A symbol's public signature as reported by an analyzer.
/// Only analyzers construct these; the rest of the crate reads
/// `signature_text` and `hash`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSignature {
    /// Digest of the normalized signature. `None` for reconstructed signatures.
    pub hash: Option<SignatureHash>,
    /// Whether the symbol is visible outside its module.
    pub is_exported: bool,
    /// Qualified symbol name.
    pub symbol_name: String,
    /// Declaration kind.
    pub symbol_type: SymbolKind,
    /// Signature source text, comments included, body elided.
    pub signature_text: String,
}
