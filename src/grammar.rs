//! Source languages the analyzer understands, keyed by file extension.

use std::path::Path;

use tree_sitter::Language;

use crate::error::Error;

/// A supported source language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    /// Go.
    Go,
    /// JavaScript, parsed with the TypeScript grammar.
    JavaScript,
    /// JSX or TSX.
    Jsx,
    /// Python.
    Python,
    /// Rust.
    Rust,
    /// TypeScript.
    TypeScript,
}

impl Grammar {
    /// Language for an extension (without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        let grammar = match ext {
            "go" => Self::Go,
            "js" | "mjs" | "cjs" => Self::JavaScript,
            "jsx" | "tsx" => Self::Jsx,
            "py" => Self::Python,
            "rs" => Self::Rust,
            "ts" | "mts" | "cts" => Self::TypeScript,
            _ => return None,
        };
        return Some(grammar);
    }

    /// The tree-sitter grammar.
    pub fn language(self) -> Language {
        return match self {
            Self::Go => tree_sitter_go::LANGUAGE.into(),
            Self::JavaScript | Self::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Self::Jsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            Self::Python => tree_sitter_python::LANGUAGE.into(),
            Self::Rust => tree_sitter_rust::LANGUAGE.into(),
        };
    }

    /// Info string for a fenced code block.
    pub const fn fence(self) -> &'static str {
        return match self {
            Self::Go => "go",
            Self::JavaScript => "javascript",
            Self::Jsx | Self::TypeScript => "typescript",
            Self::Python => "python",
            Self::Rust => "rust",
        };
    }
}

/// Tree-sitter language for a code file.
///
/// # Errors
///
/// Returns `Error::UnsupportedLanguage` for unknown extensions.
pub fn language_for_path(path: &Path) -> Result<Language, Error> {
    let ext = extension(path);
    return Grammar::from_extension(ext)
        .map(Grammar::language)
        .ok_or_else(|| return Error::UnsupportedLanguage { ext: ext.to_string() });
}

/// Fence info string for a code file; empty when the language is unknown.
pub fn fence_language(path: &Path) -> &'static str {
    return Grammar::from_extension(extension(path)).map_or("", Grammar::fence);
}

/// Whether files with this extension can hold tracked symbols.
pub fn is_supported_extension(ext: &str) -> bool {
    return Grammar::from_extension(ext).is_some();
}

/// Extension without its dot, or "".
fn extension(path: &Path) -> &str {
    return path.extension().and_then(|e| return e.to_str()).unwrap_or_default();
}
