//! The crate error type.

use std::path::PathBuf;

/// Everything that can stop a docsync command. Variants carry the path, id,
/// or reason a diagnostic needs.
#[allow(clippy::error_impl_error, reason = "crate-wide error type shared by lib and binary")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The anchor id is not present in the documentation file.
    #[error("anchor `{id}` not found in {}", file.display())]
    AnchorNotFound {
        /// Documentation file that was searched.
        file: PathBuf,
        /// Anchor id that was looked up.
        id: String,
    },

    /// An entry with this id is already tracked in the map.
    #[error("duplicate anchor id in map: `{id}`")]
    DuplicateId {
        /// The conflicting anchor id.
        id: String,
    },

    /// No map entry carries this id.
    #[error("no map entry with id `{id}`")]
    EntryNotFound {
        /// Anchor id that was looked up.
        id: String,
    },

    /// A code or documentation file is absent.
    #[error("no such file: {}", path.display())]
    FileNotFound {
        /// The absent path.
        path: PathBuf,
    },

    /// Code file above the analyzer's size cap.
    #[error("{} is {size_bytes} bytes, above the {max_bytes} byte limit", file.display())]
    FileTooLarge {
        /// Offending code file.
        file: PathBuf,
        /// The cap.
        max_bytes: u64,
        /// Its size.
        size_bytes: u64,
    },

    /// Filesystem failure.
    #[error("i/o error: {0}")]
    Io(
        /// Source error.
        #[from]
        std::io::Error,
    ),

    /// JSON (de)serialization of the anchor map failed.
    #[error("json: {0}")]
    Json(
        /// Source error.
        #[from]
        serde_json::Error,
    ),

    /// A `code_ref` value lacks the `path#symbol` separator.
    #[error("malformed code reference `{reference}`: expected path#symbol")]
    MalformedCodeRef {
        /// The raw reference text.
        reference: String,
    },

    /// Map file exists but its content violates the map invariants.
    #[error("anchor map corrupt: {reason}")]
    MapCorrupt {
        /// Description of the corruption.
        reason: String,
    },

    /// Expected map file does not exist on disk.
    #[error("anchor map not found: {}", path.display())]
    MapNotFound {
        /// Path to the missing map file.
        path: PathBuf,
    },

    /// A code file or `.docsync.toml` could not be parsed.
    #[error("cannot parse {}: {reason}", file.display())]
    ParseFailed {
        /// The unparseable file.
        file: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// The code file declares no symbol by this name.
    #[error("`{symbol}` is not declared in {}", file.display())]
    SymbolNotFound {
        /// Code file that was analyzed.
        file: PathBuf,
        /// Close matches among its declarations.
        suggestions: Vec<String>,
        /// The requested name.
        symbol: String,
    },

    /// `.docsync.toml` doesn't match the config schema.
    #[error("invalid config: {0}")]
    TomlDe(
        /// Source error.
        #[from]
        toml::de::Error,
    ),

    /// Code file in a language the analyzer doesn't know.
    #[error("unsupported source language `.{ext}`")]
    UnsupportedLanguage {
        /// Extension, no dot.
        ext: String,
    },

    /// The filesystem watcher could not be set up.
    #[error("watch failed: {reason}")]
    WatchFailed {
        /// Description of the watcher failure.
        reason: String,
    },
}
