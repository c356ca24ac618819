//! Content injection: rewrites the text between one anchor's markers, or
//! appends a new anchor block, without touching anything else in the file.

use std::path::Path;

use crate::anchor;
use crate::atomic::write_atomic;
use crate::error::Error;
use crate::types::SymbolRef;

/// Result of replacing an existing block's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Injection {
    /// The full document after injection.
    pub content: String,
    /// New line count minus old line count.
    pub lines_changed: i64,
}

/// Result of appending a new block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insertion {
    /// The full document after insertion.
    pub content: String,
    /// Id of the new block.
    pub id: String,
    /// New line count minus old line count.
    pub lines_changed: i64,
}

/// Replace the content of anchor `anchor_id` inside `source`.
///
/// Everything up to and including the start marker line, and everything from
/// the end marker line on, is kept byte for byte. Empty content puts the end
/// marker on the line right after the start marker.
///
/// # Errors
///
/// Returns `Error::AnchorNotFound` if the document has no well-formed anchor
/// with this id.
pub fn inject_into_content(
    file: &Path,
    source: &str,
    anchor_id: &str,
    new_content: &str,
) -> Result<Injection, Error> {
    let extraction = anchor::extract(file, source);
    let not_found = || {
        return Error::AnchorNotFound {
            file: file.to_path_buf(),
            id: anchor_id.to_string(),
        };
    };
    let target = extraction.find(anchor_id).ok_or_else(not_found)?;

    let before = source.get(..target.body_range.start).ok_or_else(not_found)?;
    let after = source.get(target.body_range.end..).ok_or_else(not_found)?;
    let content = if new_content.is_empty() {
        format!("{before}\n{after}")
    } else {
        format!("{before}\n{new_content}\n{after}")
    };
    let lines_changed = line_delta(source, &content);

    return Ok(Injection { content, lines_changed });
}

/// Replace the content of anchor `anchor_id` in the file at `path`.
/// With `write == false` the file is left alone and the would-be result returned.
///
/// # Errors
///
/// Returns `Error::FileNotFound` if the document is missing,
/// `Error::AnchorNotFound` if it holds no such anchor (the file is untouched),
/// or `Error::Io` if reading or the atomic write fails.
pub fn inject_into_file(path: &Path, anchor_id: &str, new_content: &str, write: bool) -> Result<Injection, Error> {
    let source = read_document(path)?;
    let injection = inject_into_content(path, &source, anchor_id, new_content)?;

    if write {
        write_atomic(path, injection.content.as_bytes())?;
        tracing::debug!(
            path = %path.display(),
            id = anchor_id,
            lines_changed = injection.lines_changed,
            "anchor content replaced"
        );
    }
    return Ok(injection);
}

/// Append a new block for `code_ref` with a fresh v4 UUID.
///
/// A missing document counts as empty. The block is separated from existing
/// content by one blank line. Parent directories are created only when writing.
///
/// # Errors
///
/// Returns `Error::Io` if the document exists but cannot be read, or the
/// write fails.
pub fn insert_into_file(
    path: &Path,
    code_ref: &SymbolRef,
    new_content: &str,
    write: bool,
) -> Result<Insertion, Error> {
    let source = match read_document(path) {
        Err(Error::FileNotFound { .. }) => String::new(),
        Err(e) => return Err(e),
        Ok(s) => s,
    };

    let id = uuid::Uuid::new_v4().to_string();
    let block = anchor::render_block(&id, code_ref, new_content);

    let mut content = source.clone();
    if !content.is_empty() {
        if !content.ends_with('\n') {
            content.push('\n');
        }
        content.push('\n');
    }
    content.push_str(&block);
    let lines_changed = line_delta(&source, &content);

    if write {
        write_atomic(path, content.as_bytes())?;
        tracing::debug!(path = %path.display(), id = %id, code_ref = %code_ref, "anchor block inserted");
    }
    return Ok(Insertion { content, id, lines_changed });
}

/// Read a markdown document, mapping a missing file to `Error::FileNotFound`.
///
/// # Errors
///
/// Returns `Error::FileNotFound` or `Error::Io`.
fn read_document(path: &Path) -> Result<String, Error> {
    return match std::fs::read_to_string(path) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::FileNotFound { path: path.to_path_buf() }),
        Err(e) => Err(Error::Io(e)),
        Ok(s) => Ok(s),
    };
}

/// Signed difference in line count between two versions of a document.
fn line_delta(old: &str, new: &str) -> i64 {
    let count = |s: &str| return i64::try_from(s.lines().count()).unwrap_or(i64::MAX);
    return count(new).saturating_sub(count(old));
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "# API\n\nIntro.\n\n<!-- docsync:start id=\"U1\" code_ref=\"src/a.ts#f\" -->\nOld line one.\n\n  Old indented.\n<!-- docsync:end id=\"U1\" -->\n\nFooter.\n";

    #[test]
    fn injecting_original_content_is_byte_identical() {
        let extraction = anchor::extract(Path::new("doc.md"), DOC);
        let original = &extraction.find("U1").unwrap().content;

        let injection = inject_into_content(Path::new("doc.md"), DOC, "U1", original).unwrap();

        assert_eq!(injection.content, DOC);
        assert_eq!(injection.lines_changed, 0);
    }

    #[test]
    fn adjacent_markers_survive_a_round_trip() {
        let doc = "<!-- docsync:start id=\"U1\" code_ref=\"a.rs#f\" -->\n<!-- docsync:end id=\"U1\" -->\n";
        let extraction = anchor::extract(Path::new("doc.md"), doc);
        let original = &extraction.find("U1").unwrap().content;
        assert_eq!(original, "");

        let injection = inject_into_content(Path::new("doc.md"), doc, "U1", original).unwrap();
        assert_eq!(injection.content, doc);
        assert_eq!(injection.lines_changed, 0);

        let filled = inject_into_content(Path::new("doc.md"), doc, "U1", "Now documented.").unwrap();
        assert!(filled.content.contains("-->\nNow documented.\n<!-- docsync:end"));
        assert_eq!(filled.lines_changed, 1);
    }

    #[test]
    fn replaces_only_the_block_body() {
        let injection = inject_into_content(Path::new("doc.md"), DOC, "U1", "New text.").unwrap();

        assert!(injection.content.starts_with("# API\n\nIntro.\n\n<!-- docsync:start id=\"U1\""));
        assert!(injection.content.contains("-->\nNew text.\n<!-- docsync:end id=\"U1\" -->\n\nFooter.\n"));
        assert!(!injection.content.contains("Old line one."));
        assert_eq!(injection.lines_changed, -2);
    }

    #[test]
    fn missing_anchor_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.md");
        std::fs::write(&path, DOC).unwrap();

        let err = inject_into_file(&path, "U9", "x", true).unwrap_err();

        assert!(matches!(err, Error::AnchorNotFound { id, .. } if id == "U9"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), DOC);
    }

    #[test]
    fn preview_does_not_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.md");
        std::fs::write(&path, DOC).unwrap();

        let injection = inject_into_file(&path, "U1", "Preview.", false).unwrap();

        assert!(injection.content.contains("Preview."));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), DOC);
    }

    #[test]
    fn insert_appends_block_after_blank_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.md");
        std::fs::write(&path, "# API").unwrap();
        let symbol = SymbolRef::new("src/a.ts", "g");

        let insertion = insert_into_file(&path, &symbol, "About g.", true).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, insertion.content);
        assert!(written.starts_with("# API\n\n<!-- docsync:start"));
        let extraction = anchor::extract(&path, &written);
        let inserted = extraction.find(&insertion.id).unwrap();
        assert_eq!(inserted.content, "About g.");
        assert_eq!(inserted.symbol, symbol);
        assert!(uuid::Uuid::parse_str(&insertion.id).is_ok());
    }

    #[test]
    fn insert_creates_parent_directories_only_when_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docs/new/api.md");
        let symbol = SymbolRef::new("src/a.ts", "g");

        insert_into_file(&path, &symbol, "About g.", false).unwrap();
        assert!(!path.parent().unwrap().exists());

        insert_into_file(&path, &symbol, "About g.", true).unwrap();
        assert!(path.exists());
    }
}
