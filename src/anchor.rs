//! Anchor extraction: finds `docsync:start` / `docsync:end` comment pairs in
//! markdown and reports structural problems without failing.
//!
//! A block looks like this:
//!
//! ```text
//! <!-- docsync:start id="6f1c..." code_ref="src/lib.rs#add" -->
//! managed content
//! <!-- docsync:end id="6f1c..." -->
//! ```
//!
//! The managed content is every line strictly between the two marker lines.
//! Offsets recorded on [`Anchor`] are the ones the injector replaces, so
//! extraction and injection always agree on where a block begins and ends.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::Error;
use crate::types::SymbolRef;

/// Matches one boundary comment. Markers never span lines.
#[allow(clippy::expect_used, reason = "hardcoded pattern, validity is a compile-time invariant")]
static MARKER: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"<!--\s*docsync:(start|end)\b(.*?)-->").expect("valid marker regex");
});

/// Matches one `key="value"` attribute inside a marker.
#[allow(clippy::expect_used, reason = "hardcoded pattern, validity is a compile-time invariant")]
static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r#"([A-Za-z_][A-Za-z0-9_-]*)\s*=\s*"([^"]*)""#).expect("valid attribute regex");
});

/// A boundary-delimited markdown region documenting one code symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    /// Byte range replaced by the injector: from the newline ending the start
    /// marker line up to the first byte of the end marker line.
    pub body_range: Range<usize>,
    /// Raw `code_ref` attribute text (`path#symbol`), empty when absent.
    pub code_ref: String,
    /// Exact text between the two marker lines.
    pub content: String,
    /// Byte range of `content` within the document.
    pub content_range: Range<usize>,
    /// Byte offset just past the end marker's closing `-->`.
    pub end_offset: usize,
    /// Stable anchor identifier (a UUID for generated blocks).
    pub id: String,
    /// One-based line number of the start marker.
    pub line: u32,
    /// Byte offset of the start marker's opening `<!--`.
    pub start_offset: usize,
    /// Parsed `code_ref`. The symbol name is empty when the reference is malformed.
    pub symbol: SymbolRef,
}

/// A structural problem found while extracting anchors. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnchorIssue {
    /// A second block reuses an id. The first block wins.
    DuplicateId {
        /// Line of the first block with this id.
        first_line: u32,
        /// The repeated id.
        id: String,
        /// Line of the repeated start marker.
        line: u32,
    },
    /// The `code_ref` attribute is missing or lacks `#`.
    MalformedCodeRef {
        /// Raw attribute text.
        code_ref: String,
        /// Anchor id.
        id: String,
        /// Line of the start marker.
        line: u32,
    },
    /// A marker without an `id` attribute.
    MissingId {
        /// Line of the marker.
        line: u32,
    },
    /// A start marker appeared while another block was still open.
    Nested {
        /// Id of the inner block.
        id: String,
        /// Line of the inner start marker.
        line: u32,
        /// Id of the enclosing block.
        outer_id: String,
    },
    /// An end marker with no open start marker of the same id.
    Orphaned {
        /// Id on the end marker.
        id: String,
        /// Line of the end marker.
        line: u32,
    },
    /// Start and end markers share one line, leaving no content lines.
    SameLine {
        /// Anchor id.
        id: String,
        /// Line of both markers.
        line: u32,
    },
    /// A start marker never closed before end of file.
    Unclosed {
        /// Anchor id.
        id: String,
        /// Line of the start marker.
        line: u32,
    },
}

impl AnchorIssue {
    /// One-based line the issue points at.
    pub const fn line(&self) -> u32 {
        return match self {
            AnchorIssue::DuplicateId { line, .. }
            | AnchorIssue::MalformedCodeRef { line, .. }
            | AnchorIssue::MissingId { line }
            | AnchorIssue::Nested { line, .. }
            | AnchorIssue::Orphaned { line, .. }
            | AnchorIssue::SameLine { line, .. }
            | AnchorIssue::Unclosed { line, .. } => *line,
        };
    }
}

impl fmt::Display for AnchorIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return match self {
            AnchorIssue::DuplicateId { id, first_line, .. } => {
                write!(f, "duplicate anchor id `{id}` (first defined on line {first_line})")
            },
            AnchorIssue::MalformedCodeRef { id, code_ref, .. } => {
                write!(f, "anchor `{id}` has malformed code_ref \"{code_ref}\" (expected path#symbol)")
            },
            AnchorIssue::MissingId { .. } => write!(f, "marker without an id attribute"),
            AnchorIssue::Nested { id, outer_id, .. } => {
                write!(f, "anchor `{id}` opened inside anchor `{outer_id}`; inner block ignored")
            },
            AnchorIssue::Orphaned { id, .. } => write!(f, "end marker for `{id}` has no matching start"),
            AnchorIssue::SameLine { id, .. } => {
                write!(f, "anchor `{id}` opens and closes on the same line")
            },
            AnchorIssue::Unclosed { id, .. } => write!(f, "anchor `{id}` is never closed"),
        };
    }
}

/// Result of extracting one markdown document.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Well-formed anchors in document order, first occurrence per id.
    pub anchors: Vec<Anchor>,
    /// The document the anchors came from.
    pub file: PathBuf,
    /// Structural problems, in document order.
    pub issues: Vec<AnchorIssue>,
}

impl Extraction {
    /// Find the anchor carrying `id`.
    pub fn find(&self, id: &str) -> Option<&Anchor> {
        return self.anchors.iter().find(|a| return a.id == id);
    }

    /// Find the first anchor documenting `symbol`.
    pub fn find_by_symbol(&self, symbol: &SymbolRef) -> Option<&Anchor> {
        return self.anchors.iter().find(|a| return &a.symbol == symbol);
    }

    /// Issues rendered as `file:line: message`.
    pub fn messages(&self) -> Vec<String> {
        return self
            .issues
            .iter()
            .map(|issue| return format!("{}:{}: {issue}", self.file.display(), issue.line()))
            .collect();
    }
}

/// Which side of a block a marker sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarkerKind {
    /// `docsync:end`
    End,
    /// `docsync:start`
    Start,
}

/// One boundary comment found in the document.
#[derive(Debug)]
struct Marker {
    /// `code_ref` attribute, if any.
    code_ref: Option<String>,
    /// `id` attribute, if any.
    id: Option<String>,
    /// Start or end.
    kind: MarkerKind,
    /// One-based line number.
    line: u32,
    /// Byte range of the whole comment.
    range: Range<usize>,
}

/// A start marker waiting for its end marker.
struct OpenBlock {
    /// Raw `code_ref`.
    code_ref: Option<String>,
    /// Block id.
    id: String,
    /// Line of the start marker.
    line: u32,
    /// Byte range of the start marker.
    range: Range<usize>,
}

/// Extract all anchors from a markdown document.
///
/// Structural problems are collected in [`Extraction::issues`]; only
/// well-formed, non-duplicate blocks appear in [`Extraction::anchors`].
/// A block with a malformed `code_ref` is still returned (with an empty
/// symbol name) so callers can surface the problem against a real anchor.
pub fn extract(file_path: &Path, content: &str) -> Extraction {
    let mut extraction = Extraction {
        anchors: Vec::new(),
        file: file_path.to_path_buf(),
        issues: Vec::new(),
    };
    let mut open: Option<OpenBlock> = None;
    let mut first_lines: HashMap<String, u32> = HashMap::new();
    let mut swallowed: HashSet<String> = HashSet::new();

    for marker in find_markers(content) {
        let Some(id) = marker.id.clone() else {
            extraction.issues.push(AnchorIssue::MissingId { line: marker.line });
            continue;
        };

        match marker.kind {
            MarkerKind::Start => {
                if let Some(outer) = &open {
                    if outer.id != id {
                        swallowed.insert(id.clone());
                    }
                    extraction.issues.push(AnchorIssue::Nested {
                        id,
                        line: marker.line,
                        outer_id: outer.id.clone(),
                    });
                    continue;
                }
                open = Some(OpenBlock {
                    code_ref: marker.code_ref,
                    id,
                    line: marker.line,
                    range: marker.range,
                });
            },
            MarkerKind::End => {
                match open.take() {
                    Some(block) if block.id == id => {
                        close_block(content, block, &marker, &mut first_lines, &mut extraction);
                    },
                    still_open => {
                        open = still_open;
                        if !swallowed.remove(&id) {
                            extraction.issues.push(AnchorIssue::Orphaned { id, line: marker.line });
                        }
                    },
                }
            },
        }
    }

    if let Some(block) = open {
        extraction.issues.push(AnchorIssue::Unclosed { id: block.id, line: block.line });
    }

    return extraction;
}

/// Split a `path#symbol` reference on its last `#`.
///
/// # Errors
///
/// Returns `Error::MalformedCodeRef` if there is no `#`, or either side is empty.
pub fn parse_code_ref(reference: &str) -> Result<SymbolRef, Error> {
    let malformed = || {
        return Error::MalformedCodeRef {
            reference: reference.to_string(),
        };
    };
    let (path, symbol) = reference.rsplit_once('#').ok_or_else(malformed)?;
    if path.trim().is_empty() || symbol.trim().is_empty() {
        return Err(malformed());
    }
    return Ok(SymbolRef::new(path.trim(), symbol.trim()));
}

/// Render a complete anchor block, terminated by a newline.
pub fn render_block(id: &str, symbol: &SymbolRef, content: &str) -> String {
    return format!(
        "{}\n{content}\n{}\n",
        start_marker(id, symbol),
        end_marker(id)
    );
}

/// Render a start marker comment.
pub fn start_marker(id: &str, symbol: &SymbolRef) -> String {
    return format!("<!-- docsync:start id=\"{id}\" code_ref=\"{symbol}\" -->");
}

/// Render an end marker comment.
pub fn end_marker(id: &str) -> String {
    return format!("<!-- docsync:end id=\"{id}\" -->");
}

/// Turn a matched start/end pair into an anchor, or record why it can't be one.
fn close_block(
    content: &str,
    block: OpenBlock,
    end: &Marker,
    first_lines: &mut HashMap<String, u32>,
    extraction: &mut Extraction,
) {
    if let Some(&first_line) = first_lines.get(&block.id) {
        extraction.issues.push(AnchorIssue::DuplicateId {
            first_line,
            id: block.id,
            line: block.line,
        });
        return;
    }

    let Some(body_range) = body_range(content, &block.range, &end.range) else {
        extraction.issues.push(AnchorIssue::SameLine { id: block.id, line: block.line });
        return;
    };
    let content_range = content_range(&body_range);
    let text = content.get(content_range.clone()).unwrap_or_default().to_string();

    let raw_ref = block.code_ref.unwrap_or_default();
    let symbol = match parse_code_ref(&raw_ref) {
        Ok(symbol) => symbol,
        Err(_malformed) => {
            extraction.issues.push(AnchorIssue::MalformedCodeRef {
                code_ref: raw_ref.clone(),
                id: block.id.clone(),
                line: block.line,
            });
            let path = raw_ref.split_once('#').map_or(raw_ref.as_str(), |(p, _)| return p);
            SymbolRef::new(path, "")
        },
    };

    first_lines.insert(block.id.clone(), block.line);
    extraction.anchors.push(Anchor {
        body_range,
        code_ref: raw_ref,
        content: text,
        content_range,
        end_offset: end.range.end,
        id: block.id,
        line: block.line,
        start_offset: block.range.start,
        symbol,
    });
}

/// The replaceable region between two markers: the newline that ends the
/// start marker's line through the start of the end marker's line.
/// `None` when both markers sit on one line.
fn body_range(content: &str, start: &Range<usize>, end: &Range<usize>) -> Option<Range<usize>> {
    let after_start = content.get(start.end..end.start)?;
    let newline = after_start.find('\n')?;
    let head = start.end.saturating_add(newline);
    let before_end = content.get(..end.start)?;
    let tail = before_end.rfind('\n').map_or(head, |i| return i.saturating_add(1));
    return Some(head..tail);
}

/// Content lies strictly inside the body range: after its leading newline and
/// before its trailing one. Adjacent marker lines give an empty range.
fn content_range(body: &Range<usize>) -> Range<usize> {
    let start = body.start.saturating_add(1);
    let end = body.end.saturating_sub(1).max(start);
    return start.min(body.end)..end;
}

/// Scan the document for boundary comments, tracking line numbers as we go.
fn find_markers(content: &str) -> Vec<Marker> {
    let mut markers = Vec::new();
    let mut line: u32 = 1;
    let mut counted_to = 0_usize;

    for caps in MARKER.captures_iter(content) {
        let Some(whole) = caps.get(0) else { continue };
        let skipped = content.get(counted_to..whole.start()).unwrap_or_default();
        let newlines = u32::try_from(skipped.matches('\n').count()).unwrap_or(u32::MAX);
        line = line.saturating_add(newlines);
        counted_to = whole.start();

        let kind = match caps.get(1).map(|m| return m.as_str()) {
            Some("start") => MarkerKind::Start,
            _ => MarkerKind::End,
        };
        let attributes = parse_attributes(caps.get(2).map_or("", |m| return m.as_str()));

        markers.push(Marker {
            code_ref: attributes.get("code_ref").cloned(),
            id: attributes.get("id").filter(|v| return !v.is_empty()).cloned(),
            kind,
            line,
            range: whole.range(),
        });
    }

    return markers;
}

/// Collect `key="value"` pairs. Later duplicates of a key are ignored.
fn parse_attributes(text: &str) -> HashMap<String, String> {
    let mut attributes = HashMap::new();
    for caps in ATTRIBUTE.captures_iter(text) {
        let (Some(key), Some(value)) = (caps.get(1), caps.get(2)) else { continue };
        attributes
            .entry(key.as_str().to_string())
            .or_insert_with(|| return value.as_str().to_string());
    }
    return attributes;
}
