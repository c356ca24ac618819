//! Fatal errors rendered as short markdown documents with a remedy.

use std::fmt::Write as _;
use std::io::IsTerminal as _;
use std::path::Path;

use crate::error::Error;

/// Headings are bolded when stderr is a terminal.
const BOLD: &str = "\x1b[1m";
/// Ends a bold run.
const RESET: &str = "\x1b[0m";

/// Print the markdown diagnostic for `e` to stderr.
pub fn print_error(e: &Error) {
    let styled = std::io::stderr().is_terminal();
    for line in render_error(e).lines() {
        match (styled, line.starts_with('#')) {
            (true, true) => eprintln!("{BOLD}{line}{RESET}"),
            _ => eprintln!("{line}"),
        }
    }
}

/// Markdown for `e`: a heading naming the failure, the detail, and a
/// `## Fix` section where one applies.
pub fn render_error(e: &Error) -> String {
    return match e {
        Error::MapNotFound { path } => render_map_not_found(path),
        Error::MapCorrupt { reason } => render_map_corrupt(reason),
        Error::SymbolNotFound { file, symbol, suggestions } => {
            render_symbol_not_found(&file.display().to_string(), symbol, suggestions)
        },
        Error::MalformedCodeRef { reference } => render_malformed_code_ref(reference),
        Error::UnsupportedLanguage { ext } => render_unsupported_language(ext),
        Error::FileTooLarge { file, size_bytes, max_bytes } => render_file_too_large(file, *size_bytes, *max_bytes),
        other => render_generic(other),
    };
}

/// Variants with no remedy beyond the message itself.
fn render_generic(e: &Error) -> String {
    return match e {
        Error::FileNotFound { path } => format!(
            "\
# Error: Missing File

Nothing at `{}`.
",
            path.display()
        ),

        Error::ParseFailed { file, reason } => format!(
            "\
# Error: Unparseable File

`{}`: {reason}
",
            file.display()
        ),

        Error::Json(e) => format!(
            "\
# Error: Invalid Anchor Map

{e}

## Fix

Restore the map from version control, or rebuild it:

    docsync init
"
        ),

        Error::TomlDe(e) => format!(
            "\
# Error: Invalid Config

{e}

## Fix

Correct `.docsync.toml`, or delete it and run `docsync init` to rewrite the defaults.
"
        ),

        Error::Io(e) => format!(
            "\
# Error: I/O

{e}
"
        ),

        _ => format!(
            "\
# Error

{e}
"
        ),
    };
}

/// Map file missing.
fn render_map_not_found(path: &Path) -> String {
    return format!(
        "\
# Error: Anchor Map Not Found

`{}` does not exist.

## Fix

Run `docsync init` to scan markdown for anchors and create the map:

    docsync init
",
        path.display()
    );
}

/// Map file present but invalid.
fn render_map_corrupt(reason: &str) -> String {
    return format!(
        "\
# Error: Anchor Map Corrupt

{reason}

## Fix

Each entry id must be unique and `version` must be `1.0.0`. Remove the
offending entries, or restore the map from version control.
"
    );
}

/// Unknown symbol, with close matches when there are any.
fn render_symbol_not_found(file: &str, symbol: &str, suggestions: &[String]) -> String {
    let mut out = format!(
        "\
# Error: Symbol Not Found

`{file}` declares no `{symbol}`.
"
    );

    if let Some(best) = suggestions.first() {
        let _ = write!(out, "\n## Did you mean `{best}`?\n\n");
        let _ = writeln!(out, "    {file}#{best}");
    }
    if suggestions.len() > 1 {
        out.push_str("\n## Similar symbols\n\n");
        for name in suggestions {
            let _ = writeln!(out, "- `{name}`");
        }
    }
    out.push_str(
        "\
\n## Fix

Methods are qualified by their type: `Type.method`.
",
    );
    return out;
}

/// A `code_ref` that isn't `path#symbol`.
fn render_malformed_code_ref(reference: &str) -> String {
    return format!(
        "\
# Error: Malformed Code Reference

`{reference}` is not of the form `path#symbol`.

## Fix

    docsync track docs/api.md src/lib.rs#my_function
"
    );
}

/// No grammar for the extension.
fn render_unsupported_language(ext: &str) -> String {
    return format!(
        "\
# Error: Unsupported Language

`.{ext}` files can't be analyzed, so symbols in them can't be tracked.

## Analyzable extensions

- `.rs` (Rust)
- `.ts`, `.tsx`, `.mts`, `.cts` (TypeScript)
- `.js`, `.jsx`, `.mjs`, `.cjs` (JavaScript)
- `.py` (Python)
- `.go` (Go)
"
    );
}

/// Source file above the analyzer limit.
fn render_file_too_large(file: &Path, size_bytes: u64, max_bytes: u64) -> String {
    return format!(
        "\
# Error: File Too Large

`{}` is {size_bytes} bytes; the analyzer stops at {max_bytes}.

## Fix

Move the documented symbol to a smaller file and update its `code_ref`.
",
        file.display()
    );
}
