//! Signature extraction: turns a code file into the list of symbols it
//! declares, each with its signature text and a comment-insensitive hash.
//!
//! The [`Analyzer`] trait is the seam the drift detector depends on; the
//! tree-sitter implementation below is the one the CLI uses.

use std::ops::Range;
use std::path::Path;

use sha2::{Digest as _, Sha256};
use tree_sitter::{Language, Node, Parser, Tree};

use crate::error::Error;
use crate::grammar;
use crate::types::{CodeSignature, SignatureHash, SymbolKind};

/// Maximum source file size (16 MiB).
const MAX_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Produces the signatures declared in a code file.
///
/// Implementations must be deterministic: the same file content always yields
/// the same hashes, and comments or whitespace never affect a hash.
pub trait Analyzer: Sync {
    /// All signatures declared in the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    fn analyze_file(&self, path: &Path) -> Result<Vec<CodeSignature>, Error>;
}

/// Tree-sitter backed analyzer for Rust, TypeScript/JavaScript, Python, and Go.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeSitterAnalyzer;

impl Analyzer for TreeSitterAnalyzer {
    fn analyze_file(&self, path: &Path) -> Result<Vec<CodeSignature>, Error> {
        let source = match std::fs::read_to_string(path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::FileNotFound { path: path.to_path_buf() });
            },
            Err(e) => return Err(Error::Io(e)),
            Ok(s) => s,
        };
        return analyze_source(path, &source);
    }
}

/// Analyze already-loaded source text. `path` selects the grammar.
///
/// # Errors
///
/// Returns `Error::UnsupportedLanguage` for unknown extensions,
/// `Error::FileTooLarge` if the source exceeds the size limit,
/// or `Error::ParseFailed` if tree-sitter cannot parse the source.
pub fn analyze_source(path: &Path, source: &str) -> Result<Vec<CodeSignature>, Error> {
    let source_len: u64 = source.len().try_into().unwrap_or(u64::MAX);
    if source_len > MAX_FILE_SIZE {
        return Err(Error::FileTooLarge {
            file: path.to_path_buf(),
            max_bytes: MAX_FILE_SIZE,
            size_bytes: source_len,
        });
    }

    let language = grammar::language_for_path(path)?;
    let tree = parse_source(path, source, &language)?;
    let ext = path.extension().and_then(|e| return e.to_str()).unwrap_or("");
    let declarations = collect_declarations(tree.root_node(), source, ext);

    return Ok(declarations
        .iter()
        .map(|decl| return declaration_to_signature(decl, source))
        .collect());
}

/// Find a signature by exact (qualified) symbol name. First match wins.
pub fn find_signature<'a>(signatures: &'a [CodeSignature], name: &str) -> Option<&'a CodeSignature> {
    return signatures.iter().find(|s| return s.symbol_name == name);
}

/// Symbol names that look like `name`, for "did you mean" hints.
pub fn suggest_names(signatures: &[CodeSignature], name: &str) -> Vec<String> {
    let wanted = name.rsplit('.').next().unwrap_or(name).to_lowercase();
    return signatures
        .iter()
        .filter(|s| {
            let last = s.symbol_name.rsplit('.').next().unwrap_or(&s.symbol_name).to_lowercase();
            return last.contains(&wanted) || wanted.contains(&last);
        })
        .map(|s| return s.symbol_name.clone())
        .collect();
}

/// Parse source into a tree-sitter tree.
///
/// # Errors
///
/// Returns `Error::ParseFailed` if the language cannot be set or parsing fails.
fn parse_source(file_path: &Path, source: &str, language: &Language) -> Result<Tree, Error> {
    let mut parser = Parser::new();
    parser.set_language(language).map_err(|e| {
        return Error::ParseFailed {
            file: file_path.to_path_buf(),
            reason: e.to_string(),
        };
    })?;

    return parser.parse(source, None).ok_or_else(|| {
        return Error::ParseFailed {
            file: file_path.to_path_buf(),
            reason: "tree-sitter returned None".to_string(),
        };
    });
}

/// A named declaration found while walking the CST.
struct Declaration<'tree> {
    /// Byte ranges (bodies) left out of the signature.
    elided: Vec<Range<usize>>,
    /// Whether the symbol is visible outside its module.
    exported: bool,
    /// Declaration kind.
    kind: SymbolKind,
    /// Node spanning the whole declaration.
    node: Node<'tree>,
    /// `name` or `Parent.name`.
    qualified_name: String,
}

/// Build the public signature for one declaration.
fn declaration_to_signature(decl: &Declaration<'_>, source: &str) -> CodeSignature {
    let normalized = normalize_signature_tokens(decl.node, source, &decl.elided);
    let digest = Sha256::digest(normalized.as_bytes());

    return CodeSignature {
        hash: Some(SignatureHash(format!("{digest:x}"))),
        is_exported: decl.exported,
        symbol_name: decl.qualified_name.clone(),
        symbol_type: decl.kind,
        signature_text: render_signature_text(decl.node, source, &decl.elided),
    };
}

/// Dispatch to the correct collector based on file extension.
fn collect_declarations<'tree>(root: Node<'tree>, source: &str, ext: &str) -> Vec<Declaration<'tree>> {
    return match ext {
        "go" => collect_go_declarations(root, source),
        "py" => collect_python_declarations(root, source),
        "rs" => collect_rust_declarations(root, source),
        "ts" | "tsx" | "js" | "jsx" | "mjs" | "cjs" | "mts" | "cts" => collect_ts_declarations(root, source),
        _ => Vec::new(),
    };
}

// ── Normalization ──────────────────────────────────────────────────────

/// Walk leaf nodes, skip comments, whitespace, and elided bodies, join with single spaces.
fn normalize_signature_tokens(node: Node<'_>, source: &str, elided: &[Range<usize>]) -> String {
    let mut tokens = Vec::new();
    collect_signature_leaf_tokens(node, source, elided, &mut tokens);
    return tokens.join(" ");
}

/// Recursively collect non-comment, non-whitespace leaf token text outside elided ranges.
fn collect_signature_leaf_tokens<'a>(
    node: Node<'_>,
    source: &'a str,
    elided: &[Range<usize>],
    tokens: &mut Vec<&'a str>,
) {
    if is_within(node.byte_range(), elided) {
        return;
    }

    if node.child_count() == 0 {
        if node.kind().contains("comment") {
            return;
        }
        let text = source.get(node.byte_range()).unwrap_or_default().trim();
        if !text.is_empty() {
            tokens.push(text);
        }
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_signature_leaf_tokens(child, source, elided, tokens);
    }
}

/// Source text of the declaration with bodies replaced by `{ ... }`.
/// A body that runs to the end of the declaration is dropped entirely.
fn render_signature_text(node: Node<'_>, source: &str, elided: &[Range<usize>]) -> String {
    let range = node.byte_range();
    let mut sorted: Vec<&Range<usize>> = elided.iter().collect();
    sorted.sort_by_key(|r| return r.start);

    let mut out = String::new();
    let mut cursor = range.start;
    for body in sorted {
        if body.start < cursor {
            continue;
        }
        out.push_str(source.get(cursor..body.start).unwrap_or_default());
        if body.end < range.end {
            out.push_str("{ ... }");
        }
        cursor = body.end;
    }
    out.push_str(source.get(cursor..range.end).unwrap_or_default());
    return out.trim().to_string();
}

/// Whether `range` lies entirely inside one of `elided`.
fn is_within(range: Range<usize>, elided: &[Range<usize>]) -> bool {
    return elided.iter().any(|e| return e.start <= range.start && range.end <= e.end);
}

/// UTF-8 text of a node's `field`.
fn field_text<'s>(node: Node<'_>, field: &str, source: &'s str) -> Option<&'s str> {
    let child = node.child_by_field_name(field)?;
    return child.utf8_text(source.as_bytes()).ok();
}

/// Byte range of a node's `body` field.
fn body_range(node: Node<'_>) -> Option<Range<usize>> {
    return node.child_by_field_name("body").map(|b| return b.byte_range());
}

/// Bodies of function-like children of a container body (class, trait, impl).
fn nested_function_bodies(container_body: Node<'_>) -> Vec<Range<usize>> {
    let mut bodies = Vec::new();
    let mut cursor = container_body.walk();
    for child in container_body.children(&mut cursor) {
        let target = unwrap_decorated(child);
        match target.kind() {
            "function_item" | "method_definition" | "function_definition" => {
                bodies.extend(body_range(target));
            },
            _ => {},
        }
    }
    return bodies;
}

/// Python wraps decorated functions/classes; look through the wrapper.
fn unwrap_decorated(node: Node<'_>) -> Node<'_> {
    if node.kind() == "decorated_definition" {
        return node.child_by_field_name("definition").unwrap_or(node);
    }
    return node;
}

// ── Rust ───────────────────────────────────────────────────────────────

/// Walk the tree and collect all named Rust declarations.
fn collect_rust_declarations<'tree>(root: Node<'tree>, source: &str) -> Vec<Declaration<'tree>> {
    let mut declarations = Vec::new();
    let mut cursor = root.walk();

    for node in root.children(&mut cursor) {
        if let Some(decl) = rust_top_level_declaration(node, source) {
            declarations.push(decl);
        }
        if node.kind() == "impl_item" {
            collect_impl_methods(node, source, &mut declarations);
        }
    }

    return declarations;
}

/// Whether a Rust item carries a `pub` visibility modifier.
fn rust_is_public(node: Node<'_>) -> bool {
    let mut cursor = node.walk();
    return node.children(&mut cursor).any(|c| return c.kind() == "visibility_modifier");
}

/// Try to extract a top-level declaration from a Rust CST node.
fn rust_top_level_declaration<'tree>(node: Node<'tree>, source: &str) -> Option<Declaration<'tree>> {
    let (kind, elided) = match node.kind() {
        "function_item" => (SymbolKind::Function, body_range(node).into_iter().collect()),
        "const_item" | "static_item" => (SymbolKind::Constant, Vec::new()),
        "struct_item" => (SymbolKind::Struct, Vec::new()),
        "enum_item" => (SymbolKind::Enum, Vec::new()),
        "type_item" => (SymbolKind::TypeAlias, Vec::new()),
        "trait_item" => {
            let bodies = node.child_by_field_name("body").map(nested_function_bodies).unwrap_or_default();
            (SymbolKind::Trait, bodies)
        },
        _ => return None,
    };

    let name = field_text(node, "name", source)?.to_string();
    return Some(Declaration {
        elided,
        exported: rust_is_public(node),
        kind,
        node,
        qualified_name: name,
    });
}

/// Collect methods from a Rust impl block, qualified as "Type.method".
/// Methods of trait impls are public whenever the trait is.
fn collect_impl_methods<'tree>(
    impl_node: Node<'tree>,
    source: &str,
    declarations: &mut Vec<Declaration<'tree>>,
) {
    let Some(type_name) = field_text(impl_node, "type", source) else {
        return;
    };
    let is_trait_impl = impl_node.child_by_field_name("trait").is_some();
    let Some(body) = impl_node.child_by_field_name("body") else {
        return;
    };

    let mut cursor = body.walk();
    for child in body.children(&mut cursor) {
        if child.kind() != "function_item" {
            continue;
        }
        let Some(method_name) = field_text(child, "name", source) else {
            continue;
        };
        declarations.push(Declaration {
            elided: body_range(child).into_iter().collect(),
            exported: is_trait_impl || rust_is_public(child),
            kind: SymbolKind::Method,
            node: child,
            qualified_name: format!("{type_name}.{method_name}"),
        });
    }
}

// ── TypeScript / JavaScript ────────────────────────────────────────────

/// Walk the tree and collect all named TypeScript declarations,
/// looking through `export` statements.
fn collect_ts_declarations<'tree>(root: Node<'tree>, source: &str) -> Vec<Declaration<'tree>> {
    let mut declarations = Vec::new();
    let mut cursor = root.walk();

    for node in root.children(&mut cursor) {
        let (inner, exported) = if node.kind() == "export_statement" {
            match node.child_by_field_name("declaration") {
                Some(decl) => (decl, true),
                None => continue,
            }
        } else {
            (node, false)
        };

        if let Some(decl) = ts_top_level_declaration(inner, source, exported) {
            declarations.push(decl);
        }
        match inner.kind() {
            "class_declaration" | "abstract_class_declaration" => {
                collect_ts_class_methods(inner, source, exported, &mut declarations);
            },
            "lexical_declaration" | "variable_declaration" => {
                collect_ts_variable_declarators(inner, source, exported, &mut declarations);
            },
            _ => {},
        }
    }

    return declarations;
}

/// Try to extract a top-level TypeScript declaration with a direct "name" field.
fn ts_top_level_declaration<'tree>(
    node: Node<'tree>,
    source: &str,
    exported: bool,
) -> Option<Declaration<'tree>> {
    let (kind, elided) = match node.kind() {
        "function_declaration" | "generator_function_declaration" | "function_signature" => {
            (SymbolKind::Function, body_range(node).into_iter().collect())
        },
        "class_declaration" | "abstract_class_declaration" => {
            let bodies = node.child_by_field_name("body").map(nested_function_bodies).unwrap_or_default();
            (SymbolKind::Class, bodies)
        },
        "interface_declaration" => (SymbolKind::Interface, Vec::new()),
        "type_alias_declaration" => (SymbolKind::TypeAlias, Vec::new()),
        "enum_declaration" => (SymbolKind::Enum, Vec::new()),
        _ => return None,
    };

    let name = field_text(node, "name", source)?.to_string();
    return Some(Declaration {
        elided,
        exported,
        kind,
        node,
        qualified_name: name,
    });
}

/// Collect class methods as "Class.method". Private members are never exported.
fn collect_ts_class_methods<'tree>(
    class: Node<'tree>,
    source: &str,
    class_exported: bool,
    declarations: &mut Vec<Declaration<'tree>>,
) {
    let Some(class_name) = field_text(class, "name", source) else {
        return;
    };
    let Some(body) = class.child_by_field_name("body") else {
        return;
    };

    let mut cursor = body.walk();
    for member in body.children(&mut cursor) {
        if member.kind() != "method_definition" {
            continue;
        }
        let Some(method_name) = field_text(member, "name", source) else {
            continue;
        };
        let is_private = {
            let mut member_cursor = member.walk();
            member.children(&mut member_cursor).any(|c| {
                return c.kind() == "accessibility_modifier"
                    && c.utf8_text(source.as_bytes()).is_ok_and(|t| return t == "private");
            })
        };
        declarations.push(Declaration {
            elided: body_range(member).into_iter().collect(),
            exported: class_exported && !is_private && !method_name.starts_with('#'),
            kind: SymbolKind::Method,
            node: member,
            qualified_name: format!("{class_name}.{method_name}"),
        });
    }
}

/// Extract variable names from a `lexical_declaration` (const/let/var).
/// Uses the parent declaration's range so the hash covers the full
/// `const X = ...;` statement. Arrow and function expressions count as
/// functions and have their bodies elided.
fn collect_ts_variable_declarators<'tree>(
    node: Node<'tree>,
    source: &str,
    exported: bool,
    declarations: &mut Vec<Declaration<'tree>>,
) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() != "variable_declarator" {
            continue;
        }
        let Some(name) = field_text(child, "name", source) else {
            continue;
        };
        let function_body = child
            .child_by_field_name("value")
            .filter(|v| {
                return matches!(v.kind(), "arrow_function" | "function_expression" | "function");
            })
            .and_then(body_range);
        let kind = if function_body.is_some() { SymbolKind::Function } else { SymbolKind::Variable };

        declarations.push(Declaration {
            elided: function_body.into_iter().collect(),
            exported,
            kind,
            node,
            qualified_name: name.to_string(),
        });
    }
}

// ── Python ─────────────────────────────────────────────────────────────

/// Collect top-level functions and classes, plus class methods as "Class.method".
/// Names starting with `_` are module-private.
fn collect_python_declarations<'tree>(root: Node<'tree>, source: &str) -> Vec<Declaration<'tree>> {
    let mut declarations = Vec::new();
    let mut cursor = root.walk();

    for outer in root.children(&mut cursor) {
        let node = unwrap_decorated(outer);
        let Some(name) = field_text(node, "name", source) else {
            continue;
        };
        let exported = !name.starts_with('_');

        match node.kind() {
            "function_definition" => declarations.push(Declaration {
                elided: body_range(node).into_iter().collect(),
                exported,
                kind: SymbolKind::Function,
                node: outer,
                qualified_name: name.to_string(),
            }),
            "class_definition" => {
                let Some(body) = node.child_by_field_name("body") else {
                    continue;
                };
                declarations.push(Declaration {
                    elided: nested_function_bodies(body),
                    exported,
                    kind: SymbolKind::Class,
                    node: outer,
                    qualified_name: name.to_string(),
                });
                collect_python_methods(body, name, exported, source, &mut declarations);
            },
            _ => {},
        }
    }

    return declarations;
}

/// Methods of a Python class body.
fn collect_python_methods<'tree>(
    body: Node<'tree>,
    class_name: &str,
    class_exported: bool,
    source: &str,
    declarations: &mut Vec<Declaration<'tree>>,
) {
    let mut cursor = body.walk();
    for outer in body.children(&mut cursor) {
        let node = unwrap_decorated(outer);
        if node.kind() != "function_definition" {
            continue;
        }
        let Some(name) = field_text(node, "name", source) else {
            continue;
        };
        let dunder = name.starts_with("__") && name.ends_with("__");
        declarations.push(Declaration {
            elided: body_range(node).into_iter().collect(),
            exported: class_exported && (dunder || !name.starts_with('_')),
            kind: SymbolKind::Method,
            node: outer,
            qualified_name: format!("{class_name}.{name}"),
        });
    }
}

// ── Go ─────────────────────────────────────────────────────────────────

/// Collect Go functions, methods (qualified by receiver type), types, and constants.
/// Capitalized names are exported.
fn collect_go_declarations<'tree>(root: Node<'tree>, source: &str) -> Vec<Declaration<'tree>> {
    let mut declarations = Vec::new();
    let mut cursor = root.walk();

    for node in root.children(&mut cursor) {
        match node.kind() {
            "function_declaration" => {
                let Some(name) = field_text(node, "name", source) else { continue };
                declarations.push(Declaration {
                    elided: body_range(node).into_iter().collect(),
                    exported: go_is_exported(name),
                    kind: SymbolKind::Function,
                    node,
                    qualified_name: name.to_string(),
                });
            },
            "method_declaration" => {
                let Some(name) = field_text(node, "name", source) else { continue };
                let receiver = node
                    .child_by_field_name("receiver")
                    .and_then(|r| return first_type_identifier(r, source))
                    .unwrap_or_default();
                let qualified_name = if receiver.is_empty() {
                    name.to_string()
                } else {
                    format!("{receiver}.{name}")
                };
                declarations.push(Declaration {
                    elided: body_range(node).into_iter().collect(),
                    exported: go_is_exported(name),
                    kind: SymbolKind::Method,
                    node,
                    qualified_name,
                });
            },
            "type_declaration" | "const_declaration" => {
                collect_go_specs(node, source, &mut declarations);
            },
            _ => {},
        }
    }

    return declarations;
}

/// `type_spec` / `const_spec` children of a grouped or single declaration.
fn collect_go_specs<'tree>(node: Node<'tree>, source: &str, declarations: &mut Vec<Declaration<'tree>>) {
    let mut cursor = node.walk();
    for spec in node.children(&mut cursor) {
        let kind = match spec.kind() {
            "type_spec" | "type_alias" => match spec.child_by_field_name("type").map(|t| return t.kind()) {
                Some("struct_type") => SymbolKind::Struct,
                Some("interface_type") => SymbolKind::Interface,
                _ => SymbolKind::TypeAlias,
            },
            "const_spec" => SymbolKind::Constant,
            _ => continue,
        };
        let Some(name) = field_text(spec, "name", source) else { continue };
        declarations.push(Declaration {
            elided: Vec::new(),
            exported: go_is_exported(name),
            kind,
            node: spec,
            qualified_name: name.to_string(),
        });
    }
}

/// Go exports identifiers that start with an uppercase letter.
fn go_is_exported(name: &str) -> bool {
    return name.chars().next().is_some_and(char::is_uppercase);
}

/// Depth-first search for the first `type_identifier` (the receiver's type name).
fn first_type_identifier(node: Node<'_>, source: &str) -> Option<String> {
    if node.kind() == "type_identifier" {
        return node.utf8_text(source.as_bytes()).ok().map(String::from);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = first_type_identifier(child, source) {
            return Some(found);
        }
    }
    return None;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(name: &str, source: &str) -> Vec<CodeSignature> {
        analyze_source(Path::new(name), source).unwrap()
    }

    fn hash_of(sigs: &[CodeSignature], name: &str) -> SignatureHash {
        find_signature(sigs, name).unwrap().hash.clone().unwrap()
    }

    #[test]
    fn rust_function_signature_excludes_body() {
        let sigs = analyze("lib.rs", "/// Adds.\npub fn add(a: i32, b: i32) -> i32 {\n    a + b\n}\n");
        let add = find_signature(&sigs, "add").unwrap();

        assert_eq!(add.signature_text, "pub fn add(a: i32, b: i32) -> i32");
        assert_eq!(add.symbol_type, SymbolKind::Function);
        assert!(add.is_exported);
    }

    #[test]
    fn body_and_comment_changes_keep_hash() {
        let before = analyze("lib.rs", "pub fn add(a: i32, b: i32) -> i32 { a + b }\n");
        let after = analyze(
            "lib.rs",
            "pub fn add(\n    a: i32, // left\n    b: i32,\n) -> i32 {\n    b + a\n}\n",
        );
        assert_eq!(hash_of(&before, "add"), hash_of(&after, "add"));
    }

    #[test]
    fn parameter_change_changes_hash() {
        let before = analyze("lib.rs", "pub fn add(a: i32, b: i32) -> i32 { a + b }\n");
        let after = analyze("lib.rs", "pub fn add(a: i64, b: i64) -> i64 { a + b }\n");
        assert_ne!(hash_of(&before, "add"), hash_of(&after, "add"));
    }

    #[test]
    fn rust_impl_methods_are_qualified() {
        let sigs = analyze(
            "lib.rs",
            "struct Config;\nimpl Config {\n    pub fn validate(&self) -> bool { true }\n    fn helper(&self) {}\n}\n",
        );
        let validate = find_signature(&sigs, "Config.validate").unwrap();
        assert_eq!(validate.symbol_type, SymbolKind::Method);
        assert!(validate.is_exported);
        assert!(!find_signature(&sigs, "Config.helper").unwrap().is_exported);
        assert!(!find_signature(&sigs, "Config").unwrap().is_exported);
    }

    #[test]
    fn typescript_exports_are_detected() {
        let sigs = analyze(
            "a.ts",
            "export function f(x: number): number { return x; }\nfunction g() {}\nexport const h = (s: string): string => s.trim();\n",
        );
        assert!(find_signature(&sigs, "f").unwrap().is_exported);
        assert!(!find_signature(&sigs, "g").unwrap().is_exported);
        let h = find_signature(&sigs, "h").unwrap();
        assert_eq!(h.symbol_type, SymbolKind::Function);
        assert!(h.is_exported);
    }

    #[test]
    fn typescript_class_hash_ignores_method_bodies() {
        let before = analyze("a.ts", "export class A {\n  run(n: number): void { console.log(n); }\n}\n");
        let after = analyze("a.ts", "export class A {\n  run(n: number): void { console.log(n + 1); }\n}\n");
        assert_eq!(hash_of(&before, "A"), hash_of(&after, "A"));
        assert!(find_signature(&before, "A.run").is_some());
    }

    #[test]
    fn python_privacy_follows_underscore() {
        let sigs = analyze(
            "m.py",
            "def public(a, b=1):\n    return a\n\ndef _private():\n    pass\n\nclass Box:\n    def open(self):\n        pass\n",
        );
        assert!(find_signature(&sigs, "public").unwrap().is_exported);
        assert!(!find_signature(&sigs, "_private").unwrap().is_exported);
        assert_eq!(find_signature(&sigs, "public").unwrap().signature_text, "def public(a, b=1):");
        assert!(find_signature(&sigs, "Box.open").is_some());
    }

    #[test]
    fn go_methods_use_receiver_type() {
        let sigs = analyze(
            "s.go",
            "package s\n\ntype Server struct {\n\tAddr string\n}\n\nfunc (s *Server) Start(port int) error {\n\treturn nil\n}\n\nfunc helper() {}\n",
        );
        assert_eq!(find_signature(&sigs, "Server").unwrap().symbol_type, SymbolKind::Struct);
        assert!(find_signature(&sigs, "Server.Start").unwrap().is_exported);
        assert!(!find_signature(&sigs, "helper").unwrap().is_exported);
    }

    #[test]
    fn suggestions_match_partial_names() {
        let sigs = analyze("lib.rs", "pub fn validate_all() {}\npub fn other() {}\n");
        assert_eq!(suggest_names(&sigs, "validate"), vec!["validate_all".to_string()]);
    }
}
