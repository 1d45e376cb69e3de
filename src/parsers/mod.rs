//! Tree-sitter syntax layer for file scanners.
//!
//! File rules that reason about code structure get a pre-parsed
//! [`SyntaxTree`] alongside the raw content. Only Python is wired up; the
//! corpora this engine validates are Python test and source files. A file
//! whose language is unknown, or that fails to parse, simply has no syntax
//! tree; file scanners fall back to line/regex checks.

use std::path::Path;
use tracing::debug;
use tree_sitter::{Node, Parser};

/// A parsed source file.
pub struct SyntaxTree {
    tree: tree_sitter::Tree,
    source: String,
}

/// One function definition found in a syntax tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDef {
    pub name: String,
    /// 1-based line of the `def`.
    pub line: u32,
    /// Whether the body contains an assert statement or an `assert*` call.
    pub has_assert: bool,
}

impl SyntaxTree {
    /// Parse `content` according to the file's extension. `None` for
    /// unsupported languages or unparsable content.
    pub fn parse(path: &Path, content: &str) -> Option<Self> {
        let extension = path.extension()?.to_str()?;
        if extension != "py" {
            return None;
        }

        let mut parser = Parser::new();
        if parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .is_err()
        {
            return None;
        }
        let tree = match parser.parse(content, None) {
            Some(tree) => tree,
            None => {
                debug!("tree-sitter could not parse {}", path.display());
                return None;
            }
        };
        Some(Self {
            tree,
            source: content.to_string(),
        })
    }

    /// Every function definition in the file, in source order.
    pub fn functions(&self) -> Vec<FunctionDef> {
        let mut out = Vec::new();
        collect_functions(self.tree.root_node(), self.source.as_bytes(), &mut out);
        out
    }
}

fn collect_functions(node: Node, source: &[u8], out: &mut Vec<FunctionDef>) {
    if node.kind() == "function_definition" {
        let name = node
            .child_by_field_name("name")
            .and_then(|n| n.utf8_text(source).ok())
            .unwrap_or_default()
            .to_string();
        out.push(FunctionDef {
            name,
            line: node.start_position().row as u32 + 1,
            has_assert: subtree_has_assert(node, source),
        });
    }
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            collect_functions(child, source, out);
        }
    }
}

fn subtree_has_assert(node: Node, source: &[u8]) -> bool {
    if node.kind() == "assert_statement" {
        return true;
    }
    // unittest style: self.assertEqual(...), pytest.raises via helpers, etc.
    if node.kind() == "call" {
        if let Some(function) = node.child_by_field_name("function") {
            if let Ok(text) = function.utf8_text(source) {
                let callee = text.rsplit('.').next().unwrap_or(text);
                if callee.starts_with("assert") {
                    return true;
                }
            }
        }
    }
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            if subtree_has_assert(child, source) {
                return true;
            }
        }
    }
    false
}
