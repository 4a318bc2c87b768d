//! Tree-sitter parsing with a result-typed outcome.

use tree_sitter::{Node, Parser, Tree};

use super::language::Language;
use crate::error::SessionError;

/// The first syntax error found in a parse, in char columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    /// 0-based row within the parsed text.
    pub line: usize,
    /// 0-based char column within that row.
    pub column: usize,
    pub message: String,
}

/// A tree-sitter parser bound to one language.
pub struct SourceParser {
    parser: Parser,
    language: Language,
}

impl std::fmt::Debug for SourceParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceParser")
            .field("language", &self.language)
            .finish_non_exhaustive()
    }
}

impl SourceParser {
    /// Returns a parser for `language`, or `None` if it has no grammar.
    pub fn for_language(language: Language) -> Result<Option<Self>, SessionError> {
        let Some(grammar) = language.tree_sitter_language() else {
            return Ok(None);
        };
        let mut parser = Parser::new();
        parser.set_language(&grammar)?;
        Ok(Some(Self { parser, language }))
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Parses `source` and returns the (possibly error-recovered) tree.
    pub fn parse_tree(&mut self, source: &str) -> Option<Tree> {
        self.parser.parse(source, None)
    }

    /// Parses `source`, failing with the first syntax error if the tree
    /// contains any.
    pub fn parse(&mut self, source: &str) -> Result<Tree, SyntaxError> {
        let Some(tree) = self.parse_tree(source) else {
            return Err(SyntaxError {
                line: 0,
                column: 0,
                message: "parser produced no tree".to_string(),
            });
        };
        match first_error(tree.root_node(), source) {
            Some(err) => Err(err),
            None => Ok(tree),
        }
    }
}

/// Finds the first error or missing node in document order.
pub fn first_error(root: Node<'_>, source: &str) -> Option<SyntaxError> {
    if !root.has_error() {
        return None;
    }
    let node = first_error_node(root).unwrap_or(root);
    let point = node.start_position();
    let message = if node.is_missing() {
        format!("missing `{}`", node.kind())
    } else {
        "invalid syntax".to_string()
    };
    Some(SyntaxError {
        line: point.row,
        column: char_column(source, point.row, point.column),
        message,
    })
}

fn first_error_node(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error_node)
}

/// Converts a tree-sitter byte column into a char column.
fn char_column(source: &str, row: usize, byte_col: usize) -> usize {
    let Some(line) = source.split('\n').nth(row) else {
        return byte_col;
    };
    match line.get(..byte_col.min(line.len())) {
        Some(prefix) => prefix.chars().count(),
        None => byte_col,
    }
}
