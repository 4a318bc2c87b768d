//! Syntax support: lexical highlighting, per-line diagnostics and symbol
//! extraction.
//!
//! Highlighting is regex-rule based and runs per line. Diagnostics and the
//! symbol table use tree-sitter.

mod diagnostics;
mod highlighter;
mod language;
mod parse;
mod symbols;
mod theme;

pub use diagnostics::{DiagnosticHighlighter, ErrorSpan};
pub use highlighter::{
    rules_for, HighlightRule, LexState, LexicalHighlighter, LineHighlights, StyledSpan,
};
pub use language::Language;
pub use parse::{first_error, SourceParser, SyntaxError};
pub use symbols::SymbolTable;
pub use theme::{Color, Theme, TokenStyle};
