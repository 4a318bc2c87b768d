//! Per-line syntax diagnostics.
//!
//! Each line is parsed on its own, which is only a heuristic: a line that
//! belongs to a larger construct will often fail in isolation. To cut the
//! noise, the line is dedented before parsing and a block header (a line
//! ending in `:`) gets a stub body. Only errors on the line itself are
//! reported; anything the parser trips over in the stub is ignored.

use super::language::Language;
use super::parse::SourceParser;
use crate::error::SessionError;

const STUB_BODY: &str = "\n    pass";

/// An advisory error underline on one line, in char columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorSpan {
    pub line: usize,
    pub start: usize,
    pub len: usize,
}

impl ErrorSpan {
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

#[derive(Debug)]
pub struct DiagnosticHighlighter {
    parser: Option<SourceParser>,
}

impl DiagnosticHighlighter {
    pub fn new(language: Language) -> Result<Self, SessionError> {
        Ok(Self {
            parser: SourceParser::for_language(language)?,
        })
    }

    /// Returns the error span for `text` (the content of line `line_number`),
    /// if parsing it in isolation fails on that line.
    pub fn diagnose(&mut self, text: &str, line_number: usize) -> Option<ErrorSpan> {
        let parser = self.parser.as_mut()?;
        let content = text.trim_start();
        if content.trim_end().is_empty() {
            return None;
        }
        let indent = text.chars().count() - content.chars().count();

        let mut snippet = content.to_string();
        if content.trim_end().ends_with(':') {
            snippet.push_str(STUB_BODY);
        }

        let err = parser.parse(&snippet).err()?;
        if err.line != 0 {
            return None;
        }

        let line_len = text.chars().count();
        let mut start = (indent + err.column).min(line_len);
        if start == line_len {
            // Zero-width errors at end of line (missing tokens) mark the last char.
            start = line_len.saturating_sub(1);
        }
        let len = line_len - start;
        if len == 0 {
            return None;
        }
        log::trace!("line {line_number}: {} at column {start}", err.message);
        Some(ErrorSpan {
            line: line_number,
            start,
            len,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn python() -> DiagnosticHighlighter {
        DiagnosticHighlighter::new(Language::Python).unwrap()
    }

    #[test]
    fn test_valid_line_has_no_error() {
        let mut diag = python();
        assert_eq!(diag.diagnose("x = foo(1, 2)", 0), None);
        assert_eq!(diag.diagnose("", 3), None);
        assert_eq!(diag.diagnose("   ", 3), None);
        assert_eq!(diag.diagnose("# just a comment", 3), None);
    }

    #[test]
    fn test_indented_line_is_dedented() {
        let mut diag = python();
        assert_eq!(diag.diagnose("        total = total + 1", 7), None);
    }

    #[test]
    fn test_block_header_gets_stub_body() {
        let mut diag = python();
        assert_eq!(diag.diagnose("def foo(a, b):", 0), None);
        assert_eq!(diag.diagnose("    for i in range(3):  ", 2), None);
    }

    #[test]
    fn test_error_spans_to_end_of_line() {
        let mut diag = python();
        let text = "    y = = 2";
        let span = diag.diagnose(text, 4).unwrap();
        assert_eq!(span.line, 4);
        assert!(span.start >= 4);
        assert!(span.len > 0);
        assert_eq!(span.end(), text.chars().count());
    }

    #[test]
    fn test_plain_text_never_reports() {
        let mut diag = DiagnosticHighlighter::new(Language::PlainText).unwrap();
        assert_eq!(diag.diagnose("y = = 2", 0), None);
    }
}
