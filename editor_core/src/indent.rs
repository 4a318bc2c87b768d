//! Indentation engine.
//!
//! The indent unit is always four spaces. Operations over a selection touch
//! every spanned line and move both selection endpoints so the same text
//! stays selected.

use crate::buffer::TextBuffer;
use crate::cursor::Selection;
use crate::history::EditOperation;

pub const INDENT_WIDTH: usize = 4;
pub const INDENT_UNIT: &str = "    ";

/// Operations produced by an indent or outdent, plus the selection to
/// install once they have been applied.
///
/// Operations are ordered for sequential application (bottom line first),
/// so each one's position is still valid when it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndentEdit {
    pub operations: Vec<EditOperation>,
    pub selection: Selection,
}

impl IndentEdit {
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Lines an operation on `selection` applies to, as an inclusive range.
///
/// A multi-line selection that ends at column 0 does not include that last
/// line: nothing on it is selected.
pub fn spanned_lines(buffer: &TextBuffer, selection: Selection) -> (usize, usize) {
    let (start, end) = selection.range();
    let (first, _) = buffer.char_to_line_col(start);
    let (last, col) = buffer.char_to_line_col(end);
    if last > first && col == 0 {
        (first, last - 1)
    } else {
        (first, last)
    }
}

pub fn indent(buffer: &TextBuffer, selection: Selection) -> IndentEdit {
    if !selection.has_selection() {
        let at = selection.cursor;
        return IndentEdit {
            operations: vec![EditOperation::Insert {
                position: at,
                text: INDENT_UNIT.to_string(),
            }],
            selection: Selection::new(at + INDENT_WIDTH),
        };
    }

    let (first, last) = spanned_lines(buffer, selection);
    let starts: Vec<usize> = (first..=last).map(|l| buffer.line_start(l)).collect();
    let shift = |p: usize| p + INDENT_WIDTH * starts.iter().filter(|&&s| s <= p).count();

    IndentEdit {
        operations: starts
            .iter()
            .rev()
            .map(|&s| EditOperation::Insert {
                position: s,
                text: INDENT_UNIT.to_string(),
            })
            .collect(),
        selection: Selection::with_range(shift(selection.anchor), shift(selection.cursor)),
    }
}

pub fn outdent(buffer: &TextBuffer, selection: Selection) -> IndentEdit {
    let (first, last) = if selection.has_selection() {
        spanned_lines(buffer, selection)
    } else {
        let (line, _) = buffer.char_to_line_col(selection.cursor);
        (line, line)
    };

    // Only lines whose prefix is a full unit are touched.
    let removed: Vec<usize> = (first..=last)
        .filter(|&l| {
            buffer
                .line(l)
                .is_some_and(|text| text.starts_with(INDENT_UNIT))
        })
        .map(|l| buffer.line_start(l))
        .collect();

    let shift = |p: usize| {
        let lost: usize = removed
            .iter()
            .map(|&s| p.saturating_sub(s).min(INDENT_WIDTH))
            .sum();
        p - lost
    };

    IndentEdit {
        operations: removed
            .iter()
            .rev()
            .map(|&s| EditOperation::Delete {
                position: s,
                text: INDENT_UNIT.to_string(),
            })
            .collect(),
        selection: Selection::with_range(shift(selection.anchor), shift(selection.cursor)),
    }
}

/// Text to insert after the line break when Enter is pressed with
/// `before_cursor` being the current line's text up to the cursor.
pub fn newline_indent(before_cursor: &str) -> String {
    let mut indent: String = before_cursor
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .collect();
    if before_cursor.trim_end().ends_with(':') {
        indent.push_str(INDENT_UNIT);
    }
    indent
}
