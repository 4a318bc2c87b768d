//! Caret and selection.
//!
//! Offsets are char indices into the buffer. A [`Selection`] is empty when
//! its anchor and caret sit on the same char.

use crate::buffer::TextBuffer;

/// A 0-based (line, column) location, column counted in chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }

    pub fn from_char(buffer: &TextBuffer, char_idx: usize) -> Self {
        let (line, col) = buffer.char_to_line_col(char_idx);
        Self::new(line, col)
    }

    /// Char offset of this position, clamped to the buffer.
    pub fn to_char(self, buffer: &TextBuffer) -> usize {
        buffer.line_col_to_char(self.line, self.col)
    }
}

/// The fixed `anchor` and the moving `cursor` end of a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub anchor: usize,
    pub cursor: usize,
}

impl Selection {
    /// An empty selection (a bare caret) at `pos`.
    pub fn new(pos: usize) -> Self {
        Self::with_range(pos, pos)
    }

    pub fn with_range(anchor: usize, cursor: usize) -> Self {
        Self { anchor, cursor }
    }

    pub fn has_selection(&self) -> bool {
        self.anchor != self.cursor
    }

    /// `(start, end)` with `start <= end`, whichever way the selection runs.
    pub fn range(&self) -> (usize, usize) {
        (self.anchor.min(self.cursor), self.anchor.max(self.cursor))
    }
}

/// The caret of one session.
///
/// Every move takes an `extend` flag: when set the anchor stays put and the
/// selection grows or shrinks, otherwise the selection collapses onto the
/// new caret. Vertical moves remember the column they started from so a
/// run of Up/Down presses through short lines lands back on it.
#[derive(Debug, Clone, Default)]
pub struct Cursor {
    selection: Selection,
    goal_col: Option<usize>,
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Caret offset.
    pub fn position(&self) -> usize {
        self.selection.cursor
    }

    pub fn has_selection(&self) -> bool {
        self.selection.has_selection()
    }

    /// Ordered bounds of a non-empty selection.
    pub fn selected_range(&self) -> Option<(usize, usize)> {
        self.has_selection().then(|| self.selection.range())
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
        self.goal_col = None;
    }

    pub fn set_position(&mut self, pos: usize, extend: bool) {
        self.goal_col = None;
        self.place(pos, extend);
    }

    pub fn collapse_selection(&mut self) {
        self.selection.anchor = self.selection.cursor;
    }

    fn place(&mut self, pos: usize, extend: bool) {
        self.selection.cursor = pos;
        if !extend {
            self.selection.anchor = pos;
        }
    }

    pub fn move_left(&mut self, extend: bool) {
        self.set_position(self.position().saturating_sub(1), extend);
    }

    pub fn move_right(&mut self, buffer: &TextBuffer, extend: bool) {
        let pos = (self.position() + 1).min(buffer.len_chars());
        self.set_position(pos, extend);
    }

    pub fn move_up(&mut self, buffer: &TextBuffer, extend: bool) {
        self.move_vertically(buffer, false, extend);
    }

    pub fn move_down(&mut self, buffer: &TextBuffer, extend: bool) {
        self.move_vertically(buffer, true, extend);
    }

    fn move_vertically(&mut self, buffer: &TextBuffer, down: bool, extend: bool) {
        let (line, col) = buffer.char_to_line_col(self.position());
        let goal = *self.goal_col.get_or_insert(col);
        let target = if down {
            Some(line + 1).filter(|&next| next < buffer.len_lines())
        } else {
            line.checked_sub(1)
        };

        match target {
            Some(target) => self.place(buffer.line_col_to_char(target, goal), extend),
            // Past the first or last line the caret goes to that end of the buffer.
            None if down => self.set_position(buffer.len_chars(), extend),
            None => self.set_position(0, extend),
        }
    }

    pub fn move_to_line_start(&mut self, buffer: &TextBuffer, extend: bool) {
        let (line, _) = buffer.char_to_line_col(self.position());
        self.set_position(buffer.line_start(line), extend);
    }

    pub fn move_to_line_end(&mut self, buffer: &TextBuffer, extend: bool) {
        let (line, _) = buffer.char_to_line_col(self.position());
        self.set_position(buffer.line_end(line), extend);
    }

    pub fn move_to_buffer_start(&mut self, extend: bool) {
        self.set_position(0, extend);
    }

    pub fn move_to_buffer_end(&mut self, buffer: &TextBuffer, extend: bool) {
        self.set_position(buffer.len_chars(), extend);
    }

    /// Pulls both ends back inside the buffer after it shrank.
    pub fn clamp_to_buffer(&mut self, buffer: &TextBuffer) {
        let max = buffer.len_chars();
        let Selection { anchor, cursor } = self.selection;
        self.selection = Selection::with_range(anchor.min(max), cursor.min(max));
    }
}
