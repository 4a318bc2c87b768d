//! Text buffer implementation using ropey.
//!
//! Every mutation reports the line range it touched so that per-line caches
//! held by the session can be spliced instead of rebuilt.

use ropey::iter::Chars;
use ropey::Rope;

/// Lines affected by a single buffer mutation.
///
/// `start..=old_end` are the line indices the edit replaced (before the
/// edit), `start..=new_end` the indices now holding the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineChange {
    pub start: usize,
    pub old_end: usize,
    pub new_end: usize,
}

impl LineChange {
    /// Number of lines added (positive) or removed (negative) by the edit.
    pub fn line_delta(&self) -> isize {
        self.new_end as isize - self.old_end as isize
    }
}

/// A text buffer backed by a rope data structure.
#[derive(Debug, Clone)]
pub struct TextBuffer {
    rope: Rope,
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextBuffer {
    /// Creates a new empty text buffer.
    pub fn new() -> Self {
        Self { rope: Rope::new() }
    }

    /// Creates a text buffer from a string.
    pub fn from_str(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    /// Returns the total number of characters in the buffer.
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Returns the total number of lines in the buffer.
    pub fn len_lines(&self) -> usize {
        self.rope.len_lines()
    }

    /// Returns true if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Inserts a string at the given character index.
    pub fn insert(&mut self, char_idx: usize, text: &str) -> LineChange {
        let idx = char_idx.min(self.len_chars());
        let start = self.rope.char_to_line(idx);
        self.rope.insert(idx, text);
        let new_end = self.rope.char_to_line(idx + text.chars().count());
        LineChange {
            start,
            old_end: start,
            new_end,
        }
    }

    /// Removes text in the given character range.
    pub fn remove(&mut self, start: usize, end: usize) -> LineChange {
        let start = start.min(self.len_chars());
        let end = end.min(self.len_chars());
        let start_line = self.rope.char_to_line(start);
        if start >= end {
            return LineChange {
                start: start_line,
                old_end: start_line,
                new_end: start_line,
            };
        }
        let old_end = self.rope.char_to_line(end);
        self.rope.remove(start..end);
        LineChange {
            start: start_line,
            old_end,
            new_end: start_line,
        }
    }

    /// Replaces the given character range with `text`.
    pub fn replace(&mut self, start: usize, end: usize, text: &str) -> LineChange {
        let removed = self.remove(start, end);
        let inserted = self.insert(start.min(self.len_chars()), text);
        LineChange {
            start: removed.start,
            old_end: removed.old_end,
            new_end: inserted.new_end,
        }
    }

    /// Returns the character at the given index, if it exists.
    pub fn char_at(&self, char_idx: usize) -> Option<char> {
        if char_idx < self.len_chars() {
            Some(self.rope.char(char_idx))
        } else {
            None
        }
    }

    /// Returns a bidirectional character iterator starting at `char_idx`.
    ///
    /// `next()` yields the character at `char_idx`, `prev()` the one before it.
    pub fn chars_at(&self, char_idx: usize) -> Chars<'_> {
        self.rope.chars_at(char_idx.min(self.len_chars()))
    }

    /// Returns the text in the given character range.
    pub fn slice(&self, start: usize, end: usize) -> String {
        let end = end.min(self.len_chars());
        let start = start.min(end);
        self.rope.slice(start..end).to_string()
    }

    /// Converts a character index to a (line, column) position.
    /// Both line and column are 0-indexed.
    pub fn char_to_line_col(&self, char_idx: usize) -> (usize, usize) {
        let char_idx = char_idx.min(self.len_chars());
        let line = self.rope.char_to_line(char_idx);
        let line_start = self.rope.line_to_char(line);
        (line, char_idx - line_start)
    }

    /// Converts a (line, column) position to a character index.
    /// Out-of-range positions are clamped to the buffer.
    pub fn line_col_to_char(&self, line: usize, col: usize) -> usize {
        if line >= self.len_lines() {
            return self.len_chars();
        }
        let line_start = self.rope.line_to_char(line);
        line_start + col.min(self.line_len_chars(line))
    }

    /// Returns the length of a line in characters (excluding newline).
    pub fn line_len_chars(&self, line: usize) -> usize {
        if line >= self.len_lines() {
            return 0;
        }
        let line_slice = self.rope.line(line);
        let mut len = line_slice.len_chars();
        if len > 0 && line_slice.char(len - 1) == '\n' {
            len -= 1;
            if len > 0 && line_slice.char(len - 1) == '\r' {
                len -= 1;
            }
        }
        len
    }

    /// Returns the character index of the start of a line.
    pub fn line_start(&self, line: usize) -> usize {
        if line >= self.len_lines() {
            self.len_chars()
        } else {
            self.rope.line_to_char(line)
        }
    }

    /// Returns the character index of the end of a line (before newline).
    pub fn line_end(&self, line: usize) -> usize {
        if line >= self.len_lines() {
            self.len_chars()
        } else {
            self.rope.line_to_char(line) + self.line_len_chars(line)
        }
    }

    /// Returns the line at the given index as a string, without its line break.
    pub fn line(&self, line: usize) -> Option<String> {
        if line >= self.len_lines() {
            return None;
        }
        let mut s = self.rope.line(line).to_string();
        if s.ends_with('\n') {
            s.pop();
            if s.ends_with('\r') {
                s.pop();
            }
        }
        Some(s)
    }

    /// Returns the number of leading space/tab characters on a line.
    pub fn leading_whitespace(&self, line: usize) -> usize {
        self.line(line)
            .map(|text| text.chars().take_while(|c| *c == ' ' || *c == '\t').count())
            .unwrap_or(0)
    }

    /// Returns the entire buffer as a string.
    pub fn to_string(&self) -> String {
        self.rope.to_string()
    }
}
