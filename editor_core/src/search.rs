//! Find and replace.
//!
//! Matching works on chars so offsets line up with the buffer's char
//! indices. Case-insensitive search folds each char on its own.

use crate::buffer::TextBuffer;
use crate::history::EditOperation;

/// A search match in the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchMatch {
    /// Start character position (inclusive).
    pub start: usize,
    /// End character position (exclusive).
    pub end: usize,
}

impl SearchMatch {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// Search state: the query and every (non-overlapping) match of it.
#[derive(Debug, Clone, Default)]
pub struct Search {
    query: String,
    matches: Vec<SearchMatch>,
    current_match: Option<usize>,
}

impl Search {
    /// Creates an empty, case-insensitive search.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the search query and performs a search on the buffer.
    /// Returns the number of matches found.
    pub fn set_query(&mut self, query: &str, buffer: &TextBuffer) -> usize {
        self.query = query.to_string();
        self.find_all(buffer)
    }

    pub fn matches(&self) -> &[SearchMatch] {
        &self.matches
    }

    fn current_match(&self) -> Option<SearchMatch> {
        self.current_match.and_then(|i| self.matches.get(i).copied())
    }

    pub fn clear(&mut self) {
        self.query.clear();
        self.matches.clear();
        self.current_match = None;
    }

    /// Returns true if the search is active (has a non-empty query).
    pub fn is_active(&self) -> bool {
        !self.query.is_empty()
    }

    fn find_all(&mut self, buffer: &TextBuffer) -> usize {
        self.matches.clear();
        self.current_match = None;

        let needle: Vec<char> = self
            .query
            .chars()
            .map(fold)
            .collect();
        if needle.is_empty() {
            return 0;
        }
        let haystack: Vec<char> = buffer
            .to_string()
            .chars()
            .map(fold)
            .collect();

        let mut at = 0;
        while at + needle.len() <= haystack.len() {
            if haystack[at..at + needle.len()] == needle[..] {
                self.matches.push(SearchMatch::new(at, at + needle.len()));
                at += needle.len();
            } else {
                at += 1;
            }
        }

        if !self.matches.is_empty() {
            self.current_match = Some(0);
        }
        self.matches.len()
    }

    /// Selects the first match starting at or after `cursor_pos`, wrapping
    /// once to the start of the buffer.
    pub fn find_from(&mut self, cursor_pos: usize) -> Option<SearchMatch> {
        if self.matches.is_empty() {
            return None;
        }
        let idx = self
            .matches
            .iter()
            .position(|m| m.start >= cursor_pos)
            .unwrap_or(0);
        self.current_match = Some(idx);
        Some(self.matches[idx])
    }

    /// Re-runs the search after the buffer changed, staying near the
    /// previous current match.
    pub fn refresh(&mut self, buffer: &TextBuffer) {
        let old_current = self.current_match();
        self.find_all(buffer);
        if let Some(old) = old_current {
            self.find_from(old.start);
        }
    }

    /// Returns matches that overlap with the given line range.
    pub fn matches_in_range(
        &self,
        buffer: &TextBuffer,
        start_line: usize,
        end_line: usize,
    ) -> Vec<SearchMatch> {
        if self.matches.is_empty() {
            return Vec::new();
        }
        let range_start = buffer.line_start(start_line);
        let range_end = if end_line + 1 >= buffer.len_lines() {
            buffer.len_chars()
        } else {
            buffer.line_start(end_line + 1)
        };
        self.matches
            .iter()
            .filter(|m| m.end > range_start && m.start < range_end)
            .copied()
            .collect()
    }

    /// Operations replacing every current match with `replacement`.
    ///
    /// Matches are processed from the end of the buffer backwards so each
    /// operation's position is still valid when applied in order, and text
    /// produced by one replacement is never matched again.
    pub fn replacement_ops(&self, buffer: &TextBuffer, replacement: &str) -> Vec<EditOperation> {
        let mut ops = Vec::with_capacity(self.matches.len() * 2);
        for m in self.matches.iter().rev() {
            ops.push(EditOperation::Delete {
                position: m.start,
                text: buffer.slice(m.start, m.end),
            });
            if !replacement.is_empty() {
                ops.push(EditOperation::Insert {
                    position: m.start,
                    text: replacement.to_string(),
                });
            }
        }
        ops
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_case_insensitive_by_default() {
        let buffer = TextBuffer::from_str("Hello HELLO hello");
        let mut search = Search::new();
        assert_eq!(search.set_query("hello", &buffer), 3);
        assert_eq!(search.set_query("HeLLo", &buffer), 3);
    }

    #[test]
    fn test_offsets_are_chars() {
        let buffer = TextBuffer::from_str("héllo wörld wörld");
        let mut search = Search::new();
        search.set_query("WÖRLD", &buffer);
        assert_eq!(
            search.matches(),
            &[SearchMatch::new(6, 11), SearchMatch::new(12, 17)]
        );
    }

    #[test]
    fn test_matches_do_not_overlap() {
        let buffer = TextBuffer::from_str("aaaa");
        let mut search = Search::new();
        assert_eq!(search.set_query("aa", &buffer), 2);
    }

    #[test]
    fn test_empty_and_missing_queries() {
        let buffer = TextBuffer::from_str("hello world");
        let mut search = Search::new();
        assert_eq!(search.set_query("", &buffer), 0);
        assert!(!search.is_active());

        assert_eq!(search.set_query("xyz", &buffer), 0);
        assert!(search.is_active());
        assert!(search.find_from(0).is_none());
    }

    #[test]
    fn test_refresh_stays_near_current_match() {
        let mut buffer = TextBuffer::from_str("ab ab ab");
        let mut search = Search::new();
        search.set_query("ab", &buffer);
        assert_eq!(search.find_from(4), Some(SearchMatch::new(6, 8)));

        buffer.insert(0, "ab ");
        search.refresh(&buffer);
        assert_eq!(search.matches().len(), 4);
        assert_eq!(search.current_match(), Some(SearchMatch::new(6, 8)));
    }

    #[test]
    fn test_find_from_wraps_once() {
        let buffer = TextBuffer::from_str("a  a  a  a");
        let mut search = Search::new();
        search.set_query("a", &buffer);
        assert_eq!(search.find_from(5).unwrap().start, 6);
        assert_eq!(search.find_from(10).unwrap().start, 0);
    }

    #[test]
    fn test_matches_in_range() {
        let buffer = TextBuffer::from_str("x\ny x\nz\nx");
        let mut search = Search::new();
        search.set_query("x", &buffer);
        assert_eq!(search.matches_in_range(&buffer, 1, 2), vec![SearchMatch::new(4, 5)]);
        assert_eq!(search.matches_in_range(&buffer, 3, 3), vec![SearchMatch::new(8, 9)]);
    }

    #[test]
    fn test_replacement_ops() {
        let mut buffer = TextBuffer::from_str("cat dog cat");
        let mut search = Search::new();
        search.set_query("cat", &buffer);
        let ops = search.replacement_ops(&buffer, "catfish");
        for op in &ops {
            op.apply(&mut buffer);
        }
        assert_eq!(buffer.to_string(), "catfish dog catfish");
    }
}
