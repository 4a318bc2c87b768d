//! Bracket matching around the cursor.

use crate::buffer::TextBuffer;
use crate::cursor::Position;

/// A delimiter next to the cursor and its partner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BracketPair {
    /// The bracket adjacent to the cursor.
    pub origin: Position,
    /// Its balancing partner.
    pub matched: Position,
}

fn closer_of(open: char) -> Option<char> {
    match open {
        '(' => Some(')'),
        '[' => Some(']'),
        '{' => Some('}'),
        _ => None,
    }
}

fn opener_of(close: char) -> Option<char> {
    match close {
        ')' => Some('('),
        ']' => Some('['),
        '}' => Some('{'),
        _ => None,
    }
}

/// Finds the bracket pair for a cursor at `cursor` (a char index).
///
/// The character before the cursor is checked first, then the one after.
/// Nested brackets of every kind are tracked on a stack, so an interleaved
/// close of the wrong kind (`(a, [b, c)]`) yields `None` rather than a
/// false match.
pub fn match_bracket(buffer: &TextBuffer, cursor: usize) -> Option<BracketPair> {
    let cursor = cursor.min(buffer.len_chars());
    let before = cursor
        .checked_sub(1)
        .and_then(|i| buffer.char_at(i).map(|c| (i, c)));
    let after = buffer.char_at(cursor).map(|c| (cursor, c));

    let (origin, ch) = [before, after]
        .into_iter()
        .flatten()
        .find(|&(_, c)| closer_of(c).is_some() || opener_of(c).is_some())?;

    let matched = if closer_of(ch).is_some() {
        scan_forward(buffer, origin, ch)
    } else {
        scan_backward(buffer, origin, ch)
    }?;

    Some(BracketPair {
        origin: Position::from_char(buffer, origin),
        matched: Position::from_char(buffer, matched),
    })
}

fn scan_forward(buffer: &TextBuffer, origin: usize, open: char) -> Option<usize> {
    let mut stack = vec![open];
    for (offset, c) in buffer.chars_at(origin + 1).enumerate() {
        if closer_of(c).is_some() {
            stack.push(c);
        } else if let Some(expected) = opener_of(c) {
            if stack.pop()? != expected {
                return None;
            }
            if stack.is_empty() {
                return Some(origin + 1 + offset);
            }
        }
    }
    None
}

fn scan_backward(buffer: &TextBuffer, origin: usize, close: char) -> Option<usize> {
    let mut stack = vec![close];
    let mut chars = buffer.chars_at(origin);
    let mut idx = origin;
    while let Some(c) = chars.prev() {
        idx -= 1;
        if opener_of(c).is_some() {
            stack.push(c);
        } else if let Some(expected) = closer_of(c) {
            if stack.pop()? != expected {
                return None;
            }
            if stack.is_empty() {
                return Some(idx);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(text: &str, cursor: usize) -> Option<(usize, usize)> {
        let buffer = TextBuffer::from_str(text);
        match_bracket(&buffer, cursor)
            .map(|p| (p.origin.to_char(&buffer), p.matched.to_char(&buffer)))
    }

    #[test]
    fn test_open_before_cursor_scans_forward() {
        assert_eq!(pair("f(a, (b))", 2), Some((1, 8)));
    }

    #[test]
    fn test_close_scans_backward() {
        assert_eq!(pair("f(ab)", 4), Some((4, 1)));
        assert_eq!(pair("f(a, (b))", 9), Some((8, 1)));
    }

    #[test]
    fn test_preceding_character_wins() {
        // Cursor between `)` and `(`: the `)` just typed is matched.
        assert_eq!(pair("(a)(b)", 3), Some((2, 0)));
    }

    #[test]
    fn test_crosses_lines() {
        let text = "items = [\n    1,\n    2,\n]";
        let buffer = TextBuffer::from_str(text);
        let result = match_bracket(&buffer, 9).unwrap();
        assert_eq!(result.origin, Position::new(0, 8));
        assert_eq!(result.matched, Position::new(3, 0));

        let back = match_bracket(&buffer, buffer.len_chars()).unwrap();
        assert_eq!(back.matched, Position::new(0, 8));
    }

    #[test]
    fn test_interleaved_kinds_do_not_match() {
        assert_eq!(pair("(a, [b, c)]", 1), None);
        assert_eq!(pair("(a, [b, c)]", 11), None);
    }

    #[test]
    fn test_unbalanced_returns_none() {
        assert_eq!(pair("(a, b", 1), None);
        assert_eq!(pair("a, b)", 5), None);
        assert_eq!(pair("abc", 1), None);
        assert_eq!(pair("", 0), None);
    }

    #[test]
    fn test_balanced_pairs_round_trip() {
        let text = "{[()()]}([]{})";
        let buffer = TextBuffer::from_str(text);
        for (i, c) in text.chars().enumerate() {
            if closer_of(c).is_none() {
                continue;
            }
            let forward = match_bracket(&buffer, i + 1).unwrap();
            let close = forward.matched.to_char(&buffer);
            assert_eq!(closer_of(c), buffer.char_at(close));
            let backward = match_bracket(&buffer, close + 1).unwrap();
            assert_eq!(backward.matched.to_char(&buffer), i);
        }
    }
}
