//! Rule-based lexical highlighter.
//!
//! A language registers an ordered table of regex rules. Every rule is run
//! over the line and paints its matches; later rules overwrite earlier ones
//! per character. Triple-quoted strings are found first by a forward scan
//! that threads a [`LexState`] from one line to the next, and the rules only
//! run over the text outside them.

use regex::Regex;

use super::language::Language;
use super::theme::TokenStyle;
use crate::error::SessionError;

/// A styled run of characters on one line (columns are char offsets).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyledSpan {
    pub line: usize,
    pub start: usize,
    pub len: usize,
    pub style: TokenStyle,
}

impl StyledSpan {
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn contains(&self, col: usize) -> bool {
        col >= self.start && col < self.end()
    }
}

/// Lexer state carried across line boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LexState {
    #[default]
    Normal,
    /// Inside a triple-quoted string opened with three of the given quote.
    InBlockString(char),
}

/// Highlight result for a single line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LineHighlights {
    /// State the line was lexed with.
    pub entry: LexState,
    /// State handed to the following line.
    pub exit: LexState,
    pub spans: Vec<StyledSpan>,
}

impl LineHighlights {
    /// Returns the style for a given column, or None if no highlight.
    pub fn style_at(&self, col: usize) -> Option<TokenStyle> {
        self.spans.iter().find(|s| s.contains(col)).map(|s| s.style)
    }
}

/// A single regex highlighting rule.
#[derive(Debug, Clone)]
pub struct HighlightRule {
    regex: Regex,
    style: TokenStyle,
    capture_group: Option<usize>,
}

impl HighlightRule {
    pub fn new(pattern: &str, style: TokenStyle) -> Result<Self, SessionError> {
        let regex = Regex::new(pattern).map_err(|source| SessionError::Rule {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            regex,
            style,
            capture_group: None,
        })
    }

    /// Paint only a capture group of each match.
    pub fn with_capture_group(mut self, group: usize) -> Self {
        self.capture_group = Some(group);
        self
    }

    pub fn style(&self) -> TokenStyle {
        self.style
    }

    /// Byte ranges this rule paints on `text`.
    fn ranges<'a>(&'a self, text: &'a str) -> Box<dyn Iterator<Item = (usize, usize)> + 'a> {
        match self.capture_group {
            Some(group) => Box::new(
                self.regex
                    .captures_iter(text)
                    .filter_map(move |caps| caps.get(group))
                    .map(|m| (m.start(), m.end())),
            ),
            None => Box::new(self.regex.find_iter(text).map(|m| (m.start(), m.end()))),
        }
    }
}

fn word_alternation(words: &[&str]) -> String {
    let escaped: Vec<String> = words.iter().map(|w| regex::escape(w)).collect();
    format!(r"\b(?:{})\b", escaped.join("|"))
}

/// The ordered rule table for a language. Order matters: later rules win.
pub fn rules_for(language: Language) -> Result<Vec<HighlightRule>, SessionError> {
    match language {
        Language::Python => Ok(vec![
            HighlightRule::new(&word_alternation(language.keywords()), TokenStyle::Keyword)?,
            HighlightRule::new(&word_alternation(language.builtins()), TokenStyle::Builtin)?,
            HighlightRule::new(r"!=|[+\-*/%=<>^|&~]", TokenStyle::Operator)?,
            HighlightRule::new(r"[()\[\]{}]", TokenStyle::Bracket)?,
            HighlightRule::new(r#""(?:[^"\\]|\\.)*""#, TokenStyle::String)?,
            HighlightRule::new(r"'(?:[^'\\]|\\.)*'", TokenStyle::String)?,
            HighlightRule::new(r"#.*", TokenStyle::Comment)?,
            HighlightRule::new(r"\b[0-9]+(?:\.[0-9]+)?\b", TokenStyle::Number)?,
            HighlightRule::new(r"@\w+", TokenStyle::Decorator)?,
            HighlightRule::new(r"\b(?:def|class)\s+(\w+)", TokenStyle::Definition)?
                .with_capture_group(1),
        ]),
        Language::PlainText => Ok(Vec::new()),
    }
}

/// Quote characters that open a block string when tripled.
fn block_quotes(language: Language) -> &'static [char] {
    match language {
        Language::Python => &['"', '\''],
        Language::PlainText => &[],
    }
}

/// Rule-table highlighter for one language.
#[derive(Debug, Clone)]
pub struct LexicalHighlighter {
    language: Language,
    rules: Vec<HighlightRule>,
}

impl LexicalHighlighter {
    pub fn new(language: Language) -> Result<Self, SessionError> {
        Ok(Self {
            language,
            rules: rules_for(language)?,
        })
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn rules(&self) -> &[HighlightRule] {
        &self.rules
    }

    /// Highlights a line that starts outside any block string.
    pub fn highlight(&self, line: usize, text: &str) -> Vec<StyledSpan> {
        self.highlight_line(line, text, LexState::Normal).spans
    }

    /// Highlights a line given the state the previous line ended in.
    ///
    /// Block-string regions are located first. The rule table then only
    /// runs over the text between them, so quotes inside a block string
    /// never pair up with quotes outside it.
    pub fn highlight_line(&self, line: usize, text: &str, entry: LexState) -> LineHighlights {
        let chars: Vec<char> = text.chars().collect();
        let mut paint: Vec<Option<TokenStyle>> = vec![None; chars.len()];

        let (regions, exit) = block_regions(&chars, block_quotes(self.language), entry);
        let mut segment_start = 0;
        for &(start, end) in regions.iter().chain(std::iter::once(&(chars.len(), chars.len()))) {
            if segment_start < start {
                self.paint_rules(&chars[segment_start..start], segment_start, &mut paint);
            }
            paint[start..end].fill(Some(TokenStyle::String));
            segment_start = end;
        }

        LineHighlights {
            entry,
            exit,
            spans: coalesce(line, &paint),
        }
    }

    /// Runs the rule table over `segment`, which starts at char column
    /// `offset` of the line.
    fn paint_rules(&self, segment: &[char], offset: usize, paint: &mut [Option<TokenStyle>]) {
        let text: String = segment.iter().collect();

        // Byte offset -> char column within the segment.
        let mut col_of_byte = vec![segment.len(); text.len() + 1];
        for (col, (byte, ch)) in text.char_indices().enumerate() {
            col_of_byte[byte..byte + ch.len_utf8()].fill(col);
        }

        for rule in &self.rules {
            for (start, end) in rule.ranges(&text) {
                let (start, end) = (offset + col_of_byte[start], offset + col_of_byte[end]);
                paint[start..end].fill(Some(rule.style));
            }
        }
    }
}

fn is_triple(chars: &[char], at: usize, quote: char) -> bool {
    at + 3 <= chars.len() && chars[at..at + 3].iter().all(|&c| c == quote)
}

/// Char ranges of the line covered by block strings (delimiters included),
/// and the state handed to the next line.
///
/// Outside a block string the scan steps over single-line strings whole and
/// stops at a comment, so a triple quote inside either opens nothing.
fn block_regions(
    chars: &[char],
    quotes: &[char],
    entry: LexState,
) -> (Vec<(usize, usize)>, LexState) {
    let mut regions = Vec::new();
    if quotes.is_empty() {
        return (regions, LexState::Normal);
    }

    let mut state = entry;
    let mut at = 0;
    loop {
        match state {
            LexState::InBlockString(quote) => match find_block_close(chars, at, quote) {
                Some(close) => {
                    regions.push((at, close + 3));
                    at = close + 3;
                    state = LexState::Normal;
                }
                None => {
                    regions.push((at, chars.len()));
                    break;
                }
            },
            LexState::Normal => {
                let Some(&c) = chars.get(at) else {
                    break;
                };
                if c == '#' {
                    break;
                }
                match quotes.iter().find(|&&q| is_triple(chars, at, q)) {
                    Some(&quote) => match find_block_close(chars, at + 3, quote) {
                        Some(close) => {
                            regions.push((at, close + 3));
                            at = close + 3;
                        }
                        None => {
                            regions.push((at, chars.len()));
                            state = LexState::InBlockString(quote);
                            break;
                        }
                    },
                    None if quotes.contains(&c) => at = skip_line_string(chars, at, c),
                    None => at += 1,
                }
            }
        }
    }
    (regions, state)
}

/// Index just past the single-line string opened by `quote` at `open`, or
/// the end of the line if it is unterminated.
fn skip_line_string(chars: &[char], open: usize, quote: char) -> usize {
    let mut at = open + 1;
    while at < chars.len() {
        match chars[at] {
            '\\' => at += 2,
            c if c == quote => return at + 1,
            _ => at += 1,
        }
    }
    chars.len()
}

fn find_block_close(chars: &[char], from: usize, quote: char) -> Option<usize> {
    let mut at = from;
    while at < chars.len() {
        if chars[at] == '\\' {
            at += 2;
            continue;
        }
        if is_triple(chars, at, quote) {
            return Some(at);
        }
        at += 1;
    }
    None
}

/// Merges runs of identically painted characters into spans.
fn coalesce(line: usize, paint: &[Option<TokenStyle>]) -> Vec<StyledSpan> {
    let mut spans: Vec<StyledSpan> = Vec::new();
    for (col, style) in paint.iter().enumerate() {
        let Some(style) = *style else {
            continue;
        };
        match spans.last_mut() {
            Some(last) if last.style == style && last.end() == col => last.len += 1,
            _ => spans.push(StyledSpan {
                line,
                start: col,
                len: 1,
                style,
            }),
        }
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn python() -> LexicalHighlighter {
        LexicalHighlighter::new(Language::Python).unwrap()
    }

    fn style_of(spans: &[StyledSpan], col: usize) -> Option<TokenStyle> {
        spans.iter().find(|s| s.contains(col)).map(|s| s.style)
    }

    #[test]
    fn test_definition_overrides_keyword_order() {
        let spans = python().highlight(0, "def foo(x):");
        assert_eq!(
            spans,
            vec![
                StyledSpan { line: 0, start: 0, len: 3, style: TokenStyle::Keyword },
                StyledSpan { line: 0, start: 4, len: 3, style: TokenStyle::Definition },
                StyledSpan { line: 0, start: 7, len: 1, style: TokenStyle::Bracket },
                StyledSpan { line: 0, start: 9, len: 1, style: TokenStyle::Bracket },
            ]
        );
    }

    #[test]
    fn test_comment_wins_over_earlier_rules() {
        let spans = python().highlight(3, "x = 1  # if print(y)");
        assert_eq!(style_of(&spans, 0), None);
        assert_eq!(style_of(&spans, 2), Some(TokenStyle::Operator));
        assert_eq!(style_of(&spans, 4), Some(TokenStyle::Number));
        for col in 7..20 {
            assert_eq!(style_of(&spans, col), Some(TokenStyle::Comment));
        }
        assert!(spans.iter().all(|s| s.line == 3));
    }

    #[test]
    fn test_strings_builtins_and_decorators() {
        let spans = python().highlight(0, "@cache");
        assert_eq!(style_of(&spans, 0), Some(TokenStyle::Decorator));

        let spans = python().highlight(0, "print('a\\'b', len)");
        assert_eq!(style_of(&spans, 0), Some(TokenStyle::Builtin));
        assert_eq!(style_of(&spans, 6), Some(TokenStyle::String));
        assert_eq!(style_of(&spans, 11), Some(TokenStyle::String));
        assert_eq!(style_of(&spans, 14), Some(TokenStyle::Builtin));
    }

    #[test]
    fn test_columns_are_chars_not_bytes() {
        let spans = python().highlight(0, "s = 'é' + 1");
        assert_eq!(style_of(&spans, 4), Some(TokenStyle::String));
        assert_eq!(style_of(&spans, 6), Some(TokenStyle::String));
        assert_eq!(style_of(&spans, 8), Some(TokenStyle::Operator));
        assert_eq!(style_of(&spans, 10), Some(TokenStyle::Number));
    }

    #[test]
    fn test_highlight_is_deterministic() {
        let hl = python();
        let line = "class Foo(Base):  # 'x' 12 @d";
        assert_eq!(hl.highlight(0, line), hl.highlight(0, line));
    }

    #[test]
    fn test_block_string_state_carries_across_lines() {
        let hl = python();
        let first = hl.highlight_line(0, "x = \"\"\"start", LexState::Normal);
        assert_eq!(first.exit, LexState::InBlockString('"'));
        assert_eq!(first.style_at(4), Some(TokenStyle::String));
        assert_eq!(first.style_at(11), Some(TokenStyle::String));

        let middle = hl.highlight_line(1, "def not_code(): # nope", first.exit);
        assert_eq!(middle.exit, LexState::InBlockString('"'));
        assert_eq!(
            middle.spans,
            vec![StyledSpan { line: 1, start: 0, len: 22, style: TokenStyle::String }]
        );

        let last = hl.highlight_line(2, "end\"\"\" + 1", middle.exit);
        assert_eq!(last.exit, LexState::Normal);
        assert_eq!(last.style_at(5), Some(TokenStyle::String));
        assert_eq!(last.style_at(7), Some(TokenStyle::Operator));
        assert_eq!(last.style_at(9), Some(TokenStyle::Number));
    }

    #[test]
    fn test_single_line_block_string_closes() {
        let line = python().highlight_line(0, "'''doc''' if x", LexState::Normal);
        assert_eq!(line.exit, LexState::Normal);
        assert_eq!(line.style_at(8), Some(TokenStyle::String));
        assert_eq!(line.style_at(10), Some(TokenStyle::Keyword));
    }

    #[test]
    fn test_triple_quote_in_comment_does_not_open() {
        let line = python().highlight_line(0, "x = 1  # \"\"\" not a string", LexState::Normal);
        assert_eq!(line.exit, LexState::Normal);
    }

    #[test]
    fn test_triple_quote_inside_string_does_not_open() {
        let line = python().highlight_line(0, "s = \"'''\"", LexState::Normal);
        assert_eq!(line.exit, LexState::Normal);
    }

    #[test]
    fn test_string_after_block_close_is_separate() {
        let hl = python();
        let line = hl.highlight_line(1, "end\"\"\" + \"x\"", LexState::InBlockString('"'));
        assert_eq!(line.exit, LexState::Normal);
        assert_eq!(line.style_at(5), Some(TokenStyle::String));
        assert_eq!(line.style_at(6), None);
        assert_eq!(line.style_at(7), Some(TokenStyle::Operator));
        assert_eq!(line.style_at(9), Some(TokenStyle::String));
        assert_eq!(line.style_at(10), Some(TokenStyle::String));

        let line = hl.highlight_line(0, "\"\"\"a\"\"\" + \"b\"", LexState::Normal);
        assert_eq!(line.exit, LexState::Normal);
        assert_eq!(line.style_at(6), Some(TokenStyle::String));
        assert_eq!(line.style_at(8), Some(TokenStyle::Operator));
        assert_eq!(line.style_at(11), Some(TokenStyle::String));
    }

    #[test]
    fn test_plain_text_has_no_spans() {
        let hl = LexicalHighlighter::new(Language::PlainText).unwrap();
        let line = hl.highlight_line(0, "def x(): '''", LexState::Normal);
        assert!(line.spans.is_empty());
        assert_eq!(line.exit, LexState::Normal);
    }
}
