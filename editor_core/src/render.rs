//! Inputs for the host's gutter and minimap painters.

use crate::fold::FoldManager;
use crate::syntax::StyledSpan;

/// Left padding plus right padding of the line-number gutter, in pixels.
const GUTTER_PADDING: f32 = 12.0 + 3.0;

/// Number of decimal digits in `n` (at least 1).
pub fn digits(n: usize) -> usize {
    n.max(1).to_string().len()
}

/// Gutter width for a buffer of `line_count` lines, given the advance of
/// one digit glyph.
pub fn gutter_width(line_count: usize, digit_width: f32) -> f32 {
    GUTTER_PADDING + digit_width * digits(line_count) as f32
}

/// One painted gutter row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GutterLine {
    /// 0-based buffer line.
    pub line: usize,
    /// 1-based line number, right-aligned to the gutter's digit count.
    pub label: String,
    /// Header of a fold scope that is currently folded.
    pub folded: bool,
}

/// Gutter rows for up to `count` visible lines, starting at buffer line
/// `first`. Lines hidden inside folded scopes are skipped.
pub fn gutter_lines(
    line_count: usize,
    folds: &FoldManager,
    first: usize,
    count: usize,
) -> Vec<GutterLine> {
    let width = digits(line_count);
    (first..line_count)
        .filter(|&line| !folds.is_line_hidden(line))
        .take(count)
        .map(|line| GutterLine {
            line,
            label: format!("{:>width$}", line + 1),
            folded: folds.is_line_folded(line),
        })
        .collect()
}

/// One sampled minimap row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinimapRow {
    pub line: usize,
    /// Leading whitespace, in chars.
    pub indent: usize,
    /// Line length, in chars.
    pub len: usize,
    pub spans: Vec<StyledSpan>,
}

/// Buffer lines shown by a minimap with room for `max_rows` rows, evenly
/// sampled when the buffer is longer.
pub fn minimap_sample(line_count: usize, max_rows: usize) -> Vec<usize> {
    if max_rows == 0 || line_count == 0 {
        return Vec::new();
    }
    if line_count <= max_rows {
        return (0..line_count).collect();
    }
    (0..max_rows).map(|row| row * line_count / max_rows).collect()
}
