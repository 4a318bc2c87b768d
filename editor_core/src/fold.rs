//! Fold scopes.
//!
//! A line ending in `:` opens a scope that runs until the next non-blank
//! line with equal or lower indentation. Scopes are recomputed after every
//! text change; a scope that still starts on the same line keeps its folded
//! flag.

use crate::buffer::TextBuffer;

/// A foldable region in the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoldRegion {
    /// Header line of the scope (inclusive, stays visible when folded).
    pub start_line: usize,
    /// Last line of the scope (inclusive).
    pub end_line: usize,
    pub is_folded: bool,
}

impl FoldRegion {
    pub fn new(start_line: usize, end_line: usize) -> Self {
        Self {
            start_line,
            end_line,
            is_folded: false,
        }
    }
}

/// Manages fold scopes for a buffer.
#[derive(Debug, Clone, Default)]
pub struct FoldManager {
    /// All fold regions, sorted by start line.
    regions: Vec<FoldRegion>,
}

impl FoldManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn regions(&self) -> &[FoldRegion] {
        &self.regions
    }

    /// Toggles the fold state at the given line.
    /// Returns true if a fold was toggled.
    pub fn toggle_fold_at_line(&mut self, line: usize) -> bool {
        match self.regions.iter_mut().find(|r| r.start_line == line) {
            Some(region) => {
                region.is_folded = !region.is_folded;
                true
            }
            None => false,
        }
    }

    /// Returns true if the given line is hidden (inside a folded region).
    pub fn is_line_hidden(&self, line: usize) -> bool {
        self.regions
            .iter()
            .any(|r| r.is_folded && line > r.start_line && line <= r.end_line)
    }

    pub fn is_line_folded(&self, line: usize) -> bool {
        self.regions.iter().any(|r| r.start_line == line && r.is_folded)
    }

    /// Recomputes scopes from indentation, keeping folded flags of scopes
    /// whose header line is unchanged.
    pub fn update(&mut self, buffer: &TextBuffer) {
        let folded: Vec<usize> = self
            .regions
            .iter()
            .filter(|r| r.is_folded)
            .map(|r| r.start_line)
            .collect();

        self.regions = detect_indent_scopes(buffer);
        for region in &mut self.regions {
            region.is_folded = folded.contains(&region.start_line);
        }
    }
}

fn detect_indent_scopes(buffer: &TextBuffer) -> Vec<FoldRegion> {
    let mut regions = Vec::new();
    // (header line, header indent)
    let mut open: Vec<(usize, usize)> = Vec::new();
    let mut last_content_line = 0;

    for line in 0..buffer.len_lines() {
        let Some(text) = buffer.line(line) else {
            continue;
        };
        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }
        let indent = buffer.leading_whitespace(line);

        while let Some(&(start, start_indent)) = open.last() {
            if start_indent < indent {
                break;
            }
            open.pop();
            if last_content_line > start {
                regions.push(FoldRegion::new(start, last_content_line));
            }
        }

        if trimmed.ends_with(':') {
            open.push((line, indent));
        }
        last_content_line = line;
    }

    while let Some((start, _)) = open.pop() {
        if last_content_line > start {
            regions.push(FoldRegion::new(start, last_content_line));
        }
    }

    regions.sort_by_key(|r| r.start_line);
    regions
}
