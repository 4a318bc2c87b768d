//! Editor session: one tab's buffer, cursor and derived views.
//!
//! Every text mutation moves the session to `Dirty` and is followed, in the
//! same call, by a resync that recomputes the derived state and returns to
//! `Clean`:
//!
//! - lexical highlights for changed lines (and any following lines whose
//!   incoming block-string state changed),
//! - diagnostics for changed lines,
//! - the symbol table and fold scopes (rebuilt from scratch),
//! - the bracket pair at the cursor,
//! - completion candidates when the edit was an identifier character.
//!
//! Cursor-only movement just recomputes the bracket pair and hides the
//! completion popup.

use crate::brackets::{match_bracket, BracketPair};
use crate::buffer::{LineChange, TextBuffer};
use crate::completion::{
    identifier_prefix, is_identifier_char, CompletionChain, CompletionRequest, CompletionState,
};
use crate::config::EditorConfig;
use crate::cursor::{Cursor, Position, Selection};
use crate::error::SessionError;
use crate::fold::FoldManager;
use crate::history::{EditOperation, History};
use crate::indent;
use crate::notice::Notice;
use crate::render::{self, GutterLine, MinimapRow};
use crate::search::{Search, SearchMatch};
use crate::syntax::{
    Color, DiagnosticHighlighter, ErrorSpan, Language, LexState, LexicalHighlighter,
    LineHighlights, SourceParser, SymbolTable, Theme,
};

const NOT_FOUND: &str = "Text not found.";

/// Whether derived state reflects the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Clean,
    Dirty,
}

/// One editor tab.
#[derive(Debug)]
pub struct EditorSession {
    buffer: TextBuffer,
    cursor: Cursor,
    history: History,
    language: Language,
    state: SessionState,
    /// Incremented on every text mutation.
    edit_seq: u64,

    lexer: LexicalHighlighter,
    diagnostics: DiagnosticHighlighter,
    symbol_parser: Option<SourceParser>,
    completer: CompletionChain,

    /// Per-line caches; `None` means the line must be recomputed.
    line_highlights: Vec<Option<LineHighlights>>,
    line_errors: Vec<Option<Option<ErrorSpan>>>,

    symbols: SymbolTable,
    folds: FoldManager,
    bracket_pair: Option<BracketPair>,
    completion: CompletionState,
    search: Search,
    notices: Vec<Notice>,
    theme: Theme,
    config: EditorConfig,
}

impl EditorSession {
    /// Creates an empty Python session.
    pub fn new(config: &EditorConfig) -> Result<Self, SessionError> {
        Self::with_text("", Language::Python, config)
    }

    pub fn with_text(
        text: &str,
        language: Language,
        config: &EditorConfig,
    ) -> Result<Self, SessionError> {
        let mut session = Self {
            buffer: TextBuffer::from_str(text),
            cursor: Cursor::new(),
            history: History::new(config.history_size),
            language,
            state: SessionState::Dirty,
            edit_seq: 0,
            lexer: LexicalHighlighter::new(language)?,
            diagnostics: DiagnosticHighlighter::new(language)?,
            symbol_parser: SourceParser::for_language(language)?,
            completer: CompletionChain::for_language(language, config),
            line_highlights: Vec::new(),
            line_errors: Vec::new(),
            symbols: SymbolTable::default(),
            folds: FoldManager::new(),
            bracket_pair: None,
            completion: CompletionState::default(),
            search: Search::new(),
            notices: Vec::new(),
            theme: Theme::by_name(&config.default_theme).unwrap_or_default(),
            config: config.clone(),
        };
        session.resync(None);
        Ok(session)
    }

    // ==================== Buffer ====================

    /// Replaces the whole buffer. History is cleared and the cursor moves
    /// to the start.
    pub fn set_text(&mut self, text: &str) {
        self.buffer = TextBuffer::from_str(text);
        self.cursor = Cursor::new();
        self.history.clear();
        self.invalidate_caches();
        self.mark_dirty();
        self.resync(None);
    }

    pub fn text(&self) -> String {
        self.buffer.to_string()
    }

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Switches the language, rebuilding rule tables, parsers and providers.
    pub fn set_language(&mut self, language: Language) -> Result<(), SessionError> {
        if language == self.language {
            return Ok(());
        }
        self.lexer = LexicalHighlighter::new(language)?;
        self.diagnostics = DiagnosticHighlighter::new(language)?;
        self.symbol_parser = SourceParser::for_language(language)?;
        self.completer = CompletionChain::for_language(language, &self.config);
        self.language = language;
        log::debug!("session language set to {}", language.name());
        self.invalidate_caches();
        self.mark_dirty();
        self.resync(None);
        Ok(())
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn edit_seq(&self) -> u64 {
        self.edit_seq
    }

    // ==================== Editing ====================

    /// Types a character, replacing the selection if there is one.
    pub fn insert_char(&mut self, c: char) {
        if c == '\n' {
            self.insert_newline();
            return;
        }
        let mut text = [0u8; 4];
        let (ops, caret) = self.replace_selection_ops(c.encode_utf8(&mut text));
        self.edit(ops, Selection::new(caret), false, Some(c));
    }

    /// Inserts text (a paste), replacing the selection if there is one.
    pub fn insert_text(&mut self, text: &str) {
        let (ops, caret) = self.replace_selection_ops(text);
        self.edit(ops, Selection::new(caret), true, None);
    }

    /// Inserts the language's template called `name` as one undoable edit.
    /// Returns false if there is no such template.
    pub fn insert_snippet(&mut self, name: &str) -> bool {
        match self.language.snippet(name) {
            Some(body) => {
                self.insert_text(body);
                true
            }
            None => false,
        }
    }

    /// Enter: line break plus the current indentation, one unit deeper
    /// after a line ending in `:`.
    pub fn insert_newline(&mut self) {
        let (start, _) = self.selection_bounds();
        let (line, _) = self.buffer.char_to_line_col(start);
        let before = self.buffer.slice(self.buffer.line_start(line), start);
        let text = format!("\n{}", indent::newline_indent(&before));
        let (ops, caret) = self.replace_selection_ops(&text);
        self.edit(ops, Selection::new(caret), true, None);
    }

    /// Backspace.
    pub fn delete_backward(&mut self) {
        if self.cursor.has_selection() {
            let (ops, caret) = self.replace_selection_ops("");
            self.edit(ops, Selection::new(caret), true, None);
            return;
        }
        let pos = self.cursor.position();
        if pos == 0 {
            return;
        }
        let op = EditOperation::Delete {
            position: pos - 1,
            text: self.buffer.slice(pos - 1, pos),
        };
        self.edit(vec![op], Selection::new(pos - 1), false, None);
    }

    /// Delete key.
    pub fn delete_forward(&mut self) {
        if self.cursor.has_selection() {
            let (ops, caret) = self.replace_selection_ops("");
            self.edit(ops, Selection::new(caret), true, None);
            return;
        }
        let pos = self.cursor.position();
        if pos >= self.buffer.len_chars() {
            return;
        }
        let op = EditOperation::Delete {
            position: pos,
            text: self.buffer.slice(pos, pos + 1),
        };
        self.edit(vec![op], Selection::new(pos), false, None);
    }

    /// Tab: indent at the cursor, or every line of the selection.
    pub fn indent(&mut self) {
        let edit = indent::indent(&self.buffer, self.cursor.selection());
        self.edit(edit.operations, edit.selection, true, None);
    }

    /// Shift+Tab: remove one full indent unit from the cursor's line or
    /// every line of the selection.
    pub fn outdent(&mut self) {
        let edit = indent::outdent(&self.buffer, self.cursor.selection());
        self.edit(edit.operations, edit.selection, true, None);
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Undoes the last edit group. Returns false if there was nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some((ops, selection)) => {
                self.replay(&ops, selection);
                true
            }
            None => false,
        }
    }

    /// Redoes the last undone edit group.
    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some((ops, selection)) => {
                self.replay(&ops, selection);
                true
            }
            None => false,
        }
    }

    fn selection_bounds(&self) -> (usize, usize) {
        let pos = self.cursor.position();
        self.cursor.selected_range().unwrap_or((pos, pos))
    }

    /// Operations replacing the selection (or inserting at the caret) with
    /// `text`, and the caret position afterwards.
    fn replace_selection_ops(&self, text: &str) -> (Vec<EditOperation>, usize) {
        let (start, end) = self.selection_bounds();
        let mut ops = Vec::new();
        if start < end {
            ops.push(EditOperation::Delete {
                position: start,
                text: self.buffer.slice(start, end),
            });
        }
        if !text.is_empty() {
            ops.push(EditOperation::Insert {
                position: start,
                text: text.to_string(),
            });
        }
        (ops, start + text.chars().count())
    }

    /// Applies `ops` as one undo group and resyncs.
    fn edit(
        &mut self,
        ops: Vec<EditOperation>,
        selection_after: Selection,
        atomic: bool,
        trigger: Option<char>,
    ) {
        if ops.is_empty() {
            return;
        }
        self.history.begin_edit(self.cursor.selection(), atomic);
        for op in ops {
            let change = op.apply(&mut self.buffer);
            self.splice_caches(change);
            self.history.record(op);
        }
        self.history.set_selection_after(selection_after);
        self.history.commit_edit();

        self.cursor.set_selection(selection_after);
        self.cursor.clamp_to_buffer(&self.buffer);
        self.mark_dirty();
        self.resync(trigger);
    }

    /// Applies undo/redo operations without recording them.
    fn replay(&mut self, ops: &[EditOperation], selection: Selection) {
        for op in ops {
            let change = op.apply(&mut self.buffer);
            self.splice_caches(change);
        }
        self.cursor.set_selection(selection);
        self.cursor.clamp_to_buffer(&self.buffer);
        self.mark_dirty();
        self.resync(None);
    }

    // ==================== Recomputation ====================

    fn mark_dirty(&mut self) {
        self.state = SessionState::Dirty;
        self.edit_seq += 1;
    }

    fn invalidate_caches(&mut self) {
        self.line_highlights.clear();
        self.line_errors.clear();
    }

    /// Replaces the cache entries of the lines an edit touched with
    /// "recompute" markers and renumbers the entries that moved.
    fn splice_caches(&mut self, change: LineChange) {
        let len = self.line_highlights.len();
        if len == 0 || self.line_errors.len() != len {
            return;
        }
        let start = change.start.min(len);
        let old_end = (change.old_end + 1).min(len);
        let inserted = change.new_end - change.start + 1;

        self.line_highlights
            .splice(start..old_end, std::iter::repeat(None).take(inserted));
        self.line_errors
            .splice(start..old_end, std::iter::repeat(None).take(inserted));

        if change.line_delta() != 0 {
            let moved = start + inserted;
            for (line, cached) in self.line_highlights.iter_mut().enumerate().skip(moved) {
                if let Some(highlights) = cached {
                    for span in &mut highlights.spans {
                        span.line = line;
                    }
                }
            }
            for (line, cached) in self.line_errors.iter_mut().enumerate().skip(moved) {
                if let Some(Some(span)) = cached {
                    span.line = line;
                }
            }
        }
    }

    fn resync(&mut self, trigger: Option<char>) {
        let highlighted = self.refresh_highlights();
        let diagnosed = self.refresh_diagnostics();
        self.refresh_symbols();
        self.folds.update(&self.buffer);
        if self.search.is_active() {
            self.search.refresh(&self.buffer);
        }
        self.state = SessionState::Clean;
        log::debug!(
            "resync #{}: {highlighted} lines highlighted, {diagnosed} diagnosed, {} functions, {} variables",
            self.edit_seq,
            self.symbols.functions.len(),
            self.symbols.variables.len()
        );

        self.update_bracket_pair();
        match trigger {
            Some(c) if is_identifier_char(c) => self.update_completion(),
            _ => self.completion.hide(),
        }
    }

    /// Re-lexes lines without a cache entry and lines whose incoming lexer
    /// state changed. Returns the number of lines lexed.
    fn refresh_highlights(&mut self) -> usize {
        let line_count = self.buffer.len_lines();
        if self.line_highlights.len() != line_count {
            self.line_highlights = vec![None; line_count];
        }

        let mut state = LexState::Normal;
        let mut lexed = 0;
        for line in 0..line_count {
            let stale = match &self.line_highlights[line] {
                Some(cached) => cached.entry != state,
                None => true,
            };
            if stale {
                let text = self.buffer.line(line).unwrap_or_default();
                self.line_highlights[line] = Some(self.lexer.highlight_line(line, &text, state));
                lexed += 1;
            }
            state = self.line_highlights[line]
                .as_ref()
                .map(|h| h.exit)
                .unwrap_or_default();
        }
        lexed
    }

    fn refresh_diagnostics(&mut self) -> usize {
        let line_count = self.buffer.len_lines();
        if self.line_errors.len() != line_count {
            self.line_errors = vec![None; line_count];
        }

        let mut diagnosed = 0;
        for line in 0..line_count {
            if self.line_errors[line].is_none() {
                let text = self.buffer.line(line).unwrap_or_default();
                self.line_errors[line] = Some(self.diagnostics.diagnose(&text, line));
                diagnosed += 1;
            }
        }
        diagnosed
    }

    fn refresh_symbols(&mut self) {
        self.symbols = match &mut self.symbol_parser {
            Some(parser) => {
                let source = self.buffer.to_string();
                parser
                    .parse_tree(&source)
                    .map(|tree| SymbolTable::from_tree(&tree, &source))
                    .unwrap_or_default()
            }
            None => SymbolTable::default(),
        };
    }

    fn update_bracket_pair(&mut self) {
        self.bracket_pair = match_bracket(&self.buffer, self.cursor.position());
    }

    fn update_completion(&mut self) {
        let pos = self.cursor.position();
        let position = Position::from_char(&self.buffer, pos);
        let before = self.buffer.slice(self.buffer.line_start(position.line), pos);
        let prefix = identifier_prefix(&before);
        if prefix.is_empty() {
            self.completion.hide();
            return;
        }
        let request = CompletionRequest {
            text: self.buffer.to_string(),
            position,
            prefix: prefix.clone(),
            edit_seq: self.edit_seq,
        };
        let candidates = self.completer.complete(&request, &self.symbols);
        self.completion.show(prefix, candidates);
    }

    // ==================== Cursor & Selection ====================

    fn after_cursor_move(&mut self) {
        self.cursor.clamp_to_buffer(&self.buffer);
        self.update_bracket_pair();
        self.completion.hide();
    }

    pub fn cursor_position(&self) -> Position {
        Position::from_char(&self.buffer, self.cursor.position())
    }

    /// Caret as a char index.
    pub fn cursor_offset(&self) -> usize {
        self.cursor.position()
    }

    pub fn selection(&self) -> Selection {
        self.cursor.selection()
    }

    pub fn selected_text(&self) -> Option<String> {
        self.cursor
            .selected_range()
            .map(|(start, end)| self.buffer.slice(start, end))
    }

    /// Moves the caret to `position` (clamped), clearing the selection.
    pub fn set_cursor_position(&mut self, position: Position) {
        let idx = position.to_char(&self.buffer);
        self.cursor.set_position(idx, false);
        self.after_cursor_move();
    }

    pub fn move_left(&mut self, extend: bool) {
        self.cursor.move_left(extend);
        self.after_cursor_move();
    }

    pub fn move_right(&mut self, extend: bool) {
        self.cursor.move_right(&self.buffer, extend);
        self.after_cursor_move();
    }

    pub fn move_up(&mut self, extend: bool) {
        self.cursor.move_up(&self.buffer, extend);
        self.after_cursor_move();
    }

    pub fn move_down(&mut self, extend: bool) {
        self.cursor.move_down(&self.buffer, extend);
        self.after_cursor_move();
    }

    pub fn move_to_line_start(&mut self, extend: bool) {
        self.cursor.move_to_line_start(&self.buffer, extend);
        self.after_cursor_move();
    }

    pub fn move_to_line_end(&mut self, extend: bool) {
        self.cursor.move_to_line_end(&self.buffer, extend);
        self.after_cursor_move();
    }

    pub fn move_to_buffer_start(&mut self, extend: bool) {
        self.cursor.move_to_buffer_start(extend);
        self.after_cursor_move();
    }

    pub fn move_to_buffer_end(&mut self, extend: bool) {
        self.cursor.move_to_buffer_end(&self.buffer, extend);
        self.after_cursor_move();
    }

    /// Selects from `anchor` to `caret` (char indices, clamped).
    pub fn select_range(&mut self, anchor: usize, caret: usize) {
        self.cursor.set_selection(Selection::with_range(anchor, caret));
        self.after_cursor_move();
    }

    pub fn select_all(&mut self) {
        self.select_range(0, self.buffer.len_chars());
    }

    pub fn clear_selection(&mut self) {
        self.cursor.collapse_selection();
        self.after_cursor_move();
    }

    // ==================== Find / Replace ====================

    /// Selects the next occurrence of `query` after the caret, wrapping once
    /// to the start of the buffer.
    pub fn find(&mut self, query: &str) -> Option<SearchMatch> {
        self.search.set_query(query, &self.buffer);
        let (_, from) = self.selection_bounds();
        match self.search.find_from(from) {
            Some(found) => {
                self.cursor
                    .set_selection(Selection::with_range(found.start, found.end));
                self.after_cursor_move();
                Some(found)
            }
            None => {
                self.notices.push(Notice::info(NOT_FOUND));
                None
            }
        }
    }

    /// Replaces every occurrence of `query` as one undoable edit. Returns
    /// the number of replacements.
    pub fn replace_all(&mut self, query: &str, replacement: &str) -> usize {
        let count = self.search.set_query(query, &self.buffer);
        if count == 0 {
            self.notices.push(Notice::info(NOT_FOUND));
            return 0;
        }

        // Keep the caret on the same text; inside a match it moves to the
        // match start.
        let pos = self.cursor.position();
        let replacement_len = replacement.chars().count();
        let mut caret = pos;
        for m in self.search.matches() {
            if m.end <= pos {
                caret = caret + replacement_len - (m.end - m.start);
            } else if m.start < pos {
                caret -= pos - m.start;
            }
        }

        let ops = self.search.replacement_ops(&self.buffer, replacement);
        self.edit(ops, Selection::new(caret), true, None);
        log::debug!("replaced {count} occurrences of {query:?}");
        count
    }

    pub fn clear_search(&mut self) {
        self.search.clear();
    }

    /// Matches of the last query touching lines `first..=last`, for the
    /// host's match highlighting. Kept current across edits.
    pub fn search_matches(&self, first: usize, last: usize) -> Vec<SearchMatch> {
        self.search.matches_in_range(&self.buffer, first, last)
    }

    // ==================== Completion ====================

    /// Explicitly requests completion for the identifier before the caret.
    pub fn trigger_completion(&mut self) {
        self.update_completion();
    }

    /// Replaces the identifier before the caret with the selected candidate.
    /// Returns false if the popup was not showing.
    pub fn accept_completion(&mut self) -> bool {
        let Some(word) = self.completion.selected_candidate().map(str::to_string) else {
            return false;
        };
        let pos = self.cursor.position();
        let (line, _) = self.buffer.char_to_line_col(pos);
        let before = self.buffer.slice(self.buffer.line_start(line), pos);
        let start = pos - identifier_prefix(&before).chars().count();

        let mut ops = Vec::new();
        if start < pos {
            ops.push(EditOperation::Delete {
                position: start,
                text: self.buffer.slice(start, pos),
            });
        }
        ops.push(EditOperation::Insert {
            position: start,
            text: word.clone(),
        });
        self.edit(ops, Selection::new(start + word.chars().count()), true, None);
        true
    }

    pub fn cancel_completion(&mut self) {
        self.completion.hide();
    }

    pub fn select_next_completion(&mut self) {
        self.completion.select_next();
    }

    pub fn select_previous_completion(&mut self) {
        self.completion.select_previous();
    }

    pub fn completion(&self) -> &CompletionState {
        &self.completion
    }

    // ==================== Derived state ====================

    pub fn line_highlights(&self, line: usize) -> Option<&LineHighlights> {
        self.line_highlights.get(line).and_then(Option::as_ref)
    }

    pub fn diagnostic(&self, line: usize) -> Option<ErrorSpan> {
        self.line_errors.get(line).copied().flatten().flatten()
    }

    /// Every error span, in line order.
    pub fn diagnostics(&self) -> Vec<ErrorSpan> {
        self.line_errors.iter().filter_map(|e| e.flatten()).collect()
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn bracket_pair(&self) -> Option<BracketPair> {
        self.bracket_pair
    }

    pub fn folds(&self) -> &FoldManager {
        &self.folds
    }

    pub fn toggle_fold(&mut self, line: usize) -> bool {
        self.folds.toggle_fold_at_line(line)
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    // ==================== Render inputs ====================

    pub fn gutter_width(&self, digit_width: f32) -> f32 {
        render::gutter_width(self.buffer.len_lines(), digit_width)
    }

    pub fn gutter_lines(&self, first: usize, count: usize) -> Vec<GutterLine> {
        render::gutter_lines(self.buffer.len_lines(), &self.folds, first, count)
    }

    pub fn minimap(&self, max_rows: usize) -> Vec<MinimapRow> {
        render::minimap_sample(self.buffer.len_lines(), max_rows)
            .into_iter()
            .map(|line| MinimapRow {
                line,
                indent: self.buffer.leading_whitespace(line),
                len: self.buffer.line_len_chars(line),
                spans: self
                    .line_highlights(line)
                    .map(|h| h.spans.clone())
                    .unwrap_or_default(),
            })
            .collect()
    }

    /// Foreground colour of the character at (`line`, `col`).
    pub fn color_at(&self, line: usize, col: usize) -> Color {
        self.line_highlights(line)
            .and_then(|h| h.style_at(col))
            .map(|style| self.theme.color(style))
            .unwrap_or(self.theme.foreground)
    }
}
