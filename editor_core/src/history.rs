//! Undo/Redo history.
//!
//! Consecutive single-character typing or backspacing inside a short time
//! window is merged into one undo step. Structural edits (indent over a
//! selection, replace-all, completion acceptance) are recorded as atomic
//! groups and never merge with their neighbours.

use crate::buffer::{LineChange, TextBuffer};
use crate::cursor::Selection;
use std::time::{Duration, Instant};

/// Default time window for coalescing edits (in milliseconds).
const COALESCE_WINDOW_MS: u64 = 300;

/// A single reversible buffer edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOperation {
    /// Insert text at position.
    Insert { position: usize, text: String },
    /// Delete text starting at position.
    Delete { position: usize, text: String },
}

impl EditOperation {
    /// Returns the inverse operation (for undo).
    pub fn inverse(&self) -> EditOperation {
        match self {
            EditOperation::Insert { position, text } => EditOperation::Delete {
                position: *position,
                text: text.clone(),
            },
            EditOperation::Delete { position, text } => EditOperation::Insert {
                position: *position,
                text: text.clone(),
            },
        }
    }

    /// Applies the operation to `buffer`.
    pub fn apply(&self, buffer: &mut TextBuffer) -> LineChange {
        match self {
            EditOperation::Insert { position, text } => buffer.insert(*position, text),
            EditOperation::Delete { position, text } => {
                buffer.remove(*position, *position + text.chars().count())
            }
        }
    }

    fn is_single_char(&self) -> bool {
        let text = match self {
            EditOperation::Insert { text, .. } | EditOperation::Delete { text, .. } => text,
        };
        text.chars().count() == 1
    }
}

/// A group of edit operations that are undone/redone together.
#[derive(Debug, Clone)]
pub struct EditGroup {
    /// The operations in this group (in order of execution).
    pub operations: Vec<EditOperation>,
    /// Cursor selection before the edit.
    pub selection_before: Selection,
    /// Cursor selection after the edit.
    pub selection_after: Selection,
    /// Atomic groups never merge with neighbouring groups.
    pub atomic: bool,
    last_edit_time: Option<Instant>,
}

impl EditGroup {
    pub fn new(selection_before: Selection, atomic: bool) -> Self {
        Self {
            operations: Vec::new(),
            selection_before,
            selection_after: selection_before,
            atomic,
            last_edit_time: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn push(&mut self, op: EditOperation) {
        self.operations.push(op);
        self.last_edit_time = Some(Instant::now());
    }

    /// Returns true if `new_op` continues the typing run recorded in this group.
    fn can_coalesce(&self, new_op: &EditOperation, window: Duration) -> bool {
        if self.atomic {
            return false;
        }
        let within_window = self
            .last_edit_time
            .map(|t| t.elapsed() <= window)
            .unwrap_or(false);
        if !within_window {
            return false;
        }
        let Some(last_op) = self.operations.last() else {
            return true;
        };
        if !last_op.is_single_char() || !new_op.is_single_char() {
            return false;
        }
        match (last_op, new_op) {
            (
                EditOperation::Insert { position: p1, text: t1 },
                EditOperation::Insert { position: p2, .. },
            ) => *p2 == *p1 + 1 && !t1.ends_with('\n'),
            (EditOperation::Delete { position: p1, .. }, EditOperation::Delete { position: p2, .. }) => {
                *p2 + 1 == *p1
            }
            _ => false,
        }
    }

    fn merge(&mut self, other: EditGroup) {
        self.operations.extend(other.operations);
        self.selection_after = other.selection_after;
        self.last_edit_time = other.last_edit_time;
    }
}

/// Manages undo/redo history.
#[derive(Debug)]
pub struct History {
    undo_stack: Vec<EditGroup>,
    redo_stack: Vec<EditGroup>,
    max_size: usize,
    current_group: Option<EditGroup>,
    coalesce_window: Duration,
}

impl Default for History {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl History {
    /// Creates a new history with the given maximum depth.
    pub fn new(max_size: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_size: max_size.max(1),
            current_group: None,
            coalesce_window: Duration::from_millis(COALESCE_WINDOW_MS),
        }
    }

    /// Sets the coalesce window duration. A zero window disables coalescing.
    pub fn set_coalesce_window(&mut self, window: Duration) {
        self.coalesce_window = window;
    }

    /// Starts a new edit group, committing any group still open.
    pub fn begin_edit(&mut self, selection: Selection, atomic: bool) {
        self.commit_edit();
        self.current_group = Some(EditGroup::new(selection, atomic));
    }

    /// Records an operation in the current group.
    pub fn record(&mut self, op: EditOperation) {
        match &mut self.current_group {
            Some(group) => group.push(op),
            None => {
                // Edits outside begin/commit become their own group.
                let mut group = EditGroup::new(Selection::default(), false);
                group.push(op);
                self.push_undo(group);
            }
        }
    }

    /// Sets the selection after the current edit.
    pub fn set_selection_after(&mut self, selection: Selection) {
        if let Some(group) = &mut self.current_group {
            group.selection_after = selection;
        }
    }

    /// Commits the current edit group.
    pub fn commit_edit(&mut self) {
        let Some(group) = self.current_group.take() else {
            return;
        };
        if group.is_empty() {
            return;
        }
        if !group.atomic && group.operations.len() == 1 {
            if let Some(last_group) = self.undo_stack.last_mut() {
                if last_group.can_coalesce(&group.operations[0], self.coalesce_window) {
                    last_group.merge(group);
                    self.redo_stack.clear();
                    return;
                }
            }
        }
        self.push_undo(group);
    }

    fn push_undo(&mut self, group: EditGroup) {
        self.undo_stack.push(group);
        self.redo_stack.clear();
        if self.undo_stack.len() > self.max_size {
            let overflow = self.undo_stack.len() - self.max_size;
            self.undo_stack.drain(..overflow);
        }
    }

    /// Returns true if undo is available.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
            || self.current_group.as_ref().is_some_and(|g| !g.is_empty())
    }

    /// Returns true if redo is available.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Pops the last edit group for undo.
    /// Returns the inverse operations (in application order) and the selection to restore.
    pub fn undo(&mut self) -> Option<(Vec<EditOperation>, Selection)> {
        self.commit_edit();
        let group = self.undo_stack.pop()?;
        let ops = group.operations.iter().rev().map(EditOperation::inverse).collect();
        let selection = group.selection_before;
        self.redo_stack.push(group);
        Some((ops, selection))
    }

    /// Pops the last undone edit group for redo.
    pub fn redo(&mut self) -> Option<(Vec<EditOperation>, Selection)> {
        let group = self.redo_stack.pop()?;
        let ops = group.operations.clone();
        let selection = group.selection_after;
        self.undo_stack.push(group);
        Some((ops, selection))
    }

    /// Clears all history.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.current_group = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert(position: usize, text: &str) -> EditOperation {
        EditOperation::Insert {
            position,
            text: text.to_string(),
        }
    }

    fn typed(history: &mut History, position: usize, text: &str) {
        history.begin_edit(Selection::new(position), false);
        history.record(insert(position, text));
        history.set_selection_after(Selection::new(position + 1));
        history.commit_edit();
    }

    #[test]
    fn test_undo_redo() {
        let mut history = History::new(100);
        history.begin_edit(Selection::new(0), false);
        history.record(insert(0, "hello"));
        history.set_selection_after(Selection::new(5));
        history.commit_edit();

        let (ops, sel) = history.undo().unwrap();
        assert_eq!(
            ops,
            vec![EditOperation::Delete {
                position: 0,
                text: "hello".to_string()
            }]
        );
        assert_eq!(sel, Selection::new(0));
        assert!(history.can_redo());

        let (ops, sel) = history.redo().unwrap();
        assert_eq!(ops, vec![insert(0, "hello")]);
        assert_eq!(sel, Selection::new(5));
    }

    #[test]
    fn test_apply_and_inverse() {
        let mut buffer = TextBuffer::from_str("héllo");
        let op = insert(1, "ü");
        op.apply(&mut buffer);
        assert_eq!(buffer.to_string(), "hüéllo");
        op.inverse().apply(&mut buffer);
        assert_eq!(buffer.to_string(), "héllo");
    }

    #[test]
    fn test_redo_cleared_on_new_edit() {
        let mut history = History::new(100);
        typed(&mut history, 0, "a");
        history.undo();
        assert!(history.can_redo());

        typed(&mut history, 0, "b");
        assert!(!history.can_redo());
    }

    #[test]
    fn test_coalescing_consecutive_inserts() {
        let mut history = History::new(100);
        history.set_coalesce_window(Duration::from_millis(1000));

        typed(&mut history, 0, "a");
        typed(&mut history, 1, "b");
        typed(&mut history, 2, "c");

        assert_eq!(history.undo_stack.len(), 1);
        let (ops, _) = history.undo().unwrap();
        assert_eq!(ops.len(), 3);
    }

    #[test]
    fn test_coalescing_breaks_after_newline() {
        let mut history = History::new(100);
        history.set_coalesce_window(Duration::from_millis(1000));

        typed(&mut history, 0, "a");
        typed(&mut history, 1, "\n");
        typed(&mut history, 2, "b");

        assert_eq!(history.undo_stack.len(), 2);
    }

    #[test]
    fn test_atomic_groups_never_merge() {
        let mut history = History::new(100);
        history.set_coalesce_window(Duration::from_millis(1000));

        typed(&mut history, 0, "a");
        history.begin_edit(Selection::new(1), true);
        history.record(insert(1, "b"));
        history.commit_edit();
        typed(&mut history, 2, "c");

        assert_eq!(history.undo_stack.len(), 3);
    }

    #[test]
    fn test_zero_window_disables_coalescing() {
        let mut history = History::new(100);
        history.set_coalesce_window(Duration::ZERO);
        typed(&mut history, 0, "a");
        std::thread::sleep(Duration::from_millis(2));
        typed(&mut history, 1, "b");
        assert_eq!(history.undo_stack.len(), 2);
    }

    #[test]
    fn test_max_size_drops_oldest() {
        let mut history = History::new(2);
        history.set_coalesce_window(Duration::ZERO);
        for i in 0..4 {
            history.begin_edit(Selection::new(i), true);
            history.record(insert(i, "x"));
            history.commit_edit();
        }
        assert_eq!(history.undo_stack.len(), 2);
    }
}
