//! The linear undo/redo timeline.
//!
//! [`CommandLog`] stores recorded actions in order together with a cursor.
//! Entries before the cursor are "past" (undoable), entries at or after it
//! are "future" (redoable). The invariant `0 <= cursor <= len` holds after
//! every operation.
//!
//! Recording while redoable entries exist truncates them first. Out-of-range
//! undo/redo are no-ops that return `false`; none of the operations can fail.

use std::fmt;

use tracing::{debug, trace};

use crate::action::{Action, FnAction};

// ---------------------------------------------------------------------------
// HistoryEntry
// ---------------------------------------------------------------------------

/// A read-only view of one recorded entry, for history display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryEntry<'a> {
    /// Position of the entry in the log.
    pub position: usize,
    /// The action's label.
    pub label: &'a str,
    /// `true` if the entry is before the cursor (can be undone).
    pub is_past: bool,
}

// ---------------------------------------------------------------------------
// CommandLog
// ---------------------------------------------------------------------------

/// Append-only, position-indexed sequence of reversible actions over `T`.
///
/// The log never holds the target itself. Callers pass the target to
/// [`undo`](Self::undo) and [`redo`](Self::redo), which keeps the owning
/// project the single holder of mutable state.
///
/// An optional capacity bounds the number of stored entries. When exceeded,
/// the oldest entries are dropped and the cursor is shifted to match.
pub struct CommandLog<T> {
    entries: Vec<Box<dyn Action<T>>>,
    cursor: usize,
    capacity: Option<usize>,
}

impl<T> CommandLog<T> {
    /// Create an empty, unbounded log.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
            capacity: None,
        }
    }

    /// Create an empty log that keeps at most `capacity` entries.
    ///
    /// A capacity of zero is treated as one: the most recent action is
    /// always undoable.
    pub fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
            capacity: Some(capacity.max(1)),
        }
    }

    /// Record an already-performed action.
    ///
    /// Discards every entry at or after the cursor, appends the action and
    /// moves the cursor past it.
    pub fn record<A>(&mut self, action: A)
    where
        A: Action<T> + 'static,
    {
        self.record_boxed(Box::new(action));
    }

    /// Record a boxed action. See [`record`](Self::record).
    pub fn record_boxed(&mut self, action: Box<dyn Action<T>>) {
        let discarded = self.entries.len() - self.cursor;
        if discarded > 0 {
            debug!(discarded, "discarding redoable history");
            self.entries.truncate(self.cursor);
        }

        trace!(label = action.label(), position = self.entries.len(), "recording action");
        self.entries.push(action);
        self.cursor = self.entries.len();

        if let Some(capacity) = self.capacity {
            if self.entries.len() > capacity {
                let excess = self.entries.len() - capacity;
                self.entries.drain(..excess);
                self.cursor -= excess;
            }
        }
    }

    /// Undo the most recent past entry.
    ///
    /// Returns `false` (nothing to undo) when the cursor is at the start.
    pub fn undo(&mut self, target: &mut T) -> bool {
        if self.cursor == 0 {
            debug!("nothing to undo");
            return false;
        }

        self.cursor -= 1;
        let action = &mut self.entries[self.cursor];
        trace!(label = action.label(), position = self.cursor, "undo");
        action.apply_undo(target);
        true
    }

    /// Redo the entry at the cursor.
    ///
    /// Returns `false` (nothing to redo) when the cursor is at the end.
    pub fn redo(&mut self, target: &mut T) -> bool {
        if self.cursor == self.entries.len() {
            debug!("nothing to redo");
            return false;
        }

        let action = &mut self.entries[self.cursor];
        trace!(label = action.label(), position = self.cursor, "redo");
        action.apply_redo(target);
        self.cursor += 1;
        true
    }

    /// `true` if at least one entry can be undone.
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    /// `true` if at least one entry can be redone.
    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len()
    }

    /// Clear every entry and move the cursor back to the start.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }

    /// Index of the next insertion position.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Total number of stored entries, past and future.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The configured entry limit, if any.
    pub fn capacity_limit(&self) -> Option<usize> {
        self.capacity
    }

    /// Label of the entry the next [`undo`](Self::undo) would revert.
    pub fn undo_label(&self) -> Option<&str> {
        self.cursor
            .checked_sub(1)
            .map(|position| self.entries[position].label())
    }

    /// Label of the entry the next [`redo`](Self::redo) would re-apply.
    pub fn redo_label(&self) -> Option<&str> {
        self.entries.get(self.cursor).map(|action| action.label())
    }

    /// Iterate over all entries in timeline order.
    pub fn entries(&self) -> impl Iterator<Item = HistoryEntry<'_>> {
        self.entries
            .iter()
            .enumerate()
            .map(move |(position, action)| HistoryEntry {
                position,
                label: action.label(),
                is_past: position < self.cursor,
            })
    }
}

impl<T: 'static> CommandLog<T> {
    /// Record a closure pair. Shorthand for `record(FnAction::new(..))`.
    pub fn record_fn<U, R>(&mut self, undo: U, redo: R, label: impl Into<String>)
    where
        U: FnMut(&mut T) + 'static,
        R: FnMut(&mut T) + 'static,
    {
        self.record(FnAction::new(undo, redo, label));
    }
}

impl<T> Default for CommandLog<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for CommandLog<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<&str> = self.entries.iter().map(|a| a.label()).collect();
        f.debug_struct("CommandLog")
            .field("entries", &labels)
            .field("cursor", &self.cursor)
            .field("capacity", &self.capacity)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
