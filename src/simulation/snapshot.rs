//! Bounded snapshot log with a cursor for undo/redo
//!
//! A command-log of full state snapshots with bounded retention.
//! Recording past the capacity evicts the oldest entry and re-bases
//! the cursor; recording while the cursor sits mid-log truncates the
//! redo tail first, matching conventional time-travel semantics.

use std::collections::VecDeque;

/// Default number of retained snapshots
pub const DEFAULT_SNAPSHOT_CAPACITY: usize = 50;

/// Bounded undo/redo log of cloned snapshots
#[derive(Debug, Clone)]
pub struct SnapshotLog<T: Clone> {
    entries: VecDeque<T>,
    /// Index of the current snapshot; meaningless while empty
    cursor: usize,
    capacity: usize,
}

impl<T: Clone> SnapshotLog<T> {
    /// Log with the default 50-entry capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SNAPSHOT_CAPACITY)
    }

    /// Log retaining at most `capacity` snapshots
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "snapshot capacity must be positive");
        Self {
            entries: VecDeque::with_capacity(capacity),
            cursor: 0,
            capacity,
        }
    }

    /// Append a snapshot, discarding any redo tail and evicting the
    /// oldest entry once past capacity
    pub fn record(&mut self, snapshot: T) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        self.entries.push_back(snapshot);
        if self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        self.cursor = self.entries.len() - 1;
    }

    /// Step the cursor back and return that snapshot
    pub fn undo(&mut self) -> Option<T> {
        if self.cursor == 0 || self.entries.is_empty() {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor).cloned()
    }

    /// Step the cursor forward and return that snapshot
    pub fn redo(&mut self) -> Option<T> {
        if self.entries.is_empty() || self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor).cloned()
    }

    /// The snapshot the cursor currently points at
    pub fn current(&self) -> Option<&T> {
        self.entries.get(self.cursor)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0 && !self.entries.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.entries.is_empty() && self.cursor + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T: Clone> Default for SnapshotLog<T> {
    fn default() -> Self {
        Self::new()
    }
}
