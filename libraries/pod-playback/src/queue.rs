//! Ordered episode queue with a cursor
//!
//! Entries are unique by identity. The cursor is either `None` or a valid
//! index, and structural edits (reorder, remove, clear) keep it pointing at
//! the same entry wherever that entry survives.

use crate::error::{PlaybackError, Result};
use pod_core::types::{EpisodeIdentity, QueueEntry};

/// What a removal did to the cursor
#[derive(Debug, Clone, PartialEq)]
pub struct Removal {
    /// The entry that was removed
    pub entry: QueueEntry,

    /// True if the removed entry was the current one
    pub was_current: bool,
}

/// Playback queue
#[derive(Debug, Clone, Default)]
pub struct Queue {
    entries: Vec<QueueEntry>,
    cursor: Option<usize>,
}

impl Queue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries in playback order
    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the current entry
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Current entry
    pub fn current(&self) -> Option<&QueueEntry> {
        self.cursor.and_then(|i| self.entries.get(i))
    }

    /// Entry at index
    pub fn get(&self, index: usize) -> Option<&QueueEntry> {
        self.entries.get(index)
    }

    /// Index of the entry with this identity
    pub fn position_of(&self, identity: &EpisodeIdentity) -> Option<usize> {
        self.entries.iter().position(|e| &e.identity == identity)
    }

    /// Check if an identity is queued
    pub fn contains(&self, identity: &EpisodeIdentity) -> bool {
        self.position_of(identity).is_some()
    }

    /// Whether an entry follows the cursor
    pub fn has_next(&self) -> bool {
        self.cursor.is_some_and(|i| i + 1 < self.entries.len())
    }

    /// Whether an entry precedes the cursor
    pub fn has_previous(&self) -> bool {
        self.cursor.is_some_and(|i| i > 0)
    }

    /// Append an entry
    ///
    /// Returns false (and changes nothing) if the identity is already queued.
    /// The first entry of an empty queue becomes current.
    pub fn enqueue(&mut self, entry: QueueEntry) -> bool {
        if self.contains(&entry.identity) {
            return false;
        }

        self.entries.push(entry);
        if self.cursor.is_none() && self.entries.len() == 1 {
            self.cursor = Some(0);
        }
        true
    }

    /// Make an entry current, appending it if it isn't queued yet
    ///
    /// Returns the new cursor.
    pub fn select_or_append(&mut self, entry: QueueEntry) -> usize {
        let index = match self.position_of(&entry.identity) {
            Some(index) => index,
            None => {
                self.entries.push(entry);
                self.entries.len() - 1
            }
        };
        self.cursor = Some(index);
        index
    }

    /// Move the cursor to `index`
    pub fn select(&mut self, index: usize) -> Result<&QueueEntry> {
        if index >= self.entries.len() {
            return Err(PlaybackError::IndexOutOfBounds {
                index,
                len: self.entries.len(),
            });
        }
        self.cursor = Some(index);
        Ok(&self.entries[index])
    }

    /// Move the cursor forward one entry
    pub fn advance(&mut self) -> Option<&QueueEntry> {
        if !self.has_next() {
            return None;
        }
        let next = self.cursor.map_or(0, |i| i + 1);
        self.cursor = Some(next);
        self.entries.get(next)
    }

    /// Move the cursor back one entry
    pub fn retreat(&mut self) -> Option<&QueueEntry> {
        if !self.has_previous() {
            return None;
        }
        let previous = self.cursor.map_or(0, |i| i - 1);
        self.cursor = Some(previous);
        self.entries.get(previous)
    }

    /// Move the entry at `from` to `to`
    ///
    /// The cursor keeps following the entry it pointed at.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.entries.len();
        if from >= len {
            return Err(PlaybackError::IndexOutOfBounds { index: from, len });
        }
        if to >= len {
            return Err(PlaybackError::IndexOutOfBounds { index: to, len });
        }
        if from == to {
            return Ok(());
        }

        let entry = self.entries.remove(from);
        self.entries.insert(to, entry);

        if let Some(cursor) = self.cursor {
            self.cursor = Some(if cursor == from {
                to
            } else if from < cursor && to >= cursor {
                cursor - 1
            } else if from > cursor && to <= cursor {
                cursor + 1
            } else {
                cursor
            });
        }

        Ok(())
    }

    /// Remove the entry at `index`
    ///
    /// Removing the current entry moves the cursor onto the entry that slides
    /// into its place, or onto the new last entry if it was last.
    pub fn remove(&mut self, index: usize) -> Result<Removal> {
        let len = self.entries.len();
        if index >= len {
            return Err(PlaybackError::IndexOutOfBounds { index, len });
        }

        let entry = self.entries.remove(index);
        let remaining = self.entries.len();
        let was_current = self.cursor == Some(index);

        self.cursor = match self.cursor {
            Some(_) if remaining == 0 => None,
            Some(cursor) if cursor == index => Some(index.min(remaining - 1)),
            Some(cursor) if cursor > index => Some(cursor - 1),
            other => other,
        };

        Ok(Removal { entry, was_current })
    }

    /// Empty the queue, optionally keeping the current entry
    pub fn clear(&mut self, retain_current: bool) {
        let kept = if retain_current {
            self.current().cloned()
        } else {
            None
        };

        self.entries.clear();
        self.cursor = None;

        if let Some(entry) = kept {
            self.entries.push(entry);
            self.cursor = Some(0);
        }
    }
}
