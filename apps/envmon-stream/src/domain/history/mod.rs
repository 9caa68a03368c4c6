//! Live History Buffer
//!
//! Bounded, insertion-ordered window over the most recent readings.
//! Append-only: the oldest entries are evicted once capacity is exceeded.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::domain::reading::Reading;

/// Number of readings kept for the live view.
pub const HISTORY_CAPACITY: usize = 20;

/// FIFO ring buffer of readings (oldest first).
///
/// Has a single writer. Readers receive snapshots, never a reference into
/// the live buffer.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    entries: VecDeque<Reading>,
    capacity: usize,
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryBuffer {
    /// Create a buffer with the standard live-view capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    /// Create a buffer with a custom capacity (minimum 1).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append a reading, evicting from the front while over capacity.
    pub fn push(&mut self, reading: Reading) {
        self.entries.push_back(reading);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Copy of the buffered readings, oldest to newest.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Reading> {
        self.entries.iter().cloned().collect()
    }

    /// Shared immutable snapshot suitable for publishing to readers.
    #[must_use]
    pub fn shared_snapshot(&self) -> Arc<[Reading]> {
        self.entries.iter().cloned().collect()
    }

    /// Most recently pushed reading.
    #[must_use]
    pub fn latest(&self) -> Option<&Reading> {
        self.entries.back()
    }

    /// Number of buffered readings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the buffer holds no readings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of readings retained.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}
