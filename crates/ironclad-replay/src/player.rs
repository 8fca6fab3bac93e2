//! Cursor over a loaded replay log.
//!
//! The [`ReplayPlayer`] does not decode or deliver anything itself. Each tick
//! the dispatch bus asks for the next entry that is due
//! ([`next_due`](ReplayPlayer::next_due)), re-issues it, and only then
//! [`advance`](ReplayPlayer::advance)s the cursor. An entry that cannot be
//! re-issued therefore stays under the cursor, which is what makes a corrupt
//! log abort at a deterministic position instead of being skipped.

use crate::log::LogEntry;
use crate::ReplayError;

/// Walks a list of [`LogEntry`] values in recorded order.
///
/// Ticks are mostly non-decreasing, but a late entry may carry a lower tick
/// than its predecessor. It becomes due as soon as the cursor reaches it.
#[derive(Debug, Clone, Default)]
pub struct ReplayPlayer {
    entries: Vec<LogEntry>,
    cursor: usize,
}

impl ReplayPlayer {
    /// Create a player positioned at the first entry.
    pub fn new(entries: Vec<LogEntry>) -> Self {
        Self { entries, cursor: 0 }
    }

    /// The entry under the cursor, if its tick is `<= tick`.
    pub fn next_due(&self, tick: u64) -> Option<&LogEntry> {
        self.entries
            .get(self.cursor)
            .filter(|entry| u64::try_from(entry.tick).map_or(true, |t| t <= tick))
    }

    /// Move past the entry under the cursor.
    pub fn advance(&mut self) {
        if self.cursor < self.entries.len() {
            self.cursor += 1;
        }
    }

    /// Index of the entry under the cursor.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Move the cursor back to the first entry.
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    /// Number of entries not yet re-issued.
    pub fn remaining(&self) -> usize {
        self.entries.len() - self.cursor
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.entries.len()
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Structural checks that do not require decoding actions.
    ///
    /// # Errors
    ///
    /// [`ReplayError::MissingOwner`] if a child entry has no owner.
    pub fn validate(&self) -> Result<(), ReplayError> {
        for (index, entry) in self.entries.iter().enumerate() {
            if entry.is_child && entry.owner.is_none() {
                return Err(ReplayError::MissingOwner {
                    index,
                    tick: entry.tick,
                });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
