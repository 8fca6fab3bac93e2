//! Records accepted actions into an ordered replay log.
//!
//! The dispatch bus calls [`ReplayRecorder::append`] whenever it accepts an
//! action for delivery during a live match. Entries carry the tick the action
//! was *issued* on, which can be earlier than the tick it was delivered on
//! (a child action waiting for its owner to register). Entries are kept in
//! the order they were dispatched, so a late entry can carry a lower tick
//! than the one before it. The replay cursor injects every entry whose tick
//! is `<=` the current tick, which catches such an entry up in place.
//!
//! A recorder created with [`ReplayRecorder::disabled`] ignores every
//! append. Replaying buses use one so a replay never rewrites its own log.

use tracing::trace;

use crate::log::{LogEntry, MatchLog};
use crate::ReplayError;

// ---------------------------------------------------------------------------
// ReplayRecorder
// ---------------------------------------------------------------------------

/// Accumulates [`LogEntry`] values in dispatch order.
#[derive(Debug, Clone)]
pub struct ReplayRecorder {
    entries: Vec<LogEntry>,
    enabled: bool,
    /// Appends whose tick was lower than the previous entry's.
    late_entries: usize,
}

impl ReplayRecorder {
    /// Create an enabled recorder with an empty log.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            enabled: true,
            late_entries: 0,
        }
    }

    /// Create a recorder that ignores every append.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Record one accepted action.
    ///
    /// Returns `Ok(false)` when the recorder is disabled.
    ///
    /// # Errors
    ///
    /// [`ReplayError::TickOverflow`] if `tick` does not fit the log's 32-bit
    /// tick field.
    pub fn append(
        &mut self,
        tick: u64,
        is_child: bool,
        action: String,
        owner: Option<String>,
    ) -> Result<bool, ReplayError> {
        if !self.enabled {
            return Ok(false);
        }
        let tick = i32::try_from(tick).map_err(|_| ReplayError::TickOverflow { tick })?;
        let entry = LogEntry {
            tick,
            is_child,
            action,
            owner,
        };

        if let Some(last) = self.entries.last() {
            if last.tick > tick {
                trace!(tick, previous = last.tick, "recording late entry");
                self.late_entries += 1;
            }
        }
        self.entries.push(entry);
        Ok(true)
    }

    /// Entries recorded so far, in dispatch order.
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// How many entries were recorded with a tick lower than their
    /// predecessor's.
    pub fn late_entries(&self) -> usize {
        self.late_entries
    }

    /// Wrap the recorded entries and match metadata into a [`MatchLog`].
    pub fn finish(self, map: &str, team_a: &str, team_b: &str) -> MatchLog {
        MatchLog {
            map: map.to_owned(),
            team_a: team_a.to_owned(),
            team_b: team_b.to_owned(),
            entries: self.entries,
        }
    }
}

impl Default for ReplayRecorder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
