//! Redundancy filter for child actions.
//!
//! Remembers the last serialized payload per `(owner, child type, kind)` and
//! suppresses a fresh child send whose payload is identical. Entries are
//! never evicted during a match.

use std::collections::HashMap;

use ironclad_core::action::{ActionKind, ChildType};
use tracing::trace;

#[derive(Debug, Default)]
pub struct RedundancyFilter {
    last_payload: HashMap<(String, ChildType, ActionKind), String>,
    suppressed: u64,
}

impl RedundancyFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `payload` repeats the stored payload for the key.
    /// Otherwise stores `payload` and returns `false`.
    ///
    /// `owner` is the owner's text form.
    pub fn should_suppress(
        &mut self,
        owner: &str,
        child_type: ChildType,
        kind: ActionKind,
        payload: &str,
    ) -> bool {
        let key = (owner.to_owned(), child_type, kind);
        match self.last_payload.get_mut(&key) {
            Some(stored) if stored == payload => {
                self.suppressed += 1;
                trace!(owner, kind = kind.as_str(), "suppressed redundant child action");
                true
            }
            Some(stored) => {
                payload.clone_into(stored);
                false
            }
            None => {
                self.last_payload.insert(key, payload.to_owned());
                false
            }
        }
    }

    /// Suppressions since the start of the match.
    pub fn suppressed(&self) -> u64 {
        self.suppressed
    }

    /// Number of keys with a stored payload.
    pub fn len(&self) -> usize {
        self.last_payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_payload.is_empty()
    }
}
