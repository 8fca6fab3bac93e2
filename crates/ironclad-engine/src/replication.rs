//! Replication handoff for child actions.
//!
//! The authoritative bus hands every child action it forwards to a
//! registered owner to a [`ReplicationSink`]. Observers apply what they
//! receive to their own view; they never run dispatch themselves.

/// Receives serialized child actions for replication to observers.
pub trait ReplicationSink {
    /// `owner_key` is the owner's identity text, `action` the serialized
    /// child action.
    fn replicate(&mut self, owner_key: &str, action: &str);
}

/// Collects replicated actions in memory.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BufferedSink {
    pub sent: Vec<(String, String)>,
}

impl ReplicationSink for BufferedSink {
    fn replicate(&mut self, owner_key: &str, action: &str) {
        self.sent.push((owner_key.to_owned(), action.to_owned()));
    }
}

impl<F> ReplicationSink for F
where
    F: FnMut(&str, &str),
{
    fn replicate(&mut self, owner_key: &str, action: &str) {
        self(owner_key, action)
    }
}
