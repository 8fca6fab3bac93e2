//! Dispatch trace: an ordered record of every delivery the bus made.
//!
//! Enabled through [`BusConfig::trace_dispatch`](crate::config::BusConfig).
//! Two runs of the same match are compared by their trace sequences or by
//! the BLAKE3 digest over all records.

use std::fmt;

use ironclad_core::action::ChildType;
use ironclad_core::identity::Identity;

/// Who received a delivery.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Receiver {
    /// A top-level action delivered to an entity.
    Entity(Identity),
    /// A child action delivered to sub-component `index` of `owner`.
    Component {
        owner: Identity,
        child_type: ChildType,
        index: usize,
    },
}

impl fmt::Display for Receiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Receiver::Entity(identity) => write!(f, "{identity}"),
            Receiver::Component {
                owner,
                child_type,
                index,
            } => write!(f, "{owner}/{}#{index}", child_type.as_str()),
        }
    }
}

/// One delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchRecord {
    pub issued_tick: u64,
    pub delivered_tick: u64,
    pub receiver: Receiver,
    /// Serialized action.
    pub action: String,
}

#[derive(Debug, Clone, Default)]
pub struct DispatchTrace {
    records: Vec<DispatchRecord>,
}

impl DispatchTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: DispatchRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[DispatchRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// `(issued tick, receiver text, action)` per delivery, in order.
    ///
    /// Independent of the delivery tick, so a live run and its replay
    /// compare equal.
    pub fn sequence(&self) -> Vec<(u64, String, String)> {
        self.records
            .iter()
            .map(|r| (r.issued_tick, r.receiver.to_string(), r.action.clone()))
            .collect()
    }

    /// BLAKE3 hex digest over every record, delivery tick included.
    pub fn digest(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for record in &self.records {
            hasher.update(&record.issued_tick.to_le_bytes());
            hasher.update(&record.delivered_tick.to_le_bytes());
            hasher.update(record.receiver.to_string().as_bytes());
            hasher.update(&[0]);
            hasher.update(record.action.as_bytes());
            hasher.update(&[0]);
        }
        hasher.finalize().to_hex().to_string()
    }
}
