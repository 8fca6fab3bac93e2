//! Pending-dispatch arena shared by every retry path.
//!
//! Work that cannot be delivered yet (no subscriber for a kind, owner entity
//! not registered, no matching sub-component) waits in a [`PendingQueue`].
//! Each queue carries an explicit [`ExpiryPolicy`]: the bus's global delay
//! queue expires entries after its horizon, child routers keep theirs until
//! delivered unless configured otherwise.
//!
//! ```
//! use ironclad_engine::pending::{Expiring, ExpiryPolicy, PendingQueue};
//!
//! struct Job(u64);
//! impl Expiring for Job {
//!     fn issued_tick(&self) -> u64 { self.0 }
//! }
//!
//! let mut queue = PendingQueue::new(ExpiryPolicy::AfterTicks(10));
//! queue.push(Job(0));
//! queue.push(Job(5));
//!
//! let survivors = queue.drain_unexpired(12);
//! assert_eq!(survivors.len(), 1);
//! assert_eq!(queue.expired_total(), 1);
//! ```

use std::collections::VecDeque;

use ironclad_core::action::{Action, ActionKind, ChildAction};
use ironclad_core::identity::Identity;

// ---------------------------------------------------------------------------
// ExpiryPolicy
// ---------------------------------------------------------------------------

/// When a pending entry is given up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryPolicy {
    /// Retry until delivered.
    Never,
    /// Drop once `now - issued_tick >= n`.
    AfterTicks(u64),
}

impl ExpiryPolicy {
    pub fn is_expired(&self, issued_tick: u64, now: u64) -> bool {
        match *self {
            ExpiryPolicy::Never => false,
            ExpiryPolicy::AfterTicks(horizon) => now.saturating_sub(issued_tick) >= horizon,
        }
    }
}

/// Anything that remembers the tick it was issued on.
pub trait Expiring {
    fn issued_tick(&self) -> u64;
}

// ---------------------------------------------------------------------------
// PendingQueue
// ---------------------------------------------------------------------------

/// FIFO of undelivered work with an expiry policy.
#[derive(Debug)]
pub struct PendingQueue<T> {
    entries: VecDeque<T>,
    policy: ExpiryPolicy,
    expired_total: u64,
}

impl<T: Expiring> PendingQueue<T> {
    pub fn new(policy: ExpiryPolicy) -> Self {
        Self {
            entries: VecDeque::new(),
            policy,
            expired_total: 0,
        }
    }

    pub fn push(&mut self, entry: T) {
        self.entries.push_back(entry);
    }

    /// Remove every entry, dropping the expired ones and returning the rest
    /// in FIFO order.
    pub fn drain_unexpired(&mut self, now: u64) -> Vec<T> {
        let policy = self.policy;
        let mut survivors = Vec::with_capacity(self.entries.len());
        for entry in self.entries.drain(..) {
            if policy.is_expired(entry.issued_tick(), now) {
                self.expired_total += 1;
            } else {
                survivors.push(entry);
            }
        }
        survivors
    }

    pub fn policy(&self) -> ExpiryPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries dropped by the expiry policy since creation.
    pub fn expired_total(&self) -> u64 {
        self.expired_total
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }
}

// ---------------------------------------------------------------------------
// Outgoing / PendingSend
// ---------------------------------------------------------------------------

/// An action as submitted to the bus.
#[derive(Debug, Clone, PartialEq)]
pub enum Outgoing {
    /// A top-level action for every subscriber of its kind.
    Action(Action),
    /// A child action for one sub-component of `owner`.
    Child { owner: Identity, action: ChildAction },
}

impl Outgoing {
    pub fn is_live_only(&self) -> bool {
        match self {
            Outgoing::Action(action) => action.is_live_only(),
            Outgoing::Child { action, .. } => action.is_live_only(),
        }
    }

    /// Whether every float in the payload is finite.
    pub fn is_finite(&self) -> bool {
        match self {
            Outgoing::Action(action) => action.is_finite(),
            Outgoing::Child { action, .. } => action.is_finite(),
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Outgoing::Action(action) => action.kind(),
            Outgoing::Child { action, .. } => action.kind(),
        }
    }

    pub fn is_child(&self) -> bool {
        matches!(self, Outgoing::Child { .. })
    }
}

impl From<Action> for Outgoing {
    fn from(action: Action) -> Self {
        Outgoing::Action(action)
    }
}

/// A queued send waiting for the next drain.
#[derive(Debug, Clone)]
pub struct PendingSend {
    pub outgoing: Outgoing,
    /// Tick the send was accepted on; this is the tick that gets recorded.
    pub issued_tick: u64,
    /// Set once the send has been through the delay queue. Retries skip the
    /// redundancy filter, which already saw the payload.
    pub retried: bool,
}

impl PendingSend {
    pub fn new(outgoing: Outgoing, issued_tick: u64) -> Self {
        Self {
            outgoing,
            issued_tick,
            retried: false,
        }
    }
}

impl Expiring for PendingSend {
    fn issued_tick(&self) -> u64 {
        self.issued_tick
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Job {
        id: u32,
        issued: u64,
    }

    impl Expiring for Job {
        fn issued_tick(&self) -> u64 {
            self.issued
        }
    }

    fn job(id: u32, issued: u64) -> Job {
        Job { id, issued }
    }

    #[test]
    fn never_policy_keeps_everything() {
        let mut queue = PendingQueue::new(ExpiryPolicy::Never);
        queue.push(job(1, 0));
        queue.push(job(2, 3));

        let survivors = queue.drain_unexpired(u64::MAX);
        assert_eq!(survivors, vec![job(1, 0), job(2, 3)]);
        assert!(queue.is_empty());
        assert_eq!(queue.expired_total(), 0);
    }

    #[test]
    fn horizon_boundary_is_exclusive() {
        let policy = ExpiryPolicy::AfterTicks(50);
        assert!(!policy.is_expired(0, 49));
        assert!(policy.is_expired(0, 50));
        assert!(!policy.is_expired(10, 59));
        assert!(policy.is_expired(10, 60));
    }

    #[test]
    fn drain_preserves_fifo_order_of_survivors() {
        let mut queue = PendingQueue::new(ExpiryPolicy::AfterTicks(5));
        queue.push(job(1, 10));
        queue.push(job(2, 2));
        queue.push(job(3, 9));
        queue.push(job(4, 1));

        let ids: Vec<u32> = queue.drain_unexpired(10).into_iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(queue.expired_total(), 2);
    }

    #[test]
    fn issued_in_the_future_is_not_expired() {
        let policy = ExpiryPolicy::AfterTicks(1);
        assert!(!policy.is_expired(10, 3));
    }

    #[test]
    fn outgoing_classification() {
        let axes: Outgoing = Action::ControlAxes {
            vertical: 1.0,
            horizontal: 0.0,
        }
        .into();
        assert!(axes.is_live_only());
        assert!(!axes.is_child());

        let fire = Outgoing::Child {
            owner: Identity::new(
                ironclad_core::identity::Camp::Red,
                ironclad_core::identity::Role::Hero,
                1,
            ),
            action: ChildAction::Fire { rounds: 1 },
        };
        assert!(!fire.is_live_only());
        assert!(fire.is_child());
    }
}
