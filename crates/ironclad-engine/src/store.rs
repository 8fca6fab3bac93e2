//! Entities and the context they receive during dispatch.
//!
//! An entity is anything implementing [`Store`]: it has an [`Identity`] and
//! reacts to the top-level actions it subscribed to. Entities (and their
//! sub-components, see [`router`](crate::router)) may emit follow-up actions
//! through the [`DispatchContext`]; those are staged in an [`Outbox`] and
//! enter the bus after the current drain, so they are dispatched on the next
//! tick.

use ironclad_core::action::{Action, ChildAction};
use ironclad_core::identity::Identity;

use crate::config::BusMode;
use crate::pending::Outgoing;

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// A registered entity.
pub trait Store {
    /// Identity the entity registers under.
    ///
    /// Read once at registration; later changes go through
    /// [`Action::Reidentify`].
    fn identity(&self) -> Identity;

    /// Handle a top-level action of a subscribed kind.
    fn on_action(&mut self, action: &Action, ctx: &mut DispatchContext<'_>);
}

// ---------------------------------------------------------------------------
// Outbox
// ---------------------------------------------------------------------------

/// Sends staged by entities while the bus is draining.
#[derive(Debug, Default)]
pub struct Outbox {
    staged: Vec<Outgoing>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn send(&mut self, action: Action) {
        self.staged.push(Outgoing::Action(action));
    }

    pub fn send_child(&mut self, owner: Identity, action: ChildAction) {
        self.staged.push(Outgoing::Child { owner, action });
    }

    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Take every staged send in submission order.
    pub fn take(&mut self) -> Vec<Outgoing> {
        std::mem::take(&mut self.staged)
    }
}

// ---------------------------------------------------------------------------
// DispatchContext
// ---------------------------------------------------------------------------

/// What a receiver sees while handling an action.
#[derive(Debug)]
pub struct DispatchContext<'a> {
    /// Tick currently being processed.
    pub tick: u64,
    /// Tick the delivered action was issued on. Differs from `tick` for
    /// actions that waited in a retry queue.
    pub issued_tick: u64,
    pub mode: BusMode,
    outbox: &'a mut Outbox,
}

impl<'a> DispatchContext<'a> {
    pub fn new(tick: u64, issued_tick: u64, mode: BusMode, outbox: &'a mut Outbox) -> Self {
        Self {
            tick,
            issued_tick,
            mode,
            outbox,
        }
    }

    /// Stage a top-level action for the next tick.
    ///
    /// During replay only live-only actions are accepted; the rest are
    /// already in the log and will be injected from there.
    pub fn send(&mut self, action: Action) {
        self.outbox.send(action);
    }

    /// Stage a child action for the next tick.
    pub fn send_child(&mut self, owner: Identity, action: ChildAction) {
        self.outbox.send_child(owner, action);
    }

    pub fn is_replay(&self) -> bool {
        self.mode == BusMode::Replay
    }
}
