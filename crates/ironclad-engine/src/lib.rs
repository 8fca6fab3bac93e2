//! Ironclad Engine -- deterministic action dispatch for robot matches.
//!
//! The engine routes typed [`Action`](ironclad_core::action::Action)s to
//! registered entities and [`ChildAction`](ironclad_core::action::ChildAction)s
//! to their sub-components, one tick at a time. A live match records every
//! accepted action; a replay feeds the recorded log back through the same
//! dispatch path.
//!
//! # Architecture
//!
//! - [`bus`]: [`ActionBus`](bus::ActionBus), the tick-driven dispatcher.
//! - [`router`]: per-entity child routing with local retry.
//! - [`filter`]: suppression of repeated child payloads.
//! - [`pending`]: retry queues with explicit expiry.
//! - [`store`]: the entity trait and dispatch context.
//! - [`context`]: [`SimulationContext`](context::SimulationContext), the
//!   match lifecycle (init, tick, teardown and log flush).
//! - [`trace`]: optional delivery trace for determinism checks.
//!
//! # Example
//!
//! ```
//! use ironclad_engine::prelude::*;
//!
//! struct Turret { identity: Identity, spawned: bool }
//!
//! impl Store for Turret {
//!     fn identity(&self) -> Identity { self.identity }
//!     fn on_action(&mut self, action: &Action, _ctx: &mut DispatchContext<'_>) {
//!         if let Action::Spawn { .. } = action {
//!             self.spawned = true;
//!         }
//!     }
//! }
//!
//! let sentry = Identity::new(Camp::Blue, Role::Sentry, 7);
//! let mut bus = ActionBus::live(BusConfig::default());
//! bus.register(Turret { identity: sentry, spawned: false }, &[ActionKind::Spawn]);
//!
//! bus.send(Action::Spawn { receiver: sentry });
//! let report = bus.tick().unwrap();
//! assert_eq!(report.dispatched, 1);
//! assert_eq!(bus.recorder().len(), 1);
//! ```

#![deny(unsafe_code)]

pub mod bus;
pub mod config;
pub mod context;
pub mod filter;
pub mod pending;
pub mod replication;
pub mod router;
pub mod schedule;
pub mod store;
pub mod trace;

pub use ironclad_core;
pub use ironclad_replay;

use ironclad_core::identity::Identity;
use ironclad_core::CoreError;
use ironclad_replay::ReplayError;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by the action bus.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("no entity registered as '{owner}'")]
    UnknownOwner { owner: Identity },

    #[error("failed to record action: {0}")]
    Record(#[from] ReplayError),

    /// A due log entry could not be decoded. Replay stops here.
    #[error("replay entry {index} (tick {tick}) is corrupt: {source}")]
    CorruptReplayEntry {
        index: usize,
        tick: i32,
        #[source]
        source: CoreError,
    },

    #[error("replay halted at corrupt entry {index}")]
    ReplayHalted { index: usize },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::bus::{ActionBus, EntityKey, TickReport};
    pub use crate::config::{BusConfig, BusMode, MatchConfig};
    pub use crate::context::{FlushReport, Lifecycle, SimulationContext};
    pub use crate::pending::{ExpiryPolicy, Outgoing};
    pub use crate::replication::ReplicationSink;
    pub use crate::router::ChildComponent;
    pub use crate::store::{DispatchContext, Store};
    pub use crate::trace::{DispatchTrace, Receiver};
    pub use crate::BusError;
    pub use ironclad_core::prelude::*;
}
