//! Per-entity routing of child actions to sub-components.
//!
//! Every registered entity owns a [`ChildRouter`]. A child action is handed
//! to each component whose [`ChildType`] matches and which declared interest
//! in the action's kind. When nothing matches (the component has not been
//! attached yet), the action waits in the router's local retry queue and is
//! re-attempted at the start of every tick.
//!
//! ```
//! use ironclad_core::action::{ActionKind, ChildAction, ChildType};
//! use ironclad_engine::config::BusMode;
//! use ironclad_engine::pending::ExpiryPolicy;
//! use ironclad_engine::router::{ChildComponent, ChildRouter};
//! use ironclad_engine::store::{DispatchContext, Outbox};
//!
//! struct Barrel { fired: u32 }
//!
//! impl ChildComponent for Barrel {
//!     fn child_type(&self) -> ChildType { ChildType::Shooter }
//!     fn interests(&self) -> &[ActionKind] { &[ActionKind::Fire] }
//!     fn on_child_action(&mut self, action: &ChildAction, _ctx: &mut DispatchContext<'_>) {
//!         if let ChildAction::Fire { rounds } = action {
//!             self.fired += rounds;
//!         }
//!     }
//! }
//!
//! let mut router = ChildRouter::new(ExpiryPolicy::Never);
//! let mut outbox = Outbox::new();
//!
//! // No shooter yet: the action is parked.
//! let mut ctx = DispatchContext::new(0, 0, BusMode::Live, &mut outbox);
//! assert!(router.route(ChildAction::Fire { rounds: 2 }, 0, &mut ctx).is_empty());
//! assert_eq!(router.pending_len(), 1);
//!
//! router.register_component(Box::new(Barrel { fired: 0 }));
//! let mut ctx = DispatchContext::new(1, 1, BusMode::Live, &mut outbox);
//! let retried = router.retry_pending(&mut ctx);
//! assert_eq!(retried.len(), 1);
//! assert_eq!(retried[0].components, vec![0]);
//! ```

use ironclad_core::action::{ActionKind, ChildAction, ChildType};
use tracing::debug;

use crate::pending::{Expiring, ExpiryPolicy, PendingQueue};
use crate::store::DispatchContext;

// ---------------------------------------------------------------------------
// ChildComponent
// ---------------------------------------------------------------------------

/// A sub-component of an entity (chassis, gimbal, shooter, armor).
pub trait ChildComponent {
    fn child_type(&self) -> ChildType;

    /// Child action kinds this component handles.
    fn interests(&self) -> &[ActionKind];

    fn on_child_action(&mut self, action: &ChildAction, ctx: &mut DispatchContext<'_>);
}

// ---------------------------------------------------------------------------
// Retry entries
// ---------------------------------------------------------------------------

/// A child action waiting for a matching component.
#[derive(Debug, Clone)]
pub struct ParkedChild {
    pub action: ChildAction,
    pub issued_tick: u64,
}

impl Expiring for ParkedChild {
    fn issued_tick(&self) -> u64 {
        self.issued_tick
    }
}

/// A parked action that found its components on retry.
#[derive(Debug, Clone)]
pub struct RoutedChild {
    pub action: ChildAction,
    pub issued_tick: u64,
    /// Indices of the components that received the action.
    pub components: Vec<usize>,
}

// ---------------------------------------------------------------------------
// ChildRouter
// ---------------------------------------------------------------------------

pub struct ChildRouter {
    components: Vec<Box<dyn ChildComponent>>,
    retry: PendingQueue<ParkedChild>,
}

impl ChildRouter {
    pub fn new(retry_policy: ExpiryPolicy) -> Self {
        Self {
            components: Vec::new(),
            retry: PendingQueue::new(retry_policy),
        }
    }

    /// Attach a component. Returns its index.
    pub fn register_component(&mut self, component: Box<dyn ChildComponent>) -> usize {
        debug!(
            child_type = component.child_type().as_str(),
            index = self.components.len(),
            "child component registered"
        );
        self.components.push(component);
        self.components.len() - 1
    }

    /// Deliver `action` to every matching component, in registration order.
    ///
    /// Returns the indices of the components that received it. If none
    /// matched, the action is parked for retry and the result is empty.
    pub fn route(
        &mut self,
        action: ChildAction,
        issued_tick: u64,
        ctx: &mut DispatchContext<'_>,
    ) -> Vec<usize> {
        let delivered = self.deliver(&action, ctx);
        if delivered.is_empty() {
            self.retry.push(ParkedChild {
                action,
                issued_tick,
            });
        }
        delivered
    }

    /// Re-attempt every parked action.
    ///
    /// Entries past the retry policy are dropped; the rest either reach their
    /// components now or are parked again with their original issued tick.
    pub fn retry_pending(&mut self, ctx: &mut DispatchContext<'_>) -> Vec<RoutedChild> {
        if self.retry.is_empty() {
            return Vec::new();
        }
        let expired_before = self.retry.expired_total();
        let parked = self.retry.drain_unexpired(ctx.tick);
        let dropped = self.retry.expired_total() - expired_before;
        if dropped > 0 {
            debug!(dropped, tick = ctx.tick, "parked child actions expired");
        }

        let mut routed = Vec::new();
        for entry in parked {
            ctx.issued_tick = entry.issued_tick;
            let components = self.deliver(&entry.action, ctx);
            if components.is_empty() {
                self.retry.push(entry);
            } else {
                routed.push(RoutedChild {
                    action: entry.action,
                    issued_tick: entry.issued_tick,
                    components,
                });
            }
        }
        routed
    }

    fn deliver(&mut self, action: &ChildAction, ctx: &mut DispatchContext<'_>) -> Vec<usize> {
        let child_type = action.receiver_child_type();
        let kind = action.kind();
        let mut delivered = Vec::new();
        for (index, component) in self.components.iter_mut().enumerate() {
            if component.child_type() == child_type && component.interests().contains(&kind) {
                component.on_child_action(action, ctx);
                delivered.push(index);
            }
        }
        delivered
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Parked actions awaiting a component.
    pub fn pending_len(&self) -> usize {
        self.retry.len()
    }

    pub fn expired_total(&self) -> u64 {
        self.retry.expired_total()
    }
}

impl std::fmt::Debug for ChildRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChildRouter")
            .field("components", &self.components.len())
            .field("pending", &self.retry.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
