//! Shared fixtures for the engine integration tests: a small arena of robots
//! with the usual sub-components, each logging what it receives.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use ironclad_engine::prelude::*;

/// `(delivered tick, issued tick, receiver, action)` per delivery.
pub type Deliveries = Rc<RefCell<Vec<(u64, u64, String, String)>>>;

pub const TOP_LEVEL: &[ActionKind] = &[
    ActionKind::Spawn,
    ActionKind::Damage,
    ActionKind::Kill,
    ActionKind::Revive,
    ActionKind::CoinUpdate,
    ActionKind::Reidentify,
    ActionKind::PositionCorrection,
    ActionKind::ControlAxes,
];

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

pub fn hero() -> Identity {
    Identity::new(Camp::Red, Role::Hero, 1)
}

pub fn infantry() -> Identity {
    Identity::new(Camp::Red, Role::Infantry, 3)
}

pub fn sentry() -> Identity {
    Identity::new(Camp::Blue, Role::Sentry, 7)
}

pub fn traced() -> BusConfig {
    BusConfig {
        trace_dispatch: true,
        ..BusConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Robot
// ---------------------------------------------------------------------------

/// An entity that logs every action and revives itself when killed.
pub struct Robot {
    pub identity: Identity,
    pub log: Deliveries,
}

impl Store for Robot {
    fn identity(&self) -> Identity {
        self.identity
    }

    fn on_action(&mut self, action: &Action, ctx: &mut DispatchContext<'_>) {
        self.log.borrow_mut().push((
            ctx.tick,
            ctx.issued_tick,
            self.identity.to_string(),
            format!("{action:?}"),
        ));
        if let Action::Kill { victim, .. } = action {
            if *victim == self.identity {
                ctx.send(Action::Revive { receiver: *victim });
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Part
// ---------------------------------------------------------------------------

/// A sub-component that logs every child action it handles.
pub struct Part {
    pub owner: Identity,
    pub child_type: ChildType,
    pub interests: Vec<ActionKind>,
    pub log: Deliveries,
}

impl ChildComponent for Part {
    fn child_type(&self) -> ChildType {
        self.child_type
    }

    fn interests(&self) -> &[ActionKind] {
        &self.interests
    }

    fn on_child_action(&mut self, action: &ChildAction, ctx: &mut DispatchContext<'_>) {
        self.log.borrow_mut().push((
            ctx.tick,
            ctx.issued_tick,
            format!("{}/{}", self.owner, self.child_type.as_str()),
            format!("{action:?}"),
        ));
    }
}

pub fn part(owner: Identity, child_type: ChildType, log: &Deliveries) -> Part {
    let interests = match child_type {
        ChildType::Chassis => vec![ActionKind::ChassisDrive],
        ChildType::Gimbal => vec![ActionKind::GimbalAim, ActionKind::GimbalSync],
        ChildType::Shooter => vec![ActionKind::Fire],
        ChildType::Armor => vec![ActionKind::ArmorHit, ActionKind::ArmorLight],
    };
    Part {
        owner,
        child_type,
        interests,
        log: Rc::clone(log),
    }
}

/// Register `identity` with every top-level kind and a full set of parts
/// (two armor plates).
pub fn register_robot(bus: &mut ActionBus, identity: Identity, log: &Deliveries) -> EntityKey {
    let key = bus.register(
        Robot {
            identity,
            log: Rc::clone(log),
        },
        TOP_LEVEL,
    );
    for child_type in [
        ChildType::Chassis,
        ChildType::Gimbal,
        ChildType::Shooter,
        ChildType::Armor,
        ChildType::Armor,
    ] {
        bus.register_component(identity, part(identity, child_type, log))
            .expect("owner was just registered");
    }
    key
}

/// The standard three-robot arena.
pub fn populate(bus: &mut ActionBus) -> Deliveries {
    let log = Deliveries::default();
    for identity in [hero(), infantry(), sentry()] {
        register_robot(bus, identity, &log);
    }
    log
}

/// Whether a serialized action (as stored in traces) is live-only.
pub fn is_live_only_text(text: &str) -> bool {
    let codec = JsonCodec;
    if let Ok(action) = codec.decode_action(text) {
        return action.is_live_only();
    }
    codec
        .decode_child(text)
        .map(|action| action.is_live_only())
        .unwrap_or(false)
}

/// Trace sequence without live-only deliveries.
pub fn recorded_sequence(trace: &DispatchTrace) -> Vec<(u64, String, String)> {
    trace
        .sequence()
        .into_iter()
        .filter(|(_, _, action)| !is_live_only_text(action))
        .collect()
}
