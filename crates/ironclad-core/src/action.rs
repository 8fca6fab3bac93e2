//! Closed action types routed by the dispatch bus.
//!
//! Two sum types cover everything the bus can carry:
//!
//! - [`Action`]: top-level commands and events, delivered to every entity
//!   that declared interest in the action's [`ActionKind`].
//! - [`ChildAction`]: commands addressed to one sub-component
//!   ([`ChildType`]) of one entity. The owning entity's identity travels
//!   next to the action (supplied by the sender), not inside it.
//!
//! Every variant has exactly one [`ActionKind`], so adding a variant without
//! classifying it (kind, live-only, child type) fails to compile.
//!
//! # Live-only actions
//!
//! Some actions are continuous corrections or raw control input. They are
//! never written to the replay log and are always accepted by the bus, even
//! while a recorded match is being replayed. [`Action::is_live_only`] and
//! [`ChildAction::is_live_only`] are the single source of truth for that
//! classification.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::identity::{Camp, Identity};

// ---------------------------------------------------------------------------
// ActionKind
// ---------------------------------------------------------------------------

/// Tag naming the concrete variant of an [`Action`] or [`ChildAction`].
///
/// Entities and sub-components declare interest by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ActionKind {
    // top-level
    Spawn,
    Damage,
    Kill,
    Revive,
    CoinUpdate,
    Reidentify,
    PositionCorrection,
    ControlAxes,
    // child
    ChassisDrive,
    GimbalAim,
    GimbalSync,
    Fire,
    ArmorHit,
    ArmorLight,
}

impl ActionKind {
    /// The kind string, identical to the `"kind"` discriminator written by
    /// the JSON codec.
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Spawn => "Spawn",
            ActionKind::Damage => "Damage",
            ActionKind::Kill => "Kill",
            ActionKind::Revive => "Revive",
            ActionKind::CoinUpdate => "CoinUpdate",
            ActionKind::Reidentify => "Reidentify",
            ActionKind::PositionCorrection => "PositionCorrection",
            ActionKind::ControlAxes => "ControlAxes",
            ActionKind::ChassisDrive => "ChassisDrive",
            ActionKind::GimbalAim => "GimbalAim",
            ActionKind::GimbalSync => "GimbalSync",
            ActionKind::Fire => "Fire",
            ActionKind::ArmorHit => "ArmorHit",
            ActionKind::ArmorLight => "ArmorLight",
        }
    }

    /// Whether this kind names a [`ChildAction`] variant.
    pub fn is_child(self) -> bool {
        matches!(
            self,
            ActionKind::ChassisDrive
                | ActionKind::GimbalAim
                | ActionKind::GimbalSync
                | ActionKind::Fire
                | ActionKind::ArmorHit
                | ActionKind::ArmorLight
        )
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ChildType
// ---------------------------------------------------------------------------

/// Sub-component tag used to route [`ChildAction`]s inside an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChildType {
    Chassis,
    Gimbal,
    Shooter,
    Armor,
}

impl ChildType {
    pub fn as_str(self) -> &'static str {
        match self {
            ChildType::Chassis => "Chassis",
            ChildType::Gimbal => "Gimbal",
            ChildType::Shooter => "Shooter",
            ChildType::Armor => "Armor",
        }
    }
}

impl fmt::Display for ChildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// A top-level command or event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Action {
    /// A robot entered the field.
    Spawn { receiver: Identity },
    /// Damage applied to `receiver`.
    Damage {
        receiver: Identity,
        attacker: Option<Identity>,
        amount: u32,
    },
    Kill { killer: Identity, victim: Identity },
    Revive { receiver: Identity },
    /// A camp's coin balance changed.
    CoinUpdate { camp: Camp, coins: i32 },
    /// An entity's addressing identity changed. The bus applies this to its
    /// registry as well as delivering it to interested entities.
    Reidentify { previous: Identity, current: Identity },
    /// Continuous authoritative pose correction. Live-only.
    PositionCorrection {
        receiver: Identity,
        x: f32,
        y: f32,
        heading: f32,
    },
    /// Raw operator control axes, not addressed to any entity. Live-only.
    ControlAxes { vertical: f32, horizontal: f32 },
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Spawn { .. } => ActionKind::Spawn,
            Action::Damage { .. } => ActionKind::Damage,
            Action::Kill { .. } => ActionKind::Kill,
            Action::Revive { .. } => ActionKind::Revive,
            Action::CoinUpdate { .. } => ActionKind::CoinUpdate,
            Action::Reidentify { .. } => ActionKind::Reidentify,
            Action::PositionCorrection { .. } => ActionKind::PositionCorrection,
            Action::ControlAxes { .. } => ActionKind::ControlAxes,
        }
    }

    /// Whether this action bypasses the replay log and the replay gate.
    pub fn is_live_only(&self) -> bool {
        match self {
            Action::PositionCorrection { .. } | Action::ControlAxes { .. } => true,
            Action::Spawn { .. }
            | Action::Damage { .. }
            | Action::Kill { .. }
            | Action::Revive { .. }
            | Action::CoinUpdate { .. }
            | Action::Reidentify { .. } => false,
        }
    }

    /// The entity this action is about, if it targets one.
    pub fn receiver(&self) -> Option<Identity> {
        match self {
            Action::Spawn { receiver }
            | Action::Damage { receiver, .. }
            | Action::Revive { receiver }
            | Action::PositionCorrection { receiver, .. } => Some(*receiver),
            Action::Kill { victim, .. } => Some(*victim),
            Action::Reidentify { previous, .. } => Some(*previous),
            Action::CoinUpdate { .. } | Action::ControlAxes { .. } => None,
        }
    }

    /// `false` if any float field is NaN or infinite. Such values have no
    /// JSON representation.
    pub fn is_finite(&self) -> bool {
        match self {
            Action::PositionCorrection { x, y, heading, .. } => {
                x.is_finite() && y.is_finite() && heading.is_finite()
            }
            Action::ControlAxes {
                vertical,
                horizontal,
            } => vertical.is_finite() && horizontal.is_finite(),
            Action::Spawn { .. }
            | Action::Damage { .. }
            | Action::Kill { .. }
            | Action::Revive { .. }
            | Action::CoinUpdate { .. }
            | Action::Reidentify { .. } => true,
        }
    }
}

// ---------------------------------------------------------------------------
// ChildAction
// ---------------------------------------------------------------------------

/// A command addressed to one sub-component of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ChildAction {
    /// Desired chassis velocity in the robot frame.
    ChassisDrive { vx: f32, vy: f32, spin: f32 },
    /// Gimbal aim target in degrees.
    GimbalAim { yaw: f32, pitch: f32 },
    /// Authoritative gimbal pose correction. Live-only.
    GimbalSync { yaw: f32, pitch: f32 },
    Fire { rounds: u32 },
    /// A projectile struck armor plate `plate`.
    ArmorHit { plate: u8, damage: u32 },
    /// Switch the armor light bar on or off.
    ArmorLight { lit: bool },
}

impl ChildAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            ChildAction::ChassisDrive { .. } => ActionKind::ChassisDrive,
            ChildAction::GimbalAim { .. } => ActionKind::GimbalAim,
            ChildAction::GimbalSync { .. } => ActionKind::GimbalSync,
            ChildAction::Fire { .. } => ActionKind::Fire,
            ChildAction::ArmorHit { .. } => ActionKind::ArmorHit,
            ChildAction::ArmorLight { .. } => ActionKind::ArmorLight,
        }
    }

    /// The sub-component type that handles this action.
    pub fn receiver_child_type(&self) -> ChildType {
        match self {
            ChildAction::ChassisDrive { .. } => ChildType::Chassis,
            ChildAction::GimbalAim { .. } | ChildAction::GimbalSync { .. } => ChildType::Gimbal,
            ChildAction::Fire { .. } => ChildType::Shooter,
            ChildAction::ArmorHit { .. } | ChildAction::ArmorLight { .. } => ChildType::Armor,
        }
    }

    /// Whether this action bypasses the replay log and the replay gate.
    pub fn is_live_only(&self) -> bool {
        match self {
            ChildAction::GimbalSync { .. } => true,
            ChildAction::ChassisDrive { .. }
            | ChildAction::GimbalAim { .. }
            | ChildAction::Fire { .. }
            | ChildAction::ArmorHit { .. }
            | ChildAction::ArmorLight { .. } => false,
        }
    }

    /// `false` if any float field is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        match self {
            ChildAction::ChassisDrive { vx, vy, spin } => {
                vx.is_finite() && vy.is_finite() && spin.is_finite()
            }
            ChildAction::GimbalAim { yaw, pitch } | ChildAction::GimbalSync { yaw, pitch } => {
                yaw.is_finite() && pitch.is_finite()
            }
            ChildAction::Fire { .. } | ChildAction::ArmorHit { .. } | ChildAction::ArmorLight { .. } => {
                true
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
