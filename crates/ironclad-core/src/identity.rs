//! Addressing identity for simulation entities.
//!
//! Every addressable participant in a match (robots, outposts, bases) carries
//! an [`Identity`]: the camp it fights for, its role, a serial number within
//! that role, and an optional spawn `order` assigned by the match host.
//!
//! Identities double as payload fields inside actions and as the owner key of
//! child actions in the persisted replay log, so their text form is fixed:
//!
//! ```text
//! <camp>;<role>;<serial>;<order>
//! ```
//!
//! ```
//! use ironclad_core::identity::{Camp, Identity, Role};
//!
//! let hero = Identity::new(Camp::Red, Role::Hero, 1);
//! assert_eq!(hero.to_string(), "Red;Hero;1;0");
//! assert_eq!("Red;Hero;1;0".parse::<Identity>().unwrap(), hero);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::CoreError;

/// Field separator of the identity text form.
pub const SEPARATOR: char = ';';

// ---------------------------------------------------------------------------
// Camp
// ---------------------------------------------------------------------------

/// The side an entity fights for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Camp {
    Red,
    Blue,
    /// Referee-owned or unaffiliated entities.
    Neutral,
}

impl Camp {
    /// All camps, in declaration order.
    pub const ALL: [Camp; 3] = [Camp::Red, Camp::Blue, Camp::Neutral];

    /// The name used in the identity text form.
    pub fn as_str(self) -> &'static str {
        match self {
            Camp::Red => "Red",
            Camp::Blue => "Blue",
            Camp::Neutral => "Neutral",
        }
    }
}

impl fmt::Display for Camp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Camp {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Camp::ALL
            .into_iter()
            .find(|camp| camp.as_str() == s)
            .ok_or_else(|| CoreError::InvalidIdentity {
                text: s.to_owned(),
                reason: "unknown camp".to_owned(),
            })
    }
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// What kind of participant an entity is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    Hero,
    Engineer,
    Infantry,
    Sentry,
    Drone,
    Outpost,
    Base,
}

impl Role {
    /// All roles, in declaration order.
    pub const ALL: [Role; 7] = [
        Role::Hero,
        Role::Engineer,
        Role::Infantry,
        Role::Sentry,
        Role::Drone,
        Role::Outpost,
        Role::Base,
    ];

    /// The name used in the identity text form.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Hero => "Hero",
            Role::Engineer => "Engineer",
            Role::Infantry => "Infantry",
            Role::Sentry => "Sentry",
            Role::Drone => "Drone",
            Role::Outpost => "Outpost",
            Role::Base => "Base",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| CoreError::InvalidIdentity {
                text: s.to_owned(),
                reason: "unknown role".to_owned(),
            })
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// The addressing key of an entity and a payload field inside actions.
///
/// # Equality
///
/// When **both** identities carry a nonzero [`order`](Self::order), they are
/// equal iff their orders are equal, regardless of camp, role or serial.
/// Otherwise they are equal iff `(camp, role, serial)` match.
///
/// This relation is not transitive across ordered and unordered identities,
/// so `Identity` is `PartialEq` only. Registries keyed by identity use
/// linear lookups with this equality instead of hashing.
#[derive(Debug, Clone, Copy)]
pub struct Identity {
    pub camp: Camp,
    pub role: Role,
    pub serial: i32,
    /// Spawn order assigned by the match host. `0` means unset.
    pub order: u32,
}

impl Identity {
    /// Create an identity without a spawn order.
    pub fn new(camp: Camp, role: Role, serial: i32) -> Self {
        Self {
            camp,
            role,
            serial,
            order: 0,
        }
    }

    /// Return a copy of this identity with the given spawn order.
    pub fn with_order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }

    /// Whether the host assigned a spawn order.
    pub fn is_ordered(&self) -> bool {
        self.order != 0
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        if self.is_ordered() && other.is_ordered() {
            return self.order == other.order;
        }
        self.camp == other.camp && self.role == other.role && self.serial == other.serial
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{SEPARATOR}{}{SEPARATOR}{}{SEPARATOR}{}",
            self.camp, self.role, self.serial, self.order
        )
    }
}

impl FromStr for Identity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| CoreError::InvalidIdentity {
            text: s.to_owned(),
            reason: reason.to_owned(),
        };

        let fields: Vec<&str> = s.split(SEPARATOR).collect();
        let [camp, role, serial, order] = fields.as_slice() else {
            return Err(invalid(&format!("expected 4 fields, found {}", fields.len())));
        };

        Ok(Self {
            camp: camp.parse().map_err(|_| invalid("unknown camp"))?,
            role: role.parse().map_err(|_| invalid("unknown role"))?,
            serial: serial.parse().map_err(|_| invalid("serial is not an integer"))?,
            order: order
                .parse()
                .map_err(|_| invalid("order is not an unsigned integer"))?,
        })
    }
}

impl Serialize for Identity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Identity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unordered_identities_compare_by_fields() {
        let a = Identity::new(Camp::Red, Role::Hero, 1);
        let b = Identity::new(Camp::Red, Role::Hero, 1);
        assert_eq!(a, b);

        let other_serial = Identity::new(Camp::Red, Role::Hero, 2);
        assert_ne!(a, other_serial);

        let other_camp = Identity::new(Camp::Blue, Role::Hero, 1);
        assert_ne!(a, other_camp);
    }

    #[test]
    fn ordered_identities_compare_by_order_alone() {
        let c = Identity::new(Camp::Red, Role::Hero, 1).with_order(7);
        let d = Identity::new(Camp::Blue, Role::Infantry, 9).with_order(7);
        assert_eq!(c, d);

        let e = Identity::new(Camp::Red, Role::Hero, 1).with_order(8);
        assert_ne!(c, e, "same fields but different nonzero orders");
    }

    #[test]
    fn one_sided_order_falls_back_to_fields() {
        let ordered = Identity::new(Camp::Red, Role::Sentry, 3).with_order(4);
        let unordered = Identity::new(Camp::Red, Role::Sentry, 3);
        assert_eq!(ordered, unordered);
        assert_eq!(unordered, ordered);

        let stranger = Identity::new(Camp::Blue, Role::Sentry, 3);
        assert_ne!(ordered, stranger);
    }

    #[test]
    fn text_form_is_fixed() {
        let id = Identity::new(Camp::Blue, Role::Engineer, 2).with_order(11);
        assert_eq!(id.to_string(), "Blue;Engineer;2;11");

        let neg = Identity::new(Camp::Neutral, Role::Base, -1);
        assert_eq!(neg.to_string(), "Neutral;Base;-1;0");
    }

    #[test]
    fn parse_restores_every_field() {
        let id: Identity = "Blue;Drone;6;3".parse().unwrap();
        assert_eq!(id.camp, Camp::Blue);
        assert_eq!(id.role, Role::Drone);
        assert_eq!(id.serial, 6);
        assert_eq!(id.order, 3);
    }

    #[test]
    fn parse_rejects_malformed_text() {
        for text in [
            "",
            "Red;Hero;1",
            "Red;Hero;1;0;extra",
            "Green;Hero;1;0",
            "Red;Pilot;1;0",
            "Red;Hero;one;0",
            "Red;Hero;1;-3",
            "red;Hero;1;0",
        ] {
            let err = text.parse::<Identity>().unwrap_err();
            assert!(
                matches!(err, CoreError::InvalidIdentity { .. }),
                "{text:?} should be rejected, got {err:?}"
            );
        }
    }

    #[test]
    fn serde_uses_text_form() {
        let id = Identity::new(Camp::Red, Role::Outpost, 0).with_order(2);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"Red;Outpost;0;2\"");

        let back: Identity = serde_json::from_str(&json).unwrap();
        assert_eq!(back.to_string(), id.to_string());
    }

    #[test]
    fn serde_rejects_bad_text() {
        let result = serde_json::from_str::<Identity>("\"Red;Hero\"");
        assert!(result.is_err());
    }
}
