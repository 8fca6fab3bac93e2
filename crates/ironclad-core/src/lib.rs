//! Ironclad Core -- identities, closed action types and the action codec.
//!
//! This crate holds the value types shared by the dispatch bus and the replay
//! log: the [`Identity`](identity::Identity) addressing key, the
//! [`Action`](action::Action) / [`ChildAction`](action::ChildAction) sum
//! types with their kind tags and live-only classification, and the
//! [`ActionCodec`](codec::ActionCodec) contract used to turn actions into
//! log-safe strings.
//!
//! # Quick Start
//!
//! ```
//! use ironclad_core::prelude::*;
//!
//! let red_hero = Identity::new(Camp::Red, Role::Hero, 1);
//! let action = Action::Revive { receiver: red_hero };
//!
//! assert_eq!(action.kind(), ActionKind::Revive);
//! assert!(!action.is_live_only());
//!
//! let text = JsonCodec.encode_action(&action).unwrap();
//! assert_eq!(JsonCodec.decode_action(&text).unwrap(), action);
//! ```

#![deny(unsafe_code)]

pub mod action;
pub mod codec;
pub mod identity;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by identity parsing and action (de)serialization.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Identity text did not match `<camp>;<role>;<serial>;<order>`.
    #[error("invalid identity '{text}': {reason}")]
    InvalidIdentity { text: String, reason: String },

    /// An action could not be serialized.
    #[error("failed to encode {kind} action: {details}")]
    Encode { kind: &'static str, details: String },

    /// A serialized action could not be turned back into a typed action.
    #[error("failed to decode action '{text}': {details}")]
    Decode { text: String, details: String },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::action::{Action, ActionKind, ChildAction, ChildType};
    pub use crate::codec::{ActionCodec, JsonCodec};
    pub use crate::identity::{Camp, Identity, Role};
    pub use crate::CoreError;
}
