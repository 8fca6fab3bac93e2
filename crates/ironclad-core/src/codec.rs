//! Polymorphic codec for actions.
//!
//! The bus never looks inside a serialized action: it stores, compares and
//! replays the strings produced by an [`ActionCodec`]. The only requirement is
//! an exact round trip for every variant of [`Action`] and [`ChildAction`].
//!
//! [`JsonCodec`] is the default implementation. Each action becomes a JSON
//! object whose `"kind"` field is the discriminator and whose remaining fields
//! are the typed payload. Float fields must be finite: JSON has no NaN or
//! infinity, so encoding such an action is an error rather than a value that
//! cannot be decoded later.
//!
//! ```
//! use ironclad_core::prelude::*;
//!
//! let codec = JsonCodec;
//! let text = codec
//!     .encode_child(&ChildAction::Fire { rounds: 3 })
//!     .unwrap();
//! assert_eq!(text, r#"{"kind":"Fire","rounds":3}"#);
//! assert_eq!(
//!     codec.decode_child(&text).unwrap(),
//!     ChildAction::Fire { rounds: 3 }
//! );
//! ```

use crate::action::{Action, ChildAction};
use crate::CoreError;

// ---------------------------------------------------------------------------
// ActionCodec
// ---------------------------------------------------------------------------

/// Serializes actions to strings and back.
pub trait ActionCodec {
    fn encode_action(&self, action: &Action) -> Result<String, CoreError>;
    fn decode_action(&self, text: &str) -> Result<Action, CoreError>;
    fn encode_child(&self, action: &ChildAction) -> Result<String, CoreError>;
    fn decode_child(&self, text: &str) -> Result<ChildAction, CoreError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// Compact JSON with a `"kind"` discriminator.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

fn non_finite(kind: &'static str) -> CoreError {
    CoreError::Encode {
        kind,
        details: "non-finite float field".to_owned(),
    }
}

impl ActionCodec for JsonCodec {
    fn encode_action(&self, action: &Action) -> Result<String, CoreError> {
        if !action.is_finite() {
            return Err(non_finite(action.kind().as_str()));
        }
        serde_json::to_string(action).map_err(|e| CoreError::Encode {
            kind: action.kind().as_str(),
            details: e.to_string(),
        })
    }

    fn decode_action(&self, text: &str) -> Result<Action, CoreError> {
        serde_json::from_str(text).map_err(|e| CoreError::Decode {
            text: text.to_owned(),
            details: e.to_string(),
        })
    }

    fn encode_child(&self, action: &ChildAction) -> Result<String, CoreError> {
        if !action.is_finite() {
            return Err(non_finite(action.kind().as_str()));
        }
        serde_json::to_string(action).map_err(|e| CoreError::Encode {
            kind: action.kind().as_str(),
            details: e.to_string(),
        })
    }

    fn decode_child(&self, text: &str) -> Result<ChildAction, CoreError> {
        serde_json::from_str(text).map_err(|e| CoreError::Decode {
            text: text.to_owned(),
            details: e.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
