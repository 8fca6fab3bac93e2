//! Persisted replay log data model.
//!
//! A [`MatchLog`] is written once at the end of a live match and read back to
//! drive a replay. Its JSON shape is part of the on-disk format:
//!
//! ```json
//! {
//!   "map": "arena-3",
//!   "teamA": "Red Comets",
//!   "teamB": "Blue Rooks",
//!   "entries": [
//!     { "tick": 0, "isChild": false, "action": "{\"kind\":\"Spawn\",...}" },
//!     { "tick": 5, "isChild": true, "action": "{\"kind\":\"Fire\",...}", "owner": "Red;Hero;1;0" }
//!   ]
//! }
//! ```
//!
//! `action` is opaque codec output; `owner` is the identity text of the
//! owning entity and is only present on child entries.

use serde::{Deserialize, Serialize};

/// One accepted action, tagged with the tick it was issued on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub tick: i32,
    pub is_child: bool,
    /// Serialized action as produced by the action codec.
    pub action: String,
    /// Identity text of the owning entity, for child entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl LogEntry {
    /// A top-level action entry.
    pub fn top_level(tick: i32, action: impl Into<String>) -> Self {
        Self {
            tick,
            is_child: false,
            action: action.into(),
            owner: None,
        }
    }

    /// A child action entry addressed to `owner`.
    pub fn child(tick: i32, action: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            tick,
            is_child: true,
            action: action.into(),
            owner: Some(owner.into()),
        }
    }
}

/// A finished match: metadata plus the ordered entries.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchLog {
    /// Map selection the match was played on.
    pub map: String,
    pub team_a: String,
    pub team_b: String,
    pub entries: Vec<LogEntry>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_keys_use_log_format_names() {
        let log = MatchLog {
            map: "arena-3".to_owned(),
            team_a: "Red Comets".to_owned(),
            team_b: "Blue Rooks".to_owned(),
            entries: vec![
                LogEntry::top_level(0, "a"),
                LogEntry::child(5, "b", "Red;Hero;1;0"),
            ],
        };

        let value = serde_json::to_value(&log).unwrap();
        assert_eq!(value["teamA"], "Red Comets");
        assert_eq!(value["teamB"], "Blue Rooks");
        assert_eq!(value["entries"][0]["isChild"], false);
        assert_eq!(value["entries"][1]["isChild"], true);
        assert_eq!(value["entries"][1]["owner"], "Red;Hero;1;0");
    }

    #[test]
    fn owner_is_omitted_for_top_level_entries() {
        let json = serde_json::to_string(&LogEntry::top_level(3, "x")).unwrap();
        assert_eq!(json, r#"{"tick":3,"isChild":false,"action":"x"}"#);
    }

    #[test]
    fn missing_owner_deserializes_as_none() {
        let entry: LogEntry =
            serde_json::from_str(r#"{"tick":9,"isChild":false,"action":"y"}"#).unwrap();
        assert_eq!(entry, LogEntry::top_level(9, "y"));
    }
}
