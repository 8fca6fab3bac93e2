//! Ironclad Replay -- match log recording, cursor playback and persistence.
//!
//! This crate owns the replay log of a match:
//!
//! - [`log`]: the persisted data model ([`LogEntry`](log::LogEntry),
//!   [`MatchLog`](log::MatchLog)).
//! - [`recorder`]: [`ReplayRecorder`](recorder::ReplayRecorder), which keeps
//!   accepted actions in dispatch order during a live match.
//! - [`player`]: [`ReplayPlayer`](player::ReplayPlayer), the cursor a
//!   replaying bus walks tick by tick.
//! - [`persist`]: the compressed on-disk encoding.
//!
//! Actions are opaque strings here; decoding them is the dispatch bus's job.

#![deny(unsafe_code)]

pub mod log;
pub mod persist;
pub mod player;
pub mod recorder;

use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced while recording, validating or persisting a replay log.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("i/o error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("match log json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("match log decompression failed: {0}")]
    Decompress(#[from] lz4_flex::block::DecompressError),

    /// The log stores ticks as 32-bit signed integers.
    #[error("tick {tick} does not fit the log's i32 tick field")]
    TickOverflow { tick: u64 },

    #[error("child entry {index} (tick {tick}) has no owner")]
    MissingOwner { index: usize, tick: i32 },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::log::{LogEntry, MatchLog};
    pub use crate::persist;
    pub use crate::player::ReplayPlayer;
    pub use crate::recorder::ReplayRecorder;
    pub use crate::ReplayError;
}
