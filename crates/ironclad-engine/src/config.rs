//! Bus and match configuration.
//!
//! [`BusConfig`] tunes the dispatch bus itself (tick rate, retry expiry,
//! tracing of deliveries). [`MatchConfig`] carries the metadata written into
//! the replay log and the path it is written to; hosts typically load it from
//! JSON alongside the rest of their match setup.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::pending::ExpiryPolicy;

// ---------------------------------------------------------------------------
// BusMode
// ---------------------------------------------------------------------------

/// Whether the bus is running a live match or replaying a recorded one.
///
/// Chosen when the bus is built and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BusMode {
    Live,
    Replay,
}

// ---------------------------------------------------------------------------
// BusConfig
// ---------------------------------------------------------------------------

/// Configuration for the dispatch bus.
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// Simulation ticks per second. Must be positive.
    ///
    /// The global delay queue keeps undeliverable sends for one second of
    /// ticks (see [`delay_horizon`](Self::delay_horizon)).
    pub tick_rate: u32,
    /// Expiry of child actions waiting for a matching sub-component inside a
    /// registered entity.
    pub child_retry: ExpiryPolicy,
    /// Record every delivery in a [`DispatchTrace`](crate::trace::DispatchTrace).
    pub trace_dispatch: bool,
}

impl BusConfig {
    /// Ticks a top-level or child send may wait for its receiver to register.
    pub fn delay_horizon(&self) -> u64 {
        u64::from(self.tick_rate)
    }
}

impl Default for BusConfig {
    /// 50 Hz, unbounded child retries, no dispatch trace.
    fn default() -> Self {
        Self {
            tick_rate: 50,
            child_retry: ExpiryPolicy::Never,
            trace_dispatch: false,
        }
    }
}

// ---------------------------------------------------------------------------
// MatchConfig
// ---------------------------------------------------------------------------

/// Match metadata and the persistence path of the replay log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Map selection, stored in the log.
    pub map: String,
    pub team_a: String,
    pub team_b: String,
    /// Where the finished log is written at teardown.
    pub log_path: PathBuf,
}

impl MatchConfig {
    /// Parse a match configuration from JSON.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
