//! Match lifecycle around an [`ActionBus`].
//!
//! A [`SimulationContext`] is created per match, moved to
//! [`Lifecycle::Running`] by [`init`](SimulationContext::init) once the host
//! has finished setting up, ticked for the length of the match, and closed
//! with [`teardown`](SimulationContext::teardown), which writes the match log
//! in live matches.
//!
//! ```no_run
//! use ironclad_engine::prelude::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config: MatchConfig = serde_json::from_str(
//!     r#"{"map":"arena-3","team_a":"Red Comets","team_b":"Blue Rooks","log_path":"replays/m1.iclog"}"#,
//! )?;
//! let mut sim = SimulationContext::live(BusConfig::default(), config);
//! sim.init()?;
//! for _ in 0..600 {
//!     sim.tick()?;
//! }
//! let flushed = sim.teardown(Some(Camp::Red))?;
//! println!("wrote {} entries to {:?}", flushed.entries, flushed.path);
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use ironclad_core::action::{Action, ActionKind, ChildAction};
use ironclad_core::identity::{Camp, Identity};
use ironclad_replay::log::MatchLog;
use ironclad_replay::persist;
use tracing::info;

use crate::bus::{ActionBus, EntityKey, TickReport};
use crate::config::{BusConfig, BusMode, MatchConfig};
use crate::router::ChildComponent;
use crate::store::Store;
use crate::BusError;

/// Where a [`SimulationContext`] is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Created,
    Running,
    TornDown,
}

/// Outcome of [`SimulationContext::teardown`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushReport {
    /// File the log was written to; `None` if nothing was written.
    pub path: Option<PathBuf>,
    pub entries: usize,
    pub bytes: usize,
    /// Set when a freshly written log is waiting to be uploaded.
    pub pending_upload: bool,
    pub winner: Option<Camp>,
}

pub struct SimulationContext {
    bus: ActionBus,
    map: String,
    team_a: String,
    team_b: String,
    log_path: Option<PathBuf>,
    lifecycle: Lifecycle,
}

impl SimulationContext {
    /// A live match that records to `match_config.log_path`.
    pub fn live(bus_config: BusConfig, match_config: MatchConfig) -> Self {
        Self {
            bus: ActionBus::live(bus_config),
            map: match_config.map,
            team_a: match_config.team_a,
            team_b: match_config.team_b,
            log_path: Some(match_config.log_path),
            lifecycle: Lifecycle::Created,
        }
    }

    /// Replay a loaded match log.
    ///
    /// # Errors
    ///
    /// Returns an error if a child entry has no owner. Entry payloads are
    /// decoded lazily while ticking.
    pub fn replay(bus_config: BusConfig, log: MatchLog) -> Result<Self, anyhow::Error> {
        let bus = ActionBus::replay(bus_config, log.entries);
        if let Some(player) = bus.player() {
            player
                .validate()
                .map_err(|e| anyhow::anyhow!("match log on map '{}' is invalid: {e}", log.map))?;
        }
        Ok(Self {
            bus,
            map: log.map,
            team_a: log.team_a,
            team_b: log.team_b,
            log_path: None,
            lifecycle: Lifecycle::Created,
        })
    }

    /// Load the match log at `path` and replay it.
    pub fn replay_from_file(bus_config: BusConfig, path: &Path) -> Result<Self, anyhow::Error> {
        let log = persist::load(path)
            .map_err(|e| anyhow::anyhow!("failed to load match log '{}': {e}", path.display()))?;
        Self::replay(bus_config, log)
    }

    /// Signal that the simulation is set up. Ticking is allowed from here on.
    pub fn init(&mut self) -> Result<(), anyhow::Error> {
        if self.lifecycle != Lifecycle::Created {
            return Err(anyhow::anyhow!(
                "init called in state {:?}; expected Created",
                self.lifecycle
            ));
        }
        self.lifecycle = Lifecycle::Running;
        info!(
            mode = ?self.bus.mode(),
            map = %self.map,
            entities = self.bus.entity_count(),
            "simulation initialized"
        );
        Ok(())
    }

    pub fn tick(&mut self) -> Result<TickReport, anyhow::Error> {
        if self.lifecycle != Lifecycle::Running {
            return Err(anyhow::anyhow!(
                "tick called in state {:?}; expected Running",
                self.lifecycle
            ));
        }
        let tick = self.bus.current_tick();
        self.bus
            .tick()
            .map_err(|e| anyhow::anyhow!("simulation tick {tick} failed: {e}"))
    }

    /// End the match.
    ///
    /// In a live match with at least one recorded entry the log is written to
    /// the configured path, exactly once. Replays never write.
    pub fn teardown(&mut self, winner: Option<Camp>) -> Result<FlushReport, anyhow::Error> {
        if self.lifecycle != Lifecycle::Running {
            return Err(anyhow::anyhow!(
                "teardown called in state {:?}; expected Running",
                self.lifecycle
            ));
        }
        self.lifecycle = Lifecycle::TornDown;

        let mut report = FlushReport {
            path: None,
            entries: 0,
            bytes: 0,
            pending_upload: false,
            winner,
        };

        if self.bus.mode() == BusMode::Live && !self.bus.recorder().is_empty() {
            let log = self.bus.finish_log(&self.map, &self.team_a, &self.team_b);
            if let Some(path) = &self.log_path {
                let bytes = persist::write(path, &log).map_err(|e| {
                    anyhow::anyhow!("failed to write match log '{}': {e}", path.display())
                })?;
                report.path = Some(path.clone());
                report.entries = log.entries.len();
                report.bytes = bytes;
                report.pending_upload = true;
            }
        }

        info!(
            tick = self.bus.current_tick(),
            winner = ?winner,
            entries = report.entries,
            bytes = report.bytes,
            "simulation torn down"
        );
        Ok(report)
    }

    // -- delegation ---------------------------------------------------------

    pub fn register<S: Store + 'static>(&mut self, store: S, kinds: &[ActionKind]) -> EntityKey {
        self.bus.register(store, kinds)
    }

    pub fn register_component<C: ChildComponent + 'static>(
        &mut self,
        owner: Identity,
        component: C,
    ) -> Result<usize, BusError> {
        self.bus.register_component(owner, component)
    }

    pub fn send(&mut self, action: Action) -> bool {
        self.bus.send(action)
    }

    pub fn send_child(&mut self, owner: Identity, action: ChildAction) -> bool {
        self.bus.send_child(owner, action)
    }

    pub fn bus(&self) -> &ActionBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut ActionBus {
        &mut self.bus
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn map(&self) -> &str {
        &self.map
    }

    pub fn teams(&self) -> (&str, &str) {
        (&self.team_a, &self.team_b)
    }
}

impl std::fmt::Debug for SimulationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationContext")
            .field("lifecycle", &self.lifecycle)
            .field("map", &self.map)
            .field("bus", &self.bus)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use ironclad_replay::log::LogEntry;

    fn match_config(name: &str) -> MatchConfig {
        MatchConfig {
            map: "arena-3".to_owned(),
            team_a: "Red Comets".to_owned(),
            team_b: "Blue Rooks".to_owned(),
            log_path: std::env::temp_dir()
                .join(format!("ironclad-context-{}", std::process::id()))
                .join(format!("{name}.iclog")),
        }
    }

    #[test]
    fn tick_before_init_is_rejected() {
        let mut sim = SimulationContext::live(BusConfig::default(), match_config("early"));
        assert_eq!(sim.lifecycle(), Lifecycle::Created);
        assert!(sim.tick().is_err());
        sim.init().unwrap();
        assert!(sim.tick().is_ok());
        assert!(sim.init().is_err());
    }

    #[test]
    fn empty_live_match_writes_nothing() {
        let config = match_config("empty");
        let path = config.log_path.clone();
        let mut sim = SimulationContext::live(BusConfig::default(), config);
        sim.init().unwrap();
        sim.tick().unwrap();

        let report = sim.teardown(None).unwrap();
        assert_eq!(report.path, None);
        assert!(!report.pending_upload);
        assert!(!path.exists());
        assert_eq!(sim.lifecycle(), Lifecycle::TornDown);
    }

    #[test]
    fn teardown_runs_once() {
        let mut sim = SimulationContext::live(BusConfig::default(), match_config("twice"));
        sim.init().unwrap();
        sim.teardown(None).unwrap();
        assert!(sim.teardown(None).is_err());
        assert!(sim.tick().is_err());
    }

    #[test]
    fn replay_rejects_invalid_log() {
        let mut orphan = LogEntry::child(2, r#"{"kind":"Fire","rounds":1}"#, "Red;Hero;1;0");
        orphan.owner = None;
        let log = MatchLog {
            map: "arena-3".to_owned(),
            entries: vec![
                LogEntry::top_level(0, r#"{"kind":"Spawn","receiver":"Red;Hero;1;0"}"#),
                orphan,
            ],
            ..MatchLog::default()
        };
        let err = SimulationContext::replay(BusConfig::default(), log).unwrap_err();
        assert!(err.to_string().contains("invalid"), "got {err}");
    }

    #[test]
    fn replay_accepts_late_entry_with_lower_tick() {
        let log = MatchLog {
            map: "arena-3".to_owned(),
            entries: vec![
                LogEntry::top_level(5, r#"{"kind":"Spawn","receiver":"Red;Hero;1;0"}"#),
                LogEntry::child(2, r#"{"kind":"Fire","rounds":1}"#, "Red;Hero;1;0"),
            ],
            ..MatchLog::default()
        };
        assert!(SimulationContext::replay(BusConfig::default(), log).is_ok());
    }

    #[test]
    fn replay_takes_metadata_from_log() {
        let log = MatchLog {
            map: "arena-1".to_owned(),
            team_a: "A".to_owned(),
            team_b: "B".to_owned(),
            entries: Vec::new(),
        };
        let sim = SimulationContext::replay(BusConfig::default(), log).unwrap();
        assert_eq!(sim.map(), "arena-1");
        assert_eq!(sim.teams(), ("A", "B"));
        assert_eq!(sim.bus().mode(), BusMode::Replay);
    }
}
