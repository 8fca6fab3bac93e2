//! The action bus: tick-driven dispatch of actions to entities and their
//! sub-components, with recording in live matches and log injection during
//! replay.
//!
//! # Tick order
//!
//! Each call to [`ActionBus::tick`] runs, in order:
//!
//! 0. Scheduled sends due this tick are submitted, and every entity's child
//!    router re-attempts its parked child actions.
//! 1. The primary queue is drained FIFO. Top-level actions go to every
//!    subscriber of their kind; child actions go through the redundancy
//!    filter and then to their owner's router. Deliverable actions are
//!    recorded with the tick they were issued on. Undeliverable ones move to
//!    the delay queue.
//! 2. The delay queue is drained: entries younger than the delay horizon go
//!    back to the primary queue, older ones are dropped. Sends staged by
//!    receivers during this tick are then queued.
//! 3. In replay mode, every log entry due at the current tick is decoded and
//!    queued.
//! 4. The tick counter advances.
//!
//! Everything queued during a tick is dispatched on the next one.
//!
//! # Replay gate
//!
//! In [`BusMode::Replay`] only live-only actions (control input, cosmetic
//! sync) are accepted from outside the log; any other send is refused and
//! `send` returns `false`. Those actions arrive from the log instead.

use std::collections::{BTreeMap, VecDeque};

use ironclad_core::action::{Action, ActionKind, ChildAction};
use ironclad_core::codec::{ActionCodec, JsonCodec};
use ironclad_core::identity::Identity;
use ironclad_core::CoreError;
use ironclad_replay::log::{LogEntry, MatchLog};
use ironclad_replay::player::ReplayPlayer;
use ironclad_replay::recorder::ReplayRecorder;
use tracing::{debug, error, trace, warn};

use crate::config::{BusConfig, BusMode};
use crate::filter::RedundancyFilter;
use crate::pending::{ExpiryPolicy, Outgoing, PendingQueue, PendingSend};
use crate::replication::ReplicationSink;
use crate::router::{ChildComponent, ChildRouter};
use crate::schedule::TickSchedule;
use crate::store::{DispatchContext, Outbox, Store};
use crate::trace::{DispatchRecord, DispatchTrace, Receiver};
use crate::BusError;

// ---------------------------------------------------------------------------
// EntityKey / TickReport
// ---------------------------------------------------------------------------

/// Handle to a registered entity, returned by [`ActionBus::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey(usize);

impl EntityKey {
    pub fn index(self) -> usize {
        self.0
    }
}

/// What happened during one [`ActionBus::tick`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// The tick that was processed.
    pub tick: u64,
    /// Deliveries to entities and sub-components.
    pub dispatched: usize,
    /// Sends moved to the delay queue because their receiver is missing.
    pub deferred: usize,
    /// Delay queue entries put back into the primary queue.
    pub delayed: usize,
    /// Delay queue entries dropped past the horizon.
    pub expired: usize,
    /// Child actions dropped as redundant.
    pub suppressed: usize,
    /// Log entries queued from the replay log.
    pub injected: usize,
}

struct EntitySlot {
    identity: Identity,
    store: Box<dyn Store>,
    router: ChildRouter,
}

// ---------------------------------------------------------------------------
// ActionBus
// ---------------------------------------------------------------------------

pub struct ActionBus {
    config: BusConfig,
    mode: BusMode,
    current_tick: u64,
    codec: JsonCodec,

    entities: Vec<EntitySlot>,
    interests: BTreeMap<ActionKind, Vec<EntityKey>>,

    queue: VecDeque<PendingSend>,
    delayed: PendingQueue<PendingSend>,
    schedule: TickSchedule<Outgoing>,
    filter: RedundancyFilter,

    recorder: ReplayRecorder,
    player: Option<ReplayPlayer>,
    halted_at: Option<usize>,

    trace: Option<DispatchTrace>,
    sink: Option<Box<dyn ReplicationSink>>,
}

impl ActionBus {
    /// A bus for a live match. Accepted actions are recorded.
    ///
    /// # Panics
    ///
    /// Panics if `config.tick_rate` is zero.
    pub fn live(config: BusConfig) -> Self {
        Self::build(config, BusMode::Live, ReplayRecorder::new(), None)
    }

    /// A bus that replays `entries`. Nothing is recorded.
    ///
    /// Injected entries are dispatched on the tick after the one they were
    /// due on, so an entity that registers in between receives them even if
    /// it missed them live. Reproducing a match requires the host to register
    /// entities at the same ticks it did when the log was recorded.
    ///
    /// # Panics
    ///
    /// Panics if `config.tick_rate` is zero.
    pub fn replay(config: BusConfig, entries: Vec<LogEntry>) -> Self {
        let player = ReplayPlayer::new(entries);
        Self::build(
            config,
            BusMode::Replay,
            ReplayRecorder::disabled(),
            Some(player),
        )
    }

    fn build(
        config: BusConfig,
        mode: BusMode,
        recorder: ReplayRecorder,
        player: Option<ReplayPlayer>,
    ) -> Self {
        assert!(
            config.tick_rate > 0,
            "tick_rate must be positive, got {}",
            config.tick_rate
        );
        let horizon = config.delay_horizon();
        let trace = config.trace_dispatch.then(DispatchTrace::new);
        Self {
            mode,
            current_tick: 0,
            codec: JsonCodec,
            entities: Vec::new(),
            interests: BTreeMap::new(),
            queue: VecDeque::new(),
            delayed: PendingQueue::new(ExpiryPolicy::AfterTicks(horizon)),
            schedule: TickSchedule::new(),
            filter: RedundancyFilter::new(),
            recorder,
            player,
            halted_at: None,
            trace,
            sink: None,
            config,
        }
    }

    // -- registration -------------------------------------------------------

    /// Register an entity and subscribe it to `kinds`.
    ///
    /// Registering the same identity twice is allowed; both registrations
    /// receive every subscribed action.
    pub fn register<S: Store + 'static>(&mut self, store: S, kinds: &[ActionKind]) -> EntityKey {
        let identity = store.identity();
        if self.entities.iter().any(|slot| slot.identity == identity) {
            warn!(%identity, "identity registered twice; dispatch will be duplicated");
        }
        let key = EntityKey(self.entities.len());
        self.entities.push(EntitySlot {
            identity,
            store: Box::new(store),
            router: ChildRouter::new(self.config.child_retry),
        });
        self.subscribe(key, kinds);
        debug!(%identity, tick = self.current_tick, kinds = kinds.len(), "entity registered");
        key
    }

    /// Subscribe an already registered entity to more kinds.
    pub fn subscribe(&mut self, key: EntityKey, kinds: &[ActionKind]) {
        for kind in kinds {
            self.interests.entry(*kind).or_default().push(key);
        }
    }

    /// Attach a sub-component to the entity registered as `owner`.
    ///
    /// Returns the component's index within the owner's router.
    ///
    /// # Errors
    ///
    /// [`BusError::UnknownOwner`] if no entity is registered as `owner`.
    pub fn register_component<C: ChildComponent + 'static>(
        &mut self,
        owner: Identity,
        component: C,
    ) -> Result<usize, BusError> {
        let slot = self
            .entities
            .iter_mut()
            .find(|slot| slot.identity == owner)
            .ok_or(BusError::UnknownOwner { owner })?;
        Ok(slot.router.register_component(Box::new(component)))
    }

    pub fn set_replication_sink<R: ReplicationSink + 'static>(&mut self, sink: R) {
        self.sink = Some(Box::new(sink));
    }

    // -- sending ------------------------------------------------------------

    /// Queue a top-level action for the next drain.
    ///
    /// Returns `false` if the replay gate refused it, or if a float field is
    /// NaN or infinite and the action could not be logged.
    pub fn send(&mut self, action: Action) -> bool {
        self.submit(Outgoing::Action(action))
    }

    /// Queue a child action for `owner` for the next drain.
    ///
    /// Returns `false` under the same conditions as [`send`](Self::send).
    pub fn send_child(&mut self, owner: Identity, action: ChildAction) -> bool {
        self.submit(Outgoing::Child { owner, action })
    }

    /// Submit `outgoing` at the start of `tick`, through the same gate as
    /// [`send`](Self::send). Ticks already reached are submitted on the next
    /// call to [`tick`](Self::tick).
    pub fn send_at(&mut self, tick: u64, outgoing: impl Into<Outgoing>) {
        self.schedule.schedule(tick, outgoing.into());
    }

    fn submit(&mut self, outgoing: Outgoing) -> bool {
        if self.mode == BusMode::Replay && !outgoing.is_live_only() {
            trace!(tick = self.current_tick, "send refused during replay");
            return false;
        }
        if !outgoing.is_finite() {
            warn!(
                tick = self.current_tick,
                kind = outgoing.kind().as_str(),
                "send refused: non-finite float field"
            );
            return false;
        }
        self.queue
            .push_back(PendingSend::new(outgoing, self.current_tick));
        true
    }

    // -- tick ---------------------------------------------------------------

    /// Run one simulation step. See the module docs for the step order.
    ///
    /// # Errors
    ///
    /// - [`BusError::Record`] if an accepted action could not be recorded.
    /// - [`BusError::CorruptReplayEntry`] if a due log entry fails to decode.
    ///   The tick counter is not advanced and the bus halts.
    /// - [`BusError::ReplayHalted`] on every call after a corrupt entry.
    pub fn tick(&mut self) -> Result<TickReport, BusError> {
        if let Some(index) = self.halted_at {
            return Err(BusError::ReplayHalted { index });
        }

        let now = self.current_tick;
        let mut report = TickReport {
            tick: now,
            ..TickReport::default()
        };
        let mut outbox = Outbox::new();

        // Step 0: scheduled sends and parked child actions.
        for outgoing in self.schedule.take_due(now) {
            self.submit(outgoing);
        }
        self.retry_parked_children(&mut outbox, &mut report);

        // Step 1: drain the primary queue. On a recording failure the failed
        // send is dropped and the rest of the batch stays queued.
        let mut batch = std::mem::take(&mut self.queue);
        while let Some(send) = batch.pop_front() {
            if let Err(err) = self.dispatch(send, &mut outbox, &mut report) {
                self.queue = batch;
                for outgoing in outbox.take() {
                    self.submit(outgoing);
                }
                return Err(err);
            }
        }

        // Step 2: delay queue, then sends staged during this tick.
        let expired_before = self.delayed.expired_total();
        let survivors = self.delayed.drain_unexpired(now);
        let expired = self.delayed.expired_total() - expired_before;
        if expired > 0 {
            debug!(tick = now, expired, "delayed sends expired");
        }
        report.expired = expired as usize;
        report.delayed = survivors.len();
        self.queue.extend(survivors);
        for outgoing in outbox.take() {
            self.submit(outgoing);
        }

        // Step 3: replay injection.
        if let Some(player) = self.player.as_mut() {
            while let Some(entry) = player.next_due(now) {
                let index = player.cursor();
                let tick = entry.tick;
                let outgoing = match decode_entry(&self.codec, entry) {
                    Ok(outgoing) => outgoing,
                    Err(source) => {
                        error!(index, tick, error = %source, "corrupt replay entry; halting replay");
                        self.halted_at = Some(index);
                        return Err(BusError::CorruptReplayEntry {
                            index,
                            tick,
                            source,
                        });
                    }
                };
                player.advance();
                debug!(index, tick, "replay entry injected");
                let issued_tick = u64::try_from(tick).unwrap_or(0);
                self.queue.push_back(PendingSend::new(outgoing, issued_tick));
                report.injected += 1;
            }
        }

        // Step 4.
        self.current_tick += 1;
        Ok(report)
    }

    fn retry_parked_children(&mut self, outbox: &mut Outbox, report: &mut TickReport) {
        let now = self.current_tick;
        let codec = self.codec;
        for slot in &mut self.entities {
            if slot.router.pending_len() == 0 {
                continue;
            }
            let mut ctx = DispatchContext::new(now, now, self.mode, outbox);
            for routed in slot.router.retry_pending(&mut ctx) {
                report.dispatched += routed.components.len();
                if let Some(trace) = self.trace.as_mut() {
                    let text = codec
                        .encode_child(&routed.action)
                        .unwrap_or_else(|_| routed.action.kind().as_str().to_owned());
                    let child_type = routed.action.receiver_child_type();
                    for index in routed.components {
                        trace.push(DispatchRecord {
                            issued_tick: routed.issued_tick,
                            delivered_tick: now,
                            receiver: Receiver::Component {
                                owner: slot.identity,
                                child_type,
                                index,
                            },
                            action: text.clone(),
                        });
                    }
                }
            }
        }
    }

    fn dispatch(
        &mut self,
        send: PendingSend,
        outbox: &mut Outbox,
        report: &mut TickReport,
    ) -> Result<(), BusError> {
        let delivered = match &send.outgoing {
            Outgoing::Action(action) => {
                self.dispatch_action(action, send.issued_tick, outbox, report)?
            }
            Outgoing::Child { owner, action } => {
                if !send.retried && self.is_redundant(owner, action) {
                    report.suppressed += 1;
                    return Ok(());
                }
                self.dispatch_child(*owner, action, send.issued_tick, outbox, report)?
            }
        };

        if !delivered {
            if !send.retried {
                if let Outgoing::Action(Action::Reidentify { previous, current }) = &send.outgoing {
                    warn!(%previous, %current, "re-identification target not registered; deferring");
                }
            }
            report.deferred += 1;
            self.delayed.push(PendingSend {
                retried: true,
                ..send
            });
        }
        Ok(())
    }

    /// Keyed by the registered identity `owner` resolves to, so every
    /// spelling that reaches one entity shares a filter slot.
    fn is_redundant(&mut self, owner: &Identity, action: &ChildAction) -> bool {
        let resolved = self
            .entities
            .iter()
            .find(|slot| slot.identity == *owner)
            .map_or(*owner, |slot| slot.identity);
        match self.codec.encode_child(action) {
            Ok(payload) => self.filter.should_suppress(
                &resolved.to_string(),
                action.receiver_child_type(),
                action.kind(),
                &payload,
            ),
            Err(_) => false,
        }
    }

    /// Deliver a top-level action. Returns `false` if it has no receiver yet.
    fn dispatch_action(
        &mut self,
        action: &Action,
        issued_tick: u64,
        outbox: &mut Outbox,
        report: &mut TickReport,
    ) -> Result<bool, BusError> {
        let kind = action.kind();
        let deliverable = match action {
            Action::Reidentify { previous, current } => self.reidentify(previous, *current),
            _ => self.interests.contains_key(&kind),
        };
        if !deliverable {
            return Ok(false);
        }

        let text = match self.codec.encode_action(action) {
            Ok(text) => Some(text),
            Err(err) => {
                warn!(kind = kind.as_str(), error = %err, "action could not be encoded; not recorded");
                None
            }
        };
        if !action.is_live_only() {
            if let Some(text) = &text {
                self.recorder.append(issued_tick, false, text.clone(), None)?;
            }
        }

        let now = self.current_tick;
        let mut ctx = DispatchContext::new(now, issued_tick, self.mode, outbox);
        let Some(bucket) = self.interests.get(&kind) else {
            return Ok(true);
        };
        for key in bucket {
            let Some(slot) = self.entities.get_mut(key.0) else {
                continue;
            };
            slot.store.on_action(action, &mut ctx);
            report.dispatched += 1;
            if let Some(trace) = self.trace.as_mut() {
                trace.push(DispatchRecord {
                    issued_tick,
                    delivered_tick: now,
                    receiver: Receiver::Entity(slot.identity),
                    action: text.clone().unwrap_or_else(|| kind.as_str().to_owned()),
                });
            }
        }
        Ok(true)
    }

    /// Deliver a child action to its owner's router. Returns `false` if the
    /// owner is not registered yet.
    fn dispatch_child(
        &mut self,
        owner: Identity,
        action: &ChildAction,
        issued_tick: u64,
        outbox: &mut Outbox,
        report: &mut TickReport,
    ) -> Result<bool, BusError> {
        let Some(slot_index) = self.entities.iter().position(|slot| slot.identity == owner) else {
            return Ok(false);
        };

        let owner_key = owner.to_string();
        let text = match self.codec.encode_child(action) {
            Ok(text) => Some(text),
            Err(err) => {
                warn!(owner = %owner_key, kind = action.kind().as_str(), error = %err,
                    "child action could not be encoded; not recorded");
                None
            }
        };
        if let Some(text) = &text {
            if !action.is_live_only() {
                self.recorder
                    .append(issued_tick, true, text.clone(), Some(owner_key.clone()))?;
            }
            if let Some(sink) = self.sink.as_mut() {
                sink.replicate(&owner_key, text);
            }
        }

        let now = self.current_tick;
        let slot = &mut self.entities[slot_index];
        let mut ctx = DispatchContext::new(now, issued_tick, self.mode, outbox);
        let components = slot.router.route(action.clone(), issued_tick, &mut ctx);
        report.dispatched += components.len();

        if let Some(trace) = self.trace.as_mut() {
            let child_type = action.receiver_child_type();
            for index in components {
                trace.push(DispatchRecord {
                    issued_tick,
                    delivered_tick: now,
                    receiver: Receiver::Component {
                        owner: slot.identity,
                        child_type,
                        index,
                    },
                    action: text.clone().unwrap_or_else(|| action.kind().as_str().to_owned()),
                });
            }
        }
        Ok(true)
    }

    /// Rename the entity registered as `previous`. Returns `false` if there
    /// is none.
    fn reidentify(&mut self, previous: &Identity, current: Identity) -> bool {
        match self.entities.iter_mut().find(|slot| slot.identity == *previous) {
            Some(slot) => {
                debug!(%previous, %current, "entity re-identified");
                slot.identity = current;
                true
            }
            None => false,
        }
    }

    // -- accessors ----------------------------------------------------------

    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }

    pub fn mode(&self) -> BusMode {
        self.mode
    }

    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    pub fn recorder(&self) -> &ReplayRecorder {
        &self.recorder
    }

    /// The replay cursor, in replay mode.
    pub fn player(&self) -> Option<&ReplayPlayer> {
        self.player.as_ref()
    }

    /// The dispatch trace, if enabled in the config.
    pub fn trace(&self) -> Option<&DispatchTrace> {
        self.trace.as_ref()
    }

    pub fn filter(&self) -> &RedundancyFilter {
        &self.filter
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Current identity of a registered entity.
    pub fn identity_of(&self, key: EntityKey) -> Option<Identity> {
        self.entities.get(key.0).map(|slot| slot.identity)
    }

    /// Sends waiting for the next drain.
    pub fn pending_len(&self) -> usize {
        self.queue.len()
    }

    /// Entries in the delay queue. Between ticks the survivors sit in the
    /// primary queue, so this is non-zero only mid-tick.
    pub fn delayed_len(&self) -> usize {
        self.delayed.len()
    }

    /// Sends in the primary queue that have already missed their receiver
    /// at least once.
    pub fn retrying_len(&self) -> usize {
        self.queue.iter().filter(|send| send.retried).count()
    }

    /// Child actions parked in routers, waiting for a sub-component.
    pub fn parked_len(&self) -> usize {
        self.entities.iter().map(|slot| slot.router.pending_len()).sum()
    }

    pub fn scheduled_len(&self) -> usize {
        self.schedule.len()
    }

    /// Index of the corrupt entry that halted replay, if any.
    pub fn halted_at(&self) -> Option<usize> {
        self.halted_at
    }

    /// Close the recording and build the match log. The bus records nothing
    /// afterwards.
    pub fn finish_log(&mut self, map: &str, team_a: &str, team_b: &str) -> MatchLog {
        std::mem::replace(&mut self.recorder, ReplayRecorder::disabled()).finish(map, team_a, team_b)
    }
}

impl std::fmt::Debug for ActionBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionBus")
            .field("mode", &self.mode)
            .field("current_tick", &self.current_tick)
            .field("entities", &self.entities.len())
            .field("pending", &self.queue.len())
            .field("recorded", &self.recorder.len())
            .finish()
    }
}

/// Decode one log entry back into a send.
fn decode_entry(codec: &JsonCodec, entry: &LogEntry) -> Result<Outgoing, CoreError> {
    if !entry.is_child {
        return Ok(Outgoing::Action(codec.decode_action(&entry.action)?));
    }
    let owner = entry
        .owner
        .as_deref()
        .ok_or_else(|| CoreError::InvalidIdentity {
            text: String::new(),
            reason: "child entry has no owner".to_owned(),
        })?
        .parse::<Identity>()?;
    let action = codec.decode_child(&entry.action)?;
    Ok(Outgoing::Child { owner, action })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
