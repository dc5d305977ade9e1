//! # AlarmEngine: the scheduling facade.
//!
//! [`AlarmEngine`] owns the shared context — the alarm store, the group
//! worker registry, the event bus, and the runtime cancellation token — and
//! exposes the operation surface callers use: [`start`](AlarmEngine::start),
//! [`cancel`](AlarmEngine::cancel), [`replace`](AlarmEngine::replace).
//!
//! ## High-level architecture
//! ```text
//! CommandSource ──► AlarmEngine::{start, cancel, replace}
//!                        │ store lock ──► registry lock   (fixed order)
//!                        ▼
//!                   AlarmStore ◄──── GroupWorker (periodic scan, one per group)
//!                        ▲
//!                   Dispatcher (fires due alarms, tears down emptied groups)
//!
//! Every mutation publishes to the Bus; the sink listener fans events out
//! to the registered sinks.
//! ```
//!
//! ## Rules
//! - Composite steps (remove-then-maybe-terminate, replace's
//!   remove-then-insert) run inside **one** continuous critical section;
//!   concurrent readers never observe the intermediate state.
//! - Concurrent operations racing on one id are serialized by the store
//!   lock; first committer wins, the loser gets `NotFound`.
//! - No lock is held across a sleep or I/O.

use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::alarm::{Alarm, AlarmId, GroupId};
use crate::command::{AlarmRequest, CommandSource};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::events::{Bus, Event, EventKind};
use crate::sinks::{Sink, SinkSet};
use crate::store::AlarmStore;

use super::dispatcher::Dispatcher;
use super::registry::GroupWorkerRegistry;
use super::shutdown;

/// Shared state for the engine, dispatcher, and group workers.
///
/// Constructed once by [`AlarmEngine::new`] and passed by `Arc` to every
/// component; there is no global state.
pub(crate) struct EngineShared {
    /// Pending alarms. Lock order: **first**.
    pub store: Mutex<AlarmStore>,
    /// Live group workers. Lock order: **second**.
    pub registry: Mutex<GroupWorkerRegistry>,
    /// Status event bus.
    pub bus: Bus,
    /// Engine configuration.
    pub cfg: EngineConfig,
    /// Root cancellation token; workers and the dispatcher hold children.
    pub runtime: CancellationToken,
}

/// Concurrent alarm-scheduling engine.
///
/// Cheap operations, callable from any task: each takes the store lock (and
/// the registry lock when worker lifecycle is involved) for one bounded
/// critical section.
pub struct AlarmEngine {
    shared: Arc<EngineShared>,
    /// Kept alive for the engine's lifetime; dropping it closes sink queues.
    #[allow(dead_code)]
    sinks: Arc<SinkSet>,
    dispatcher: StdMutex<Option<JoinHandle<()>>>,
}

impl AlarmEngine {
    /// Creates an engine, wires the sink fan-out, and starts the sink
    /// listener. The dispatcher is started separately via
    /// [`Self::spawn_dispatcher`] (or implicitly by [`Self::run`]).
    pub fn new(cfg: EngineConfig, sinks: Vec<Arc<dyn Sink>>) -> Self {
        let bus = Bus::new(cfg.bus_capacity);
        let shared = Arc::new(EngineShared {
            store: Mutex::new(AlarmStore::new()),
            registry: Mutex::new(GroupWorkerRegistry::new(cfg.max_groups)),
            bus,
            cfg,
            runtime: CancellationToken::new(),
        });

        let sinks = Arc::new(SinkSet::new(sinks));
        Self::spawn_sink_listener(&shared, &sinks);

        Self {
            shared,
            sinks,
            dispatcher: StdMutex::new(None),
        }
    }

    /// Subscribes to the bus and forwards events to the sink set
    /// (fire-and-forget).
    fn spawn_sink_listener(shared: &Arc<EngineShared>, sinks: &Arc<SinkSet>) {
        let mut rx = shared.bus.subscribe();
        let set = Arc::clone(sinks);
        tokio::spawn(async move {
            // Runs until the bus closes (engine drop), not until the runtime
            // token fires: shutdown events must still reach the sinks.
            loop {
                match rx.recv().await {
                    Ok(ev) => set.emit(&ev),
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                }
            }
        });
    }

    /// Starts the dispatcher task. Idempotent: a second call no-ops.
    pub fn spawn_dispatcher(&self) {
        let mut slot = self
            .dispatcher
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if slot.is_none() {
            let d = Dispatcher::new(Arc::clone(&self.shared));
            *slot = Some(tokio::spawn(d.run()));
        }
    }

    /// Schedules a new alarm.
    ///
    /// Validates the duration, rejects duplicate pending ids, inserts the
    /// alarm, and ensures its group's worker exists — all in one critical
    /// section over store then registry.
    pub async fn start(
        &self,
        id: AlarmId,
        seconds: u32,
        message: impl Into<String>,
    ) -> Result<(), EngineError> {
        let alarm = Alarm::new(id, seconds, message, self.shared.cfg.message_capacity)?;

        let mut store = self.shared.store.lock().await;
        let mut registry = self.shared.registry.lock().await;

        if store.contains(id) {
            return Err(EngineError::DuplicateId { id });
        }
        if !registry.has_capacity_for(alarm.group) {
            return Err(EngineError::GroupCapacityExceeded {
                max: registry.max_groups(),
            });
        }

        self.shared.bus.publish(
            Event::new(EventKind::AlarmInserted)
                .with_alarm(alarm.id)
                .with_group(alarm.group)
                .with_seconds(alarm.seconds)
                .with_message(alarm.message.clone()),
        );
        registry.ensure(&self.shared, alarm.group, alarm.id);
        store.insert(alarm);
        Ok(())
    }

    /// Cancels a pending alarm.
    ///
    /// Removes the alarm and, if its group emptied, tears the group's worker
    /// down — one critical section. An unknown id is a reported no-op.
    pub async fn cancel(&self, id: AlarmId) -> Result<(), EngineError> {
        let mut store = self.shared.store.lock().await;

        let Some(alarm) = store.remove(id) else {
            self.shared
                .bus
                .publish(Event::new(EventKind::AlarmNotFound).with_alarm(id));
            return Err(EngineError::NotFound { id });
        };

        if !store.has_group(alarm.group) {
            let mut registry = self.shared.registry.lock().await;
            let _ = registry.terminate(&self.shared, alarm.group);
        }

        self.shared.bus.publish(
            Event::new(EventKind::AlarmCancelled)
                .with_alarm(alarm.id)
                .with_group(alarm.group)
                .with_message(alarm.message),
        );
        Ok(())
    }

    /// Replaces a pending alarm with a new duration and message.
    ///
    /// Find, remove, old-group teardown, insert, and new-group ensure all
    /// execute under one continuous critical section holding the store and
    /// registry locks — concurrent readers never see the alarm absent
    /// mid-replace. An unknown id performs no mutation.
    pub async fn replace(
        &self,
        id: AlarmId,
        seconds: u32,
        message: impl Into<String>,
    ) -> Result<(), EngineError> {
        let replacement = Alarm::new(id, seconds, message, self.shared.cfg.message_capacity)?;

        let mut store = self.shared.store.lock().await;
        let mut registry = self.shared.registry.lock().await;

        if !store.contains(id) {
            self.shared
                .bus
                .publish(Event::new(EventKind::AlarmNotFound).with_alarm(id));
            return Err(EngineError::NotFound { id });
        }

        // The old alarm is still in place, so a capacity refusal leaves the
        // store untouched. Removing the old alarm can only free a slot.
        let old_group = store.find(id).map(|a| a.group);
        let needs_new_worker = old_group != Some(replacement.group);
        if needs_new_worker && !registry.has_capacity_for(replacement.group) {
            // The one slot the teardown below would free.
            let frees_slot = old_group
                .is_some_and(|g| store.alarms_in(g).len() == 1 && registry.live_groups().contains(&g));
            if !frees_slot {
                return Err(EngineError::GroupCapacityExceeded {
                    max: registry.max_groups(),
                });
            }
        }

        let old = store
            .remove(id)
            .ok_or(EngineError::NotFound { id })?;
        if !store.has_group(old.group) {
            let _ = registry.terminate(&self.shared, old.group);
        }

        registry.ensure(&self.shared, replacement.group, replacement.id);
        self.shared.bus.publish(
            Event::new(EventKind::AlarmReplaced)
                .with_alarm(replacement.id)
                .with_group(replacement.group)
                .with_seconds(replacement.seconds)
                .with_message(replacement.message.clone()),
        );
        store.insert(replacement);
        Ok(())
    }

    /// Dispatches a structured request to the matching operation.
    pub async fn apply(&self, request: AlarmRequest) -> Result<(), EngineError> {
        match request {
            AlarmRequest::Start { id, seconds, message } => self.start(id, seconds, message).await,
            AlarmRequest::Cancel { id } => self.cancel(id).await,
            AlarmRequest::Replace { id, seconds, message } => {
                self.replace(id, seconds, message).await
            }
        }
    }

    /// Reports unparseable input from the command source.
    pub fn report_unknown(&self, input: &str) {
        self.shared
            .bus
            .publish(Event::new(EventKind::UnknownCommand).with_message(input));
    }

    /// Drives the engine from a command source until the source ends or a
    /// termination signal arrives, then shuts down gracefully.
    ///
    /// Rejected requests (duplicate id, invalid duration, capacity) are
    /// surfaced to sinks as [`EventKind::RequestRejected`]; `NotFound` misses
    /// already publish their own event inside `cancel`/`replace`.
    pub async fn run(&self, source: &mut dyn CommandSource) -> Result<(), EngineError> {
        self.spawn_dispatcher();

        let signal = shutdown::wait_for_shutdown_signal();
        tokio::pin!(signal);

        loop {
            tokio::select! {
                sig = &mut signal => {
                    let _ = sig;
                    break;
                }
                req = source.next_request() => match req {
                    None => break,
                    Some(Ok(request)) => {
                        let alarm = match &request {
                            AlarmRequest::Start { id, .. }
                            | AlarmRequest::Cancel { id }
                            | AlarmRequest::Replace { id, .. } => *id,
                        };
                        match self.apply(request).await {
                            Ok(()) | Err(EngineError::NotFound { .. }) => {}
                            Err(e) => self.shared.bus.publish(
                                Event::new(EventKind::RequestRejected)
                                    .with_alarm(alarm)
                                    .with_message(e.as_message()),
                            ),
                        }
                    }
                    Some(Err(parse_err)) => self.report_unknown(&parse_err.to_string()),
                },
            }
        }

        self.shutdown().await
    }

    /// Cancels the dispatcher and every worker, then waits up to the
    /// configured grace period for them to stop.
    ///
    /// Returns [`EngineError::GraceExceeded`] listing the groups whose
    /// workers did not stop in time.
    pub async fn shutdown(&self) -> Result<(), EngineError> {
        self.shared
            .bus
            .publish(Event::new(EventKind::ShutdownRequested));
        self.shared.runtime.cancel();

        let handles = {
            let mut registry = self.shared.registry.lock().await;
            registry.drain_all()
        };
        let dispatcher = self
            .dispatcher
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();

        let grace = self.shared.cfg.grace;
        let deadline = time::Instant::now() + grace;
        let mut stuck: Vec<GroupId> = Vec::new();

        for (group, handle) in handles {
            let remaining = deadline.saturating_duration_since(time::Instant::now());
            if time::timeout(remaining, handle.join).await.is_err() {
                stuck.push(group);
            } else {
                self.shared
                    .bus
                    .publish(Event::new(EventKind::WorkerTerminated).with_group(group));
            }
        }
        if let Some(join) = dispatcher {
            let remaining = deadline.saturating_duration_since(time::Instant::now());
            let _ = time::timeout(remaining, join).await;
        }

        if stuck.is_empty() {
            self.shared
                .bus
                .publish(Event::new(EventKind::AllStoppedWithinGrace));
            Ok(())
        } else {
            stuck.sort_unstable();
            self.shared.bus.publish(Event::new(EventKind::GraceExceeded));
            Err(EngineError::GraceExceeded { grace, stuck })
        }
    }

    /// Number of pending alarms.
    pub async fn pending_alarms(&self) -> usize {
        self.shared.store.lock().await.len()
    }

    /// Sorted list of groups with a live worker.
    pub async fn live_groups(&self) -> Vec<GroupId> {
        self.shared.registry.lock().await.live_groups()
    }

    /// Subscribes to the engine's status events.
    ///
    /// Useful for tests and embedders that want raw events instead of a
    /// [`Sink`].
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.shared.bus.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::broadcast::Receiver;

    fn engine() -> AlarmEngine {
        AlarmEngine::new(EngineConfig::default(), Vec::new())
    }

    /// Receives events until one of `kind` arrives; panics after a long
    /// virtual-time budget so a missing event fails instead of hanging.
    async fn wait_for_kind(rx: &mut Receiver<Event>, kind: EventKind) -> Event {
        loop {
            let ev = time::timeout(Duration::from_secs(600), rx.recv())
                .await
                .expect("timed out waiting for event")
                .expect("bus closed");
            if ev.kind == kind {
                return ev;
            }
        }
    }

    /// Collects every event published during `dur` of virtual time.
    async fn drain_for(rx: &mut Receiver<Event>, dur: Duration) -> Vec<Event> {
        let mut out = Vec::new();
        let deadline = time::Instant::now() + dur;
        loop {
            let remaining = deadline.saturating_duration_since(time::Instant::now());
            if remaining.is_zero() {
                break;
            }
            match time::timeout(remaining, rx.recv()).await {
                Ok(Ok(ev)) => out.push(ev),
                Ok(Err(_)) | Err(_) => break,
            }
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn started_alarm_fires_and_worker_is_torn_down() {
        let engine = engine();
        engine.spawn_dispatcher();
        let mut rx = engine.subscribe();

        engine.start(AlarmId(1), 3, "a").await.unwrap();
        assert_eq!(engine.live_groups().await, vec![GroupId(1)]);
        assert_eq!(engine.pending_alarms().await, 1);

        // Teardown is published before the fire report (remove → terminate
        // → report completion).
        let torn = wait_for_kind(&mut rx, EventKind::WorkerTerminated).await;
        assert_eq!(torn.group, Some(GroupId(1)));

        let fired = wait_for_kind(&mut rx, EventKind::AlarmFired).await;
        assert_eq!(fired.alarm, Some(AlarmId(1)));
        assert_eq!(fired.seconds, Some(3));
        assert_eq!(fired.message.as_deref(), Some("a"));

        assert_eq!(engine.pending_alarms().await, 0);
        assert!(engine.live_groups().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn one_worker_serves_all_alarms_of_a_group() {
        let engine = engine();
        engine.spawn_dispatcher();
        let mut rx = engine.subscribe();

        engine.start(AlarmId(1), 3, "a").await.unwrap();
        engine.start(AlarmId(2), 3, "b").await.unwrap();
        assert_eq!(engine.live_groups().await, vec![GroupId(1)]);

        let mut spawned = 0;
        let mut terminated = 0;
        let mut fired = 0;
        while fired < 2 {
            let ev = time::timeout(Duration::from_secs(600), rx.recv())
                .await
                .expect("timed out")
                .expect("bus closed");
            match ev.kind {
                EventKind::WorkerSpawned => spawned += 1,
                EventKind::WorkerTerminated => terminated += 1,
                EventKind::AlarmFired => fired += 1,
                _ => {}
            }
        }

        assert_eq!(spawned, 1, "both alarms share one worker");
        assert_eq!(terminated, 1, "worker is torn down once, after the last fire");
        assert!(engine.live_groups().await.is_empty());
        assert_eq!(engine.pending_alarms().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_unknown_id_is_a_reported_noop() {
        let engine = engine();
        let mut rx = engine.subscribe();

        engine.start(AlarmId(1), 30, "keep").await.unwrap();
        let err = engine.cancel(AlarmId(9)).await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound { id: AlarmId(9) }));

        let miss = wait_for_kind(&mut rx, EventKind::AlarmNotFound).await;
        assert_eq!(miss.alarm, Some(AlarmId(9)));
        assert_eq!(engine.pending_alarms().await, 1);
        assert_eq!(engine.live_groups().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn replace_unknown_id_leaves_store_unchanged() {
        let engine = engine();
        engine.start(AlarmId(1), 30, "keep").await.unwrap();

        let err = engine.replace(AlarmId(9), 10, "nope").await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound { id: AlarmId(9) }));
        assert_eq!(engine.pending_alarms().await, 1);
        assert_eq!(engine.live_groups().await, vec![GroupId(6)]);
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_start_is_rejected() {
        let engine = engine();
        engine.start(AlarmId(1), 30, "first").await.unwrap();

        let err = engine.start(AlarmId(1), 40, "second").await.unwrap_err();
        assert!(matches!(err, EngineError::DuplicateId { id: AlarmId(1) }));
        assert_eq!(engine.pending_alarms().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_duration_is_rejected_before_insertion() {
        let engine = engine();
        let err = engine.start(AlarmId(1), 0, "never").await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidDuration { seconds: 0 }));
        assert_eq!(engine.pending_alarms().await, 0);
        assert!(engine.live_groups().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn start_replace_cancel_round_trip_leaves_nothing_behind() {
        let engine = engine();
        let mut rx = engine.subscribe();

        engine.start(AlarmId(7), 10, "hi").await.unwrap();
        assert_eq!(engine.live_groups().await, vec![GroupId(2)]);

        engine.replace(AlarmId(7), 20, "bye").await.unwrap();
        let replaced = wait_for_kind(&mut rx, EventKind::AlarmReplaced).await;
        assert_eq!(replaced.seconds, Some(20));
        assert_eq!(replaced.message.as_deref(), Some("bye"));
        // Old group's worker went away with its last alarm.
        assert_eq!(engine.live_groups().await, vec![GroupId(4)]);
        assert_eq!(engine.pending_alarms().await, 1);

        engine.cancel(AlarmId(7)).await.unwrap();
        assert_eq!(engine.pending_alarms().await, 0);
        assert!(engine.live_groups().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn worker_reports_every_alarm_in_its_group() {
        let engine = engine();
        let mut rx = engine.subscribe();

        engine.start(AlarmId(1), 7, "tick").await.unwrap();

        let report = wait_for_kind(&mut rx, EventKind::GroupReport).await;
        assert_eq!(report.group, Some(GroupId(2)));
        assert_eq!(report.alarm, Some(AlarmId(1)));
        assert_eq!(report.message.as_deref(), Some("tick"));
    }

    #[tokio::test(start_paused = true)]
    async fn no_reports_beyond_one_cycle_after_teardown() {
        let engine = engine();
        let mut rx = engine.subscribe();

        engine.start(AlarmId(1), 30, "gone soon").await.unwrap();
        engine.cancel(AlarmId(1)).await.unwrap();
        assert!(engine.live_groups().await.is_empty());

        let tail = drain_for(&mut rx, Duration::from_secs(5)).await;
        let torn_at = tail
            .iter()
            .position(|e| e.kind == EventKind::WorkerTerminated)
            .expect("teardown event");
        let late_reports = tail[torn_at..]
            .iter()
            .filter(|e| e.kind == EventKind::GroupReport)
            .count();
        assert!(
            late_reports <= 1,
            "at most one report cycle may follow a termination request, saw {late_reports}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn group_capacity_bounds_live_workers() {
        let mut cfg = EngineConfig::default();
        cfg.max_groups = 1;
        let engine = AlarmEngine::new(cfg, Vec::new());

        engine.start(AlarmId(1), 3, "a").await.unwrap();
        let err = engine.start(AlarmId(2), 10, "b").await.unwrap_err();
        assert!(matches!(err, EngineError::GroupCapacityExceeded { max: 1 }));
        assert_eq!(engine.pending_alarms().await, 1);
        assert_eq!(engine.live_groups().await, vec![GroupId(1)]);

        // Replacing the group's only alarm frees its slot for the new group.
        engine.replace(AlarmId(1), 10, "moved").await.unwrap();
        assert_eq!(engine.live_groups().await, vec![GroupId(2)]);
        assert_eq!(engine.pending_alarms().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_dispatcher_and_workers_within_grace() {
        let engine = engine();
        engine.spawn_dispatcher();
        let mut rx = engine.subscribe();

        engine.start(AlarmId(1), 60, "long").await.unwrap();
        engine.start(AlarmId(2), 120, "longer").await.unwrap();
        assert_eq!(engine.live_groups().await.len(), 2);

        engine.shutdown().await.unwrap();
        assert!(engine.live_groups().await.is_empty());

        wait_for_kind(&mut rx, EventKind::ShutdownRequested).await;
        wait_for_kind(&mut rx, EventKind::AllStoppedWithinGrace).await;
    }
}
