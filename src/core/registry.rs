//! # Group worker registry: at most one live worker per group.
//!
//! The registry maps a [`GroupId`] to the handle of its display worker. It is
//! a plain map; the engine owns it behind a `tokio::sync::Mutex`, so
//! `ensure`/`terminate` are atomic with respect to concurrent callers by
//! construction — exactly one worker exists per group between an
//! empty-to-nonempty transition and the next empty transition.
//!
//! ## Rules
//! - The registry owns the worker handles (JoinHandle + CancellationToken).
//! - Termination is a request: the token is cancelled and the handle is
//!   returned to the caller, which may join it **outside** the lock. The
//!   worker may emit at most one more report cycle before it observes the
//!   token.
//! - `terminate` on a group with no worker is a no-op.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::alarm::{AlarmId, GroupId};
use crate::events::{Event, EventKind};

use super::engine::EngineShared;
use super::worker::GroupWorker;

/// Handle to a running group worker.
pub(crate) struct WorkerHandle {
    /// Join handle for the worker task.
    pub join: JoinHandle<()>,
    /// Cooperative stop signal for this worker.
    pub cancel: CancellationToken,
}

/// Table of live group workers, keyed by group id.
pub(crate) struct GroupWorkerRegistry {
    workers: HashMap<GroupId, WorkerHandle>,
    max_groups: usize,
}

impl GroupWorkerRegistry {
    /// Creates an empty registry with the given capacity (0 = unlimited).
    pub fn new(max_groups: usize) -> Self {
        Self {
            workers: HashMap::new(),
            max_groups,
        }
    }

    /// Whether a worker for `group` could be registered right now.
    ///
    /// True when the group already has a worker (ensure would no-op) or a
    /// free slot exists.
    pub fn has_capacity_for(&self, group: GroupId) -> bool {
        self.workers.contains_key(&group)
            || self.max_groups == 0
            || self.workers.len() < self.max_groups
    }

    /// Configured worker capacity.
    pub fn max_groups(&self) -> usize {
        self.max_groups
    }

    /// Spawns and registers a worker for `group` if none is live.
    ///
    /// Publishes [`EventKind::WorkerSpawned`] with the triggering alarm id.
    /// Callers check [`Self::has_capacity_for`] first; `ensure` itself only
    /// no-ops when the worker already exists.
    pub fn ensure(&mut self, shared: &Arc<EngineShared>, group: GroupId, trigger: AlarmId) {
        if self.workers.contains_key(&group) {
            return;
        }

        let cancel = shared.runtime.child_token();
        let worker = GroupWorker::new(group, Arc::clone(shared), cancel.clone());
        let join = tokio::spawn(worker.run());
        self.workers.insert(group, WorkerHandle { join, cancel });

        shared.bus.publish(
            Event::new(EventKind::WorkerSpawned)
                .with_group(group)
                .with_alarm(trigger),
        );
    }

    /// Signals `group`'s worker to stop and deregisters it.
    ///
    /// Returns the handle so the caller can join outside any lock; `None`
    /// (and no event) when no worker exists.
    pub fn terminate(&mut self, shared: &EngineShared, group: GroupId) -> Option<WorkerHandle> {
        let handle = self.workers.remove(&group)?;
        handle.cancel.cancel();
        shared
            .bus
            .publish(Event::new(EventKind::WorkerTerminated).with_group(group));
        Some(handle)
    }

    /// Cancels every worker and drains the table.
    ///
    /// Used at shutdown; callers join the returned handles with a grace
    /// period.
    pub fn drain_all(&mut self) -> Vec<(GroupId, WorkerHandle)> {
        let drained: Vec<(GroupId, WorkerHandle)> = self.workers.drain().collect();
        for (_, handle) in &drained {
            handle.cancel.cancel();
        }
        drained
    }

    /// Sorted list of groups with a live worker.
    pub fn live_groups(&self) -> Vec<GroupId> {
        let mut groups: Vec<GroupId> = self.workers.keys().copied().collect();
        groups.sort_unstable();
        groups
    }
}
