//! # GroupWorker: periodic per-group alarm reporter.
//!
//! One worker task exists per non-empty duration group. Each cycle it
//! snapshots the store's alarms for its group, publishes one
//! [`EventKind::GroupReport`] per alarm, then sleeps one report interval.
//!
//! ## Rules
//! - The store lock is held only for the snapshot, never across the sleep
//!   or the publishes.
//! - Stop is cooperative: the cancellation token is checked at the top of
//!   each cycle and interrupts the sleep. After a termination request the
//!   worker emits **at most one** more report cycle.
//! - A report racing a removal (the alarm fired or was cancelled an instant
//!   earlier) is an accepted eventual-consistency artifact, bounded by one
//!   report interval.

use std::sync::Arc;

use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use crate::alarm::GroupId;
use crate::events::{Event, EventKind};

use super::engine::EngineShared;

/// Recurring task reporting every pending alarm of one group.
pub(crate) struct GroupWorker {
    group: GroupId,
    shared: Arc<EngineShared>,
    cancel: CancellationToken,
}

impl GroupWorker {
    /// Creates a worker for `group`.
    pub fn new(group: GroupId, shared: Arc<EngineShared>, cancel: CancellationToken) -> Self {
        Self {
            group,
            shared,
            cancel,
        }
    }

    /// Runs report cycles until the stop token fires.
    pub async fn run(self) {
        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            let snapshot = {
                let store = self.shared.store.lock().await;
                store.alarms_in(self.group)
            };
            for alarm in &snapshot {
                self.shared.bus.publish(
                    Event::new(EventKind::GroupReport)
                        .with_group(self.group)
                        .with_alarm(alarm.id)
                        .with_seconds(alarm.seconds)
                        .with_message(alarm.message.clone()),
                );
            }

            let sleep = time::sleep(self.shared.cfg.report_interval);
            tokio::pin!(sleep);
            select! {
                _ = &mut sleep => {}
                _ = self.cancel.cancelled() => break,
            }
        }
    }
}
