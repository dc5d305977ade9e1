//! # Dispatcher: detects and fires due alarms.
//!
//! A single long-lived task. Per iteration, under the store lock:
//!
//! ```text
//! store empty            → sleep poll interval
//! earliest not yet due   → sleep min(remaining, poll)
//! earliest due           → remove it
//!                          ├─ group now empty → terminate its worker
//!                          ├─ publish AlarmFired
//!                          └─ loop immediately (no sleep)
//! ```
//!
//! ## Rules
//! - Because the store orders by expiry, the fired entry is always the
//!   earliest-due alarm.
//! - Sleeps are capped at the poll interval so an alarm inserted with an
//!   earlier expiry is still observed within one poll.
//! - Worker teardown happens while the store lock is still held (registry
//!   lock acquired second, the fixed order), so no other caller can observe
//!   an empty group that still has a worker registered for longer than one
//!   critical section.
//! - Sleeps are cancellable; the task exits when the runtime token fires.

use std::sync::Arc;
use std::time::Duration;

use tokio::{select, time};

use crate::events::{Event, EventKind};

use super::engine::EngineShared;

/// The single alarm-firing task.
pub(crate) struct Dispatcher {
    shared: Arc<EngineShared>,
}

impl Dispatcher {
    /// Creates the dispatcher over the shared engine context.
    pub fn new(shared: Arc<EngineShared>) -> Self {
        Self { shared }
    }

    /// Runs until the runtime token is cancelled.
    pub async fn run(self) {
        loop {
            if self.shared.runtime.is_cancelled() {
                break;
            }

            // `None` means an alarm was fired: loop again without sleeping.
            let wait = self.step().await;
            let Some(wait) = wait else { continue };

            let sleep = time::sleep(wait);
            tokio::pin!(sleep);
            select! {
                _ = &mut sleep => {}
                _ = self.shared.runtime.cancelled() => break,
            }
        }
    }

    /// One inspect-and-maybe-fire pass; returns how long to sleep, or `None`
    /// after firing.
    async fn step(&self) -> Option<Duration> {
        let poll = self.shared.cfg.poll;
        let now = time::Instant::now();

        let mut store = self.shared.store.lock().await;
        if let Some(alarm) = store.pop_due(now) {
            if !store.has_group(alarm.group) {
                let mut registry = self.shared.registry.lock().await;
                // Handle dropped: the worker exits at its next checkpoint.
                let _ = registry.terminate(&self.shared, alarm.group);
            }
            self.shared.bus.publish(
                Event::new(EventKind::AlarmFired)
                    .with_alarm(alarm.id)
                    .with_group(alarm.group)
                    .with_seconds(alarm.seconds)
                    .with_message(alarm.message),
            );
            return None;
        }

        match store.earliest() {
            None => Some(poll),
            Some(next) => Some(next.expiry.saturating_duration_since(now).min(poll)),
        }
    }
}
