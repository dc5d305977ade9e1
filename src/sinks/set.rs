//! # SinkSet: non-blocking fan-out over multiple sinks.
//!
//! [`SinkSet`] distributes each [`Event`] to every registered sink **without
//! awaiting** its processing.
//!
//! ## What it guarantees
//! - `emit(&Event)` returns immediately.
//! - Per-sink FIFO (queue order).
//! - Panics inside sinks are caught and reported to stderr (isolation).
//!
//! ## What it does **not** guarantee
//! - No global ordering across different sinks (use [`Event::seq`] to
//!   reconstruct order).
//! - No retries on per-sink queue overflow; the event is dropped for that
//!   sink only.

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::Event;

use super::Sink;

/// Per-sink channel with metadata.
struct SinkChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Composite fan-out with per-sink bounded queues and worker tasks.
pub struct SinkSet {
    channels: Vec<SinkChannel>,
    /// Kept so worker tasks stay observable; they exit when senders drop.
    #[allow(dead_code)]
    workers: Vec<JoinHandle<()>>,
}

impl SinkSet {
    /// Creates a new set and spawns one worker per sink.
    #[must_use]
    pub fn new(sinks: Vec<Arc<dyn Sink>>) -> Self {
        let mut channels = Vec::with_capacity(sinks.len());
        let mut workers = Vec::with_capacity(sinks.len());

        for sink in sinks {
            let cap = sink.queue_capacity().max(1);
            let name = sink.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Event>>(cap);
            let s = Arc::clone(&sink);

            let handle = tokio::spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = s.on_event(ev.as_ref());
                    if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                        eprintln!("[alarmvisor] sink '{}' panicked: {:?}", s.name(), panic_err);
                    }
                }
            });

            channels.push(SinkChannel { name, sender: tx });
            workers.push(handle);
        }

        Self { channels, workers }
    }

    /// Fans one event out to all sinks (non-blocking).
    ///
    /// If a sink's queue is **full** or **closed**, the event is dropped for
    /// it and a warning is written with the sink's name.
    pub fn emit(&self, event: &Event) {
        let ev = Arc::new(event.clone());
        for channel in &self.channels {
            match channel.sender.try_send(Arc::clone(&ev)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    eprintln!(
                        "[alarmvisor] sink '{}' dropped event: queue full",
                        channel.name
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    eprintln!(
                        "[alarmvisor] sink '{}' dropped event: worker closed",
                        channel.name
                    );
                }
            }
        }
    }

    /// Number of registered sinks.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Whether the set has no sinks.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter(Arc<AtomicUsize>);

    #[async_trait]
    impl Sink for Counter {
        async fn on_event(&self, _ev: &Event) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
        fn name(&self) -> &'static str {
            "counter"
        }
    }

    #[tokio::test]
    async fn events_reach_every_sink() {
        let a = Arc::new(AtomicUsize::new(0));
        let b = Arc::new(AtomicUsize::new(0));
        let set = SinkSet::new(vec![
            Arc::new(Counter(a.clone())),
            Arc::new(Counter(b.clone())),
        ]);

        for _ in 0..3 {
            set.emit(&Event::new(EventKind::AlarmInserted));
        }
        tokio::task::yield_now().await;
        // Workers run concurrently; give them a moment to drain.
        for _ in 0..50 {
            if a.load(Ordering::SeqCst) == 3 && b.load(Ordering::SeqCst) == 3 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        }
        assert_eq!(a.load(Ordering::SeqCst), 3);
        assert_eq!(b.load(Ordering::SeqCst), 3);
    }
}
