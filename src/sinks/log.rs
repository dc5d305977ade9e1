//! # Simple logging sink for debugging and demos.
//!
//! [`LogSink`] prints events to stdout in a human-readable format.
//!
//! ## Output format
//! ```text
//! [inserted] alarm=3 group=1 seconds=4 at=1718000000 message="wake up"
//! [worker-spawned] group=1 alarm=3
//! [group-report] group=1 alarm=3 at=1718000001 message="wake up"
//! [fired] alarm=3 seconds=4 message="wake up"
//! [worker-terminated] group=1 at=1718000004
//! [not-found] alarm=9
//! [replaced] alarm=3 seconds=20 message="later"
//! [unknown-command] input="Snooze_Alarm(1)"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};

use super::Sink;

/// Stdout logging sink.
///
/// Prints one line per event for development, demos, and interactive use.
/// Implement a custom [`Sink`] for structured logging or metrics.
pub struct LogSink;

/// Wall-clock seconds since the epoch, for log lines.
fn unix_secs(ev: &Event) -> u64 {
    ev.at
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[async_trait]
impl Sink for LogSink {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::AlarmInserted => {
                if let (Some(id), Some(group)) = (e.alarm, e.group) {
                    println!(
                        "[inserted] alarm={id} group={group} seconds={} at={} message={:?}",
                        e.seconds.unwrap_or(0),
                        unix_secs(e),
                        e.message.as_deref().unwrap_or(""),
                    );
                }
            }
            EventKind::AlarmFired => {
                println!(
                    "[fired] alarm={:?} seconds={:?} message={:?}",
                    e.alarm, e.seconds, e.message
                );
            }
            EventKind::AlarmCancelled => {
                println!("[cancelled] alarm={:?} group={:?}", e.alarm, e.group);
            }
            EventKind::AlarmReplaced => {
                println!(
                    "[replaced] alarm={:?} seconds={:?} message={:?}",
                    e.alarm, e.seconds, e.message
                );
            }
            EventKind::AlarmNotFound => {
                println!("[not-found] alarm={:?}", e.alarm);
            }
            EventKind::WorkerSpawned => {
                println!("[worker-spawned] group={:?} alarm={:?}", e.group, e.alarm);
            }
            EventKind::WorkerTerminated => {
                println!("[worker-terminated] group={:?} at={}", e.group, unix_secs(e));
            }
            EventKind::GroupReport => {
                if let (Some(group), Some(id)) = (e.group, e.alarm) {
                    println!(
                        "[group-report] group={group} alarm={id} at={} message={:?}",
                        unix_secs(e),
                        e.message.as_deref().unwrap_or(""),
                    );
                }
            }
            EventKind::UnknownCommand => {
                println!("[unknown-command] input={:?}", e.message);
            }
            EventKind::RequestRejected => {
                println!(
                    "[rejected] alarm={:?} reason={:?}",
                    e.alarm,
                    e.message.as_deref().unwrap_or("")
                );
            }
            EventKind::ShutdownRequested => {
                println!("[shutdown-requested]");
            }
            EventKind::AllStoppedWithinGrace => {
                println!("[all-stopped-within-grace]");
            }
            EventKind::GraceExceeded => {
                println!("[grace-exceeded]");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
