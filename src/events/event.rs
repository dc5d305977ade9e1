//! # Status events emitted by the engine, dispatcher, and group workers.
//!
//! The [`EventKind`] enum classifies events across four categories:
//! - **Alarm lifecycle**: inserted, fired, cancelled, replaced, not-found
//! - **Worker lifecycle**: spawned, terminated, periodic group reports
//! - **Command surface**: unknown command, rejected request
//! - **Shutdown**: requested, completed within grace, grace exceeded
//!
//! The [`Event`] struct carries optional metadata: alarm id, group id,
//! requested seconds, and message text.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore order when events are observed through
//! independent sinks.
//!
//! ## Example
//! ```rust
//! use alarmvisor::{AlarmId, Event, EventKind, GroupId};
//!
//! let ev = Event::new(EventKind::AlarmInserted)
//!     .with_alarm(AlarmId(3))
//!     .with_group(GroupId(1))
//!     .with_seconds(4)
//!     .with_message("wake up");
//!
//! assert_eq!(ev.kind, EventKind::AlarmInserted);
//! assert_eq!(ev.alarm, Some(AlarmId(3)));
//! assert_eq!(ev.message.as_deref(), Some("wake up"));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

use crate::alarm::{AlarmId, GroupId};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of status events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Alarm lifecycle ===
    /// Alarm was accepted into the store.
    ///
    /// Sets: `alarm`, `group`, `seconds`, `message`, `at`, `seq`.
    AlarmInserted,

    /// Alarm expired and was fired by the dispatcher.
    ///
    /// Sets: `alarm`, `group`, `seconds` (originally requested), `message`,
    /// `at`, `seq`.
    AlarmFired,

    /// Alarm was cancelled by the caller.
    ///
    /// Sets: `alarm`, `group`, `message`, `at`, `seq`.
    AlarmCancelled,

    /// Alarm was superseded by a replacement.
    ///
    /// Sets: `alarm`, `group` (new), `seconds` (new), `message` (new),
    /// `at`, `seq`.
    AlarmReplaced,

    /// `cancel`/`replace` referenced an id with no pending alarm.
    ///
    /// Sets: `alarm`, `at`, `seq`.
    AlarmNotFound,

    // === Worker lifecycle ===
    /// A new group worker was spawned.
    ///
    /// Sets: `group`, `alarm` (the triggering alarm), `at`, `seq`.
    WorkerSpawned,

    /// A group worker was signalled to stop and deregistered.
    ///
    /// Sets: `group`, `at`, `seq`.
    WorkerTerminated,

    /// A group worker reported one pending alarm of its group.
    ///
    /// Sets: `group`, `alarm`, `seconds`, `message`, `at`, `seq`.
    GroupReport,

    // === Command surface ===
    /// Input from the command source matched no known command shape.
    ///
    /// Sets: `message` (the offending input), `at`, `seq`.
    UnknownCommand,

    /// A structured request was rejected by the engine (duplicate id,
    /// invalid duration, capacity).
    ///
    /// Sets: `alarm` (when known), `message` (rejection reason), `at`, `seq`.
    RequestRejected,

    // === Shutdown ===
    /// Engine shutdown was requested.
    ///
    /// Sets: `at`, `seq`.
    ShutdownRequested,

    /// All workers stopped within the configured grace period.
    ///
    /// Sets: `at`, `seq`.
    AllStoppedWithinGrace,

    /// Grace period exceeded; some workers did not stop in time.
    ///
    /// Sets: `at`, `seq`.
    GraceExceeded,
}

/// Status event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Alarm id, if applicable.
    pub alarm: Option<AlarmId>,
    /// Group id, if applicable.
    pub group: Option<GroupId>,
    /// Requested duration in seconds, if applicable.
    pub seconds: Option<u32>,
    /// Message text (alarm message, input line, or rejection reason).
    pub message: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next
    /// sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            alarm: None,
            group: None,
            seconds: None,
            message: None,
        }
    }

    /// Attaches an alarm id.
    #[inline]
    pub fn with_alarm(mut self, id: AlarmId) -> Self {
        self.alarm = Some(id);
        self
    }

    /// Attaches a group id.
    #[inline]
    pub fn with_group(mut self, group: GroupId) -> Self {
        self.group = Some(group);
        self
    }

    /// Attaches a requested duration.
    #[inline]
    pub fn with_seconds(mut self, seconds: u32) -> Self {
        self.seconds = Some(seconds);
        self
    }

    /// Attaches message text.
    #[inline]
    pub fn with_message(mut self, message: impl Into<Arc<str>>) -> Self {
        self.message = Some(message.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_are_monotonic() {
        let a = Event::new(EventKind::AlarmInserted);
        let b = Event::new(EventKind::AlarmFired);
        assert!(b.seq > a.seq);
    }
}
