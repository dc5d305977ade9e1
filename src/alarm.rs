//! # Alarm data model.
//!
//! An [`Alarm`] is a pending timed request: a caller-supplied [`AlarmId`],
//! a requested duration in whole seconds, an absolute expiry instant computed
//! at construction, a bounded-length message, and a derived [`GroupId`].
//!
//! ## Group derivation
//! Alarms are bucketed by duration into 5-second groups:
//! `group = ceil(seconds / 5)`, so durations `1..=5` map to group 1,
//! `6..=10` to group 2, and so on. Alarms sharing a group are reported
//! together by one [`GroupWorker`](crate::core) until the group empties.
//!
//! ## Rules
//! - `seconds == 0` is rejected at construction ([`EngineError::InvalidDuration`]);
//!   a zero-duration alarm has no meaningful expiry or group.
//! - Messages longer than the configured capacity are truncated at a char
//!   boundary, never split mid-codepoint.

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::EngineError;

/// Caller-supplied alarm identifier.
///
/// Uniqueness among pending alarms is enforced by the engine: a second
/// `start` with an id that is still pending is rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AlarmId(pub u32);

impl fmt::Display for AlarmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Duration bucket identifier: `ceil(seconds / 5)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupId(pub u32);

impl GroupId {
    /// Derives the group for a requested duration.
    ///
    /// `seconds` must be non-zero (validated by [`Alarm::new`]).
    pub fn for_seconds(seconds: u32) -> Self {
        Self((seconds + 4) / 5)
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A pending timed request owned by the store until fired, cancelled, or
/// replaced.
#[derive(Clone, Debug)]
pub struct Alarm {
    /// Caller-supplied identifier.
    pub id: AlarmId,
    /// Requested delay in whole seconds.
    pub seconds: u32,
    /// Absolute expiry, computed as `now + seconds` at construction.
    ///
    /// A `tokio::time::Instant`, so paused-clock tests advance it with the
    /// runtime's virtual clock.
    pub expiry: Instant,
    /// Message echoed when the alarm fires or is reported; bounded length.
    pub message: String,
    /// Duration bucket this alarm belongs to.
    pub group: GroupId,
}

impl Alarm {
    /// Builds an alarm, computing expiry and group from `seconds`.
    ///
    /// The message is truncated to `message_capacity` bytes (at a char
    /// boundary). Returns [`EngineError::InvalidDuration`] for `seconds == 0`.
    pub fn new(
        id: AlarmId,
        seconds: u32,
        message: impl Into<String>,
        message_capacity: usize,
    ) -> Result<Self, EngineError> {
        if seconds == 0 {
            return Err(EngineError::InvalidDuration { seconds });
        }
        Ok(Self {
            id,
            seconds,
            expiry: Instant::now() + Duration::from_secs(u64::from(seconds)),
            message: truncate_to_boundary(message.into(), message_capacity),
            group: GroupId::for_seconds(seconds),
        })
    }

    /// Whether this alarm is due at `now`.
    pub fn is_due(&self, now: Instant) -> bool {
        self.expiry <= now
    }
}

/// Truncates `s` to at most `cap` bytes without splitting a codepoint.
fn truncate_to_boundary(mut s: String, cap: usize) -> String {
    if s.len() > cap {
        let mut end = cap;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        s.truncate(end);
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_buckets_are_five_seconds_wide() {
        for s in 1..=5 {
            assert_eq!(GroupId::for_seconds(s), GroupId(1), "seconds={s}");
        }
        assert_eq!(GroupId::for_seconds(6), GroupId(2));
        assert_eq!(GroupId::for_seconds(10), GroupId(2));
        assert_eq!(GroupId::for_seconds(11), GroupId(3));
    }

    #[test]
    fn zero_duration_is_rejected() {
        let err = Alarm::new(AlarmId(1), 0, "x", 128).unwrap_err();
        assert!(matches!(err, EngineError::InvalidDuration { seconds: 0 }));
    }

    #[test]
    fn message_is_truncated_at_capacity() {
        let alarm = Alarm::new(AlarmId(1), 3, "a".repeat(200), 128).unwrap();
        assert_eq!(alarm.message.len(), 128);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        // 'é' is two bytes; capacity lands in the middle of the second one.
        let alarm = Alarm::new(AlarmId(1), 3, "aé", 2).unwrap();
        assert_eq!(alarm.message, "a");
    }

    #[test]
    fn expiry_is_now_plus_seconds() {
        let before = Instant::now();
        let alarm = Alarm::new(AlarmId(1), 7, "x", 128).unwrap();
        assert!(alarm.expiry >= before + Duration::from_secs(7));
        assert!(!alarm.is_due(Instant::now()));
        assert_eq!(alarm.group, GroupId(2));
    }
}
