//! Error types used by the alarm engine and the command layer.
//!
//! This module defines two error enums:
//!
//! - [`EngineError`] — failures raised by scheduling operations and shutdown.
//! - [`CommandParseError`] — failures raised while parsing command text; these
//!   belong to the external command layer and never reach the core.
//!
//! Both types provide `as_label`/`as_message` helpers for logs and sinks.

use std::time::Duration;
use thiserror::Error;

use crate::alarm::{AlarmId, GroupId};

/// # Errors produced by scheduling operations.
///
/// `NotFound` is recovered locally (the operation is a no-op and the miss is
/// reported to sinks); the remaining variants fail the triggering operation
/// and leave shared state consistent.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum EngineError {
    /// `cancel`/`replace` referenced an id with no pending alarm.
    #[error("alarm {id} not found")]
    NotFound {
        /// The id the caller asked for.
        id: AlarmId,
    },

    /// Requested duration cannot produce a meaningful expiry or group.
    #[error("invalid duration: {seconds} seconds")]
    InvalidDuration {
        /// The rejected duration.
        seconds: u32,
    },

    /// `start` referenced an id that is already pending.
    #[error("alarm {id} already pending")]
    DuplicateId {
        /// The conflicting id.
        id: AlarmId,
    },

    /// The registry is at its configured worker capacity and the operation
    /// would need a new group worker.
    #[error("group worker capacity ({max}) exceeded")]
    GroupCapacityExceeded {
        /// The configured maximum number of concurrent group workers.
        max: usize,
    },

    /// Shutdown grace period was exceeded; some workers had to be abandoned.
    #[error("shutdown grace {grace:?} exceeded; stuck groups: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Groups whose workers did not stop in time.
        stuck: Vec<GroupId>,
    },
}

impl EngineError {
    /// Returns a short stable label (snake_case) for use in logs/sinks.
    pub fn as_label(&self) -> &'static str {
        match self {
            EngineError::NotFound { .. } => "alarm_not_found",
            EngineError::InvalidDuration { .. } => "invalid_duration",
            EngineError::DuplicateId { .. } => "duplicate_id",
            EngineError::GroupCapacityExceeded { .. } => "group_capacity_exceeded",
            EngineError::GraceExceeded { .. } => "grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        self.to_string()
    }
}

/// # Errors produced while parsing command text.
///
/// Owned by the command layer ([`crate::command`]); a malformed line never
/// reaches the engine, it is reported as an unknown command instead.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CommandParseError {
    /// The line matched none of the three command shapes.
    #[error("unrecognized command: {input:?}")]
    Unrecognized {
        /// The offending input line.
        input: String,
    },

    /// The line matched a command shape but a field failed to parse.
    #[error("bad {field} in command: {input:?}")]
    BadField {
        /// Which field was malformed (`"id"` or `"seconds"`).
        field: &'static str,
        /// The offending input line.
        input: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_stable() {
        let err = EngineError::NotFound { id: AlarmId(3) };
        assert_eq!(err.as_label(), "alarm_not_found");
        assert_eq!(err.as_message(), "alarm 3 not found");

        let err = EngineError::GroupCapacityExceeded { max: 100 };
        assert_eq!(err.as_label(), "group_capacity_exceeded");
    }
}
