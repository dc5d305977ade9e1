//! # AlarmStore: ordered collection of pending alarms.
//!
//! The store is a plain synchronous collection; the engine owns it behind a
//! single `tokio::sync::Mutex` and every composite operation (for example
//! remove-then-maybe-terminate-worker) runs inside one continuous critical
//! section on that lock.
//!
//! ## Ordering
//! Alarms are kept sorted by absolute expiry, ties broken by id, so
//! [`AlarmStore::earliest`] is always the earliest-due alarm and dispatch
//! latency is bounded by the earliest alarm's remaining time rather than by
//! list position.
//!
//! ## Rules
//! - An alarm id appears at most once (enforced by the engine via
//!   [`AlarmStore::contains`] before insert).
//! - Each alarm is removed by exactly one of: fire, cancel, replace.
//!   `remove` on an absent id is a `None` no-op.

use tokio::time::Instant;

use crate::alarm::{Alarm, AlarmId, GroupId};

/// Ordered sequence of pending alarms (earliest expiry first).
#[derive(Debug, Default)]
pub struct AlarmStore {
    alarms: Vec<Alarm>,
}

impl AlarmStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self { alarms: Vec::new() }
    }

    /// Inserts an alarm at its (expiry, id) position.
    pub fn insert(&mut self, alarm: Alarm) {
        let at = self
            .alarms
            .partition_point(|a| (a.expiry, a.id) < (alarm.expiry, alarm.id));
        self.alarms.insert(at, alarm);
    }

    /// Returns the pending alarm with `id`, if any.
    pub fn find(&self, id: AlarmId) -> Option<&Alarm> {
        self.alarms.iter().find(|a| a.id == id)
    }

    /// Whether an alarm with `id` is pending.
    pub fn contains(&self, id: AlarmId) -> bool {
        self.find(id).is_some()
    }

    /// Removes and returns the alarm with `id`; `None` if absent.
    pub fn remove(&mut self, id: AlarmId) -> Option<Alarm> {
        let at = self.alarms.iter().position(|a| a.id == id)?;
        Some(self.alarms.remove(at))
    }

    /// The earliest-due alarm, if any.
    pub fn earliest(&self) -> Option<&Alarm> {
        self.alarms.first()
    }

    /// Removes and returns the earliest alarm iff it is due at `now`.
    pub fn pop_due(&mut self, now: Instant) -> Option<Alarm> {
        if self.alarms.first()?.is_due(now) {
            Some(self.alarms.remove(0))
        } else {
            None
        }
    }

    /// Whether any pending alarm belongs to `group`.
    pub fn has_group(&self, group: GroupId) -> bool {
        self.alarms.iter().any(|a| a.group == group)
    }

    /// Snapshot of every pending alarm in `group`, in expiry order.
    pub fn alarms_in(&self, group: GroupId) -> Vec<Alarm> {
        self.alarms
            .iter()
            .filter(|a| a.group == group)
            .cloned()
            .collect()
    }

    /// Number of pending alarms.
    pub fn len(&self) -> usize {
        self.alarms.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.alarms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alarm(id: u32, seconds: u32) -> Alarm {
        Alarm::new(AlarmId(id), seconds, format!("alarm-{id}"), 128).unwrap()
    }

    #[test]
    fn keeps_expiry_order_regardless_of_insert_order() {
        let mut store = AlarmStore::new();
        store.insert(alarm(1, 30));
        store.insert(alarm(2, 10));
        store.insert(alarm(3, 20));

        assert_eq!(store.earliest().map(|a| a.id), Some(AlarmId(2)));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn ties_on_expiry_break_by_id() {
        let mut store = AlarmStore::new();
        let a = alarm(9, 10);
        let mut b = alarm(4, 10);
        // Same instant so ordering depends purely on the tie-break.
        b.expiry = a.expiry;
        store.insert(a);
        store.insert(b);

        assert_eq!(store.earliest().map(|x| x.id), Some(AlarmId(4)));
    }

    #[test]
    fn remove_is_a_noop_when_absent() {
        let mut store = AlarmStore::new();
        store.insert(alarm(1, 5));
        assert!(store.remove(AlarmId(2)).is_none());
        assert_eq!(store.len(), 1);
        assert!(store.remove(AlarmId(1)).is_some());
        assert!(store.remove(AlarmId(1)).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn group_queries_track_membership() {
        let mut store = AlarmStore::new();
        store.insert(alarm(1, 3)); // group 1
        store.insert(alarm(2, 4)); // group 1
        store.insert(alarm(3, 8)); // group 2

        assert!(store.has_group(GroupId(1)));
        assert_eq!(store.alarms_in(GroupId(1)).len(), 2);
        assert_eq!(store.alarms_in(GroupId(2)).len(), 1);

        store.remove(AlarmId(3));
        assert!(!store.has_group(GroupId(2)));
        assert!(store.alarms_in(GroupId(2)).is_empty());
    }

    #[test]
    fn pop_due_only_fires_due_alarms() {
        let mut store = AlarmStore::new();
        store.insert(alarm(1, 60));
        assert!(store.pop_due(Instant::now()).is_none());

        let mut due = alarm(2, 1);
        due.expiry = Instant::now();
        store.insert(due);
        let fired = store.pop_due(Instant::now()).unwrap();
        assert_eq!(fired.id, AlarmId(2));
        assert_eq!(store.len(), 1);
    }
}
