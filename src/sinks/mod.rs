//! # Status sinks for the alarm engine.
//!
//! This module provides the [`Sink`] trait and the fan-out machinery for
//! delivering status events broadcast through the [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Engine / Dispatcher / GroupWorker ── publish(Event) ──► Bus
//!                                                            │
//!                                                  sink listener (in engine)
//!                                                            │
//!                                                       SinkSet::emit
//!                                              ┌─────────────┼─────────────┐
//!                                              ▼             ▼             ▼
//!                                         [queue S1]    [queue S2]    [queue SN]
//!                                              │             │             │
//!                                         worker S1     worker S2     worker SN
//!                                              ▼             ▼             ▼
//!                                        s1.on_event   s2.on_event   sN.on_event
//! ```
//!
//! ## Sink types
//! - [`LogSink`] — human-readable stdout rendering of every event
//! - custom sinks — metrics, assertions in tests, alerting

mod log;
mod set;
mod sink;

pub use log::LogSink;
pub use set::SinkSet;
pub use sink::Sink;
