//! # alarmvisor
//!
//! **Alarmvisor** is a concurrent alarm-scheduling engine: callers submit
//! timed alarm requests, the engine tracks each request's absolute expiry and
//! fires it at the right time, and alarms sharing a 5-second duration bucket
//! are echoed together by a dedicated group worker until the bucket empties.
//!
//! ## Architecture
//! ```text
//!   CommandSource (console, script, socket — external)
//!        │  AlarmRequest
//!        ▼
//! ┌───────────────────────────────────────────────────────────────┐
//! │  AlarmEngine (scheduling facade)                              │
//! │  - AlarmStore   (pending alarms, expiry order)   lock #1      │
//! │  - Registry     (one live worker per group)      lock #2      │
//! │  - Bus          (broadcast status events)                     │
//! └──────┬───────────────────┬───────────────────────┬────────────┘
//!        ▼                   ▼                       ▼
//!   Dispatcher          GroupWorker g=1  ...  GroupWorker g=N
//!   (fires earliest-    (reports its group's alarms every
//!    due alarm, tears    interval; cooperative stop token)
//!    down empty groups)
//!        │                   │                       │
//!        └───────── publish(Event) ──────────────────┘
//!                            │
//!                            ▼
//!                  Bus ──► sink listener ──► SinkSet
//!                                     ┌────────┼────────┐
//!                                     ▼        ▼        ▼
//!                                  LogSink   custom   custom
//! ```
//!
//! ### Lifecycle
//! ```text
//! start(id, secs, msg) ─► validate ─► insert into store ─► ensure group worker
//! cancel(id)           ─► remove ─► terminate worker if group emptied
//! replace(id, …)       ─► remove + reinsert under ONE critical section
//! Dispatcher           ─► pops earliest due alarm ─► fire ─► teardown if empty
//! ```
//!
//! ## Guarantees
//! - At most one worker per group at any instant; a group's worker is torn
//!   down within one poll interval of the group emptying.
//! - Every started alarm eventually fires, is cancelled, or is replaced —
//!   none are silently lost.
//! - Worker stop is cooperative (at most one extra report cycle after a
//!   termination request); nothing is killed mid-step.
//! - Lock order is fixed (store before registry); no coordinator deadlocks.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use alarmvisor::{AlarmEngine, AlarmId, EngineConfig, LogSink};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = AlarmEngine::new(EngineConfig::default(), vec![Arc::new(LogSink)]);
//!     engine.spawn_dispatcher();
//!
//!     engine.start(AlarmId(1), 3, "tea is ready").await?;
//!     engine.replace(AlarmId(1), 5, "tea is REALLY ready").await?;
//!     engine.cancel(AlarmId(1)).await?;
//!
//!     engine.shutdown().await?;
//!     Ok(())
//! }
//! ```

mod alarm;
mod command;
mod config;
mod core;
mod error;
mod events;
mod sinks;
mod store;

// ---- Public re-exports ----

pub use alarm::{Alarm, AlarmId, GroupId};
pub use command::{parse_line, AlarmRequest, CommandSource, LineSource};
pub use config::EngineConfig;
pub use self::core::AlarmEngine;
pub use error::{CommandParseError, EngineError};
pub use events::{Bus, Event, EventKind};
pub use sinks::{LogSink, Sink, SinkSet};
pub use store::AlarmStore;
