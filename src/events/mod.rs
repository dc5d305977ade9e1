//! Status events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to status notifications emitted by the engine, the
//! dispatcher, and group workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] — event classification and payload metadata
//! - [`Bus`] — thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `AlarmEngine` (start/cancel/replace), `Dispatcher`
//!   (fires, worker teardown), `GroupWorker` (periodic reports),
//!   `GroupWorkerRegistry` (spawn/terminate).
//! - **Consumers**: the engine's sink listener, which fans events out to
//!   every registered [`Sink`](crate::sinks::Sink).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
