//! Engine core: scheduling and worker lifecycle.
//!
//! This module contains the embedded implementation of the alarm engine.
//! The only public API from this module is [`AlarmEngine`], which owns the
//! shared state and exposes the `start`/`cancel`/`replace` surface.
//!
//! Internal modules:
//! - [`engine`]: the scheduling facade, shared context, and graceful shutdown;
//! - [`dispatcher`]: detects and fires due alarms, tears down emptied groups;
//! - [`worker`]: per-group periodic report task;
//! - [`registry`]: at-most-one live worker per group;
//! - [`shutdown`]: cross-platform termination-signal handling.
//!
//! ## Locking discipline
//! The alarm store and the worker registry each sit behind their own mutex
//! inside the shared context. Any step that observes-then-acts across both
//! holds both locks for the whole step, acquired in a fixed order:
//! **store before registry**. Nothing sleeps or does I/O while holding
//! either lock.

mod dispatcher;
mod engine;
mod registry;
mod shutdown;
mod worker;

pub use engine::AlarmEngine;
