//! # Status sink trait.
//!
//! Provides [`Sink`], the extension point for consuming status notifications
//! emitted by the engine.
//!
//! Each sink gets:
//! - **Dedicated worker task** (runs independently)
//! - **Per-sink bounded queue** (capacity via [`Sink::queue_capacity`])
//! - **Panic isolation** (panics are caught inside the worker)
//!
//! ## Rules
//! - A slow sink only affects its own queue.
//! - Queue overflow drops the event **for this sink only**; other sinks are
//!   unaffected.
//! - Events are processed sequentially (FIFO) per sink.
//! - Sinks never block publishers or each other.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use alarmvisor::{Event, EventKind, Sink};
//!
//! struct FireCounter;
//!
//! #[async_trait]
//! impl Sink for FireCounter {
//!     async fn on_event(&self, ev: &Event) {
//!         if matches!(ev.kind, EventKind::AlarmFired) {
//!             // increment a metric, etc.
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "fire-counter" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Consumer of engine status notifications.
///
/// Each sink runs in isolation: a bounded queue buffers events and a
/// dedicated worker task processes them sequentially.
#[async_trait]
pub trait Sink: Send + Sync + 'static {
    /// Handles one status event.
    ///
    /// Implementations should return promptly; long work delays only this
    /// sink's own queue.
    async fn on_event(&self, ev: &Event);

    /// Short, stable sink name (used in overflow diagnostics).
    fn name(&self) -> &'static str;

    /// Capacity of this sink's event queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
