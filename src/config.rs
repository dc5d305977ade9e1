//! # Global engine configuration.
//!
//! [`EngineConfig`] defines the engine's behavior: dispatcher poll interval,
//! group report interval, message capacity, the concurrent-group cap, event
//! bus capacity, and the shutdown grace period.
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use alarmvisor::EngineConfig;
//!
//! let mut cfg = EngineConfig::default();
//! cfg.poll = Duration::from_millis(500);
//! cfg.max_groups = 8;
//!
//! assert_eq!(cfg.max_groups, 8);
//! ```

use std::time::Duration;

/// Global configuration for the engine, dispatcher, and group workers.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Upper bound on dispatcher sleep while idle or waiting for the
    /// earliest alarm; newly inserted alarms are observed within one `poll`.
    pub poll: Duration,
    /// Interval between a group worker's report cycles.
    pub report_interval: Duration,
    /// Maximum alarm message length in bytes; longer messages are truncated.
    pub message_capacity: usize,
    /// Maximum number of concurrently live group workers (0 = unlimited).
    pub max_groups: usize,
    /// Capacity of the event bus channel.
    pub bus_capacity: usize,
    /// Maximum time to wait for workers during graceful shutdown.
    pub grace: Duration,
}

impl Default for EngineConfig {
    /// Provides a default configuration:
    /// - `poll = 1s`
    /// - `report_interval = 1s`
    /// - `message_capacity = 128`
    /// - `max_groups = 100`
    /// - `bus_capacity = 1024`
    /// - `grace = 30s`
    fn default() -> Self {
        Self {
            poll: Duration::from_secs(1),
            report_interval: Duration::from_secs(1),
            message_capacity: 128,
            max_groups: 100,
            bus_capacity: 1024,
            grace: Duration::from_secs(30),
        }
    }
}
