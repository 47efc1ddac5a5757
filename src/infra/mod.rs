//! Infrastructure - configuration, clock, and metrics
//!
//! This module contains infrastructure concerns:
//! - `config` - Application configuration (TOML loading, defaults)
//! - `clock` - Injectable time source for trip timing
//! - `metrics` - Gauge registry with last-write-wins semantics

pub mod clock;
pub mod config;
pub mod metrics;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use metrics::{MetricId, Metrics, MetricsSink};
