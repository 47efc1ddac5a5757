//! IO modules - external system interfaces
//!
//! This module contains all external IO operations:
//! - `frm` - HTTP client for the Ficsit Remote Monitoring JSON endpoints
//! - `prometheus` - Prometheus metrics HTTP endpoint

pub mod frm;
pub mod prometheus;

// Re-export commonly used types
pub use frm::{FrmClient, FrmSource, RetrievalError, SnapshotSource};
pub use prometheus::start_metrics_server;
