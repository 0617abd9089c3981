//! Telemetry infrastructure
//!
//! Structured logging through tracing.

pub mod logging;

pub use logging::{init_logging, LogConfig, LogGuard};
