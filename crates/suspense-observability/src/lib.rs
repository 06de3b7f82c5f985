//! Logging and per-session metrics for streamed pages.
//!
//! This crate provides:
//! - `init_logging` - `tracing` subscriber setup (human or JSON)
//! - `MetricsCollector` / `SessionMetrics` - Shell, section and full-page timings

mod logging;
mod metrics;

pub use logging::*;
pub use metrics::*;

// Re-export for convenience
pub use suspense_core::{SessionId, TimingContext};
