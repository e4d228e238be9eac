//! Telemetry for the fetch layer
//!
//! Counters for pool and request activity, plus the sink that receives
//! user-facing certificate diagnostics.

pub mod client_stats;
pub mod diagnostics;

pub use client_stats::{FetchStats, FetchStatsSnapshot};
pub use diagnostics::{DiagnosticSink, MemorySink, TracingSink};
