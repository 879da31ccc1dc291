//! Data models for probe results
//!
//! This module contains the data structures produced by the probes.

mod batch_report;
mod latency;
mod probe_result;
mod server_metrics;

pub use batch_report::{BatchReport, CacheWarmup, RequestOutcome};
pub use latency::LatencyStats;
pub use probe_result::{CacheTiming, ConcurrentResult, EndpointStats, ProbeResult};
pub use server_metrics::{MetricField, MetricsSnapshot, TokenKind};
