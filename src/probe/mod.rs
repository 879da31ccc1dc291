//! Probes against the server under test
//!
//! Four dashboard probes (load, cache, concurrent, metrics), the auto-refresh
//! timer that re-runs the metrics probe, and three capped batches (stress,
//! warmup, sweep) that record failures instead of aborting.

mod runner;
mod scrape;
mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use runner::ProbeRunner;
pub use session::Session;

use std::fmt;
use thiserror::Error;

use crate::http::HttpError;

/// Probe failures. Both collapse to one rendered error line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// A request was rejected or its body could not be read
    #[error(transparent)]
    Network(#[from] HttpError),

    /// The metrics document could not be scanned
    #[error("Failed to parse metrics: {0}")]
    Parse(String),
}

/// Everything a session can run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProbeKind {
    Load,
    Cache,
    Concurrent,
    Metrics,
    Stress,
    Warmup,
    Sweep,
}

impl ProbeKind {
    pub fn name(&self) -> &'static str {
        match self {
            ProbeKind::Load => "load",
            ProbeKind::Cache => "cache",
            ProbeKind::Concurrent => "concurrent",
            ProbeKind::Metrics => "metrics",
            ProbeKind::Stress => "stress",
            ProbeKind::Warmup => "warmup",
            ProbeKind::Sweep => "sweep",
        }
    }

    pub fn loading_message(&self) -> &'static str {
        match self {
            ProbeKind::Load => "Starting load test...",
            ProbeKind::Cache => "Testing cache functionality...",
            ProbeKind::Concurrent => "Testing concurrent request handling...",
            ProbeKind::Metrics => "Fetching live metrics...",
            ProbeKind::Stress => "Running capped load test...",
            ProbeKind::Warmup => "Warming the cache...",
            ProbeKind::Sweep => "Sweeping concurrency levels...",
        }
    }

    pub fn error_prefix(&self) -> &'static str {
        match self {
            ProbeKind::Metrics => "Error fetching metrics",
            _ => "Error",
        }
    }

    /// Order used by the suite. Metrics runs last so it counts the suite's traffic.
    pub fn all() -> [ProbeKind; 7] {
        [
            ProbeKind::Load,
            ProbeKind::Cache,
            ProbeKind::Concurrent,
            ProbeKind::Stress,
            ProbeKind::Warmup,
            ProbeKind::Sweep,
            ProbeKind::Metrics,
        ]
    }
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
