//! Probe result models
//!
//! Aggregates computed from one probe invocation. Nothing here outlives
//! the render that follows it.

use serde::{Serialize, Serializer};
use std::fmt;

use super::LatencyStats;
use crate::http::HttpResponse;

/// A ratio rounded the way browser dashboards round it.
///
/// Halves round toward positive infinity, so `-2.5` becomes `-2`.
/// Division by a zero duration yields `Infinity`, `0 / 0` yields `NaN`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rounded {
    Value(i64),
    Infinity,
    NegInfinity,
    NaN,
}

impl Rounded {
    pub fn of(x: f64) -> Self {
        if x.is_nan() {
            Rounded::NaN
        } else if x == f64::INFINITY {
            Rounded::Infinity
        } else if x == f64::NEG_INFINITY {
            Rounded::NegInfinity
        } else {
            Rounded::Value((x + 0.5).floor() as i64)
        }
    }

    pub fn ratio(numerator: f64, denominator: f64) -> Self {
        Self::of(numerator / denominator)
    }

    pub fn value(self) -> Option<i64> {
        match self {
            Rounded::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Rounded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rounded::Value(v) => write!(f, "{v}"),
            Rounded::Infinity => write!(f, "Infinity"),
            Rounded::NegInfinity => write!(f, "-Infinity"),
            Rounded::NaN => write!(f, "NaN"),
        }
    }
}

impl Serialize for Rounded {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Rounded::Value(v) => serializer.serialize_i64(*v),
            other => serializer.collect_str(other),
        }
    }
}

/// `count` requests completed in `duration_ms`, per second
pub(super) fn per_second(count: f64, duration_ms: f64) -> Rounded {
    Rounded::ratio(count, duration_ms / 1000.0)
}

/// Outcome of a load probe batch
#[derive(Clone, Debug, Default, Serialize)]
pub struct ProbeResult {
    pub path: String,
    pub request_count: u64,
    pub duration_ms: u64,
    pub success_count: u64,
    pub error_count: u64,
    pub latency: LatencyStats,
}

impl ProbeResult {
    /// All responses in the batch arrived
    pub fn from_batch(path: impl Into<String>, responses: &[HttpResponse], duration_ms: u64) -> Self {
        Self {
            path: path.into(),
            request_count: responses.len() as u64,
            duration_ms,
            success_count: responses.len() as u64,
            error_count: 0,
            latency: LatencyStats::from_millis(responses.iter().map(|r| r.duration_ms)),
        }
    }

    pub fn requests_per_second(&self) -> Rounded {
        per_second(self.request_count as f64, self.duration_ms as f64)
    }

    pub fn avg_response_ms(&self) -> Rounded {
        Rounded::ratio(self.duration_ms as f64, self.request_count as f64)
    }
}

/// Three sequential timings against one path
#[derive(Clone, Debug, Serialize)]
pub struct CacheTiming {
    pub path: String,
    pub first_ms: u64,
    pub second_ms: u64,
    pub third_ms: u64,
}

impl CacheTiming {
    /// Percentage by which the second request beat the first.
    ///
    /// Negative when the second request was slower; zero when the first
    /// request took no measurable time.
    pub fn speedup_percent(&self) -> i64 {
        if self.first_ms == 0 {
            return 0;
        }
        let t1 = self.first_ms as f64;
        let t2 = self.second_ms as f64;
        Rounded::of((t1 - t2) / t1 * 100.0).value().unwrap_or(0)
    }

    pub fn timings(&self) -> [u64; 3] {
        [self.first_ms, self.second_ms, self.third_ms]
    }
}

/// Per-path breakdown inside a concurrent batch
#[derive(Clone, Debug, Serialize)]
pub struct EndpointStats {
    pub path: String,
    pub total: u64,
    pub success: u64,
    /// Mean latency of the 200 responses only
    pub avg_latency_ms: f64,
}

impl EndpointStats {
    /// Tally `(succeeded, latency_ms)` pairs observed for `path`
    pub fn tally(path: &str, hits: impl IntoIterator<Item = (bool, f64)>) -> Self {
        let mut total = 0;
        let mut ok = Vec::new();
        for (success, latency_ms) in hits {
            total += 1;
            if success {
                ok.push(latency_ms);
            }
        }

        let avg_latency_ms = if ok.is_empty() {
            0.0
        } else {
            ok.iter().sum::<f64>() / ok.len() as f64
        };

        Self {
            path: path.to_string(),
            total,
            success: ok.len() as u64,
            avg_latency_ms,
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.success as f64 / self.total as f64 * 100.0
        }
    }
}

/// Outcome of a concurrent probe batch
#[derive(Clone, Debug, Serialize)]
pub struct ConcurrentResult {
    pub total: u64,
    pub duration_ms: u64,
    pub success_count: u64,
    pub error_count: u64,
    pub endpoints: Vec<EndpointStats>,
}

impl ConcurrentResult {
    /// Classify every response by `status == 200`.
    ///
    /// `targets` fixes the order of the endpoint breakdown.
    pub fn classify(targets: &[String], responses: &[HttpResponse], duration_ms: u64) -> Self {
        let success_count = responses.iter().filter(|r| r.is_ok()).count() as u64;
        let total = responses.len() as u64;

        let endpoints = targets
            .iter()
            .map(|path| {
                EndpointStats::tally(
                    path,
                    responses
                        .iter()
                        .filter(|r| &r.path == path)
                        .map(|r| (r.is_ok(), r.duration_ms as f64)),
                )
            })
            .collect();

        Self {
            total,
            duration_ms,
            success_count,
            error_count: total - success_count,
            endpoints,
        }
    }

    pub fn throughput(&self) -> Rounded {
        per_second(self.total as f64, self.duration_ms as f64)
    }
}
