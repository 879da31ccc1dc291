//! Capped batch reports
//!
//! Results of the batches that run with a limit on requests in flight.
//! Unlike the probe results, every request is kept: a rejected request is a
//! failure with a message, not an abort.

use serde::Serialize;

use super::probe_result::{per_second, EndpointStats, Rounded};
use super::LatencyStats;
use crate::http::{HttpError, HttpResponse};

/// Failures listed under a batch report
pub const FAILURE_LIST_LIMIT: usize = 5;

/// One request inside a capped batch
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RequestOutcome {
    /// Position in dispatch order, starting at 0
    pub id: usize,
    pub path: String,
    /// `None` when no response arrived
    pub status_code: Option<u16>,
    pub latency_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RequestOutcome {
    pub fn new(
        id: usize,
        path: &str,
        result: Result<HttpResponse, HttpError>,
        latency_ms: f64,
    ) -> Self {
        let (status_code, error) = match result {
            Ok(response) => (Some(response.status_code), None),
            Err(e) => (None, Some(e.to_string())),
        };
        Self {
            id,
            path: path.to_string(),
            status_code,
            latency_ms,
            error,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == Some(200)
    }

    /// What went wrong, for the failure listing
    pub fn failure_message(&self) -> String {
        match (&self.error, self.status_code) {
            (Some(error), _) => error.clone(),
            (None, Some(code)) => format!("HTTP {code}"),
            (None, None) => "Unknown error".to_string(),
        }
    }
}

/// Outcome of a batch with at most `in_flight` requests outstanding
#[derive(Clone, Debug, Serialize)]
pub struct BatchReport {
    pub in_flight: usize,
    pub total: u64,
    pub duration_ms: f64,
    pub success_count: u64,
    pub error_count: u64,
    /// Latency of the successful requests only
    pub latency: LatencyStats,
    pub endpoints: Vec<EndpointStats>,
    /// Failed requests in dispatch order
    pub failures: Vec<RequestOutcome>,
}

impl BatchReport {
    /// `targets` fixes the order of the endpoint breakdown
    pub fn from_outcomes(
        targets: &[String],
        in_flight: usize,
        mut outcomes: Vec<RequestOutcome>,
        duration_ms: f64,
    ) -> Self {
        outcomes.sort_by_key(|o| o.id);

        let total = outcomes.len() as u64;
        let success_count = outcomes.iter().filter(|o| o.is_success()).count() as u64;

        let ok_latencies: Vec<f64> = outcomes
            .iter()
            .filter(|o| o.is_success())
            .map(|o| o.latency_ms)
            .collect();

        let endpoints = targets
            .iter()
            .map(|path| {
                EndpointStats::tally(
                    path,
                    outcomes
                        .iter()
                        .filter(|o| &o.path == path)
                        .map(|o| (o.is_success(), o.latency_ms)),
                )
            })
            .collect();

        Self {
            in_flight,
            total,
            duration_ms,
            success_count,
            error_count: total - success_count,
            latency: LatencyStats::from_samples(&ok_latencies),
            endpoints,
            failures: outcomes.into_iter().filter(|o| !o.is_success()).collect(),
        }
    }

    pub fn throughput(&self) -> Rounded {
        per_second(self.total as f64, self.duration_ms)
    }

    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.success_count as f64 / self.total as f64 * 100.0
        }
    }

    /// The failures shown in a report
    pub fn first_failures(&self) -> &[RequestOutcome] {
        &self.failures[..self.failures.len().min(FAILURE_LIST_LIMIT)]
    }
}

/// Repeated sequential requests to one path.
///
/// The first successful request is taken as the cache miss and the rest as
/// cache hits.
#[derive(Clone, Debug, Serialize)]
pub struct CacheWarmup {
    pub path: String,
    pub requested: usize,
    /// Latency of each 200 response, in request order
    pub timings_ms: Vec<f64>,
}

impl CacheWarmup {
    pub fn first_ms(&self) -> Option<f64> {
        self.timings_ms.first().copied()
    }

    /// Mean of every successful request after the first
    pub fn cached_average_ms(&self) -> Option<f64> {
        match self.timings_ms.as_slice() {
            [_, rest @ ..] if !rest.is_empty() => {
                Some(rest.iter().sum::<f64>() / rest.len() as f64)
            }
            _ => None,
        }
    }

    /// `None` with fewer than two successes or an unmeasurable first request
    pub fn speedup_percent(&self) -> Option<f64> {
        let first = self.first_ms().filter(|ms| *ms > 0.0)?;
        let cached = self.cached_average_ms()?;
        Some((first - cached) / first * 100.0)
    }
}
