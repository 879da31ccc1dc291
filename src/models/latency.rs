//! Per-request latency statistics
//!
//! Summarises the individual response times observed inside a batch.

use serde::{Deserialize, Serialize};

/// Latency percentiles in milliseconds
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    pub p50: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
}

impl Percentiles {
    /// Nearest-rank percentiles over an ascending slice
    pub fn from_sorted(sorted: &[f64]) -> Self {
        Self {
            p50: rank(sorted, 0.50),
            p90: rank(sorted, 0.90),
            p95: rank(sorted, 0.95),
            p99: rank(sorted, 0.99),
        }
    }
}

/// `sorted[floor(len * q)]`, clamped to the last sample
fn rank(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        len => sorted[((len as f64 * q) as usize).min(len - 1)],
    }
}

/// Latency statistics
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencyStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub percentiles: Percentiles,
}

impl LatencyStats {
    /// Calculate statistics from latency samples (in milliseconds)
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let count = sorted.len();
        let mean = sorted.iter().sum::<f64>() / count as f64;
        let variance = sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / count as f64;

        let median = if count % 2 == 0 {
            (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
        } else {
            sorted[count / 2]
        };

        Self {
            count,
            min: sorted[0],
            max: sorted[count - 1],
            mean,
            median,
            std_dev: variance.sqrt(),
            percentiles: Percentiles::from_sorted(&sorted),
        }
    }

    /// Build from integral millisecond samples
    pub fn from_millis(samples: impl IntoIterator<Item = u64>) -> Self {
        let samples: Vec<f64> = samples.into_iter().map(|ms| ms as f64).collect();
        Self::from_samples(&samples)
    }

    /// Format as summary string
    pub fn format_summary(&self) -> String {
        format!(
            "avg={:.2}ms median={:.2}ms min={:.2}ms max={:.2}ms p95={:.2}ms",
            self.mean, self.median, self.min, self.max, self.percentiles.p95
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_samples() {
        let stats = LatencyStats::from_samples(&[]);
        assert_eq!(stats.count, 0);
        assert_eq!(stats.mean, 0.0);
    }

    #[test]
    fn test_latency_stats() {
        let stats = LatencyStats::from_samples(&[5.0, 1.0, 3.0, 2.0, 4.0]);

        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 5.0);
        assert_eq!(stats.mean, 3.0);
        assert_eq!(stats.median, 3.0);
        assert_eq!(stats.count, 5);
    }

    #[test]
    fn test_even_median() {
        let stats = LatencyStats::from_millis([1, 2, 3, 4]);
        assert_eq!(stats.median, 2.5);
    }

    #[test]
    fn test_nearest_rank_percentiles() {
        let data: Vec<f64> = (1..=100).map(|x| x as f64).collect();
        let p = Percentiles::from_sorted(&data);

        assert_eq!(p.p50, 51.0);
        assert_eq!(p.p95, 96.0);
        assert_eq!(p.p99, 100.0);
    }
}
