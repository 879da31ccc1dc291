//! Probe execution
//!
//! Batches are joined futures inside the calling task, with no thread pool
//! and no ordering between them. The dashboard probes put every request in
//! flight at once; the capped batches keep at most `in_flight` outstanding.
//!
//! The cache and concurrent probes time a request up to its headers; the
//! body is never read.

use futures::future::try_join_all;
use futures::stream::{self, StreamExt};
use tracing::{debug, info};

use super::scrape::scrape_metrics;
use super::ProbeError;
use crate::config::ProbeSettings;
use crate::http::Fetch;
use crate::models::{
    BatchReport, CacheTiming, CacheWarmup, ConcurrentResult, MetricsSnapshot, ProbeResult,
    RequestOutcome,
};
use crate::utils::Timer;

/// Runs probes against one fetcher
pub struct ProbeRunner<F> {
    fetcher: F,
    settings: ProbeSettings,
}

impl<F: Fetch> ProbeRunner<F> {
    pub fn new(fetcher: F, settings: ProbeSettings) -> Self {
        Self { fetcher, settings }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn settings(&self) -> &ProbeSettings {
        &self.settings
    }

    /// Fire `load_requests` GETs at `load_path` at once and wait for all.
    ///
    /// The first failure aborts the batch.
    pub async fn load(&self) -> Result<ProbeResult, ProbeError> {
        let path = self.settings.load_path.as_str();
        let count = self.settings.load_requests;
        info!("Load probe: {} concurrent requests to {}", count, path);

        let timer = Timer::start("load probe");
        let responses = try_join_all((0..count).map(|_| self.fetcher.get(path))).await?;
        let duration_ms = timer.stop();

        Ok(ProbeResult::from_batch(path, &responses, duration_ms))
    }

    /// Three strictly sequential GETs to `cache_path`
    pub async fn cache(&self) -> Result<CacheTiming, ProbeError> {
        let path = self.settings.cache_path.as_str();
        info!("Cache probe: 3 sequential requests to {}", path);

        let mut timings = [0u64; 3];
        for (i, slot) in timings.iter_mut().enumerate() {
            let timer = Timer::start(format!("cache request {}", i + 1));
            self.fetcher.get_headers(path).await?;
            *slot = timer.stop();
        }

        let [first_ms, second_ms, third_ms] = timings;
        Ok(CacheTiming {
            path: path.to_string(),
            first_ms,
            second_ms,
            third_ms,
        })
    }

    /// Request `i` goes to `concurrent_paths[i % len]`; all fired at once.
    ///
    /// Non-200 responses count as errors. A rejected request aborts the batch.
    pub async fn concurrent(&self) -> Result<ConcurrentResult, ProbeError> {
        let paths = &self.settings.concurrent_paths;
        let count = self.settings.concurrent_requests;
        info!(
            "Concurrent probe: {} requests across {} paths",
            count,
            paths.len()
        );

        let timer = Timer::start("concurrent probe");
        let batch = paths
            .iter()
            .cycle()
            .take(count)
            .map(|path| self.fetcher.get_headers(path));
        let responses = try_join_all(batch).await?;
        let duration_ms = timer.stop();

        let result = ConcurrentResult::classify(paths, &responses, duration_ms);
        debug!(
            "Concurrent probe: {} ok, {} errors",
            result.success_count, result.error_count
        );
        Ok(result)
    }

    /// GET the metrics page and scrape it
    pub async fn metrics(&self) -> Result<MetricsSnapshot, ProbeError> {
        let path = self.settings.metrics_path.as_str();
        debug!("Metrics probe: fetching {}", path);

        let response = self.fetcher.get(path).await?;
        scrape_metrics(&response.body)
    }

    /// `count` requests cycling through `concurrent_paths`, at most
    /// `in_flight` outstanding at once.
    ///
    /// Every request runs to completion; a rejected one is recorded as a
    /// failure with its message.
    pub async fn capped_batch(&self, count: usize, in_flight: usize) -> BatchReport {
        let paths = &self.settings.concurrent_paths;
        debug!(
            "Batch of {} requests across {} paths, {} in flight",
            count,
            paths.len(),
            in_flight
        );

        let timer = Timer::start(format!("batch of {count}"));
        let mut completed = 0;
        let targets = paths.iter().cycle().take(count).enumerate();
        let outcomes: Vec<RequestOutcome> = stream::iter(targets)
            .map(|(id, path)| async move {
                let request = Timer::start(path.as_str());
                let result = self.fetcher.get(path).await;
                RequestOutcome::new(id, path, result, request.elapsed_ms_f64())
            })
            .buffer_unordered(in_flight.max(1))
            .inspect(|_| {
                completed += 1;
                if completed % 10 == 0 || completed == count {
                    debug!("Progress: {}/{} requests completed", completed, count);
                }
            })
            .collect()
            .await;
        let duration_ms = timer.elapsed_ms_f64();

        BatchReport::from_outcomes(paths, in_flight, outcomes, duration_ms)
    }

    /// The stress batch: `stress_requests` with `stress_in_flight` outstanding
    pub async fn stress(&self) -> BatchReport {
        let count = self.settings.stress_requests;
        let in_flight = self.settings.stress_in_flight;
        info!("Stress: {} requests, {} in flight", count, in_flight);

        self.capped_batch(count, in_flight).await
    }

    /// One batch per sweep level, each level's requests all in flight at once
    pub async fn sweep(&self) -> Vec<BatchReport> {
        let mut reports = Vec::with_capacity(self.settings.sweep_levels.len());
        for &level in &self.settings.sweep_levels {
            info!("Sweep: {} concurrent requests", level);
            reports.push(self.capped_batch(level, level).await);
        }
        reports
    }

    /// `warmup_samples` strictly sequential GETs to `cache_path`.
    ///
    /// Only 200 responses are timed; failures shrink the sample.
    pub async fn warmup(&self) -> CacheWarmup {
        let path = self.settings.cache_path.as_str();
        let requested = self.settings.warmup_samples;
        info!("Warmup: {} sequential requests to {}", requested, path);

        let mut timings_ms = Vec::with_capacity(requested);
        for i in 0..requested {
            let timer = Timer::start(format!("warmup request {}", i + 1));
            match self.fetcher.get(path).await {
                Ok(response) if response.is_ok() => timings_ms.push(timer.elapsed_ms_f64()),
                Ok(response) => debug!("Warmup request {}: HTTP {}", i + 1, response.status_code),
                Err(e) => debug!("Warmup request {}: {}", i + 1, e),
            }
        }

        CacheWarmup {
            path: path.to_string(),
            requested,
            timings_ms,
        }
    }
}
