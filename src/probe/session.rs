//! Probe session
//!
//! Ties a runner to a render sink: run a probe, turn its outcome into
//! render updates, apply them.

use std::future::Future;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::{ProbeError, ProbeKind, ProbeRunner};
use crate::config::METRICS_MARKER;
use crate::http::Fetch;
use crate::output::{Region, RenderSink, RenderUpdate, ResultFormatter};

/// Re-runs the metrics probe while the dashboard is showing
#[derive(Clone, Debug)]
pub struct AutoRefresh {
    interval: Duration,
    marker: String,
}

impl AutoRefresh {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            marker: METRICS_MARKER.to_string(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Refresh only a stats region that has been populated once
    pub fn should_refresh(&self, stats_content: &str) -> bool {
        stats_content.contains(&self.marker)
    }
}

/// A runner, a sink, and the formatter between them
pub struct Session<F, S> {
    runner: ProbeRunner<F>,
    sink: S,
    formatter: ResultFormatter,
    refresh: AutoRefresh,
}

impl<F: Fetch, S: RenderSink> Session<F, S> {
    pub fn new(runner: ProbeRunner<F>, sink: S, formatter: ResultFormatter) -> Self {
        let refresh = AutoRefresh::new(Duration::from_millis(
            runner.settings().refresh_interval_ms,
        ));
        Self {
            runner,
            sink,
            formatter,
            refresh,
        }
    }

    pub fn runner(&self) -> &ProbeRunner<F> {
        &self.runner
    }

    #[cfg(test)]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn apply_all(&mut self, updates: impl IntoIterator<Item = RenderUpdate>) {
        for update in updates {
            self.sink.apply(update);
        }
    }

    /// Run one probe and render its outcome.
    ///
    /// The error is rendered before it is returned.
    pub async fn run(&mut self, kind: ProbeKind) -> Result<(), ProbeError> {
        if let Some(loading) = self.formatter.loading(kind) {
            self.sink.apply(loading);
        }

        let outcome = match kind {
            ProbeKind::Load => self.runner.load().await.map(|r| vec![self.formatter.load(&r)]),
            ProbeKind::Cache => self.runner.cache().await.map(|t| vec![self.formatter.cache(&t)]),
            ProbeKind::Concurrent => self
                .runner
                .concurrent()
                .await
                .map(|r| vec![self.formatter.concurrent(&r)]),
            ProbeKind::Metrics => self.runner.metrics().await.map(|m| self.formatter.metrics(&m)),
            ProbeKind::Stress => Ok(vec![self.formatter.stress(&self.runner.stress().await)]),
            ProbeKind::Warmup => Ok(vec![self.formatter.warmup(&self.runner.warmup().await)]),
            ProbeKind::Sweep => Ok(vec![self.formatter.sweep(&self.runner.sweep().await)]),
        };

        match outcome {
            Ok(updates) => {
                self.apply_all(updates);
                Ok(())
            }
            Err(e) => {
                warn!("{} probe failed: {}", kind, e);
                let update = self.formatter.error(kind, &e);
                self.sink.apply(update);
                Err(e)
            }
        }
    }

    /// Run every probe in order. Failures do not stop later probes.
    pub async fn run_suite(&mut self) -> Vec<(ProbeKind, Result<(), ProbeError>)> {
        let mut outcomes = Vec::new();
        for kind in ProbeKind::all() {
            let outcome = self.run(kind).await;
            outcomes.push((kind, outcome));
        }
        outcomes
    }

    /// One timer tick. Returns whether the metrics probe ran.
    pub async fn tick(&mut self) -> bool {
        if !self
            .refresh
            .should_refresh(self.sink.content(Region::PerformanceStats))
        {
            debug!("Metrics dashboard not shown, skipping refresh");
            return false;
        }

        // Failures are already rendered; the next tick runs regardless.
        let _ = self.run(ProbeKind::Metrics).await;
        true
    }

    /// Tick every refresh interval until `shutdown` resolves
    pub async fn watch(&mut self, shutdown: impl Future<Output = ()>) {
        let mut ticker = interval(self.refresh.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        info!(
            "Refreshing metrics every {}ms, Ctrl-C to stop",
            self.refresh.interval().as_millis()
        );

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Stopping metrics refresh");
                    break;
                }
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }
    }
}
