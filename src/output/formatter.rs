//! Output formatters for probe results
//!
//! Turns probe results into [`RenderUpdate`]s in table, JSON or summary form.

use chrono::{Local, Utc};
use serde_json::{json, Map, Value};

use super::dashboard::{Region, RenderUpdate};
use crate::config::METRICS_MARKER;
use crate::models::{
    BatchReport, CacheTiming, CacheWarmup, ConcurrentResult, EndpointStats, MetricField,
    MetricsSnapshot, ProbeResult,
};
use crate::probe::{ProbeError, ProbeKind};

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

/// Dashboard cell width, excluding borders
const CELL: usize = 22;

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Summary,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "table" => Some(OutputFormat::Table),
            "json" => Some(OutputFormat::Json),
            "summary" => Some(OutputFormat::Summary),
            _ => None,
        }
    }
}

/// Result formatter
pub struct ResultFormatter {
    format: OutputFormat,
    colorize: bool,
    refresh_interval_ms: u64,
}

impl ResultFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: true,
            refresh_interval_ms: 30_000,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    pub fn with_refresh_interval(mut self, ms: u64) -> Self {
        self.refresh_interval_ms = ms;
        self
    }

    fn paint(&self, color: &str, text: impl AsRef<str>) -> String {
        if self.colorize {
            format!("{color}{}{RESET}", text.as_ref())
        } else {
            text.as_ref().to_string()
        }
    }

    fn json(region: Region, value: Value) -> RenderUpdate {
        RenderUpdate::new(region, serde_json::to_string(&value).unwrap_or_default())
    }

    /// Placeholder shown while a probe runs; table output only
    pub fn loading(&self, kind: ProbeKind) -> Option<RenderUpdate> {
        match self.format {
            OutputFormat::Table => Some(RenderUpdate::new(
                Region::TestResults,
                format!("⏳ {}", kind.loading_message()),
            )),
            OutputFormat::Json | OutputFormat::Summary => None,
        }
    }

    /// Format a load probe result
    pub fn load(&self, result: &ProbeResult) -> RenderUpdate {
        match self.format {
            OutputFormat::Table => {
                let mut out = String::from("✅ Load Test Complete!\n");
                out.push_str(&row("Requests", result.request_count));
                out.push_str(&row("Duration", format!("{}ms", result.duration_ms)));
                out.push_str(&row("Requests/second", result.requests_per_second()));
                out.push_str(&row(
                    "Average response time",
                    format!("{}ms", result.avg_response_ms()),
                ));
                if result.latency.count > 0 {
                    out.push_str(&row("Latency", result.latency.format_summary()));
                }
                out.push_str(&self.paint(GREEN, "All requests handled successfully!"));
                RenderUpdate::new(Region::TestResults, out)
            }
            OutputFormat::Json => Self::json(
                Region::TestResults,
                json!({
                    "title": "Load Test Complete",
                    "probe": ProbeKind::Load.name(),
                    "path": result.path,
                    "requests": result.request_count,
                    "duration_ms": result.duration_ms,
                    "requests_per_second": result.requests_per_second(),
                    "avg_response_ms": result.avg_response_ms(),
                    "latency": result.latency,
                }),
            ),
            OutputFormat::Summary => RenderUpdate::new(
                Region::TestResults,
                format!(
                    "Load: {} requests to {} in {}ms ({} req/s, avg {}ms)",
                    result.request_count,
                    result.path,
                    result.duration_ms,
                    result.requests_per_second(),
                    result.avg_response_ms()
                ),
            ),
        }
    }

    /// Format a cache probe result
    pub fn cache(&self, timing: &CacheTiming) -> RenderUpdate {
        let speedup = timing.speedup_percent();
        match self.format {
            OutputFormat::Table => {
                let mut out = format!("💾 Cache Test Results ({})\n", timing.path);
                out.push_str(&row("First request", format!("{}ms (cache miss)", timing.first_ms)));
                out.push_str(&row("Second request", format!("{}ms (cache hit)", timing.second_ms)));
                out.push_str(&row("Third request", format!("{}ms (cache hit)", timing.third_ms)));
                out.push_str(&row(
                    "Cache speedup",
                    format!("{speedup}% faster on cache hits"),
                ));
                RenderUpdate::new(Region::TestResults, out.trim_end().to_string())
            }
            OutputFormat::Json => Self::json(
                Region::TestResults,
                json!({
                    "title": "Cache Test Results",
                    "probe": ProbeKind::Cache.name(),
                    "path": timing.path,
                    "timings_ms": timing.timings(),
                    "speedup_percent": speedup,
                }),
            ),
            OutputFormat::Summary => RenderUpdate::new(
                Region::TestResults,
                format!(
                    "Cache: {}ms / {}ms / {}ms on {} (speedup {}%)",
                    timing.first_ms, timing.second_ms, timing.third_ms, timing.path, speedup
                ),
            ),
        }
    }

    /// Format a concurrent probe result
    pub fn concurrent(&self, result: &ConcurrentResult) -> RenderUpdate {
        match self.format {
            OutputFormat::Table => {
                let mut out = String::from("🧵 Concurrent Test Results\n");
                out.push_str(&row("Total requests", result.total));
                out.push_str(&row("Successful", result.success_count));
                let errors = if result.error_count > 0 {
                    self.paint(RED, result.error_count.to_string())
                } else {
                    result.error_count.to_string()
                };
                out.push_str(&row("Errors", errors));
                out.push_str(&row("Duration", format!("{}ms", result.duration_ms)));
                out.push_str(&row("Throughput", format!("{} req/s", result.throughput())));
                out.push_str(&endpoint_lines(&result.endpoints));
                RenderUpdate::new(Region::TestResults, out.trim_end().to_string())
            }
            OutputFormat::Json => Self::json(
                Region::TestResults,
                json!({
                    "title": "Concurrent Test Results",
                    "probe": ProbeKind::Concurrent.name(),
                    "total": result.total,
                    "successful": result.success_count,
                    "errors": result.error_count,
                    "duration_ms": result.duration_ms,
                    "throughput": result.throughput(),
                    "endpoints": result.endpoints,
                }),
            ),
            OutputFormat::Summary => RenderUpdate::new(
                Region::TestResults,
                format!(
                    "Concurrent: {}/{} ok, {} errors in {}ms ({} req/s)",
                    result.success_count,
                    result.total,
                    result.error_count,
                    result.duration_ms,
                    result.throughput()
                ),
            ),
        }
    }

    /// Format a stress batch with its endpoint breakdown and first failures
    pub fn stress(&self, report: &BatchReport) -> RenderUpdate {
        match self.format {
            OutputFormat::Table => {
                let mut out = format!(
                    "🔥 Stress Test Results ({} requests, {} in flight)\n",
                    report.total, report.in_flight
                );
                out.push_str(&row("Total requests", report.total));
                out.push_str(&row("Successful", report.success_count));
                let failed = if report.error_count > 0 {
                    self.paint(RED, report.error_count.to_string())
                } else {
                    report.error_count.to_string()
                };
                out.push_str(&row("Failed", failed));
                out.push_str(&row("Success rate", format!("{:.1}%", report.success_rate())));
                out.push_str(&row("Duration", format!("{:.2}ms", report.duration_ms)));
                out.push_str(&row("Requests/second", report.throughput()));
                if report.latency.count > 0 {
                    out.push_str(&row("Latency", report.latency.format_summary()));
                }
                out.push_str(&endpoint_lines(&report.endpoints));
                if !report.failures.is_empty() {
                    out.push_str("  Failed requests:\n");
                    for failure in report.first_failures() {
                        out.push_str(&format!(
                            "    Request {} ({}): {}\n",
                            failure.id,
                            failure.path,
                            self.paint(RED, failure.failure_message())
                        ));
                    }
                }
                RenderUpdate::new(Region::TestResults, out.trim_end().to_string())
            }
            OutputFormat::Json => {
                let failures: Vec<Value> = report
                    .first_failures()
                    .iter()
                    .map(|f| {
                        json!({
                            "id": f.id,
                            "path": f.path,
                            "status_code": f.status_code,
                            "error": f.failure_message(),
                        })
                    })
                    .collect();
                Self::json(
                    Region::TestResults,
                    json!({
                        "title": "Stress Test Results",
                        "probe": ProbeKind::Stress.name(),
                        "total": report.total,
                        "in_flight": report.in_flight,
                        "successful": report.success_count,
                        "failed": report.error_count,
                        "duration_ms": report.duration_ms,
                        "requests_per_second": report.throughput(),
                        "latency": report.latency,
                        "endpoints": report.endpoints,
                        "failures": failures,
                    }),
                )
            }
            OutputFormat::Summary => RenderUpdate::new(
                Region::TestResults,
                format!(
                    "Stress: {}/{} ok, {} failed in {:.2}ms ({} req/s, {} in flight)",
                    report.success_count,
                    report.total,
                    report.error_count,
                    report.duration_ms,
                    report.throughput(),
                    report.in_flight
                ),
            ),
        }
    }

    /// Format a warmup run: the first request against the average of the rest
    pub fn warmup(&self, warmup: &CacheWarmup) -> RenderUpdate {
        let comparison = warmup.first_ms().zip(warmup.cached_average_ms());
        match self.format {
            OutputFormat::Table => {
                let mut out = format!("🧪 Cache Warmup Results ({})\n", warmup.path);
                for (i, ms) in warmup.timings_ms.iter().enumerate() {
                    out.push_str(&row(&format!("Request {}", i + 1), format!("{ms:.2}ms")));
                }
                match (comparison, warmup.speedup_percent()) {
                    (Some((first, cached)), speedup) => {
                        out.push_str(&row("First (cache miss)", format!("{first:.2}ms")));
                        out.push_str(&row("Cached average", format!("{cached:.2}ms")));
                        if let Some(speedup) = speedup {
                            out.push_str(&row("Cache speedup", format!("{speedup:.1}%")));
                        }
                    }
                    (None, _) => out.push_str(&self.paint(
                        RED,
                        format!(
                            "  Only {} of {} requests succeeded; nothing to compare",
                            warmup.timings_ms.len(),
                            warmup.requested
                        ),
                    )),
                }
                RenderUpdate::new(Region::TestResults, out.trim_end().to_string())
            }
            OutputFormat::Json => Self::json(
                Region::TestResults,
                json!({
                    "title": "Cache Warmup Results",
                    "probe": ProbeKind::Warmup.name(),
                    "path": warmup.path,
                    "requested": warmup.requested,
                    "timings_ms": warmup.timings_ms,
                    "cached_average_ms": warmup.cached_average_ms(),
                    "speedup_percent": warmup.speedup_percent(),
                }),
            ),
            OutputFormat::Summary => {
                let detail = match (comparison, warmup.speedup_percent()) {
                    (Some((first, cached)), Some(speedup)) => format!(
                        "first {first:.2}ms, cached avg {cached:.2}ms (speedup {speedup:.1}%)"
                    ),
                    (Some((first, cached)), None) => {
                        format!("first {first:.2}ms, cached avg {cached:.2}ms")
                    }
                    (None, _) => format!(
                        "{} of {} requests succeeded",
                        warmup.timings_ms.len(),
                        warmup.requested
                    ),
                };
                RenderUpdate::new(
                    Region::TestResults,
                    format!("Warmup: {} on {}", detail, warmup.path),
                )
            }
        }
    }

    /// Format one line per sweep level
    pub fn sweep(&self, reports: &[BatchReport]) -> RenderUpdate {
        match self.format {
            OutputFormat::Table => {
                let mut out = String::from("📶 Concurrency Sweep\n");
                out.push_str(&format!(
                    "  {:>6}  {:>12}  {:>9}  {:>10}\n",
                    "Level", "Duration", "OK", "Throughput"
                ));
                for report in reports {
                    let ok = format!("{}/{}", report.success_count, report.total);
                    let ok = if report.error_count > 0 {
                        self.paint(RED, format!("{ok:>9}"))
                    } else {
                        format!("{ok:>9}")
                    };
                    out.push_str(&format!(
                        "  {:>6}  {:>10.2}ms  {}  {:>6} req/s\n",
                        report.in_flight,
                        report.duration_ms,
                        ok,
                        report.throughput().to_string()
                    ));
                }
                RenderUpdate::new(Region::TestResults, out.trim_end().to_string())
            }
            OutputFormat::Json => {
                let levels: Vec<Value> = reports
                    .iter()
                    .map(|r| {
                        json!({
                            "concurrency": r.in_flight,
                            "duration_ms": r.duration_ms,
                            "successful": r.success_count,
                            "total": r.total,
                            "throughput": r.throughput(),
                        })
                    })
                    .collect();
                Self::json(
                    Region::TestResults,
                    json!({
                        "title": "Concurrency Sweep",
                        "probe": ProbeKind::Sweep.name(),
                        "levels": levels,
                    }),
                )
            }
            OutputFormat::Summary => {
                let levels: Vec<String> = reports
                    .iter()
                    .map(|r| {
                        format!(
                            "{}: {}/{} ok, {} req/s",
                            r.in_flight,
                            r.success_count,
                            r.total,
                            r.throughput()
                        )
                    })
                    .collect();
                RenderUpdate::new(Region::TestResults, format!("Sweep: {}", levels.join("; ")))
            }
        }
    }

    /// Dashboard for `performance-stats` plus a confirmation for `test-results`
    pub fn metrics(&self, snapshot: &MetricsSnapshot) -> Vec<RenderUpdate> {
        match self.format {
            OutputFormat::Table => vec![
                RenderUpdate::new(Region::PerformanceStats, self.metrics_grid(snapshot)),
                RenderUpdate::new(
                    Region::TestResults,
                    format!(
                        "📈 Metrics Retrieved Successfully!\n  Live server performance data displayed above.\n{}",
                        self.paint(GREEN, "Real-time monitoring is active.")
                    ),
                ),
            ],
            OutputFormat::Json => {
                let metrics: Map<String, Value> = MetricField::all()
                    .iter()
                    .map(|field| {
                        let key = serde_json::to_value(field)
                            .ok()
                            .and_then(|v| v.as_str().map(str::to_string))
                            .unwrap_or_default();
                        (key, Value::String(snapshot.display(*field).to_string()))
                    })
                    .collect();
                vec![
                    Self::json(
                        Region::PerformanceStats,
                        json!({
                            "title": METRICS_MARKER,
                            "updated_at": Utc::now().to_rfc3339(),
                            "refresh_interval_ms": self.refresh_interval_ms,
                            "metrics": metrics,
                        }),
                    ),
                    Self::json(
                        Region::TestResults,
                        json!({
                            "title": "Metrics Retrieved Successfully",
                            "probe": ProbeKind::Metrics.name(),
                        }),
                    ),
                ]
            }
            OutputFormat::Summary => {
                let fields: Vec<String> = MetricField::all()
                    .iter()
                    .map(|f| format!("{}={}{}", f.title(), snapshot.display(*f), f.unit()))
                    .collect();
                vec![
                    RenderUpdate::new(
                        Region::PerformanceStats,
                        format!("{METRICS_MARKER}: {}", fields.join(", ")),
                    ),
                    RenderUpdate::new(Region::TestResults, "Metrics retrieved"),
                ]
            }
        }
    }

    fn metrics_grid(&self, snapshot: &MetricsSnapshot) -> String {
        let bar = "─".repeat(CELL + 2);
        let border = |left: &str, mid: &str, right: &str| format!("{left}{bar}{mid}{bar}{mid}{bar}{right}\n");

        let mut out = format!("📊 {METRICS_MARKER}\n");
        out.push_str(&border("┌", "┬", "┐"));
        for (i, fields) in MetricField::all().chunks(3).enumerate() {
            if i > 0 {
                out.push_str(&border("├", "┼", "┤"));
            }
            let titles: Vec<String> = fields.iter().map(|f| format!(" {:<width$} ", f.title(), width = CELL)).collect();
            let values: Vec<String> = fields
                .iter()
                .map(|f| {
                    let value = format!(
                        "{:<width$}",
                        format!("{}{}", snapshot.display(*f), f.unit()),
                        width = CELL
                    );
                    format!(" {} ", self.paint(f.color(), value))
                })
                .collect();
            out.push_str(&format!("│{}│\n", titles.join("│")));
            out.push_str(&format!("│{}│\n", values.join("│")));
        }
        out.push_str(&border("└", "┴", "┘"));
        out.push_str(&self.paint(
            DIM,
            format!(
                "Metrics update every {} seconds automatically (last update {})",
                self.refresh_interval_ms / 1000,
                Local::now().format("%H:%M:%S")
            ),
        ));
        out
    }

    /// Inline error replacing the `test-results` region
    pub fn error(&self, kind: ProbeKind, error: &ProbeError) -> RenderUpdate {
        match self.format {
            OutputFormat::Table | OutputFormat::Summary => RenderUpdate::new(
                Region::TestResults,
                self.paint(RED, format!("{}: {}", kind.error_prefix(), error)),
            ),
            OutputFormat::Json => Self::json(
                Region::TestResults,
                json!({
                    "title": kind.error_prefix(),
                    "probe": kind.name(),
                    "error": error.to_string(),
                }),
            ),
        }
    }
}

fn row(label: &str, value: impl std::fmt::Display) -> String {
    format!("  {:<24}{}\n", format!("{label}:"), value)
}

fn endpoint_lines(endpoints: &[EndpointStats]) -> String {
    let mut out = String::from("  Endpoints:\n");
    for endpoint in endpoints {
        out.push_str(&format!(
            "    {:<18}{:>3}/{:<3} ({:5.1}%) {:>8.2}ms avg\n",
            endpoint.path,
            endpoint.success,
            endpoint.total,
            endpoint.success_rate(),
            endpoint.avg_latency_ms
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpError;
    use crate::models::{LatencyStats, RequestOutcome};

    fn plain(format: OutputFormat) -> ResultFormatter {
        ResultFormatter::new(format).no_color()
    }

    fn load_result() -> ProbeResult {
        ProbeResult {
            path: "/".to_string(),
            request_count: 100,
            duration_ms: 250,
            success_count: 100,
            error_count: 0,
            latency: LatencyStats::default(),
        }
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("summary"), Some(OutputFormat::Summary));
        assert_eq!(OutputFormat::from_str("csv"), None);
    }

    #[test]
    fn test_load_table() {
        let update = plain(OutputFormat::Table).load(&load_result());
        assert_eq!(update.region, Region::TestResults);
        assert!(update.content.contains("Load Test Complete"));
        assert!(update.content.contains("Requests/second:        400"));
        assert!(update.content.contains("Average response time:  3ms"));
    }

    #[test]
    fn test_load_json() {
        let update = plain(OutputFormat::Json).load(&load_result());
        let value: Value = serde_json::from_str(&update.content).unwrap();
        assert_eq!(value["requests_per_second"], 400);
        assert_eq!(value["avg_response_ms"], 3);
    }

    #[test]
    fn test_cache_negative_speedup_rendered_as_is() {
        let timing = CacheTiming {
            path: "/style.css".to_string(),
            first_ms: 4,
            second_ms: 10,
            third_ms: 3,
        };
        let update = plain(OutputFormat::Table).cache(&timing);
        assert!(update.content.contains("-150% faster on cache hits"));
        assert!(update.content.contains("4ms (cache miss)"));
    }

    #[test]
    fn test_concurrent_summary() {
        let result = ConcurrentResult {
            total: 50,
            duration_ms: 100,
            success_count: 40,
            error_count: 10,
            endpoints: Vec::new(),
        };
        let update = plain(OutputFormat::Summary).concurrent(&result);
        assert_eq!(update.content, "Concurrent: 40/50 ok, 10 errors in 100ms (500 req/s)");
    }

    #[test]
    fn test_metrics_dashboard_has_marker_in_every_format() {
        let mut snapshot = MetricsSnapshot::default();
        snapshot.set(MetricField::TotalRequests, "7");

        for format in [OutputFormat::Table, OutputFormat::Json, OutputFormat::Summary] {
            let updates = plain(format).metrics(&snapshot);
            let stats = updates
                .iter()
                .find(|u| u.region == Region::PerformanceStats)
                .unwrap();
            assert!(stats.content.contains(METRICS_MARKER), "{format:?}");
        }
    }

    #[test]
    fn test_metrics_json_defaults_to_zero() {
        let mut snapshot = MetricsSnapshot::default();
        snapshot.set(MetricField::CacheHitRate, "83.5");

        let updates = plain(OutputFormat::Json).metrics(&snapshot);
        let value: Value = serde_json::from_str(&updates[0].content).unwrap();
        assert_eq!(value["metrics"]["cache_hit_rate"], "83.5");
        assert_eq!(value["metrics"]["cache_size"], "0");
    }

    #[test]
    fn test_error_render() {
        let err = ProbeError::Network(HttpError::Timeout(30));
        let update = plain(OutputFormat::Table).error(ProbeKind::Metrics, &err);
        assert_eq!(update.region, Region::TestResults);
        assert_eq!(update.content, "Error fetching metrics: Timeout after 30 seconds");

        let update = plain(OutputFormat::Table).error(ProbeKind::Load, &err);
        assert!(update.content.starts_with("Error: "));
    }

    fn stress_report(failures: usize) -> BatchReport {
        BatchReport {
            in_flight: 10,
            total: 50,
            duration_ms: 125.0,
            success_count: 50 - failures as u64,
            error_count: failures as u64,
            latency: LatencyStats::default(),
            endpoints: Vec::new(),
            failures: (0..failures)
                .map(|id| RequestOutcome {
                    id,
                    path: "/about.html".to_string(),
                    status_code: Some(503),
                    latency_ms: 1.0,
                    error: None,
                })
                .collect(),
        }
    }

    #[test]
    fn test_stress_table_lists_first_failures() {
        let update = plain(OutputFormat::Table).stress(&stress_report(7));
        assert!(update.content.contains("Requests/second:        400"));
        assert!(update.content.contains("Success rate:           86.0%"));
        assert!(update.content.contains("Request 0 (/about.html): HTTP 503"));
        assert!(update.content.contains("Request 4 (/about.html): HTTP 503"));
        assert!(!update.content.contains("Request 5 "));
    }

    #[test]
    fn test_stress_without_failures_has_no_listing() {
        let update = plain(OutputFormat::Table).stress(&stress_report(0));
        assert!(!update.content.contains("Failed requests"));

        let update = plain(OutputFormat::Json).stress(&stress_report(2));
        let value: Value = serde_json::from_str(&update.content).unwrap();
        assert_eq!(value["failures"][1]["error"], "HTTP 503");
    }

    #[test]
    fn test_warmup_render() {
        let warmup = CacheWarmup {
            path: "/style.css".to_string(),
            requested: 3,
            timings_ms: vec![8.0, 2.0, 2.0],
        };
        let update = plain(OutputFormat::Summary).warmup(&warmup);
        assert_eq!(
            update.content,
            "Warmup: first 8.00ms, cached avg 2.00ms (speedup 75.0%) on /style.css"
        );

        let empty = CacheWarmup {
            timings_ms: Vec::new(),
            ..warmup
        };
        let update = plain(OutputFormat::Table).warmup(&empty);
        assert!(update.content.contains("Only 0 of 3 requests succeeded"));
    }

    #[test]
    fn test_sweep_summary() {
        let mut fast = stress_report(0);
        fast.in_flight = 5;
        fast.total = 5;
        fast.success_count = 5;
        fast.duration_ms = 10.0;

        let update = plain(OutputFormat::Summary).sweep(&[fast, stress_report(1)]);
        assert_eq!(
            update.content,
            "Sweep: 5: 5/5 ok, 500 req/s; 10: 49/50 ok, 400 req/s"
        );
    }

    #[test]
    fn test_loading_only_in_table() {
        assert!(plain(OutputFormat::Table).loading(ProbeKind::Cache).is_some());
        assert!(plain(OutputFormat::Json).loading(ProbeKind::Cache).is_none());
    }
}
