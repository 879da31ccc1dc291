//! Server-side metrics as scraped from the metrics page

use serde::Serialize;

/// How a field's numeric token is matched
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// Digits only
    Integer,
    /// Digits and dots
    Decimal,
}

/// The six fields shown on the metrics dashboard
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricField {
    TotalRequests,
    CacheHits,
    CacheMisses,
    CacheHitRate,
    AvgResponseTime,
    CacheSize,
}

impl MetricField {
    /// Fields in label priority order
    pub fn all() -> [MetricField; 6] {
        [
            MetricField::TotalRequests,
            MetricField::CacheHits,
            MetricField::CacheMisses,
            MetricField::CacheHitRate,
            MetricField::AvgResponseTime,
            MetricField::CacheSize,
        ]
    }

    /// Label searched for in the paragraph text
    pub fn label(&self) -> &'static str {
        match self {
            MetricField::TotalRequests => "Total Requests:",
            MetricField::CacheHits => "Cache Hits:",
            MetricField::CacheMisses => "Cache Misses:",
            MetricField::CacheHitRate => "Cache Hit Rate:",
            MetricField::AvgResponseTime => "Average Response Time:",
            MetricField::CacheSize => "Cache Size:",
        }
    }

    /// Heading shown on the dashboard
    pub fn title(&self) -> &'static str {
        match self {
            MetricField::TotalRequests => "Total Requests",
            MetricField::CacheHits => "Cache Hits",
            MetricField::CacheMisses => "Cache Misses",
            MetricField::CacheHitRate => "Cache Hit Rate",
            MetricField::AvgResponseTime => "Avg Response Time",
            MetricField::CacheSize => "Cache Size",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            MetricField::CacheHitRate => "%",
            MetricField::AvgResponseTime => "ms",
            _ => "",
        }
    }

    pub fn token_kind(&self) -> TokenKind {
        match self {
            MetricField::CacheHitRate | MetricField::AvgResponseTime => TokenKind::Decimal,
            _ => TokenKind::Integer,
        }
    }

    /// ANSI color used for the value on the dashboard
    pub fn color(&self) -> &'static str {
        match self {
            MetricField::TotalRequests | MetricField::CacheSize => "\x1b[34m",
            MetricField::CacheHits => "\x1b[32m",
            MetricField::CacheMisses => "\x1b[31m",
            MetricField::CacheHitRate => "\x1b[33m",
            MetricField::AvgResponseTime => "\x1b[35m",
        }
    }
}

/// Most recent scrape of the metrics page.
///
/// Values are kept as the raw numeric tokens.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: Option<String>,
    pub cache_hits: Option<String>,
    pub cache_misses: Option<String>,
    pub cache_hit_rate: Option<String>,
    pub avg_response_time: Option<String>,
    pub cache_size: Option<String>,
}

impl MetricsSnapshot {
    fn slot(&mut self, field: MetricField) -> &mut Option<String> {
        match field {
            MetricField::TotalRequests => &mut self.total_requests,
            MetricField::CacheHits => &mut self.cache_hits,
            MetricField::CacheMisses => &mut self.cache_misses,
            MetricField::CacheHitRate => &mut self.cache_hit_rate,
            MetricField::AvgResponseTime => &mut self.avg_response_time,
            MetricField::CacheSize => &mut self.cache_size,
        }
    }

    pub fn get(&self, field: MetricField) -> Option<&str> {
        let value = match field {
            MetricField::TotalRequests => &self.total_requests,
            MetricField::CacheHits => &self.cache_hits,
            MetricField::CacheMisses => &self.cache_misses,
            MetricField::CacheHitRate => &self.cache_hit_rate,
            MetricField::AvgResponseTime => &self.avg_response_time,
            MetricField::CacheSize => &self.cache_size,
        };
        value.as_deref()
    }

    /// Overwrites any earlier value for `field`
    pub fn set(&mut self, field: MetricField, value: impl Into<String>) {
        *self.slot(field) = Some(value.into());
    }

    /// Value as rendered, `"0"` when the field was never seen
    pub fn display(&self, field: MetricField) -> &str {
        match self.get(field) {
            Some(v) if !v.is_empty() => v,
            _ => "0",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_defaults_to_zero() {
        let mut snapshot = MetricsSnapshot::default();
        snapshot.set(MetricField::TotalRequests, "42");

        assert_eq!(snapshot.display(MetricField::TotalRequests), "42");
        for field in &MetricField::all()[1..] {
            assert_eq!(snapshot.display(*field), "0");
        }
    }

    #[test]
    fn test_set_overwrites() {
        let mut snapshot = MetricsSnapshot::default();
        snapshot.set(MetricField::CacheSize, "3");
        snapshot.set(MetricField::CacheSize, "9");
        assert_eq!(snapshot.get(MetricField::CacheSize), Some("9"));
    }

    #[test]
    fn test_label_order() {
        let labels: Vec<_> = MetricField::all().iter().map(|f| f.label()).collect();
        assert_eq!(labels[0], "Total Requests:");
        assert_eq!(labels[3], "Cache Hit Rate:");
        assert_eq!(MetricField::CacheHitRate.token_kind(), TokenKind::Decimal);
        assert_eq!(MetricField::CacheHits.token_kind(), TokenKind::Integer);
    }
}
