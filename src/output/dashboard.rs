//! Render regions and sinks
//!
//! Probes never write output directly. The formatter produces
//! [`RenderUpdate`]s and a [`RenderSink`] applies them.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::io::Write;

/// The two output regions of the dashboard
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Region {
    #[serde(rename = "test-results")]
    TestResults,
    #[serde(rename = "performance-stats")]
    PerformanceStats,
}

impl Region {
    pub fn id(&self) -> &'static str {
        match self {
            Region::TestResults => "test-results",
            Region::PerformanceStats => "performance-stats",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Replace the whole content of one region
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderUpdate {
    pub region: Region,
    pub content: String,
}

impl RenderUpdate {
    pub fn new(region: Region, content: impl Into<String>) -> Self {
        Self {
            region,
            content: content.into(),
        }
    }
}

/// Render target. Last write to a region wins.
pub trait RenderSink {
    fn apply(&mut self, update: RenderUpdate);

    /// Current content of `region`, empty if never written
    fn content(&self, region: Region) -> &str;
}

/// Region store that optionally echoes every update to a writer
pub struct Dashboard {
    regions: HashMap<Region, String>,
    echo: Option<Box<dyn Write + Send>>,
}

impl Dashboard {
    /// Keep content in memory only
    pub fn new() -> Self {
        Self {
            regions: HashMap::new(),
            echo: None,
        }
    }

    /// Echo every update to stdout
    pub fn stdout() -> Self {
        Self {
            regions: HashMap::new(),
            echo: Some(Box::new(std::io::stdout())),
        }
    }
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderSink for Dashboard {
    fn apply(&mut self, update: RenderUpdate) {
        if let Some(out) = self.echo.as_mut() {
            if let Err(e) = writeln!(out, "{}", update.content).and_then(|_| out.flush()) {
                tracing::warn!("Failed to write {} region: {}", update.region, e);
            }
        }
        self.regions.insert(update.region, update.content);
    }

    fn content(&self, region: Region) -> &str {
        self.regions.get(&region).map(String::as_str).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_write_wins() {
        let mut dashboard = Dashboard::new();
        assert_eq!(dashboard.content(Region::TestResults), "");

        dashboard.apply(RenderUpdate::new(Region::TestResults, "first"));
        dashboard.apply(RenderUpdate::new(Region::TestResults, "second"));
        dashboard.apply(RenderUpdate::new(Region::PerformanceStats, "stats"));

        assert_eq!(dashboard.content(Region::TestResults), "second");
        assert_eq!(dashboard.content(Region::PerformanceStats), "stats");
    }

    #[test]
    fn test_region_ids() {
        assert_eq!(Region::TestResults.to_string(), "test-results");
        assert_eq!(
            serde_json::to_string(&Region::PerformanceStats).unwrap(),
            "\"performance-stats\""
        );
    }
}
