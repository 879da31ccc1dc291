//! Logging utilities
//!
//! Logs go to stderr so rendered regions on stdout stay clean.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Log level configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
}

impl LogLevel {
    pub fn to_tracing_level(self) -> Level {
        match self {
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
        }
    }

    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            LogLevel::Debug
        } else {
            LogLevel::Info
        }
    }
}

/// Build the filter: an explicit directive string wins over the level
pub fn build_filter(level: LogLevel, directives: Option<&str>) -> EnvFilter {
    match directives {
        Some(d) if !d.trim().is_empty() => EnvFilter::new(d),
        _ => EnvFilter::new(format!("webprobe={}", level.to_tracing_level())),
    }
}

/// Initialize the global subscriber
pub fn init_logger(level: LogLevel, directives: Option<&str>) {
    tracing_subscriber::fmt()
        .with_env_filter(build_filter(level, directives))
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
