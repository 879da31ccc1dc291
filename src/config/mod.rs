//! Configuration module
//!
//! Handles loading and managing configuration. Values are layered as
//! defaults, then config file, then `WEBPROBE_*` environment, then CLI flags.

mod env;
mod file;

pub use env::{print_env_help, EnvConfig};
#[cfg(test)]
pub(crate) use env::EnvGuard;
pub use file::{find_config, is_yaml_file};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::cli::{Args, Command};

/// Paths hit by the concurrent probe, cycled in this order
pub const DEFAULT_CONCURRENT_PATHS: [&str; 5] =
    ["/", "/style.css", "/script.js", "/about.html", "/api/data.json"];

/// Concurrency levels of the sweep, each run as one fully parallel batch
pub const DEFAULT_SWEEP_LEVELS: [usize; 4] = [5, 10, 20, 50];

/// Marker the auto-refresh guard looks for in the stats region
pub const METRICS_MARKER: &str = "Live Server Metrics";

/// Application configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Origin of the server under test
    pub base_url: String,

    /// HTTP timeout in seconds
    pub timeout_secs: u64,

    /// Output format (table, json, summary)
    pub format: String,

    /// ANSI colors in table output
    pub color: bool,

    /// Probe targets and batch sizes
    pub probes: ProbeSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_secs: 30,
            format: "table".to_string(),
            color: true,
            probes: ProbeSettings::default(),
        }
    }
}

/// Probe targets and batch sizes
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeSettings {
    pub load_path: String,
    pub load_requests: usize,
    pub cache_path: String,
    pub concurrent_paths: Vec<String>,
    pub concurrent_requests: usize,
    pub metrics_path: String,
    pub refresh_interval_ms: u64,
    /// Requests in the stress batch, cycled over `concurrent_paths`
    pub stress_requests: usize,
    /// Cap on stress requests outstanding at once
    pub stress_in_flight: usize,
    pub sweep_levels: Vec<usize>,
    /// Sequential requests to `cache_path` in the warmup run
    pub warmup_samples: usize,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            load_path: "/".to_string(),
            load_requests: 100,
            cache_path: "/style.css".to_string(),
            concurrent_paths: DEFAULT_CONCURRENT_PATHS.iter().map(|p| p.to_string()).collect(),
            concurrent_requests: 50,
            metrics_path: "/metrics".to_string(),
            refresh_interval_ms: 30_000,
            stress_requests: 50,
            stress_in_flight: 10,
            sweep_levels: DEFAULT_SWEEP_LEVELS.to_vec(),
            warmup_samples: 10,
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = if is_yaml_file(path) {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Load the first config file found, or defaults
    pub fn load_default() -> Result<Self> {
        match find_config() {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = if is_yaml_file(path) {
            serde_yaml::to_string(self).context("Failed to serialize config")?
        } else {
            serde_json::to_string_pretty(self).context("Failed to serialize config")?
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Apply environment overrides on top of this config
    pub fn with_env(mut self, env: &EnvConfig) -> Self {
        if let Some(url) = &env.base_url {
            self.base_url = url.clone();
        }
        if let Some(timeout) = env.timeout {
            self.timeout_secs = timeout;
        }
        if let Some(format) = &env.format {
            self.format = format.clone();
        }
        if let Some(interval) = env.interval_ms {
            self.probes.refresh_interval_ms = interval;
        }
        if let Some(no_color) = env.no_color {
            self.color = !no_color;
        }
        self
    }

    /// Apply command-line flags on top of this config
    pub fn with_args(mut self, args: &Args) -> Self {
        if let Some(url) = &args.base_url {
            self.base_url = url.clone();
        }
        if let Some(format) = &args.format {
            self.format = format.clone();
        }
        if args.no_color {
            self.color = false;
        }

        let probes = &mut self.probes;
        match &args.command {
            Command::Load { requests, path } => {
                if let Some(n) = requests {
                    probes.load_requests = *n;
                }
                if let Some(path) = path {
                    probes.load_path = path.clone();
                }
            }
            Command::Cache { path: Some(path) } => {
                probes.cache_path = path.clone();
            }
            Command::Concurrent { requests: Some(n) } => {
                probes.concurrent_requests = *n;
            }
            Command::Stress {
                requests,
                in_flight,
            } => {
                if let Some(n) = requests {
                    probes.stress_requests = *n;
                }
                if let Some(n) = in_flight {
                    probes.stress_in_flight = *n;
                }
            }
            Command::Warmup { samples, path } => {
                if let Some(n) = samples {
                    probes.warmup_samples = *n;
                }
                if let Some(path) = path {
                    probes.cache_path = path.clone();
                }
            }
            Command::Sweep {
                levels: Some(levels),
            } => {
                probes.sweep_levels = levels.clone();
            }
            Command::Watch {
                interval_ms: Some(ms),
                ..
            } => {
                probes.refresh_interval_ms = *ms;
            }
            _ => {}
        }
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        reqwest::Url::parse(&self.base_url)
            .with_context(|| format!("Invalid base_url: {}", self.base_url))?;

        if self.timeout_secs == 0 {
            anyhow::bail!("timeout_secs must be greater than 0");
        }

        let probes = &self.probes;
        if probes.load_requests == 0 {
            anyhow::bail!("probes.load_requests must be greater than 0");
        }
        if probes.concurrent_requests == 0 {
            anyhow::bail!("probes.concurrent_requests must be greater than 0");
        }
        if probes.concurrent_paths.is_empty() {
            anyhow::bail!("probes.concurrent_paths must not be empty");
        }
        if probes.refresh_interval_ms == 0 {
            anyhow::bail!("probes.refresh_interval_ms must be greater than 0");
        }
        if probes.stress_requests == 0 || probes.stress_in_flight == 0 {
            anyhow::bail!("probes.stress_requests and probes.stress_in_flight must be greater than 0");
        }
        if probes.sweep_levels.is_empty() || probes.sweep_levels.contains(&0) {
            anyhow::bail!("probes.sweep_levels must be non-empty and every level greater than 0");
        }
        if probes.warmup_samples < 2 {
            anyhow::bail!("probes.warmup_samples must be at least 2");
        }

        let paths = [&probes.load_path, &probes.cache_path, &probes.metrics_path]
            .into_iter()
            .chain(probes.concurrent_paths.iter());
        for path in paths {
            if !path.starts_with('/') {
                anyhow::bail!("Probe path '{}' must start with '/'", path);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.probes.load_requests, 100);
        assert_eq!(config.probes.concurrent_requests, 50);
        assert_eq!(config.probes.concurrent_paths.len(), 5);
        assert_eq!(config.probes.refresh_interval_ms, 30_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_load_yaml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("webprobe.yaml");

        let mut config = AppConfig::default();
        config.probes.load_requests = 20;
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_save_load_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("webprobe.json");

        let config = AppConfig::default();
        config.save(&path).unwrap();
        assert_eq!(AppConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("webprobe.yml");
        std::fs::write(&path, "base_url: http://10.0.0.5:9000\nprobes:\n  load_requests: 10\n")
            .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.base_url, "http://10.0.0.5:9000");
        assert_eq!(config.probes.load_requests, 10);
        assert_eq!(config.probes.metrics_path, "/metrics");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.probes.concurrent_paths.clear();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.probes.cache_path = "style.css".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.base_url = "localhost".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_capped_batches() {
        let mut config = AppConfig::default();
        config.probes.sweep_levels = vec![5, 0];
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.probes.stress_in_flight = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.probes.warmup_samples = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_with_args_overrides_env() {
        let env = EnvConfig {
            base_url: Some("http://env:1".to_string()),
            interval_ms: Some(2000),
            ..Default::default()
        };
        let args = Args::parse_from([
            "webprobe",
            "watch",
            "--interval-ms",
            "3000",
            "--base-url",
            "http://cli:2",
        ]);

        let config = AppConfig::default().with_env(&env).with_args(&args);
        assert_eq!(config.probes.refresh_interval_ms, 3000);
        assert_eq!(config.base_url, "http://cli:2");
    }

    #[test]
    fn test_with_args_keeps_unset_values() {
        let env = EnvConfig {
            interval_ms: Some(2000),
            ..Default::default()
        };
        let args = Args::parse_from(["webprobe", "watch"]);

        let config = AppConfig::default().with_env(&env).with_args(&args);
        assert_eq!(config.probes.refresh_interval_ms, 2000);
        assert_eq!(config.base_url, "http://localhost:8080");
    }

    #[test]
    fn test_with_args_capped_batches() {
        let args = Args::parse_from(["webprobe", "sweep", "--levels", "2,4,8"]);
        let config = AppConfig::default().with_args(&args);
        assert_eq!(config.probes.sweep_levels, vec![2, 4, 8]);

        let args = Args::parse_from(["webprobe", "stress", "-n", "200", "--in-flight", "20"]);
        let config = AppConfig::default().with_args(&args);
        assert_eq!(config.probes.stress_requests, 200);
        assert_eq!(config.probes.stress_in_flight, 20);

        let args = Args::parse_from(["webprobe", "warmup", "-n", "4", "--path", "/script.js"]);
        let config = AppConfig::default().with_args(&args);
        assert_eq!(config.probes.warmup_samples, 4);
        assert_eq!(config.probes.cache_path, "/script.js");
    }

    #[test]
    fn test_with_env() {
        let env = EnvConfig {
            base_url: Some("http://127.0.0.1:1".to_string()),
            timeout: Some(5),
            no_color: Some(true),
            ..Default::default()
        };

        let config = AppConfig::default().with_env(&env);
        assert_eq!(config.base_url, "http://127.0.0.1:1");
        assert_eq!(config.timeout_secs, 5);
        assert!(!config.color);
        assert_eq!(config.format, "table");
    }
}
