//! webprobe - load, cache and metrics probe for caching HTTP servers
//!
//! Fires request batches at a server, times them, and scrapes the server's
//! `/metrics` page into a live dashboard.
//!
//! ## Features
//!
//! - Load probe: one batch of concurrent requests, requests/sec and latency
//! - Cache probe: three sequential requests and the speedup of the second
//! - Concurrent probe: a batch cycling through the site's paths, per-path breakdown
//! - Metrics probe: six server counters scraped from HTML, refreshed on a timer
//! - Capped batches: stress with a failure listing, cache warmup, concurrency sweep
//! - Multiple output formats (Table, JSON, Summary)
//!
//! ## Usage
//!
//! ```bash
//! # Run every probe against a local server
//! webprobe suite --base-url http://localhost:8080
//!
//! # 500 concurrent requests to one page
//! webprobe load -n 500 --path /about.html
//!
//! # Keep the metrics dashboard fresh
//! webprobe watch --interval-ms 10000
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use tracing::{info, warn};

mod cli;
mod config;
mod http;
mod models;
mod output;
mod probe;
mod utils;

use cli::{Args, Command, ConfigAction};
use config::{AppConfig, EnvConfig};
use http::{Fetch, HttpClient};
use output::{Dashboard, OutputFormat, ResultFormatter};
use probe::{ProbeKind, ProbeRunner, Session};
use utils::{init_logger, LogLevel};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let env = EnvConfig::load();

    let verbose = args.verbose || env.verbose.unwrap_or(false);
    init_logger(LogLevel::from_verbose(verbose), env.log.as_deref());

    let success = match &args.command {
        Command::Config(config_args) => {
            manage_config(&config_args.action, &args, &env)?;
            true
        }
        command => {
            let config = resolve_config(&args, &env)?;
            run_probes(command, &config).await?
        }
    };

    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Defaults, then config file, then environment, then flags
fn resolve_config(args: &Args, env: &EnvConfig) -> Result<AppConfig> {
    let path = args.config.clone().or_else(|| env.config_file.clone());
    let config = match path {
        Some(path) => AppConfig::load(&path)?,
        None => AppConfig::load_default()?,
    }
    .with_env(env)
    .with_args(args);

    config.validate()?;
    Ok(config)
}

fn build_session(config: &AppConfig) -> Result<Session<HttpClient, Dashboard>> {
    let format = OutputFormat::from_str(&config.format)
        .ok_or_else(|| anyhow::anyhow!("Unknown output format: {}", config.format))?;

    let mut formatter =
        ResultFormatter::new(format).with_refresh_interval(config.probes.refresh_interval_ms);
    if !config.color {
        formatter = formatter.no_color();
    }

    let client = HttpClient::new(&config.base_url, config.timeout_secs)?;
    let runner = ProbeRunner::new(client, config.probes.clone());

    Ok(Session::new(runner, Dashboard::stdout(), formatter))
}

/// Returns whether every probe that ran succeeded
async fn run_probes(command: &Command, config: &AppConfig) -> Result<bool> {
    let mut session = build_session(config)?;
    info!("Probing {}", config.base_url);

    let success = match command {
        Command::Load { .. } => session.run(ProbeKind::Load).await.is_ok(),
        Command::Cache { .. } => session.run(ProbeKind::Cache).await.is_ok(),
        Command::Concurrent { .. } => session.run(ProbeKind::Concurrent).await.is_ok(),
        Command::Metrics => session.run(ProbeKind::Metrics).await.is_ok(),
        Command::Stress { .. } => session.run(ProbeKind::Stress).await.is_ok(),
        Command::Warmup { .. } => session.run(ProbeKind::Warmup).await.is_ok(),
        Command::Sweep { .. } => session.run(ProbeKind::Sweep).await.is_ok(),
        Command::Watch { no_populate, .. } => {
            if !no_populate {
                // A failed first scrape leaves the guard closed; keep ticking anyway
                let _ = session.run(ProbeKind::Metrics).await;
            }
            session.watch(shutdown_signal()).await;
            true
        }
        Command::Suite => run_suite(&mut session, &config.base_url).await,
        Command::Config(_) => true,
    };

    Ok(success)
}

async fn run_suite(session: &mut Session<HttpClient, Dashboard>, base_url: &str) -> bool {
    if let Err(e) = session.runner().fetcher().get("/").await {
        println!("❌ Server is not responding at {base_url}: {e}");
        println!("   Start the server first, or pass --base-url");
        return false;
    }
    println!("✓ Server is running and responding");

    let outcomes = session.run_suite().await;
    let failed: Vec<_> = outcomes
        .iter()
        .filter(|(_, outcome)| outcome.is_err())
        .map(|(kind, _)| kind.name())
        .collect();

    if failed.is_empty() {
        println!("\nAll probes completed.");
        true
    } else {
        println!("\nFailed probes: {}", failed.join(", "));
        false
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

fn manage_config(action: &ConfigAction, args: &Args, env: &EnvConfig) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = resolve_config(args, env)?;
            let yaml = serde_yaml::to_string(&config).context("Failed to serialize config")?;
            println!("{yaml}");
        }
        ConfigAction::Init { path, force } => {
            if Path::new(path).exists() && !force {
                anyhow::bail!("{path} already exists (use --force to overwrite)");
            }
            AppConfig::default().save(path)?;
            println!("✓ Wrote default configuration to {path}");
        }
        ConfigAction::Env => {
            config::print_env_help();
            println!();
            env.print_summary();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnvGuard;
    use tempfile::tempdir;

    fn write_config(dir: &Path) -> String {
        let path = dir.join("webprobe.yaml");
        std::fs::write(
            &path,
            "base_url: http://file:1\nprobes:\n  refresh_interval_ms: 1000\n",
        )
        .unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_flags_beat_env_and_file() {
        let dir = tempdir().unwrap();
        let config_path = write_config(dir.path());
        let _guard = EnvGuard::set(&[("INTERVAL", "2000"), ("BASE_URL", "http://env:2")]);

        let args = Args::parse_from([
            "webprobe",
            "--config",
            config_path.as_str(),
            "watch",
            "--interval-ms",
            "3000",
            "--base-url",
            "http://cli:3",
        ]);
        let config = resolve_config(&args, &EnvConfig::load()).unwrap();

        assert_eq!(config.probes.refresh_interval_ms, 3000);
        assert_eq!(config.base_url, "http://cli:3");
    }

    #[test]
    fn test_env_beats_file() {
        let dir = tempdir().unwrap();
        let config_path = write_config(dir.path());
        let _guard = EnvGuard::set(&[("INTERVAL", "2000"), ("BASE_URL", "http://env:2")]);

        let args = Args::parse_from(["webprobe", "--config", config_path.as_str(), "watch"]);
        let config = resolve_config(&args, &EnvConfig::load()).unwrap();

        assert_eq!(config.probes.refresh_interval_ms, 2000);
        assert_eq!(config.base_url, "http://env:2");
    }

    #[test]
    fn test_file_beats_defaults() {
        let dir = tempdir().unwrap();
        let config_path = write_config(dir.path());

        let args = Args::parse_from(["webprobe", "--config", config_path.as_str(), "metrics"]);
        let config = resolve_config(&args, &EnvConfig::default()).unwrap();

        assert_eq!(config.probes.refresh_interval_ms, 1000);
        assert_eq!(config.base_url, "http://file:1");
        assert_eq!(config.probes.load_requests, 100);
    }

    #[test]
    fn test_invalid_flag_value_rejected() {
        let args = Args::parse_from(["webprobe", "sweep", "--levels", "5,0"]);
        assert!(resolve_config(&args, &EnvConfig::default()).is_err());
    }
}
