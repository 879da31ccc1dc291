//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};

/// Load, cache and metrics probe for caching HTTP servers
#[derive(Parser, Debug)]
#[command(name = "webprobe")]
#[command(version)]
#[command(about = "Probe a caching HTTP server and render its live metrics")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (YAML or JSON)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Origin of the server under test, e.g. http://localhost:8080
    #[arg(short, long, global = true)]
    pub base_url: Option<String>,

    /// Output format (table, json, summary)
    #[arg(short, long, global = true)]
    pub format: Option<String>,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fire a batch of concurrent requests at one path
    Load {
        /// Number of requests in the batch
        #[arg(short = 'n', long)]
        requests: Option<usize>,

        /// Target path
        #[arg(short, long)]
        path: Option<String>,
    },

    /// Time three sequential requests to one path
    Cache {
        /// Target path
        #[arg(short, long)]
        path: Option<String>,
    },

    /// Fire a batch cycling through the site's paths
    Concurrent {
        /// Number of requests in the batch
        #[arg(short = 'n', long)]
        requests: Option<usize>,
    },

    /// Scrape the server's metrics page once
    Metrics,

    /// Fire a batch across the site's paths with a cap on requests in flight
    Stress {
        /// Number of requests in the batch
        #[arg(short = 'n', long)]
        requests: Option<usize>,

        /// Maximum requests outstanding at once
        #[arg(short = 't', long)]
        in_flight: Option<usize>,
    },

    /// Time repeated sequential requests to one path against the first
    Warmup {
        /// Number of sequential requests
        #[arg(short = 'n', long)]
        samples: Option<usize>,

        /// Target path
        #[arg(short, long)]
        path: Option<String>,
    },

    /// Run one fully parallel batch per concurrency level
    Sweep {
        /// Comma-separated concurrency levels, e.g. 5,10,20,50
        #[arg(short, long, value_delimiter = ',')]
        levels: Option<Vec<usize>>,
    },

    /// Refresh the metrics dashboard on a timer
    Watch {
        /// Refresh interval in milliseconds
        #[arg(short, long)]
        interval_ms: Option<u64>,

        /// Skip the initial scrape; ticks then do nothing until the dashboard is shown
        #[arg(long)]
        no_populate: bool,
    },

    /// Check the server is up, then run every probe
    Suite,

    /// Show or create configuration
    Config(ConfigArgs),
}

/// Arguments for config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Write a default configuration file
    Init {
        /// Output path (.yaml, .yml or .json)
        #[arg(default_value = "webprobe.yaml")]
        path: String,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// List supported environment variables
    Env,
}
