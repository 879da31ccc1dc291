//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::env;

/// Environment variable prefix
const ENV_PREFIX: &str = "WEBPROBE";

/// Environment configuration from environment variables
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EnvConfig {
    /// Server origin from WEBPROBE_BASE_URL
    pub base_url: Option<String>,
    /// Timeout from WEBPROBE_TIMEOUT
    pub timeout: Option<u64>,
    /// Output format from WEBPROBE_FORMAT
    pub format: Option<String>,
    /// Refresh interval from WEBPROBE_INTERVAL (milliseconds)
    pub interval_ms: Option<u64>,
    /// Config file from WEBPROBE_CONFIG
    pub config_file: Option<String>,
    /// Verbose from WEBPROBE_VERBOSE
    pub verbose: Option<bool>,
    /// Log filter directives from WEBPROBE_LOG
    pub log: Option<String>,
    /// Disable colors from WEBPROBE_NO_COLOR
    pub no_color: Option<bool>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            base_url: get_env("BASE_URL"),
            timeout: get_env_parse("TIMEOUT"),
            format: get_env("FORMAT"),
            interval_ms: get_env_parse("INTERVAL"),
            config_file: get_env("CONFIG"),
            verbose: get_env_bool("VERBOSE"),
            log: get_env("LOG"),
            no_color: get_env_bool("NO_COLOR"),
        }
    }

    /// Print current environment configuration
    pub fn print_summary(&self) {
        println!("Environment Configuration:");
        println!("  {ENV_PREFIX}_BASE_URL:  {:?}", self.base_url);
        println!("  {ENV_PREFIX}_TIMEOUT:   {:?}", self.timeout);
        println!("  {ENV_PREFIX}_FORMAT:    {:?}", self.format);
        println!("  {ENV_PREFIX}_INTERVAL:  {:?}", self.interval_ms);
        println!("  {ENV_PREFIX}_CONFIG:    {:?}", self.config_file);
        println!("  {ENV_PREFIX}_VERBOSE:   {:?}", self.verbose);
        println!("  {ENV_PREFIX}_LOG:       {:?}", self.log);
        println!("  {ENV_PREFIX}_NO_COLOR:  {:?}", self.no_color);
    }
}

/// Get environment variable with prefix
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}")).ok()
}

/// Get environment variable and parse to type
fn get_env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    get_env(name).and_then(|v| v.parse().ok())
}

/// Get environment variable as boolean
fn get_env_bool(name: &str) -> Option<bool> {
    get_env(name).map(|v| parse_bool(&v))
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.to_lowercase().as_str(),
        "1" | "true" | "yes" | "on" | "enabled"
    )
}

/// Print all WEBPROBE environment variables
pub fn print_env_help() {
    println!("Environment Variables:");
    println!();
    println!("  {ENV_PREFIX}_BASE_URL   Origin of the server under test");
    println!("  {ENV_PREFIX}_TIMEOUT    Request timeout in seconds");
    println!("  {ENV_PREFIX}_FORMAT     Output format (table, json, summary)");
    println!("  {ENV_PREFIX}_INTERVAL   Metrics refresh interval in milliseconds");
    println!("  {ENV_PREFIX}_CONFIG     Path to configuration file");
    println!("  {ENV_PREFIX}_VERBOSE    Enable debug logging (true/false)");
    println!("  {ENV_PREFIX}_LOG        Log filter directives, e.g. webprobe=trace");
    println!("  {ENV_PREFIX}_NO_COLOR   Disable ANSI colors (true/false)");
    println!();
    println!("Example:");
    println!("  export {ENV_PREFIX}_BASE_URL=http://localhost:8080");
    println!("  webprobe suite");
}

/// Sets `WEBPROBE_*` variables for one test and restores them on drop.
///
/// Holds a process-wide lock so tests touching the environment run one at a time.
#[cfg(test)]
pub(crate) struct EnvGuard {
    previous: Vec<(String, Option<String>)>,
    _lock: std::sync::MutexGuard<'static, ()>,
}

#[cfg(test)]
impl EnvGuard {
    pub(crate) fn set(vars: &[(&str, &str)]) -> Self {
        static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
        let lock = LOCK.lock().unwrap_or_else(|e| e.into_inner());

        let previous = vars
            .iter()
            .map(|(k, v)| {
                let key = format!("{ENV_PREFIX}_{k}");
                let old = env::var(&key).ok();
                env::set_var(&key, v);
                (key, old)
            })
            .collect();
        Self {
            previous,
            _lock: lock,
        }
    }
}

#[cfg(test)]
impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.previous {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
    }
}
