use crate::monitor::constants::*;
use crate::monitor::error::{MonitorError, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

#[derive(Parser, Debug, Clone)]
#[command(name = "multiping")]
#[command(about = "Live ICMP reachability and latency monitor for up to 20 targets")]
pub struct Config {
    /// IP addresses or hostnames to monitor (prompts interactively when omitted)
    pub targets: Vec<String>,

    /// Load targets from a list file, one address per line
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Initial delay between probes of the same target, in seconds
    #[arg(long, default_value_t = DEFAULT_DELAY_SECS)]
    pub delay: f64,

    /// Reply timeout for a single probe in milliseconds
    #[arg(long, default_value_t = DEFAULT_PROBE_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// Log format (text or json)
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub log_format: String,
}

impl Config {
    /// Returns the configured probe timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Returns true if JSON format logging is enabled
    pub fn is_json_format(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }

    /// Validates the configuration values
    pub fn validate(&self) -> Result<()> {
        debug!("Validating configuration");
        if !(MIN_DELAY_SECS..=MAX_DELAY_SECS).contains(&self.delay) {
            return Err(MonitorError::Config(format!(
                "delay must be between {} and {} seconds",
                MIN_DELAY_SECS, MAX_DELAY_SECS
            )));
        }
        if self.timeout_ms == 0 {
            return Err(MonitorError::Config("timeout must be > 0".into()));
        }
        if self.targets.len() > MAX_TARGETS {
            return Err(MonitorError::Config(format!(
                "at most {} targets may be monitored",
                MAX_TARGETS
            )));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(MonitorError::Config(format!(
                "log_level must be one of: {}",
                valid_levels.join(", ")
            )));
        }

        debug!("Configuration validated successfully");
        Ok(())
    }
}
