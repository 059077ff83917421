use clap::Args;
use eyre::WrapErr;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::time::Duration;

use crate::request::RequestConfig;
use crate::scheduler::SchedulerConfig;

/// Options shared by every subcommand that builds an [`AppConfig`]
#[derive(Args, Clone, Debug, Default)]
pub struct ConfigArgs {
    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Path to a YAML configuration file
    #[arg(short, long, env = "FRAME_REQUEST_CONFIG")]
    pub config_file: Option<String>,

    /// Milliseconds between driver ticks
    #[arg(long, env = "FRAME_REQUEST_TICK_MS")]
    pub tick_interval_ms: Option<u64>,

    /// Maximum number of idle task records kept for reuse
    #[arg(long)]
    pub pool_capacity: Option<usize>,

    /// Default request timeout in seconds
    #[arg(long, env = "FRAME_REQUEST_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Maximum redirects followed (0 disables redirects)
    #[arg(long)]
    pub redirect_limit: Option<u32>,

    /// Default header applied to every request, as `Name: value`
    #[arg(long = "super-header", value_name = "HEADER")]
    pub super_headers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log_level: String,
    pub tick_interval_ms: u64,
    pub scheduler: SchedulerConfig,
    pub request: RequestConfig,
    pub super_headers: BTreeMap<String, String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            tick_interval_ms: 16,
            scheduler: SchedulerConfig::default(),
            request: RequestConfig::default(),
            super_headers: BTreeMap::new(),
        }
    }
}

impl AppConfig {
    /// Load the optional config file, then apply CLI overrides on top
    pub fn from_args(args: &ConfigArgs) -> eyre::Result<Self> {
        let mut config = match &args.config_file {
            Some(path) => read_config(path)?,
            None => Self::default(),
        };

        if let Some(log_level) = &args.log_level {
            config.log_level = log_level.clone();
        }
        if let Some(tick_interval_ms) = args.tick_interval_ms {
            config.tick_interval_ms = tick_interval_ms;
        }
        if let Some(pool_capacity) = args.pool_capacity {
            config.scheduler.pool_capacity = pool_capacity;
        }
        if let Some(timeout_secs) = args.timeout_secs {
            config.request.default_timeout_secs = Some(timeout_secs);
        }
        if let Some(redirect_limit) = args.redirect_limit {
            config.request.redirect_limit = redirect_limit;
        }
        for header in &args.super_headers {
            let (key, value) = parse_header(header)?;
            config.super_headers.insert(key, value);
        }

        Ok(config)
    }

    pub fn from_yaml<R: std::io::Read>(reader: R) -> eyre::Result<Self> {
        serde_yaml::from_reader(reader).wrap_err("Failed to parse config YAML")
    }

    pub fn to_yaml<W: std::io::Write>(&self, writer: W) -> eyre::Result<()> {
        serde_yaml::to_writer(writer, self).wrap_err("Failed to write config YAML")
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

/// Read configuration from a YAML file
pub fn read_config(filename: &str) -> eyre::Result<AppConfig> {
    let file = File::open(filename)
        .wrap_err_with(|| format!("Failed to open config file {filename}"))?;
    AppConfig::from_yaml(file)
}

/// Split a `Name: value` header argument
pub fn parse_header(raw: &str) -> eyre::Result<(String, String)> {
    let (key, value) = raw
        .split_once(':')
        .ok_or_else(|| eyre::eyre!("header '{raw}' must look like 'Name: value'"))?;
    let (key, value) = (key.trim(), value.trim());
    if key.is_empty() || value.is_empty() {
        return Err(eyre::eyre!("header '{raw}' has an empty name or value"));
    }
    Ok((key.to_string(), value.to_string()))
}
