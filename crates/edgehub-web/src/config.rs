//! Gateway configuration loaded from the environment.

use std::str::FromStr;
use std::time::Duration;

use clap::ValueEnum;
use edgehub_core::{BridgeConfig, HostAllowList, ValidationError};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid log format '{value}' (expected 'pretty' or 'json')")]
    InvalidLogFormat { value: String },

    #[error("invalid cache sweep interval '{value}' (expected a positive number of seconds)")]
    InvalidSweepInterval { value: String },

    #[error("invalid CAMERA_BRIDGE_URL: {0}")]
    InvalidBridgeUrl(ValidationError),
}

/// Log line rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::InvalidLogFormat {
                value: value.to_owned(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive when `RUST_LOG` is unset.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Root gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub bind: String,
    pub logging: LoggingConfig,
    /// `None` when the camera bridge is not configured; bridge routes answer 501.
    pub bridge: Option<BridgeConfig>,
    pub media_allowed_hosts: HostAllowList,
    pub cache_sweep_secs: u64,
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_cache_sweep_secs() -> u64 {
    60
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            logging: LoggingConfig::default(),
            bridge: None,
            media_allowed_hosts: HostAllowList::default(),
            cache_sweep_secs: default_cache_sweep_secs(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_blank = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let format = match non_blank("EDGEHUB_LOG_FORMAT") {
            Some(value) => value.parse()?,
            None => LogFormat::default(),
        };
        let cache_sweep_secs = match non_blank("EDGEHUB_CACHE_SWEEP_SECS") {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidSweepInterval { value })?,
            None => default_cache_sweep_secs(),
        };
        let bridge_url = lookup("CAMERA_BRIDGE_URL");
        let bridge_token = lookup("CAMERA_BRIDGE_TOKEN");
        let bridge = BridgeConfig::from_parts(bridge_url.as_deref(), bridge_token.as_deref())
            .map_err(ConfigError::InvalidBridgeUrl)?;

        Ok(Self {
            bind: non_blank("EDGEHUB_BIND").unwrap_or_else(default_bind),
            logging: LoggingConfig {
                level: non_blank("EDGEHUB_LOG").unwrap_or_else(default_log_level),
                format,
            },
            bridge,
            media_allowed_hosts: lookup("MEDIA_ALLOWED_HOSTS")
                .map(|raw| HostAllowList::parse(&raw))
                .unwrap_or_default(),
            cache_sweep_secs,
        })
    }

    pub fn cache_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.cache_sweep_secs)
    }
}
