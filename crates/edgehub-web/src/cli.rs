//! Command-line flags for the `edgehub` binary.
//!
//! Every flag is optional and overrides the matching environment variable.
//!
//! | Option | Environment | Default |
//! |--------|-------------|---------|
//! | `--bind` | `EDGEHUB_BIND` | `0.0.0.0:8080` |
//! | `--log-level` | `EDGEHUB_LOG` | `info` |
//! | `--log-format` | `EDGEHUB_LOG_FORMAT` | `pretty` |

use clap::Parser;

use crate::config::{GatewayConfig, LogFormat};

/// Edge API gateway with provider fallback and a range-preserving stream proxy.
#[derive(Debug, Default, Parser)]
#[command(name = "edgehub", version, about = "Edge API gateway")]
pub struct Cli {
    /// Socket address to listen on.
    #[arg(long)]
    pub bind: Option<String>,

    /// Default log filter directive (e.g. `info`, `edgehub_core=debug`).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log output format.
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,
}

impl Cli {
    pub fn apply(&self, config: &mut GatewayConfig) {
        if let Some(bind) = &self.bind {
            config.bind = bind.clone();
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
    }
}
