//! Command-line flags.
//!
//! Flags map one-to-one onto [`BalancerConfig`] fields. When `--config` is
//! given the file is loaded first and any flag passed explicitly overrides
//! the value from the file.

use std::path::PathBuf;

use clap::Parser;

use crate::config::loader::{load_config, ConfigError};
use crate::config::schema::{BalancerConfig, LogFormat};

#[derive(Debug, Parser)]
#[command(name = "balancer-proxy")]
#[command(version, about = "Round-robin HTTP load balancer with active health checks", long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Port to listen on [default: 8000]
    #[arg(short, long)]
    pub port: Option<u32>,

    /// Comma-separated backend URLs [default: http://localhost:8080,http://localhost:8081,http://localhost:8082]
    #[arg(short, long, value_delimiter = ',')]
    pub backends: Option<Vec<String>>,

    /// Path probed on every backend [default: /]
    #[arg(long)]
    pub health_check_path: Option<String>,

    /// Seconds between health check passes [default: 10]
    #[arg(long)]
    pub health_check_interval: Option<u64>,

    /// Per-probe timeout in seconds [default: 2]
    #[arg(long)]
    pub health_check_timeout: Option<u64>,

    /// Proxied request timeout in seconds [default: 30]
    #[arg(long)]
    pub backend_timeout: Option<u64>,

    /// Log output format
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,
}

impl Cli {
    /// Build the configuration from the optional file plus flag overrides.
    pub fn into_config(self) -> Result<BalancerConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => BalancerConfig::default(),
        };

        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(backends) = self.backends {
            config.backends = backends
                .into_iter()
                .map(|b| b.trim().to_string())
                .filter(|b| !b.is_empty())
                .collect();
        }
        if let Some(path) = self.health_check_path {
            config.health_check.path = path;
        }
        if let Some(secs) = self.health_check_interval {
            config.health_check.interval_secs = secs;
        }
        if let Some(secs) = self.health_check_timeout {
            config.health_check.timeout_secs = secs;
        }
        if let Some(secs) = self.backend_timeout {
            config.timeouts.backend_secs = secs;
        }
        if let Some(format) = self.log_format {
            config.observability.log_format = format;
        }

        Ok(config)
    }
}
