//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::BalancerConfig;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Load configuration from a TOML file.
///
/// The result is not validated; callers apply CLI overrides first and then
/// run [`validate_config`](crate::config::validation::validate_config).
pub fn load_config(path: &Path) -> Result<BalancerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    tracing::debug!(path = %path.display(), "Configuration file loaded");
    Ok(config)
}

/// Parse configuration from TOML text. Missing fields take their defaults.
pub fn parse_config(content: &str) -> Result<BalancerConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}
