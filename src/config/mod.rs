//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! CLI flags (cli.rs)
//!     → optional config file (loader.rs, TOML)
//!     → flag overrides applied
//!     → validation.rs (aggregated semantic checks)
//!     → BalancerConfig (validated, immutable)
//!     → handed to the forwarding engine at construction
//! ```
//!
//! # Design Decisions
//! - Config is immutable once validated; there is no reload path
//! - All fields have defaults to allow minimal configs
//! - Validation collects every violated rule before failing

pub mod cli;
pub mod loader;
pub mod schema;
pub mod validation;

pub use cli::Cli;
pub use loader::{load_config, ConfigError};
pub use schema::{
    BalancerConfig, HealthCheckConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
