//! Round-robin HTTP load balancer library.
//!
//! Forwards every inbound request to one backend from a fixed pool,
//! skipping backends that failed their last health check or their last
//! proxied request, and exposes request and health counters on `/metrics`.

// Core subsystems
pub mod config;
pub mod errors;
pub mod http;
pub mod proxy;

// Traffic management
pub mod health;
pub mod load_balancer;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::BalancerConfig;
pub use errors::{ErrorCode, LoadBalancerError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use proxy::ForwardingEngine;
