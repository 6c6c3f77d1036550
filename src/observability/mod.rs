//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Forwarding engine and health prober produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters and gauges in a MetricsCollector)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → GET /metrics (Prometheus text rendered from a snapshot)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Every proxied request runs inside a span carrying its request ID
//! - Metrics are read through snapshots, never live references

pub mod logging;
pub mod metrics;

pub use metrics::{MetricsCollector, MetricsSnapshot};
