//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Immediate pass, then periodic timer
//!     → Snapshot registry
//!     → Spawn one probe per backend (GET <base><path>)
//!     → registry.set_health() on transition
//!
//! Passive signal (proxy engine):
//!     Connection failure or timeout on a proxied request
//!     → registry.set_health(id, false) immediately
//! ```
//!
//! # Design Decisions
//! - Both writers go through the same registry setter
//! - A probe only writes when its result differs from the last known flag
//! - Only a 200 counts as healthy; 5xx on proxied traffic never flips health
//! - Stopping the prober does not wait for in-flight probes

pub mod active;

pub use active::{HealthProber, ProbeSettings, PROBE_USER_AGENT};
