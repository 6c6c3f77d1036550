//! Request forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → engine.rs: strategy picks a backend (none → 503)
//!     → outbound.rs: rebuild request against backend base URL
//!     → send under backend deadline
//!         - timeout      → 504, backend marked unhealthy
//!         - conn failure → 502, backend marked unhealthy
//!         - status >= 500 → backend status relayed, health untouched
//!         - otherwise    → status, headers, body relayed verbatim,
//!                          body cut once the same deadline passes
//!     → metrics updated for every outcome that reached a backend
//! ```

pub mod client;
pub mod engine;
pub mod outbound;

pub use engine::{EngineSettings, ForwardingEngine};
