//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, TraceLayer)
//!     → /metrics → render metrics snapshot
//!     → anything else → proxy engine (select, forward, relay)
//!     → response.rs (structured errors → status + JSON body)
//!     → Send to client
//! ```

pub mod response;
pub mod server;

pub use server::{AppState, HttpServer};
