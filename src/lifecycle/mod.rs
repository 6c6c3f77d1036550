//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Parse flags → Load config → Validate → Build engine → Bind → Serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Stop health prober → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger shutdown
//! ```
//!
//! # Design Decisions
//! - Startup is fail fast: invalid config or a failed bind exits the process
//! - Request-level failures never stop the process
//! - Shutdown does not drain in-flight health probes

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
