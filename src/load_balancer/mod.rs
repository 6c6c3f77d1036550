//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Request arrives at the forwarding engine
//!     → Strategy::next_backend(&registry)
//!         - round_robin.rs (rotate through backends)
//!     → registry.rs (count / by_index reads under a shared lock)
//!     → backend.rs (value copy of the chosen backend)
//!     → Return backend or None
//! ```
//!
//! # Design Decisions
//! - The registry is the single source of truth for membership and health
//! - Strategies hold only their own selection state, never a backend list
//! - Unhealthy backends excluded from selection
//! - New algorithms are new `Strategy` impls; the engine never matches on them

pub mod backend;
pub mod registry;
pub mod round_robin;

pub use backend::Backend;
pub use registry::BackendRegistry;
pub use round_robin::RoundRobin;

/// A backend selection algorithm.
pub trait Strategy: Send + Sync + std::fmt::Debug {
    /// Pick the backend for the next request, or `None` if no healthy
    /// backend could be found.
    fn next_backend(&self, registry: &BackendRegistry) -> Option<Backend>;

    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;
}
