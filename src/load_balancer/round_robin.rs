//! Round-robin load balancing strategy.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::load_balancer::{backend::Backend, registry::BackendRegistry, Strategy};

/// Round-robin selector.
/// Stores an internal counter to rotate through backends.
#[derive(Debug, Default)]
pub struct RoundRobin {
    counter: AtomicU64,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Strategy for RoundRobin {
    fn next_backend(&self, registry: &BackendRegistry) -> Option<Backend> {
        let len = registry.count();
        if len == 0 {
            return None;
        }

        // The count may be stale by the time an index is read; at most `len`
        // attempts are made either way.
        for _ in 0..len {
            let prev = self.counter.fetch_add(1, Ordering::Relaxed);
            let index = (prev % len as u64) as usize;
            if let Some(backend) = registry.by_index(index) {
                if backend.is_healthy() {
                    return Some(backend);
                }
            }
        }
        None
    }

    fn name(&self) -> &'static str {
        "round-robin"
    }
}
