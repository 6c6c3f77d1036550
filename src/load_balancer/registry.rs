//! Backend registry.
//!
//! # Responsibilities
//! - Own the ordered list of backends and their health flags
//! - Assign unique, never-reused identifiers at registration
//! - Serve concurrent reads, serialize writes
//!
//! # Design Decisions
//! - One reader/writer lock guards the whole list
//! - Reads return copies; no caller holds the lock after a call returns
//! - Removal shifts later positions, so index-based reads are only
//!   meaningful for the instant they are made

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use url::Url;

use crate::errors::LoadBalancerError;
use crate::load_balancer::backend::Backend;

/// The synchronized collection of all known backends.
#[derive(Debug, Default)]
pub struct BackendRegistry {
    backends: RwLock<Vec<Backend>>,
    next_id: AtomicU64,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a list of URLs. Fails on the first bad URL so a
    /// partially populated registry is never returned.
    pub fn from_urls<I, S>(urls: I) -> Result<Self, LoadBalancerError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let registry = Self::new();
        for url in urls {
            registry.add(url.as_ref())?;
        }
        Ok(registry)
    }

    /// Register a backend. It starts out healthy.
    pub fn add(&self, url: &str) -> Result<Backend, LoadBalancerError> {
        let parsed = Url::parse(url).map_err(|e| LoadBalancerError::invalid_backend(url, e))?;
        if parsed.host_str().map_or(true, str::is_empty) {
            return Err(LoadBalancerError::invalid_backend(url, "must include a host"));
        }

        let id = format!("backend-{}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let backend = Backend::new(id, parsed);

        self.backends.write().push(backend.clone());
        tracing::debug!(backend = %backend.id(), url = %backend.url(), "Backend registered");
        Ok(backend)
    }

    /// Remove the backend with the given id. Returns whether one was removed.
    pub fn remove(&self, id: &str) -> bool {
        let mut backends = self.backends.write();
        match backends.iter().position(|b| b.id() == id) {
            Some(index) => {
                backends.remove(index);
                tracing::debug!(backend = %id, "Backend removed");
                true
            }
            None => false,
        }
    }

    /// Copy of every backend, in registration order.
    pub fn snapshot(&self) -> Vec<Backend> {
        self.backends.read().clone()
    }

    pub fn by_index(&self, index: usize) -> Option<Backend> {
        self.backends.read().get(index).cloned()
    }

    pub fn get(&self, id: &str) -> Option<Backend> {
        self.backends.read().iter().find(|b| b.id() == id).cloned()
    }

    pub fn count(&self) -> usize {
        self.backends.read().len()
    }

    pub fn healthy_count(&self) -> usize {
        self.backends.read().iter().filter(|b| b.is_healthy()).count()
    }

    /// Update a backend's health flag. Returns false if the id is unknown.
    pub fn set_health(&self, id: &str, healthy: bool) -> bool {
        let mut backends = self.backends.write();
        match backends.iter_mut().find(|b| b.id() == id) {
            Some(backend) => {
                backend.set_healthy(healthy);
                true
            }
            None => false,
        }
    }
}
