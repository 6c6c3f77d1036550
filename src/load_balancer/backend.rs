//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single backend server
//! - Derive the effective port from the URL scheme
//! - Build upstream URIs from the base URL
//!
//! Backends are plain values. The registry owns the authoritative copy and
//! hands out clones, so the health flag is only ever changed through
//! [`BackendRegistry::set_health`](crate::load_balancer::registry::BackendRegistry::set_health).

use url::Url;

/// A single backend server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backend {
    id: String,
    url: Url,
    port: u16,
    healthy: bool,
}

impl Backend {
    pub(crate) fn new(id: String, url: Url) -> Self {
        let port = port_for(&url);
        Self {
            id,
            url,
            port,
            healthy: true,
        }
    }

    /// Stable identifier assigned at registration.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Explicit port, or the scheme default when the URL has none.
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy
    }

    pub(crate) fn set_healthy(&mut self, healthy: bool) {
        self.healthy = healthy;
    }

    /// Base URL with any trailing slash removed, ready for path concatenation.
    pub fn base(&self) -> &str {
        self.url.as_str().trim_end_matches('/')
    }

    /// Upstream target for a request path and optional raw query string.
    pub fn target(&self, path: &str, query: Option<&str>) -> String {
        match query {
            Some(q) => format!("{}{}?{}", self.base(), path, q),
            None => format!("{}{}", self.base(), path),
        }
    }
}

fn port_for(url: &Url) -> u16 {
    url.port().unwrap_or(match url.scheme() {
        "https" => 443,
        _ => 80,
    })
}
