//! Per-request forwarding engine.
//!
//! # Responsibilities
//! - Select a backend through the configured strategy
//! - Forward the request under a deadline and classify the outcome
//! - Feed outcomes back into registry health and metrics
//! - Own the health prober's lifecycle

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::Instrument;
use uuid::Uuid;

use crate::config::BalancerConfig;
use crate::errors::LoadBalancerError;
use crate::health::{HealthProber, ProbeSettings};
use crate::http::response::error_response;
use crate::lifecycle::Shutdown;
use crate::load_balancer::{Backend, BackendRegistry, RoundRobin, Strategy};
use crate::observability::{MetricsCollector, MetricsSnapshot};
use crate::proxy::client::{backend_client, BackendClient};
use crate::proxy::outbound::{build_outbound, relay};

/// Timing knobs for the engine and its prober.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub probe: ProbeSettings,
    pub backend_timeout: Duration,
}

impl From<&BalancerConfig> for EngineSettings {
    fn from(config: &BalancerConfig) -> Self {
        Self {
            probe: ProbeSettings::from(&config.health_check),
            backend_timeout: config.timeouts.backend(),
        }
    }
}

/// Selects, forwards, classifies and relays.
pub struct ForwardingEngine {
    registry: Arc<BackendRegistry>,
    strategy: Arc<dyn Strategy>,
    metrics: Arc<MetricsCollector>,
    prober: Arc<HealthProber>,
    client: BackendClient,
    backend_timeout: Duration,
    shutdown: Shutdown,
}

impl ForwardingEngine {
    /// Build an engine over the given backend URLs with round-robin selection.
    ///
    /// Fails if any URL cannot be parsed; no engine is built in that case.
    pub fn new<S: AsRef<str>>(backends: &[S], settings: EngineSettings) -> Result<Self, LoadBalancerError> {
        let registry = Arc::new(BackendRegistry::from_urls(backends)?);
        let metrics = Arc::new(MetricsCollector::new());
        metrics.update_backend_counts(registry.healthy_count(), registry.count());

        let prober = Arc::new(HealthProber::new(registry.clone(), metrics.clone(), settings.probe));
        let client = backend_client();

        Ok(Self {
            registry,
            strategy: Arc::new(RoundRobin::new()),
            metrics,
            prober,
            client,
            backend_timeout: settings.backend_timeout,
            shutdown: Shutdown::new(),
        })
    }

    pub fn from_config(config: &BalancerConfig) -> Result<Self, LoadBalancerError> {
        Self::new(config.backends.as_slice(), EngineSettings::from(config))
    }

    /// Replace the selection strategy.
    pub fn with_strategy(mut self, strategy: Arc<dyn Strategy>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn registry(&self) -> &Arc<BackendRegistry> {
        &self.registry
    }

    /// Spawn the health prober. Returns `None` once the engine is stopped.
    pub fn start(&self) -> Option<JoinHandle<()>> {
        if self.shutdown.is_triggered() {
            return None;
        }
        let stop = self.shutdown.subscribe();
        Some(tokio::spawn(self.prober.clone().run(stop)))
    }

    /// Signal the health prober to exit. In-flight probes are not awaited.
    pub fn stop(&self) {
        self.shutdown.trigger();
    }

    pub fn add_backend(&self, url: &str) -> Result<Backend, LoadBalancerError> {
        let backend = self.registry.add(url)?;
        tracing::info!(backend = %backend.id(), url = %backend.url(), "Backend added");
        self.refresh_backend_counts();
        Ok(backend)
    }

    pub fn remove_backend(&self, id: &str) -> bool {
        let removed = self.registry.remove(id);
        if removed {
            tracing::info!(backend = %id, "Backend removed");
            self.refresh_backend_counts();
        }
        removed
    }

    /// Current backends and their health.
    pub fn backends(&self) -> Vec<Backend> {
        self.registry.snapshot()
    }

    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.refresh_backend_counts();
        self.metrics.snapshot()
    }

    /// Proxy one request and produce the caller's response.
    pub async fn forward(&self, request: Request<Body>) -> Response {
        let span = tracing::info_span!(
            "proxy",
            request_id = %Uuid::new_v4(),
            method = %request.method(),
            path = %request.uri().path(),
        );
        self.forward_inner(request).instrument(span).await
    }

    async fn forward_inner(&self, request: Request<Body>) -> Response {
        let Some(backend) = self.strategy.next_backend(&self.registry) else {
            let err = if self.registry.count() == 0 {
                LoadBalancerError::pool_empty()
            } else {
                LoadBalancerError::no_healthy_backends()
            }
            .with_context("strategy", self.strategy.name());
            tracing::warn!(code = %err.code(), error = %err, "No backend available");
            return err.into_response();
        };

        tracing::debug!(backend = %backend.id(), url = %backend.url(), "Forwarding request");

        let outbound = match build_outbound(&backend, request) {
            Ok(req) => req,
            Err(err) => {
                tracing::error!(backend = %backend.id(), code = %err.code(), error = %err, "Failed to build backend request");
                return err.into_response();
            }
        };
        let target = outbound.uri().to_string();

        let start = Instant::now();
        let deadline = start + self.backend_timeout;
        match time::timeout_at(deadline, self.client.request(outbound)).await {
            Err(_) => {
                let err = LoadBalancerError::backend_timeout(backend.id())
                    .with_context("url", &target)
                    .with_context("timeout_ms", self.backend_timeout.as_millis());
                self.mark_failed(&backend, &err);
                err.into_response()
            }
            Ok(Err(e)) => {
                let err = LoadBalancerError::backend_connection(backend.id(), e).with_context("url", &target);
                self.mark_failed(&backend, &err);
                err.into_response()
            }
            Ok(Ok(response)) if response.status().is_server_error() => {
                let status = response.status();
                let err = LoadBalancerError::backend_response(backend.id(), status).with_context("url", &target);
                self.metrics.record_failure(backend.id());
                tracing::warn!(backend = %backend.id(), status = %status, code = %err.code(), "Backend returned server error");
                error_response(&err, status)
            }
            Ok(Ok(response)) => {
                let latency = start.elapsed();
                self.metrics.record_success(backend.id(), latency);
                tracing::debug!(
                    backend = %backend.id(),
                    status = %response.status(),
                    latency_ms = latency.as_millis() as u64,
                    "Response from backend"
                );
                relay(response, backend.id(), deadline)
            }
        }
    }

    /// Transport-level failure: count it and pull the backend out of rotation
    /// until the prober sees it answer again.
    fn mark_failed(&self, backend: &Backend, err: &LoadBalancerError) {
        tracing::error!(backend = %backend.id(), code = %err.code(), error = %err, "Error forwarding request to backend");
        self.metrics.record_failure(backend.id());
        if self.registry.set_health(backend.id(), false) && backend.is_healthy() {
            tracing::warn!(backend = %backend.id(), "Backend marked unhealthy after request failure");
        }
        self.refresh_backend_counts();
    }

    fn refresh_backend_counts(&self) {
        self.metrics
            .update_backend_counts(self.registry.healthy_count(), self.registry.count());
    }
}

impl std::fmt::Debug for ForwardingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForwardingEngine")
            .field("strategy", &self.strategy.name())
            .field("backends", &self.registry.count())
            .field("backend_timeout", &self.backend_timeout)
            .finish()
    }
}
