//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe every registered backend
//! - Write health transitions into the registry
//! - Record probe outcomes in the metrics collector

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::config::HealthCheckConfig;
use crate::errors::LoadBalancerError;
use crate::load_balancer::{Backend, BackendRegistry};
use crate::observability::MetricsCollector;
use crate::proxy::client::{backend_client, BackendClient};

/// User-Agent sent with every probe.
pub const PROBE_USER_AGENT: &str = concat!("balancer-proxy-health-check/", env!("CARGO_PKG_VERSION"));

/// Probe target and timing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSettings {
    pub path: String,
    pub interval: Duration,
    pub timeout: Duration,
}

impl From<&HealthCheckConfig> for ProbeSettings {
    fn from(config: &HealthCheckConfig) -> Self {
        Self {
            path: config.path.clone(),
            interval: config.interval(),
            timeout: config.timeout(),
        }
    }
}

pub struct HealthProber {
    registry: Arc<BackendRegistry>,
    metrics: Arc<MetricsCollector>,
    settings: ProbeSettings,
    client: BackendClient,
}

impl HealthProber {
    pub fn new(
        registry: Arc<BackendRegistry>,
        metrics: Arc<MetricsCollector>,
        settings: ProbeSettings,
    ) -> Self {
        let client = backend_client();

        Self {
            registry,
            metrics,
            settings,
            client,
        }
    }

    pub fn settings(&self) -> &ProbeSettings {
        &self.settings
    }

    /// Probe immediately, then once per interval until `shutdown` fires.
    ///
    /// Probes already in flight when the signal arrives are not awaited and
    /// may still update the registry afterwards.
    pub async fn run(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval = ?self.settings.interval,
            timeout = ?self.settings.timeout,
            path = %self.settings.path,
            "Health prober starting"
        );

        let mut ticker = time::interval(self.settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.check_all();
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health prober received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Launch one independent probe per registered backend.
    pub fn check_all(self: &Arc<Self>) {
        for backend in self.registry.snapshot() {
            let prober = Arc::clone(self);
            tokio::spawn(async move {
                prober.check_backend(&backend).await;
            });
        }
    }

    /// Probe one backend and apply the result. Returns the computed health.
    pub async fn check_backend(&self, backend: &Backend) -> bool {
        let healthy = match self.probe(backend).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    backend = %backend.id(),
                    code = %e.code(),
                    error = %e,
                    "Health check failed"
                );
                false
            }
        };

        self.metrics.record_health_check(backend.id(), healthy);

        if healthy != backend.is_healthy() && self.registry.set_health(backend.id(), healthy) {
            if healthy {
                tracing::info!(backend = %backend.id(), url = %backend.url(), "Backend is now healthy");
            } else {
                tracing::warn!(backend = %backend.id(), url = %backend.url(), "Backend is now unhealthy");
            }
            self.metrics
                .update_backend_counts(self.registry.healthy_count(), self.registry.count());
        }

        healthy
    }

    async fn probe(&self, backend: &Backend) -> Result<(), LoadBalancerError> {
        let url = format!("{}{}", backend.base(), self.settings.path);

        let request = Request::get(&url)
            .header(header::USER_AGENT, PROBE_USER_AGENT)
            .body(Body::empty())
            .map_err(|e| {
                LoadBalancerError::health_check_failed(backend.id())
                    .with_cause(e)
                    .with_context("url", &url)
            })?;

        match time::timeout(self.settings.timeout, self.client.request(request)).await {
            Ok(Ok(response)) if response.status() == StatusCode::OK => Ok(()),
            Ok(Ok(response)) => Err(LoadBalancerError::health_check_failed(backend.id())
                .with_context("status_code", response.status().as_u16())
                .with_context("url", &url)),
            Ok(Err(e)) => Err(LoadBalancerError::health_check_failed(backend.id())
                .with_cause(e)
                .with_context("url", &url)),
            Err(_) => Err(LoadBalancerError::health_check_timeout(backend.id())
                .with_context("url", &url)
                .with_context("timeout_ms", self.settings.timeout.as_millis())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;
    use axum::{routing::get, Router};
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicU16, Ordering};
    use tokio::net::TcpListener;

    async fn serve(router: Router) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    async fn closed_addr() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    }

    fn prober(registry: Arc<BackendRegistry>, interval_ms: u64, timeout_ms: u64) -> Arc<HealthProber> {
        Arc::new(HealthProber::new(
            registry,
            Arc::new(MetricsCollector::new()),
            ProbeSettings {
                path: "/health".into(),
                interval: Duration::from_millis(interval_ms),
                timeout: Duration::from_millis(timeout_ms),
            },
        ))
    }

    #[tokio::test]
    async fn test_ok_status_is_healthy() {
        let addr = serve(Router::new().route("/health", get(|| async { "ok" }))).await;
        let registry = Arc::new(BackendRegistry::new());
        let backend = registry.add(&format!("http://{}", addr)).unwrap();

        assert!(prober(registry.clone(), 1000, 500).check_backend(&backend).await);
        assert_eq!(registry.healthy_count(), 1);
    }

    #[tokio::test]
    async fn test_non_200_marks_unhealthy() {
        let addr = serve(Router::new().route(
            "/health",
            get(|| async { (StatusCode::NO_CONTENT, "") }),
        ))
        .await;
        let registry = Arc::new(BackendRegistry::new());
        let backend = registry.add(&format!("http://{}", addr)).unwrap();
        let prober = prober(registry.clone(), 1000, 500);

        assert!(!prober.check_backend(&backend).await);
        assert!(!registry.get(backend.id()).unwrap().is_healthy());

        let s = prober.metrics.snapshot();
        assert_eq!(s.health_check_failures[backend.id()], 1);
        assert_eq!(s.healthy_backends, 0);
        assert_eq!(s.total_backends, 1);
    }

    #[tokio::test]
    async fn test_connection_refused_marks_unhealthy() {
        let addr = closed_addr().await;
        let registry = Arc::new(BackendRegistry::new());
        let backend = registry.add(&format!("http://{}", addr)).unwrap();

        let prober = prober(registry.clone(), 1000, 500);
        let err = prober.probe(&backend).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::HealthCheckFailed);

        assert!(!prober.check_backend(&backend).await);
        assert_eq!(registry.healthy_count(), 0);
    }

    #[tokio::test]
    async fn test_slow_backend_times_out() {
        let addr = serve(Router::new().route(
            "/health",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                "late"
            }),
        ))
        .await;
        let registry = Arc::new(BackendRegistry::new());
        let backend = registry.add(&format!("http://{}", addr)).unwrap();

        let err = prober(registry, 1000, 50).probe(&backend).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::HealthCheckTimeout);
    }

    #[tokio::test]
    async fn test_sends_user_agent() {
        let addr = serve(Router::new().route(
            "/health",
            get(|headers: axum::http::HeaderMap| async move {
                match headers.get(header::USER_AGENT) {
                    Some(ua) if ua == PROBE_USER_AGENT => StatusCode::OK,
                    _ => StatusCode::BAD_REQUEST,
                }
            }),
        ))
        .await;
        let registry = Arc::new(BackendRegistry::new());
        let backend = registry.add(&format!("http://{}", addr)).unwrap();

        assert!(prober(registry, 1000, 500).check_backend(&backend).await);
    }

    #[tokio::test]
    async fn test_loop_tracks_transitions_until_stopped() {
        let status = Arc::new(AtomicU16::new(200));
        let s = status.clone();
        let addr = serve(Router::new().route(
            "/health",
            get(move || {
                let s = s.clone();
                async move { StatusCode::from_u16(s.load(Ordering::SeqCst)).unwrap() }
            }),
        ))
        .await;

        let registry = Arc::new(BackendRegistry::new());
        let backend = registry.add(&format!("http://{}", addr)).unwrap();
        let prober = prober(registry.clone(), 100, 50);

        let (tx, rx) = broadcast::channel(1);
        let handle = tokio::spawn(prober.clone().run(rx));

        status.store(503, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(350)).await;
        assert!(!registry.get(backend.id()).unwrap().is_healthy());

        status.store(200, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(350)).await;
        assert!(registry.get(backend.id()).unwrap().is_healthy());

        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("prober loop should exit after stop")
            .unwrap();
    }
}
