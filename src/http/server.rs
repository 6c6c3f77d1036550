//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the metrics and proxy handlers
//! - Wire up middleware (tracing)
//! - Bind server to listener
//! - Start and stop the health prober with the server

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::observability::metrics;
use crate::proxy::ForwardingEngine;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ForwardingEngine>,
}

/// HTTP server for the load balancer.
pub struct HttpServer {
    router: Router,
    engine: Arc<ForwardingEngine>,
}

impl HttpServer {
    pub fn new(engine: Arc<ForwardingEngine>) -> Self {
        let state = AppState {
            engine: engine.clone(),
        };
        let router = Self::build_router(state);
        Self { router, engine }
    }

    /// `/metrics` is served locally; every other path is proxied.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/metrics", any(metrics_handler))
            .fallback(proxy_handler)
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// The fully layered router, for embedding or in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then stop the health prober.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            strategy = self.engine.strategy_name(),
            "HTTP server starting"
        );

        self.engine.start();

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        self.engine.stop();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    state.engine.forward(request).await
}

async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.engine.metrics_snapshot();
    ([(header::CONTENT_TYPE, metrics::CONTENT_TYPE)], metrics::render(&snapshot))
}
