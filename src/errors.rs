//! Structured error taxonomy.
//!
//! # Responsibilities
//! - Define the fixed set of failure codes shared by every subsystem
//! - Map each code to its canonical HTTP status
//! - Carry a wrapped cause and key/value diagnostic context
//!
//! # Design Decisions
//! - Codes are grouped in contiguous numeric ranges, one range per category
//! - Category membership is a range check on the code, not a type hierarchy
//! - Context values are stored pre-formatted so errors stay `Send + Sync`

use std::collections::BTreeMap;
use std::fmt;

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Boxed cause carried inside a [`LoadBalancerError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure codes.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorCode {
    // Configuration
    InvalidConfig = 1000,
    InvalidPort = 1001,
    InvalidBackend = 1002,
    InvalidHealthCheck = 1003,
    InvalidTimeout = 1004,

    // Backend
    BackendUnavailable = 1005,
    BackendTimeout = 1006,
    BackendConnection = 1007,
    BackendResponse = 1008,
    NoHealthyBackends = 1009,

    // Load balancer
    StrategyFailure = 1010,
    PoolEmpty = 1011,
    MetricsFailure = 1012,

    // Health check
    HealthCheckFailed = 1013,
    HealthCheckTimeout = 1014,

    // Request
    RequestTimeout = 1015,
    RequestFailed = 1016,
    ResponseCopy = 1017,
}

/// Error categories, one per code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Backend,
    LoadBalancer,
    HealthCheck,
    Request,
}

impl ErrorCode {
    /// Numeric value of the code.
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    /// Category this code belongs to.
    pub fn category(self) -> ErrorCategory {
        match self.as_u16() {
            1000..=1004 => ErrorCategory::Configuration,
            1005..=1009 => ErrorCategory::Backend,
            1010..=1012 => ErrorCategory::LoadBalancer,
            1013..=1014 => ErrorCategory::HealthCheck,
            _ => ErrorCategory::Request,
        }
    }

    /// Canonical externally visible status for this code.
    pub fn status_code(self) -> StatusCode {
        match self {
            ErrorCode::InvalidConfig
            | ErrorCode::InvalidPort
            | ErrorCode::InvalidBackend
            | ErrorCode::InvalidHealthCheck
            | ErrorCode::InvalidTimeout => StatusCode::BAD_REQUEST,

            ErrorCode::BackendUnavailable | ErrorCode::NoHealthyBackends | ErrorCode::PoolEmpty => {
                StatusCode::SERVICE_UNAVAILABLE
            }

            ErrorCode::BackendTimeout | ErrorCode::RequestTimeout => StatusCode::GATEWAY_TIMEOUT,

            ErrorCode::BackendConnection | ErrorCode::BackendResponse => StatusCode::BAD_GATEWAY,

            ErrorCode::HealthCheckFailed | ErrorCode::HealthCheckTimeout => {
                StatusCode::SERVICE_UNAVAILABLE
            }

            ErrorCode::StrategyFailure
            | ErrorCode::MetricsFailure
            | ErrorCode::RequestFailed
            | ErrorCode::ResponseCopy => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}

/// A coded, context-bearing failure.
#[derive(Debug, Error)]
#[error("[{code}] {message}{}", cause_suffix(.cause))]
pub struct LoadBalancerError {
    code: ErrorCode,
    message: String,
    #[source]
    cause: Option<BoxError>,
    context: BTreeMap<String, String>,
    timestamp: DateTime<Utc>,
}

fn cause_suffix(cause: &Option<BoxError>) -> String {
    match cause {
        Some(cause) => format!(": {}", cause),
        None => String::new(),
    }
}

impl LoadBalancerError {
    /// Create an error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            cause: None,
            context: BTreeMap::new(),
            timestamp: Utc::now(),
        }
    }

    /// Attach the underlying cause.
    pub fn with_cause(mut self, cause: impl Into<BoxError>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Add a diagnostic key/value pair.
    pub fn with_context(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.context.insert(key.into(), value.to_string());
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn context(&self, key: &str) -> Option<&str> {
        self.context.get(key).map(String::as_str)
    }

    /// All diagnostic context, ordered by key.
    pub fn context_map(&self) -> &BTreeMap<String, String> {
        &self.context
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    /// True when this error carries the given code.
    pub fn is(&self, code: ErrorCode) -> bool {
        self.code == code
    }

    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    pub fn is_configuration(&self) -> bool {
        self.category() == ErrorCategory::Configuration
    }

    pub fn is_backend(&self) -> bool {
        self.category() == ErrorCategory::Backend
    }

    pub fn is_load_balancer(&self) -> bool {
        self.category() == ErrorCategory::LoadBalancer
    }

    pub fn is_health_check(&self) -> bool {
        self.category() == ErrorCategory::HealthCheck
    }

    pub fn is_request(&self) -> bool {
        self.category() == ErrorCategory::Request
    }

    // --- Configuration ---

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidConfig, message)
    }

    pub fn invalid_port(port: u32) -> Self {
        Self::new(ErrorCode::InvalidPort, format!("invalid port: {}", port))
            .with_context("port", port)
    }

    pub fn invalid_backend(backend: &str, cause: impl Into<BoxError>) -> Self {
        Self::new(ErrorCode::InvalidBackend, format!("invalid backend: {}", backend))
            .with_cause(cause)
            .with_context("backend", backend)
    }

    pub fn invalid_health_check(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidHealthCheck, message)
    }

    pub fn invalid_timeout(field: &str, secs: u64) -> Self {
        Self::new(
            ErrorCode::InvalidTimeout,
            format!("invalid {} timeout: {}s", field, secs),
        )
        .with_context("timeout_secs", secs)
        .with_context("field", field)
    }

    // --- Backend ---

    pub fn backend_unavailable(backend: &str) -> Self {
        Self::new(ErrorCode::BackendUnavailable, format!("backend unavailable: {}", backend))
            .with_context("backend", backend)
    }

    pub fn backend_timeout(backend: &str) -> Self {
        Self::new(ErrorCode::BackendTimeout, format!("backend timeout: {}", backend))
            .with_context("backend", backend)
    }

    pub fn backend_connection(backend: &str, cause: impl Into<BoxError>) -> Self {
        Self::new(
            ErrorCode::BackendConnection,
            format!("backend connection failed: {}", backend),
        )
        .with_cause(cause)
        .with_context("backend", backend)
    }

    pub fn backend_response(backend: &str, status: StatusCode) -> Self {
        Self::new(
            ErrorCode::BackendResponse,
            format!("backend response error: {} (status: {})", backend, status.as_u16()),
        )
        .with_context("backend", backend)
        .with_context("status_code", status.as_u16())
    }

    pub fn no_healthy_backends() -> Self {
        Self::new(ErrorCode::NoHealthyBackends, "no healthy backends available")
    }

    // --- Load balancer ---

    pub fn strategy_failure(strategy: &str) -> Self {
        Self::new(
            ErrorCode::StrategyFailure,
            format!("load balancing strategy failed: {}", strategy),
        )
        .with_context("strategy", strategy)
    }

    pub fn pool_empty() -> Self {
        Self::new(ErrorCode::PoolEmpty, "server pool is empty")
    }

    pub fn metrics_failure(cause: impl Into<BoxError>) -> Self {
        Self::new(ErrorCode::MetricsFailure, "metrics collection failed").with_cause(cause)
    }

    // --- Health check ---

    pub fn health_check_failed(backend: &str) -> Self {
        Self::new(ErrorCode::HealthCheckFailed, format!("health check failed: {}", backend))
            .with_context("backend", backend)
    }

    pub fn health_check_timeout(backend: &str) -> Self {
        Self::new(ErrorCode::HealthCheckTimeout, format!("health check timeout: {}", backend))
            .with_context("backend", backend)
    }

    // --- Request ---

    pub fn request_timeout() -> Self {
        Self::new(ErrorCode::RequestTimeout, "request timeout")
    }

    pub fn request_failed(cause: impl Into<BoxError>) -> Self {
        Self::new(ErrorCode::RequestFailed, "request failed").with_cause(cause)
    }

    pub fn response_copy(cause: impl Into<BoxError>) -> Self {
        Self::new(ErrorCode::ResponseCopy, "failed to copy response").with_cause(cause)
    }
}
