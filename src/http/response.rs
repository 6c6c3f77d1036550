//! Error responses.
//!
//! # Responsibilities
//! - Turn a structured error into the caller-visible status and body
//!
//! # Design Decisions
//! - Body is a small JSON object: reason phrase, numeric code, message
//! - Diagnostic context stays in the logs, never in the response

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::errors::LoadBalancerError;

/// Render `err` with an explicit status, e.g. a relayed backend 5xx.
pub fn error_response(err: &LoadBalancerError, status: StatusCode) -> Response {
    let body = json!({
        "error": status.canonical_reason().unwrap_or("Error"),
        "code": err.code().as_u16(),
        "message": err.message(),
    });

    (status, Json(body)).into_response()
}

impl IntoResponse for LoadBalancerError {
    fn into_response(self) -> Response {
        error_response(&self, self.status_code())
    }
}
