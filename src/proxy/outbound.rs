//! Outbound request construction and response relay.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{header, Request, Response};
use http_body_util::BodyExt;
use hyper::body::{Body as HttpBody, Bytes, Frame, Incoming, SizeHint};
use tokio::time::{Instant, Sleep};

use crate::errors::{BoxError, LoadBalancerError};
use crate::load_balancer::Backend;

/// Rebuild an inbound request so it targets `backend`.
///
/// Method, headers and query string are carried over verbatim and the body
/// is streamed through without buffering. `Host` is dropped so the client
/// derives it from the backend URL.
pub fn build_outbound(backend: &Backend, request: Request<Body>) -> Result<Request<Body>, LoadBalancerError> {
    let (parts, body) = request.into_parts();
    let target = backend.target(parts.uri.path(), parts.uri.query());

    let mut headers = parts.headers;
    headers.remove(header::HOST);

    let mut builder = Request::builder().method(parts.method).uri(&target);
    if let Some(slot) = builder.headers_mut() {
        *slot = headers;
    }

    builder.body(body).map_err(|e| {
        LoadBalancerError::request_failed(e)
            .with_context("backend", backend.id())
            .with_context("url", &target)
    })
}

/// Turn a backend response into the caller's response.
///
/// Status and headers are kept as-is. The body keeps streaming until
/// `deadline`; past it the stream is cut. Errors while streaming can no
/// longer change the status line, so they are only logged.
pub fn relay(response: Response<Incoming>, backend_id: &str, deadline: Instant) -> Response<Body> {
    let (parts, body) = response.into_parts();
    let backend_id = backend_id.to_string();

    let body = with_deadline(body, &backend_id, deadline).map_err(move |e| {
        let err = LoadBalancerError::response_copy(e.to_string()).with_context("backend", &backend_id);
        tracing::warn!(backend = %backend_id, code = %err.code(), error = %err, "Error copying response body");
        e
    });

    Response::from_parts(parts, Body::new(body))
}

/// Wrap `body` so it fails with a backend timeout once `deadline` passes.
pub fn with_deadline<B>(body: B, backend_id: &str, deadline: Instant) -> DeadlineBody<B> {
    DeadlineBody {
        inner: Box::pin(body),
        sleep: Box::pin(tokio::time::sleep_until(deadline)),
        backend_id: backend_id.to_string(),
        expired: false,
    }
}

/// Body adapter bounding the time a response may keep streaming.
pub struct DeadlineBody<B> {
    inner: Pin<Box<B>>,
    sleep: Pin<Box<Sleep>>,
    backend_id: String,
    expired: bool,
}

impl<B> HttpBody for DeadlineBody<B>
where
    B: HttpBody<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    type Data = Bytes;
    type Error = BoxError;

    fn poll_frame(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Bytes>, BoxError>>> {
        let this = self.get_mut();
        if this.expired {
            return Poll::Ready(None);
        }

        if let Poll::Ready(frame) = this.inner.as_mut().poll_frame(cx) {
            return Poll::Ready(frame.map(|r| r.map_err(Into::into)));
        }

        if this.sleep.as_mut().poll(cx).is_ready() {
            this.expired = true;
            let err = LoadBalancerError::backend_timeout(&this.backend_id).with_context("phase", "body");
            return Poll::Ready(Some(Err(err.into())));
        }

        Poll::Pending
    }

    fn is_end_stream(&self) -> bool {
        self.expired || self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}
