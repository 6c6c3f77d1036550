//! Shared utilities for integration tests.
//!
//! Every helper binds to an ephemeral port on 127.0.0.1 so tests can run
//! in parallel.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::Request,
    http::{HeaderMap, Method, Uri},
    response::AppendHeaders,
    routing::get,
    Json, Router,
};
use balancer_proxy::health::ProbeSettings;
use balancer_proxy::lifecycle::Shutdown;
use balancer_proxy::proxy::EngineSettings;
use balancer_proxy::{ForwardingEngine, HttpServer};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Path used for health probes in tests.
pub const HEALTH_PATH: &str = "/health";

/// Engine settings with a long probe interval so only the initial probe runs.
pub fn quiet_settings() -> EngineSettings {
    EngineSettings {
        probe: ProbeSettings {
            path: HEALTH_PATH.into(),
            interval: Duration::from_secs(3600),
            timeout: Duration::from_millis(500),
        },
        backend_timeout: Duration::from_secs(2),
    }
}

/// Engine settings with millisecond probe timing.
pub fn fast_settings() -> EngineSettings {
    EngineSettings {
        probe: ProbeSettings {
            path: HEALTH_PATH.into(),
            interval: Duration::from_millis(50),
            timeout: Duration::from_millis(200),
        },
        backend_timeout: Duration::from_secs(2),
    }
}

pub fn url(addr: SocketAddr) -> String {
    format!("http://{}", addr)
}

/// Serve `router` on an ephemeral port.
pub async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// Backend that answers every path with `name`.
pub async fn start_named_backend(name: &'static str) -> SocketAddr {
    serve(Router::new().fallback(get(move || async move { name }))).await
}

/// Backend that describes the request it received as JSON.
///
/// Response carries `x-backend: echo` twice so multi-valued headers can be
/// checked on the way back.
pub async fn start_echo_backend() -> SocketAddr {
    async fn echo(
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: Bytes,
    ) -> (AppendHeaders<[(&'static str, &'static str); 2]>, Json<Value>) {
        let mut seen: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, value) in &headers {
            seen.entry(name.to_string())
                .or_default()
                .push(value.to_str().unwrap_or_default().to_string());
        }
        (
            AppendHeaders([("x-backend", "echo"), ("x-backend", "echo-2")]),
            Json(json!({
                "method": method.as_str(),
                "path": uri.path(),
                "query": uri.query(),
                "headers": seen,
                "body": String::from_utf8_lossy(&body),
            })),
        )
    }

    serve(Router::new().fallback(echo)).await
}

/// Raw TCP backend whose reply is computed per request from the request path.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            tokio::spawn(async move {
                let Some(path) = read_request_path(&mut socket).await else {
                    return;
                };
                let (status, body) = f(path).await;
                let status_text = match status {
                    200 => "200 OK",
                    404 => "404 Not Found",
                    500 => "500 Internal Server Error",
                    502 => "502 Bad Gateway",
                    503 => "503 Service Unavailable",
                    _ => "200 OK",
                };
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_text,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// Read a request head and return its path. Bodies are not expected.
async fn read_request_path(socket: &mut tokio::net::TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let head = String::from_utf8_lossy(&buf);
    let line = head.lines().next()?;
    line.split_whitespace().nth(1).map(str::to_string)
}

/// Raw TCP backend that sends headers announcing `content_length` bytes,
/// writes `prefix`, then stalls without closing.
pub async fn start_stalling_backend(prefix: &'static [u8], content_length: usize) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                if read_request_path(&mut socket).await.is_none() {
                    return;
                }
                let head = format!("HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n", content_length);
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(prefix).await;
                let _ = socket.flush().await;
                tokio::time::sleep(Duration::from_secs(30)).await;
            });
        }
    });

    addr
}

/// Address nothing listens on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// In-process router over an engine, without starting the prober.
pub fn router(backends: &[String], settings: EngineSettings) -> (Arc<ForwardingEngine>, Router) {
    let engine = Arc::new(ForwardingEngine::new(backends, settings).unwrap());
    let router = HttpServer::new(engine.clone()).router();
    (engine, router)
}

/// Full server on an ephemeral port, prober included.
pub async fn start_proxy(backends: &[String], settings: EngineSettings) -> (SocketAddr, Arc<ForwardingEngine>, Shutdown) {
    let engine = Arc::new(ForwardingEngine::new(backends, settings).unwrap());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(engine.clone());
    let stop = shutdown.subscribe();
    tokio::spawn(async move {
        server.run(listener, stop).await.unwrap();
    });

    (addr, engine, shutdown)
}

/// HTTP client that ignores any proxy configured in the environment.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Poll `check` until it holds or `timeout` elapses.
pub async fn wait_until<F: Fn() -> bool>(timeout: Duration, check: F) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}

pub async fn body_string(response: axum::response::Response) -> String {
    use http_body_util::BodyExt;
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_bytes(response: axum::response::Response) -> Bytes {
    use http_body_util::BodyExt;
    response.into_body().collect().await.unwrap().to_bytes()
}

pub fn get_request(path: &str) -> Request {
    Request::builder().uri(path).body(axum::body::Body::empty()).unwrap()
}
