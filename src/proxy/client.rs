//! Outbound HTTP client shared by the forwarding engine and the health prober.
//!
//! Backends may be `http://` or `https://`. TLS is only spoken towards the
//! backend; the listener itself stays plain HTTP.

use axum::body::Body;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

/// Client able to reach both plain and TLS backends.
pub type BackendClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Build a client trusting the webpki root set.
pub fn backend_client() -> BackendClient {
    let connector = HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .build();

    Client::builder(TokioExecutor::new()).build(connector)
}
