//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Count requests, failures and health check results per backend
//! - Track the current healthy/total backend gauges
//! - Produce immutable snapshots and render them as Prometheus text
//!
//! # Metrics
//! - `balancer_requests_total` (counter): every proxied request that reached a backend
//! - `balancer_requests_success_total` / `balancer_requests_failed_total` (counters)
//! - `balancer_backend_requests_total{backend}` / `balancer_backend_failures_total{backend}`
//! - `balancer_backend_request_duration_seconds_sum{backend}`: summed latency of successes
//! - `balancer_health_checks_total{backend,result}`: probe outcomes
//! - `balancer_backends{state}`: healthy and total backend gauges
//!
//! # Design Decisions
//! - One mutex guards every counter; snapshots copy under the same lock
//! - Rendering is a pure function of a snapshot

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

/// Content type of the text exposition.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4";

#[derive(Debug, Default)]
struct Counters {
    total_requests: u64,
    successful_requests: u64,
    failed_requests: u64,
    backend_requests: BTreeMap<String, u64>,
    backend_failures: BTreeMap<String, u64>,
    backend_latency: BTreeMap<String, Duration>,
    health_check_passes: BTreeMap<String, u64>,
    health_check_failures: BTreeMap<String, u64>,
    healthy_backends: usize,
    total_backends: usize,
}

/// Live counters shared by the forwarding engine and the health prober.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    counters: Mutex<Counters>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request the backend answered without a server error.
    pub fn record_success(&self, backend: &str, latency: Duration) {
        let mut c = self.counters.lock();
        c.total_requests += 1;
        c.successful_requests += 1;
        *c.backend_requests.entry(backend.to_string()).or_default() += 1;
        *c.backend_latency.entry(backend.to_string()).or_default() += latency;
    }

    /// Record a request that failed at, or because of, the backend.
    pub fn record_failure(&self, backend: &str) {
        let mut c = self.counters.lock();
        c.total_requests += 1;
        c.failed_requests += 1;
        *c.backend_failures.entry(backend.to_string()).or_default() += 1;
    }

    pub fn record_health_check(&self, backend: &str, passed: bool) {
        let mut c = self.counters.lock();
        let map = if passed {
            &mut c.health_check_passes
        } else {
            &mut c.health_check_failures
        };
        *map.entry(backend.to_string()).or_default() += 1;
    }

    pub fn update_backend_counts(&self, healthy: usize, total: usize) {
        let mut c = self.counters.lock();
        c.healthy_backends = healthy;
        c.total_backends = total;
    }

    /// Point-in-time copy of every counter.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let c = self.counters.lock();
        MetricsSnapshot {
            total_requests: c.total_requests,
            successful_requests: c.successful_requests,
            failed_requests: c.failed_requests,
            backend_requests: c.backend_requests.clone(),
            backend_failures: c.backend_failures.clone(),
            backend_latency: c.backend_latency.clone(),
            health_check_passes: c.health_check_passes.clone(),
            health_check_failures: c.health_check_failures.clone(),
            healthy_backends: c.healthy_backends,
            total_backends: c.total_backends,
            timestamp: Utc::now(),
        }
    }
}

/// Point-in-time view of the metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub backend_requests: BTreeMap<String, u64>,
    pub backend_failures: BTreeMap<String, u64>,
    pub backend_latency: BTreeMap<String, Duration>,
    pub health_check_passes: BTreeMap<String, u64>,
    pub health_check_failures: BTreeMap<String, u64>,
    pub healthy_backends: usize,
    pub total_backends: usize,
    pub timestamp: DateTime<Utc>,
}

impl MetricsSnapshot {
    /// Success rate as a percentage; 100 when nothing has been served yet.
    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            return 100.0;
        }
        self.successful_requests as f64 / self.total_requests as f64 * 100.0
    }

    /// Share of healthy backends as a percentage.
    pub fn healthy_percentage(&self) -> f64 {
        if self.total_backends == 0 {
            return 0.0;
        }
        self.healthy_backends as f64 / self.total_backends as f64 * 100.0
    }
}

/// Render a snapshot in the Prometheus text exposition format.
pub fn render(snapshot: &MetricsSnapshot) -> String {
    let mut out = String::new();

    header(&mut out, "balancer_requests_total", "Total number of requests processed", "counter");
    let _ = writeln!(out, "balancer_requests_total {}", snapshot.total_requests);

    header(&mut out, "balancer_requests_success_total", "Total number of successful requests", "counter");
    let _ = writeln!(out, "balancer_requests_success_total {}", snapshot.successful_requests);

    header(&mut out, "balancer_requests_failed_total", "Total number of failed requests", "counter");
    let _ = writeln!(out, "balancer_requests_failed_total {}", snapshot.failed_requests);

    header(&mut out, "balancer_backends", "Current number of backends by state", "gauge");
    let _ = writeln!(out, "balancer_backends{{state=\"healthy\"}} {}", snapshot.healthy_backends);
    let _ = writeln!(out, "balancer_backends{{state=\"total\"}} {}", snapshot.total_backends);

    header(&mut out, "balancer_backend_requests_total", "Total successful requests served by backend", "counter");
    for (backend, count) in &snapshot.backend_requests {
        let _ = writeln!(out, "balancer_backend_requests_total{{backend=\"{}\"}} {}", backend, count);
    }

    header(&mut out, "balancer_backend_failures_total", "Total failed requests by backend", "counter");
    for (backend, count) in &snapshot.backend_failures {
        let _ = writeln!(out, "balancer_backend_failures_total{{backend=\"{}\"}} {}", backend, count);
    }

    header(
        &mut out,
        "balancer_backend_request_duration_seconds_sum",
        "Summed latency of successful requests by backend",
        "counter",
    );
    for (backend, latency) in &snapshot.backend_latency {
        let _ = writeln!(
            out,
            "balancer_backend_request_duration_seconds_sum{{backend=\"{}\"}} {:.6}",
            backend,
            latency.as_secs_f64()
        );
    }

    header(&mut out, "balancer_health_checks_total", "Health check results by backend", "counter");
    for (backend, count) in &snapshot.health_check_passes {
        let _ = writeln!(
            out,
            "balancer_health_checks_total{{backend=\"{}\",result=\"pass\"}} {}",
            backend, count
        );
    }
    for (backend, count) in &snapshot.health_check_failures {
        let _ = writeln!(
            out,
            "balancer_health_checks_total{{backend=\"{}\",result=\"fail\"}} {}",
            backend, count
        );
    }

    out
}

fn header(out: &mut String, name: &str, help: &str, kind: &str) {
    let _ = writeln!(out, "# HELP {} {}", name, help);
    let _ = writeln!(out, "# TYPE {} {}", name, kind);
}
