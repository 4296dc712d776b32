//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method, status, route
//! - `proxy_request_duration_seconds` (histogram): latency by route
//! - `proxy_html_rewrites_total` (counter): rewritten HTML documents
//! - `proxy_html_urls_rewritten_total` (counter): rewritten attribute URLs
//! - `proxy_redirect_rewrites_total` (counter): rewritten Location headers

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
/// Must run inside the Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record a finished request.
pub fn record_request(method: &str, status: u16, route: &'static str, start: Instant) {
    metrics::counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "route" => route
    )
    .increment(1);
    metrics::histogram!("proxy_request_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}

/// Record one rewritten HTML document.
pub fn record_html_rewrite(urls_rewritten: usize) {
    metrics::counter!("proxy_html_rewrites_total").increment(1);
    metrics::counter!("proxy_html_urls_rewritten_total").increment(urls_rewritten as u64);
}

/// Record one rewritten `Location` header.
pub fn record_redirect_rewrite() {
    metrics::counter!("proxy_redirect_rewrites_total").increment(1);
}
