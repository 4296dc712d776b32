//! Upstream forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! http::server (UpstreamRequest)
//!     → Upstream::forward (one call, no retries)
//!     → client.rs (reqwest: pooled, no redirects, no TLS verification)
//!     → UpstreamResponse (fully buffered) back to http::response
//! ```
//!
//! # Design Decisions
//! - One trait for "forward request, await response"; the runtime flavor is
//!   chosen at startup, not by a second implementation
//! - The client is built once and injected through `AppState`
//! - Responses are buffered because HTML bodies are rewritten whole

pub mod client;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode};
use thiserror::Error;
use url::Url;

pub use client::ReqwestUpstream;

/// Body sent upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamBody {
    Empty,
    /// Decoded `application/x-www-form-urlencoded` pairs, re-encoded on send.
    Form(Vec<(String, String)>),
    Raw(Bytes),
}

/// Request derived from the inbound request and its resolved target.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: UpstreamBody,
}

/// Buffered upstream response.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Errors that can occur while talking to an upstream.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The HTTP client could not be constructed.
    #[error("failed to build upstream client: {0}")]
    Build(#[source] reqwest::Error),

    /// Connect or request deadline exceeded.
    #[error("upstream {url} timed out")]
    Timeout { url: String },

    /// Connection, protocol or body failure.
    #[error("upstream {url} failed: {reason}")]
    Request { url: String, reason: String },
}

/// Forwards one request to its upstream and waits for the full response.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn forward(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError>;
}
