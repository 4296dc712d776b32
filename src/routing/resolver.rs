//! Target resolution from the inbound host.
//!
//! # Responsibilities
//! - Strip the port from the host header (IPv6 literals included)
//! - Match the `.<base_domain>` suffix case-insensitively
//! - Return the label in front of it as the upstream host
//!
//! # Design Decisions
//! - Host matching is case-insensitive (RFC 9110)
//! - Pure function of the host string; built once, shared read-only
//! - Empty labels and bare base domains are "no target"

use axum::http::{header, HeaderMap, Uri};
use url::Url;

/// Scheme used for every upstream request.
pub const UPSTREAM_SCHEME: &str = "https";

/// Upstream host decoded from a proxied subdomain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target(String);

impl Target {
    /// Upstream host name, e.g. `news.example.com`.
    pub fn host(&self) -> &str {
        &self.0
    }

    /// Absolute upstream URL for an inbound path and query, copied verbatim.
    pub fn upstream_url(&self, path_and_query: &str) -> Result<Url, url::ParseError> {
        let path_and_query = if path_and_query.starts_with('/') {
            path_and_query.to_string()
        } else {
            format!("/{}", path_and_query)
        };
        Url::parse(&format!("{}://{}{}", UPSTREAM_SCHEME, self.0, path_and_query))
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Maps `{label}.<base_domain>[:port]` hosts to upstream targets.
#[derive(Debug, Clone)]
pub struct TargetResolver {
    /// Lowercased suffix including the leading dot, e.g. `.localhost`.
    suffix: String,
}

impl TargetResolver {
    /// Create a resolver for the given base domain.
    pub fn new(base_domain: &str) -> Self {
        Self {
            suffix: format!(".{}", base_domain.trim_matches('.').to_ascii_lowercase()),
        }
    }

    /// Resolve a raw host value. Returns `None` when no target label is present.
    pub fn resolve(&self, host: &str) -> Option<Target> {
        let host = strip_port(host.trim()).trim_end_matches('.').to_ascii_lowercase();
        let label = host.strip_suffix(&self.suffix)?;
        if label.is_empty() || label.starts_with('.') {
            return None;
        }
        Some(Target(label.to_string()))
    }

    /// Resolve from request headers, falling back to the URI authority (HTTP/2).
    pub fn resolve_request(&self, headers: &HeaderMap, uri: &Uri) -> Option<Target> {
        let host = headers
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .or_else(|| uri.authority().map(|a| a.as_str()))?;
        self.resolve(host)
    }
}

fn strip_port(host: &str) -> &str {
    match host.rfind(':') {
        Some(idx)
            if !host[idx..].contains(']')
                && host[idx + 1..].chars().all(|c| c.is_ascii_digit()) =>
        {
            &host[..idx]
        }
        _ => host,
    }
}
