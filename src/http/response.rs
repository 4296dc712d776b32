//! Response handling and transformation.
//!
//! # Responsibilities
//! - Filter upstream headers for the client
//! - Forward every `Set-Cookie` as its own header
//! - Rewrite HTML bodies and `Location` headers
//! - Regenerate `Content-Length` from the final body
//!
//! # Design Decisions
//! - Bodies are buffered; length and encoding change after rewriting
//! - A failed HTML rewrite falls back to the original bytes
//! - Upstream CSP headers are dropped so the injected script can run

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::Response;

use crate::observability::metrics;
use crate::rewrite::{is_html, rewrite_location, BodyRewriter, PublicOrigin};
use crate::upstream::UpstreamResponse;

/// Upstream headers never copied to the client.
pub const RESPONSE_EXCLUDED_HEADERS: &[&str] = &[
    "content-encoding",
    "content-length",
    "transfer-encoding",
    "connection",
    "content-security-policy",
];

/// Copy upstream headers minus the excluded set. Repeated headers such as
/// `Set-Cookie` stay separate entries.
pub fn filter_response_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(upstream.len());
    for (name, value) in upstream {
        if !RESPONSE_EXCLUDED_HEADERS.contains(&name.as_str()) {
            headers.append(name.clone(), value.clone());
        }
    }
    headers
}

/// Turn an upstream response into the response sent to the client.
///
/// `method` is the forwarded request's method: a `HEAD` response has no body
/// to rewrite and keeps the upstream `Content-Length`.
pub fn transform_response(
    upstream: UpstreamResponse,
    method: &Method,
    rewriter: &BodyRewriter,
    origin: &PublicOrigin,
) -> Response {
    let UpstreamResponse {
        status,
        headers: upstream_headers,
        body,
    } = upstream;

    let mut headers = filter_response_headers(&upstream_headers);

    let is_head = *method == Method::HEAD;
    let body = if !is_head && is_html(&upstream_headers) {
        rewrite_body(rewriter, body)
    } else {
        body
    };

    let location = headers
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    if let Some(location) = location {
        if let Some(rewritten) = rewrite_location(&location, origin) {
            match HeaderValue::from_str(&rewritten) {
                Ok(value) => {
                    tracing::debug!(from = %location, to = %rewritten, "Redirect rewrite");
                    headers.insert(header::LOCATION, value);
                    metrics::record_redirect_rewrite();
                }
                Err(e) => {
                    tracing::warn!(location = %rewritten, error = %e, "Rewritten Location is not a valid header value");
                }
            }
        }
    }

    if is_head {
        if let Some(length) = upstream_headers.get(header::CONTENT_LENGTH) {
            headers.insert(header::CONTENT_LENGTH, length.clone());
        }
    } else if carries_body(status) {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(body.len()));
    }

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

fn rewrite_body(rewriter: &BodyRewriter, body: Bytes) -> Bytes {
    match rewriter.rewrite(&body) {
        Ok(document) => {
            tracing::debug!(
                urls_rewritten = document.urls_rewritten,
                csp_removed = document.csp_removed,
                bytes = document.body.len(),
                "HTML document rewritten"
            );
            metrics::record_html_rewrite(document.urls_rewritten);
            Bytes::from(document.body)
        }
        Err(e) => {
            tracing::warn!(error = %e, "HTML rewrite failed; passing body through");
            body
        }
    }
}

fn carries_body(status: StatusCode) -> bool {
    !(status.is_informational() || status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED)
}
