//! CORS middleware.
//!
//! Preflights are answered before any proxying. Every other response gets
//! the same permissive headers, with the request's `Origin` echoed back,
//! whenever the request carried one.

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

pub const ALLOW_HEADERS: &str = "Content-Type, Authorization, X-Requested-With";
pub const ALLOW_METHODS: &str = "GET, POST, OPTIONS, PUT, DELETE";

/// Add the four CORS headers for `origin`, replacing any upstream values.
pub fn apply_cors_headers(headers: &mut HeaderMap, origin: &HeaderValue) {
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
}

/// Empty 200, annotated only when an origin was supplied.
pub fn preflight_response(origin: Option<&HeaderValue>) -> Response {
    let mut response = StatusCode::OK.into_response();
    if let Some(origin) = origin {
        apply_cors_headers(response.headers_mut(), origin);
    }
    response
}

pub async fn cors_middleware(request: Request<Body>, next: Next) -> Response {
    let origin = request.headers().get(header::ORIGIN).cloned();

    if request.method() == Method::OPTIONS {
        tracing::debug!(path = %request.uri().path(), origin = ?origin, "Preflight answered");
        return preflight_response(origin.as_ref());
    }

    let mut response = next.run(request).await;
    if let Some(origin) = origin {
        apply_cors_headers(response.headers_mut(), &origin);
    }
    response
}
