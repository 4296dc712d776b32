//! Request handling and transformation.
//!
//! # Responsibilities
//! - Decide which inbound methods are forwarded
//! - Strip transport-specific headers before forwarding
//! - Turn the inbound body into the upstream body
//!
//! # Design Decisions
//! - Cookies travel in the forwarded `Cookie` header untouched
//! - Form posts are decoded and re-encoded; other payloads are sent raw
//! - GET never carries a body upstream

use axum::body::Bytes;
use axum::http::{header, HeaderMap, Method};

use crate::upstream::UpstreamBody;

/// Headers never forwarded upstream. The first four go stale once the proxy
/// re-frames the request; the rest are hop-by-hop.
pub const REQUEST_EXCLUDED_HEADERS: &[&str] = &[
    "host",
    "content-length",
    "connection",
    "accept-encoding",
    "transfer-encoding",
    "te",
    "upgrade",
    "keep-alive",
    "proxy-connection",
];

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// GET and POST are always forwarded; everything else only when enabled.
pub fn is_forwarded_method(method: &Method, forward_all_methods: bool) -> bool {
    *method == Method::GET || *method == Method::POST || forward_all_methods
}

/// Copy inbound headers minus the excluded set, keeping repeated values.
pub fn forward_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(inbound.len());
    for (name, value) in inbound {
        if !REQUEST_EXCLUDED_HEADERS.contains(&name.as_str()) {
            headers.append(name.clone(), value.clone());
        }
    }
    headers
}

/// Build the upstream body for a forwarded request.
pub fn forward_body(method: &Method, headers: &HeaderMap, body: Bytes) -> UpstreamBody {
    if *method == Method::GET {
        return UpstreamBody::Empty;
    }

    if *method == Method::POST {
        let pairs = match content_type(headers) {
            Some(ct) if is_form_type(ct) => Some(decode_form(&body)),
            Some(_) => None,
            None => untyped_form(&body),
        };
        if let Some(pairs) = pairs {
            return UpstreamBody::Form(pairs);
        }
    }

    if body.is_empty() {
        UpstreamBody::Empty
    } else {
        UpstreamBody::Raw(body)
    }
}

fn content_type(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok())
}

fn is_form_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
}

fn decode_form(body: &[u8]) -> Vec<(String, String)> {
    url::form_urlencoded::parse(body).into_owned().collect()
}

/// An untyped body is treated as a form only when re-encoding the decoded
/// pairs reproduces it byte for byte; anything else is sent raw.
fn untyped_form(body: &[u8]) -> Option<Vec<(String, String)>> {
    let pairs = decode_form(body);
    let encoded = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(&pairs)
        .finish();
    (encoded.as_bytes() == body).then_some(pairs)
}
