//! Request-scoped errors and their HTTP mapping.
//!
//! Every variant is recovered inside the request that raised it; none of
//! them stops the server.

use std::error::Error as _;

use axum::http::StatusCode;
use http_body_util::LengthLimitError;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::routing::LandingError;
use crate::upstream::UpstreamError;

#[derive(Debug, Error)]
pub enum ProxyError {
    /// `?url=` on the landing route could not be turned into a target.
    #[error("Invalid URL: {0}")]
    InvalidLandingUrl(#[from] LandingError),

    /// The subdomain label does not form a valid upstream URL.
    #[error("Invalid target `{host}`: {source}")]
    InvalidTarget {
        host: String,
        #[source]
        source: url::ParseError,
    },

    /// The inbound body could not be read (or exceeded the size limit).
    #[error("Failed to read request body: {0}")]
    Body(#[source] axum::Error),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::InvalidLandingUrl(_) | ProxyError::InvalidTarget { .. } => {
                StatusCode::BAD_REQUEST
            }
            ProxyError::Body(e) if exceeds_limit(e) => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::Body(_) => StatusCode::BAD_REQUEST,
            ProxyError::Upstream(UpstreamError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

/// True when a `LengthLimitError` sits anywhere in the source chain.
fn exceeds_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = err.source();
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let timeout = ProxyError::from(UpstreamError::Timeout { url: "https://a.test/".into() });
        assert_eq!(timeout.status(), StatusCode::GATEWAY_TIMEOUT);

        let failed = ProxyError::from(UpstreamError::Request {
            url: "https://a.test/".into(),
            reason: "connection refused".into(),
        });
        assert_eq!(failed.status(), StatusCode::BAD_GATEWAY);

        let landing = ProxyError::from(LandingError::MissingHost("file:///".into()));
        assert_eq!(landing.status(), StatusCode::BAD_REQUEST);
        assert!(landing.to_string().starts_with("Invalid URL: "));
    }

    #[tokio::test]
    async fn test_body_errors_split_by_cause() {
        let too_long = axum::body::to_bytes(axum::body::Body::from("more than four"), 4)
            .await
            .unwrap_err();
        assert_eq!(ProxyError::Body(too_long).status(), StatusCode::PAYLOAD_TOO_LARGE);

        let reset = axum::Error::new(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "client went away",
        ));
        assert_eq!(ProxyError::Body(reset).status(), StatusCode::BAD_REQUEST);
    }
}
