//! reqwest-backed upstream client.

use std::time::Duration;

use async_trait::async_trait;

use crate::config::TimeoutConfig;
use crate::upstream::{Upstream, UpstreamBody, UpstreamError, UpstreamRequest, UpstreamResponse};

/// Pooled HTTP(S) client shared by all requests.
///
/// Redirects are never followed so `Location` headers reach the rewriter,
/// and upstream certificates are not verified: targets are arbitrary
/// user-supplied hosts.
#[derive(Debug, Clone)]
pub struct ReqwestUpstream {
    client: reqwest::Client,
}

impl ReqwestUpstream {
    pub fn new(timeouts: &TimeoutConfig) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .danger_accept_invalid_certs(true)
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .timeout(Duration::from_secs(timeouts.request_secs))
            .build()
            .map_err(UpstreamError::Build)?;
        Ok(Self { client })
    }
}

fn classify(url: &str, err: reqwest::Error) -> UpstreamError {
    if err.is_timeout() {
        UpstreamError::Timeout { url: url.to_string() }
    } else {
        UpstreamError::Request {
            url: url.to_string(),
            reason: err.to_string(),
        }
    }
}

#[async_trait]
impl Upstream for ReqwestUpstream {
    async fn forward(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError> {
        let url = request.url.to_string();
        let builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);

        let builder = match request.body {
            UpstreamBody::Empty => builder,
            UpstreamBody::Form(pairs) => builder.form(&pairs),
            UpstreamBody::Raw(bytes) => builder.body(bytes),
        };

        let response = builder.send().await.map_err(|e| classify(&url, e))?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(|e| classify(&url, e))?;

        tracing::debug!(url = %url, status = %status, bytes = body.len(), "Upstream responded");

        Ok(UpstreamResponse { status, headers, body })
    }
}
