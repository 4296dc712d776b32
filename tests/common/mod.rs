//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use tokio::net::TcpListener;

use subdomain_proxy::upstream::{Upstream, UpstreamError, UpstreamRequest, UpstreamResponse};
use subdomain_proxy::{Assets, HttpServer, ProxyConfig, Shutdown};

pub const BOOTSTRAP: &str = "/*bootstrap*/";
pub const LANDING: &str = "<h1>landing</h1>";

type Responder = dyn Fn(&UpstreamRequest) -> Result<UpstreamResponse, UpstreamError> + Send + Sync;

/// Upstream stand-in that records every forwarded request.
pub struct MockUpstream {
    responder: Box<Responder>,
    requests: Mutex<Vec<UpstreamRequest>>,
}

impl MockUpstream {
    pub fn new<F>(responder: F) -> Arc<Self>
    where
        F: Fn(&UpstreamRequest) -> Result<UpstreamResponse, UpstreamError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Always answer with the same response.
    pub fn fixed(response: UpstreamResponse) -> Arc<Self> {
        Self::new(move |_| Ok(response.clone()))
    }

    pub fn requests(&self) -> Vec<UpstreamRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Upstream for MockUpstream {
    async fn forward(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError> {
        let result = (self.responder)(&request);
        self.requests.lock().unwrap().push(request);
        result
    }
}

/// Build an upstream response from static parts.
pub fn response(status: u16, headers: &[(&str, &str)], body: &str) -> UpstreamResponse {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        map.append(
            HeaderName::from_bytes(name.as_bytes()).unwrap(),
            HeaderValue::from_str(value).unwrap(),
        );
    }
    UpstreamResponse {
        status: StatusCode::from_u16(status).unwrap(),
        headers: map,
        body: Bytes::from(body.to_string()),
    }
}

pub fn html(body: &str) -> UpstreamResponse {
    response(200, &[("content-type", "text/html; charset=utf-8")], body)
}

/// Markup the proxy injects for [`BOOTSTRAP`] under `base_domain`.
pub fn injected_script(base_domain: &str) -> String {
    format!(r#"<script data-proxy-base=".{}">{}</script>"#, base_domain, BOOTSTRAP)
}

pub fn test_assets() -> Assets {
    Assets::new(BOOTSTRAP, LANDING)
}

/// A proxy listening on an ephemeral loopback port.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
}

impl TestProxy {
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// `http://<host>:<port><path>` against this proxy.
    pub fn url(&self, host: &str, path: &str) -> String {
        format!("http://{}:{}{}", host, self.port(), path)
    }

    /// reqwest client that resolves the given hosts to the proxy and never
    /// follows redirects.
    pub fn client(&self, hosts: &[&str]) -> reqwest::Client {
        let mut builder = reqwest::Client::builder()
            .no_proxy()
            .redirect(reqwest::redirect::Policy::none());
        for host in hosts {
            builder = builder.resolve(host, self.addr);
        }
        builder.build().unwrap()
    }
}

impl Drop for TestProxy {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn spawn_proxy(config: ProxyConfig, upstream: Arc<dyn Upstream>) -> TestProxy {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::with_upstream(config, test_assets(), upstream);
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestProxy { addr, shutdown }
}
