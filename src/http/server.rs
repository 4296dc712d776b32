//! HTTP server setup and the per-request proxy flow.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all proxy handler
//! - Wire up middleware (request ID, tracing, CORS, timeout, body limit)
//! - Resolve the target from the host, or serve the landing route
//! - Forward requests to the upstream and transform the response
//! - Serve over plain TCP or TLS with graceful shutdown

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, Request, StatusCode, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::assets::Assets;
use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::http::cors::cors_middleware;
use crate::http::request::{forward_body, forward_headers, is_forwarded_method};
use crate::http::response::transform_response;
use crate::observability::metrics;
use crate::rewrite::{BodyRewriter, PublicOrigin};
use crate::routing::{landing_redirect, Target, TargetResolver};
use crate::upstream::{ReqwestUpstream, Upstream, UpstreamError, UpstreamRequest};

/// Grace period for in-flight requests once shutdown starts.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Application state injected into handlers. Everything in it is built once
/// at startup and read concurrently afterwards.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<TargetResolver>,
    pub origin: Arc<PublicOrigin>,
    pub rewriter: Arc<BodyRewriter>,
    pub upstream: Arc<dyn Upstream>,
    pub landing_page: Bytes,
    pub forward_all_methods: bool,
    pub max_body_size: usize,
}

/// HTTP server for the subdomain proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a server backed by the pooled reqwest client.
    pub fn new(config: ProxyConfig, assets: Assets) -> Result<Self, UpstreamError> {
        let upstream = Arc::new(ReqwestUpstream::new(&config.timeouts)?);
        Ok(Self::with_upstream(config, assets, upstream))
    }

    /// Create a server that forwards through the given upstream.
    pub fn with_upstream(config: ProxyConfig, assets: Assets, upstream: Arc<dyn Upstream>) -> Self {
        let origin = PublicOrigin::from_config(&config);
        let rewriter = BodyRewriter::new(origin.clone(), assets.bootstrap_script());

        let state = AppState {
            resolver: Arc::new(TargetResolver::new(&config.proxy.base_domain)),
            origin: Arc::new(origin),
            rewriter: Arc::new(rewriter),
            upstream,
            landing_page: assets.landing_page(),
            forward_all_methods: config.proxy.forward_all_methods,
            max_body_size: config.proxy.max_body_size,
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        let exchange_timeout =
            Duration::from_secs(config.timeouts.request_secs + config.timeouts.connect_secs);

        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.proxy.max_body_size))
            .layer(TimeoutLayer::new(exchange_timeout))
            .layer(middleware::from_fn(cors_middleware))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, e.g. for driving requests in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Serve plain HTTP until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Serve HTTPS until the shutdown signal fires.
    pub async fn run_tls(
        self,
        listener: std::net::TcpListener,
        tls: RustlsConfig,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), io::Error> {
        let addr = listener.local_addr()?;
        listener.set_nonblocking(true)?;
        tracing::info!(address = %addr, "HTTPS server starting");

        let handle = axum_server::Handle::new();
        let shutdown_handle = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            tracing::info!("Shutdown signal received");
            shutdown_handle.graceful_shutdown(Some(DRAIN_TIMEOUT));
        });

        axum_server::from_tcp_rustls(listener, tls)
            .handle(handle)
            .serve(self.router.into_make_service())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}

/// Main proxy handler.
/// Resolves the target, then either serves the landing route or proxies.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let target = state.resolver.resolve_request(request.headers(), request.uri());
    let (route, result) = match target {
        None => ("landing", landing(&state, request.uri())),
        Some(target) => {
            tracing::debug!(
                request_id = %request_id,
                method = %method,
                target = %target,
                path = %path,
                "Proxying request"
            );
            ("proxy", proxy(&state, target, request).await)
        }
    };

    let response = result.unwrap_or_else(|e| {
        tracing::warn!(request_id = %request_id, path = %path, error = %e, "Request failed");
        e.into_response()
    });

    metrics::record_request(method.as_str(), response.status().as_u16(), route, start_time);
    response
}

/// Bare domain: redirect `?url=` into the proxy, or serve the landing page.
fn landing(state: &AppState, uri: &Uri) -> Result<Response, ProxyError> {
    let requested = uri.query().and_then(|query| {
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, value)| key == "url" && !value.is_empty())
            .map(|(_, value)| value.into_owned())
    });

    let Some(requested) = requested else {
        return Ok((
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            state.landing_page.clone(),
        )
            .into_response());
    };

    let location = landing_redirect(&requested, &state.origin)?;
    tracing::info!(url = %requested, location = %location, "Landing redirect");
    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}

/// Forward to the resolved target and transform the response.
async fn proxy(state: &AppState, target: Target, request: Request<Body>) -> Result<Response, ProxyError> {
    let method = request.method().clone();
    if !is_forwarded_method(&method, state.forward_all_methods) {
        tracing::warn!(method = %method, target = %target, "Method not forwarded; answering empty 200");
        return Ok(StatusCode::OK.into_response());
    }

    let path_and_query = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let url = target
        .upstream_url(path_and_query)
        .map_err(|source| ProxyError::InvalidTarget {
            host: target.host().to_string(),
            source,
        })?;

    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, state.max_body_size)
        .await
        .map_err(ProxyError::Body)?;

    let upstream_request = UpstreamRequest {
        url,
        headers: forward_headers(&parts.headers),
        body: forward_body(&parts.method, &parts.headers, body),
        method: parts.method.clone(),
    };

    let upstream_response = state.upstream.forward(upstream_request).await?;
    tracing::debug!(target = %target, status = %upstream_response.status, "Upstream response received");

    Ok(transform_response(
        upstream_response,
        &parts.method,
        &state.rewriter,
        &state.origin,
    ))
}
