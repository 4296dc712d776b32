//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the subdomain proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Public addressing and forwarding policy.
    pub proxy: ProxySettings,

    /// Static files loaded at startup.
    pub assets: AssetsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Tokio runtime selection.
    pub runtime: RuntimeConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl ProxyConfig {
    /// Whether the listener terminates TLS itself.
    pub fn tls_enabled(&self) -> bool {
        self.listener.tls.is_some()
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:1337").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:1337".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Scheme written into every URL that points back at the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SchemePolicy {
    /// Always `https`.
    #[default]
    Https,
    /// Always `http`.
    Http,
    /// `https` when the listener terminates TLS, `http` otherwise.
    Inbound,
}

/// How the proxy addresses itself and what it forwards.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxySettings {
    /// Domain whose subdomain labels encode the upstream host.
    pub base_domain: String,

    /// Port written into rewritten URLs (what browsers connect to).
    pub public_port: u16,

    /// Scheme policy for rewritten URLs.
    pub scheme: SchemePolicy,

    /// Forward methods other than GET and POST instead of answering an empty 200.
    pub forward_all_methods: bool,

    /// Maximum inbound body size in bytes.
    pub max_body_size: usize,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            base_domain: "localhost".to_string(),
            public_port: 1337,
            scheme: SchemePolicy::Https,
            forward_all_methods: false,
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Asset file locations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Client-side script injected into every rewritten HTML page.
    pub bootstrap_script: String,

    /// Page served on the bare domain when no `url` parameter is given.
    pub landing_page: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            bootstrap_script: "assets/redirect.js".to_string(),
            landing_page: "static/index.html".to_string(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 10,
            request_secs: 300,
        }
    }
}

/// Tokio scheduler flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeFlavor {
    /// Work-stealing pool of worker threads.
    #[default]
    MultiThread,
    /// Single-threaded event loop.
    CurrentThread,
}

/// Runtime configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Scheduler flavor.
    pub flavor: RuntimeFlavor,

    /// Worker thread count for the multi-threaded flavor (default: one per core).
    pub worker_threads: Option<usize>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
