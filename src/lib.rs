//! Subdomain-routed rewriting reverse proxy.
//!
//! `https://<target-host>.localhost:1337/...` is forwarded to
//! `https://<target-host>/...`; HTML, redirects and CORS headers are rewritten
//! so the browser keeps talking to the proxy.

pub mod assets;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod rewrite;
pub mod routing;
pub mod upstream;

pub use assets::Assets;
pub use config::schema::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
