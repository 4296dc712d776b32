//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware stack)
//!     → cors.rs (preflight short-circuit)
//!     → server.rs proxy_handler (routing::resolver decides landing vs proxy)
//!     → request.rs (forwarded headers + body)
//!     → upstream (one call)
//!     → response.rs (filter headers, rewrite body and Location)
//!     → cors.rs (annotate) → Send to client
//! ```

pub mod cors;
pub mod request;
pub mod response;
pub mod server;

pub use server::{AppState, HttpServer};
