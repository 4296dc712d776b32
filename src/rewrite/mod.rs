//! Response rewriting subsystem.
//!
//! # Data Flow
//! ```text
//! Upstream response
//!     → html.rs (HTML bodies: CSP meta removal, URL rewrite, script injection)
//!     → location.rs (absolute Location headers)
//!     both build proxy URLs through url.rs (PublicOrigin)
//! ```

pub mod html;
pub mod location;
pub mod url;

pub use html::{is_html, BodyRewriter, RewrittenDocument};
pub use location::rewrite_location;
pub use url::PublicOrigin;
