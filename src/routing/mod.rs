//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (host header or :authority)
//!     → resolver.rs (subdomain label → upstream Target)
//!     → Some(Target): proxied by http::server
//!     → None: landing.rs (`?url=` redirect or landing page)
//! ```
//!
//! # Design Decisions
//! - No routing table: the target is encoded in the host itself
//! - Deterministic: same host always resolves to the same target
//! - Resolution never fails; anything unrecognized is "no target"

pub mod landing;
pub mod resolver;

pub use landing::{landing_redirect, LandingError};
pub use resolver::{Target, TargetResolver};
