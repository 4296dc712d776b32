//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (runtime.rs + main):
//!     Load config → Validate → Build runtime → Load assets → Start listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain in-flight requests → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The runtime flavor is configuration, the proxy code is the same

pub mod runtime;
pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
