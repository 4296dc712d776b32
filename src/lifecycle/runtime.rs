//! Tokio runtime construction.
//!
//! The proxy's request path is identical under both flavors: a worker pool
//! handles requests in parallel, the current-thread loop interleaves them at
//! the upstream await point.

use tokio::runtime::{Builder, Runtime};

use crate::config::{RuntimeConfig, RuntimeFlavor};

/// Build the runtime described by the config.
pub fn build_runtime(config: &RuntimeConfig) -> std::io::Result<Runtime> {
    let mut builder = match config.flavor {
        RuntimeFlavor::MultiThread => {
            let mut builder = Builder::new_multi_thread();
            if let Some(threads) = config.worker_threads {
                builder.worker_threads(threads);
            }
            builder
        }
        RuntimeFlavor::CurrentThread => Builder::new_current_thread(),
    };
    builder.enable_all().thread_name("subdomain-proxy").build()
}
