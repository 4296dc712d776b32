//! Subdomain proxy (v1)
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────────────────────────────────────────────┐
//!                  │                   SUBDOMAIN PROXY                     │
//!                  │                                                       │
//!  Client Request  │  ┌────────┐   ┌────────┐   ┌──────────┐              │
//!  ────────────────┼─▶│  cors  │──▶│  http  │──▶│ routing  │──▶ landing    │
//!                  │  │preflght│   │ server │   │ resolver │   redirect /  │
//!                  │  └────────┘   └────────┘   └────┬─────┘   page        │
//!                  │                                 │ target               │
//!                  │                                 ▼                      │
//!                  │                          ┌─────────────┐              │
//!                  │                          │  upstream   │──────────────┼──▶ https://<target>
//!                  │                          │  (reqwest)  │◀─────────────┼───
//!                  │                          └──────┬──────┘              │
//!                  │                                 ▼                      │
//!  Client Response │  ┌────────┐   ┌──────────────────────────┐           │
//!  ◀───────────────┼──│  cors  │◀──│ response: headers, HTML, │           │
//!                  │  │annotate│   │ Location rewriting       │           │
//!                  │  └────────┘   └──────────────────────────┘           │
//!                  └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use subdomain_proxy::config::{self, ConfigError, ProxyConfig};
use subdomain_proxy::lifecycle::runtime::build_runtime;
use subdomain_proxy::observability::{logging, metrics};
use subdomain_proxy::{net, Assets, HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "subdomain-proxy")]
#[command(about = "Reverse proxy that routes <host>.localhost to https://<host>", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(long)]
    bind: Option<String>,

    /// Override proxy.public_port.
    #[arg(long)]
    public_port: Option<u16>,
}

impl Cli {
    fn load(&self) -> Result<ProxyConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => config::load_config(path)?,
            None => ProxyConfig::default(),
        };
        if let Some(bind) = &self.bind {
            config.listener.bind_address = bind.clone();
        }
        if let Some(port) = self.public_port {
            config.proxy.public_port = port;
        }
        config::validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = cli.load()?;

    logging::init_logging(&config.observability);
    tracing::info!("subdomain-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    let runtime = build_runtime(&config.runtime)?;
    runtime.block_on(run(config))
}

async fn run(config: ProxyConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        bind_address = %config.listener.bind_address,
        base_domain = %config.proxy.base_domain,
        public_port = config.proxy.public_port,
        scheme = ?config.proxy.scheme,
        tls = config.tls_enabled(),
        runtime = ?config.runtime.flavor,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let assets = Assets::load(&config.assets)?;
    let tls = config.listener.tls.clone();
    let bind_address = config.listener.bind_address.clone();
    let server = HttpServer::new(config, assets)?;

    let shutdown = Shutdown::new();
    let shutdown_rx = shutdown.subscribe();
    shutdown.trigger_on_signal();

    match tls {
        Some(tls) => {
            let tls_config = net::load_tls_config(&tls).await?;
            let listener = std::net::TcpListener::bind(&bind_address)?;
            server.run_tls(listener, tls_config, shutdown_rx).await?;
        }
        None => {
            let listener = TcpListener::bind(&bind_address).await?;
            server.run(listener, shutdown_rx).await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
