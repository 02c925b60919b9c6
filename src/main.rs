//! Media streaming relay
//!
//! A stateless HTTP service that lets a browser play podcast audio and load
//! artwork hosted on arbitrary origins.
//!
//! # Architecture Overview
//!
//! ```text
//!     Browser                  ┌───────────────────────────────────────────────┐
//!     ─────────────────────────┼─▶ http::server (request ID, trace, CORS)      │
//!                              │        │                                      │
//!                              │        ├─▶ proxy::upstream ──▶ proxy::relay ──┼──▶ any origin
//!                              │        ├─▶ proxy::image                       │
//!                              │        └─▶ metadata::client ──────────────────┼──▶ PodcastIndex
//!                              │                                               │
//!                              │  config · observability · lifecycle · net     │
//!                              └───────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use relay::config::{load_config, load_default};
use relay::observability::{logging, metrics};
use relay::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "relay")]
#[command(about = "Media streaming relay", long_about = None)]
struct Args {
    /// Path to a TOML config file; defaults are used when omitted
    #[arg(short, long, env = "RELAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => load_default()?,
    };

    logging::init_logging(&config.observability);
    tracing::info!("relay v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        api_prefix = %config.listener.api_prefix,
        connect_timeout_secs = config.upstream.connect_timeout_secs,
        chunk_size = config.upstream.chunk_size,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::on_signals();
    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
