//! chainware server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http server ──▶ Context ──▶ pipeline
//!                                                   │
//!                      chain_all ◀──────────────────┘
//!                        ├─ request_id, response headers
//!                        ├─ chain_until_response
//!                        │    ├─ if_hostname ...
//!                        │    ├─ route ...
//!                        │    └─ not_found
//!                        ├─ if_content_type(html, cache_control)
//!                        ├─ keep_alive, gzip
//!                        └─ log_request
//!     Client Response
//!     ◀────────────── http server ◀── Context (response facet)
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use chainware::config::{load_config, AppConfig};
use chainware::lifecycle::{signals, Shutdown};
use chainware::observability::{logging, metrics};
use chainware::{build_pipeline, HttpServer};

#[derive(Parser)]
#[command(name = "chainware")]
#[command(about = "HTTP server driven by a configured middleware pipeline", long_about = None)]
struct Cli {
    /// TOML configuration file. Built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,

    /// Validate the configuration, build the pipeline and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "chainware starting");

    let pipeline = build_pipeline(&config.pipeline)?;
    tracing::info!(
        bind_address = %config.listener.bind_address,
        hosts = config.pipeline.hosts.len(),
        routes = config.pipeline.routes.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );
    if cli.check {
        tracing::info!("Configuration OK");
        return Ok(());
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    let grace = Duration::from_secs(config.timeouts.shutdown_grace_secs);
    let server = HttpServer::new(config, pipeline);
    match shutdown.drain(server.run(listener, shutdown.subscribe()), grace).await {
        Some(result) => result?,
        None => tracing::warn!("In-flight requests abandoned"),
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
