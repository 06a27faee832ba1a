//! Live forum server.
//!
//! # Architecture Overview
//!
//! ```text
//!     HTTP request ──▶ http::server ──▶ routing::Dispatcher ──▶ forum handlers
//!                                              │                    │
//!                                              │              &mut Database
//!                                              ▼
//!                                   broadcast::SnapshotNotifier
//!                                              │
//!                                              ▼
//!     WebSocket ◀── http::websocket ◀── broadcast::Fanout
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use live_forum::config::{load_config, AppConfig};
use live_forum::lifecycle::{self, signals, Shutdown};
use live_forum::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "live-forum")]
#[command(about = "Forum API server with live WebSocket updates", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
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

    logging::init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "live-forum starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        static_dir = %config.forum.static_dir,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let app = lifecycle::bootstrap(config)?;

    let listener = TcpListener::bind(&app.config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let stop = shutdown.subscribe();
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        shutdown.trigger();
    });

    app.server().run(listener, stop).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
