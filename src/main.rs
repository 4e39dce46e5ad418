//! Fitness API server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request id ─▶ trace ─▶ metrics ─▶ timeout
//!                         │
//!                         ▼
//!                    authenticate ──▶ rate limit ──▶ routes ──▶ row store
//!                    (verifier)       (window store)  (validated input)
//!
//!     Admin listener (optional, never rate limited)
//!     ──────────────▶ /admin/* ──▶ same window store
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use fitness_api::config::loader::{from_env, load_config};
use fitness_api::config::ApiConfig;
use fitness_api::lifecycle::{build_services, spawn_signal_listener, Services, Shutdown};
use fitness_api::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "fitness-api")]
#[command(about = "Fitness tracking REST API", long_about = None)]
struct Args {
    /// TOML config file. Environment variables override its values.
    #[arg(short, long, env = "FITNESS_API_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Loading validates; an invalid config never reaches the server.
    let config: ApiConfig = match &args.config {
        Some(path) => load_config(path)?,
        None => from_env()?,
    };

    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "fitness-api starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        window_ms = config.rate_limit.window_ms,
        max_requests = config.rate_limit.max_requests,
        request_timeout_secs = config.timeouts.request_secs,
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

    let bind_address = config.listener.bind_address.clone();
    let admin_address = config.admin.bind_address.clone();

    let Services { server, admin } = build_services(config)?;

    let shutdown = Shutdown::new();
    let signals = spawn_signal_listener(shutdown.clone());

    let admin_task = match admin {
        Some(router) => {
            let listener = TcpListener::bind(&admin_address).await?;
            tracing::info!(address = %listener.local_addr()?, "Admin API listening");
            let mut rx = shutdown.subscribe();
            Some(tokio::spawn(async move {
                let result = axum::serve(listener, router)
                    .with_graceful_shutdown(async move {
                        let _ = rx.recv().await;
                    })
                    .await;
                if let Err(e) = result {
                    tracing::error!(error = %e, "Admin API server failed");
                }
            }))
        }
        None => None,
    };

    let listener = TcpListener::bind(&bind_address).await?;
    let result = server.run(listener, shutdown.subscribe()).await;

    // The API listener stopped (signal or error): bring everything else down.
    shutdown.trigger();
    if let Some(task) = admin_task {
        let _ = task.await;
    }
    signals.abort();

    result?;
    tracing::info!("Shutdown complete");
    Ok(())
}
