//! Bloom API Server
//!
//! Serves random map points and GeoTIFF overlays for the phenology map.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use bloom_api::build_router;
use bloom_api::config::OverlayConfig;
use bloom_api::state::AppState;

/// Bloom API Server
#[derive(Parser, Debug)]
#[command(name = "bloom-api")]
#[command(about = "Random point sampling and GeoTIFF overlay server")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:8085", env = "BLOOM_LISTEN_ADDR")]
    listen: String,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Number of worker threads
    #[arg(long, env = "BLOOM_WORKER_THREADS")]
    worker_threads: Option<usize>,

    /// Overlay definitions (YAML)
    #[arg(long, default_value = "config/overlays.yaml", env = "BLOOM_OVERLAY_CONFIG")]
    overlay_config: String,

    /// Threads in the GeoTIFF decode pool
    #[arg(long, env = "BLOOM_DECODE_WORKERS")]
    decode_workers: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Build runtime with configured threads
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(threads) = args.worker_threads {
        runtime_builder.worker_threads(threads);
    }

    let runtime = runtime_builder
        .build()
        .context("Failed to create Tokio runtime")?;

    runtime.block_on(run_server(args))
}

async fn run_server(args: Args) -> anyhow::Result<()> {
    // Initialize tracing
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .json()
        .init();

    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    info!("Prometheus metrics exporter initialized");
    info!("Starting bloom API server");

    let config = OverlayConfig::load(&args.overlay_config)?;
    let state = match AppState::new(config, args.decode_workers) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            error!(error = %e, "Failed to initialize application state");
            return Err(e);
        }
    };

    // Detached; the server does not wait for pre-warm loads
    let prewarming = state.spawn_prewarm();
    if !prewarming.is_empty() {
        info!(overlays = prewarming.len(), "Pre-warming overlays in background");
    }

    let app = build_router(state, prometheus_handle);

    let addr: SocketAddr = args
        .listen
        .parse()
        .with_context(|| format!("Invalid listen address: {}", args.listen))?;

    info!(address = %addr, "Bloom API listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server failed")?;

    Ok(())
}
