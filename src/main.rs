use std::net::SocketAddr;
use std::process::ExitCode;

use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use tejelanas_api::config::LogFormat;
use tejelanas_api::{AppState, Config, build_router, metrics, utils};

#[tokio::main]
async fn main() -> ExitCode {
    // Read .env before the log filter is built
    let _ = dotenvy::dotenv();
    init_tracing();

    info!(
        "Starting Tejelanas API v{}",
        env!("CARGO_PKG_VERSION")
    );

    match run().await {
        Ok(()) => ExitCode::from(exitcode::OK as u8),
        Err(exit_code) => ExitCode::from(exit_code as u8),
    }
}

/// Plain or JSON log output, filtered by `RUST_LOG`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .ok()
        .and_then(|v| v.parse::<LogFormat>().ok())
        == Some(LogFormat::Json);

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    }
}

/// Run the application, returning an exit code on error.
async fn run() -> Result<(), exitcode::ExitCode> {
    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Configuration error: {e}");
        exitcode::CONFIG
    })?;
    info!(
        host = %config.host,
        port = %config.port,
        auth_mode = %config.auth_mode,
        rate_limit = config.rate_limit_max_requests,
        cache_ttl_secs = config.cache_ttl.as_secs(),
        seed_data = config.seed_data,
        "Configuration loaded"
    );

    // Metrics exporter (optional)
    if let Some(metrics_addr) = config.metrics_addr() {
        match metrics::init_metrics(metrics_addr) {
            Ok(()) => info!("Prometheus metrics available at http://{metrics_addr}/metrics"),
            Err(e) => warn!("Metrics exporter not started: {e}"),
        }
    }

    // Build application state and router
    let state = AppState::new(config.clone());
    let app = build_router(state.clone()).map_err(|e| {
        error!("Failed to build router: {e}");
        exitcode::CONFIG
    })?;

    // Start server
    let addr: SocketAddr = config.server_addr().parse().map_err(|e| {
        error!("Invalid server address: {e}");
        exitcode::CONFIG
    })?;
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        error!("Failed to bind to {addr}: {e}");
        exitcode::UNAVAILABLE
    })?;

    info!("Server listening on http://{addr}");
    info!("API endpoints:");
    info!("  GET  /health                    - Health check");
    info!("  GET  /stats                     - Service statistics");
    info!("  GET  /api/v1/products           - List products");
    info!("  GET  /api/v1/products-services  - Storefront overview");
    info!("  GET  /api/v1/categories         - List categories");
    info!("  GET  /api/v1/workshops          - List workshops");
    info!("  GET  /api/v1/faqs               - List FAQs");
    info!("  GET  /api/v1/about-us           - About-us sections");
    info!("  POST/PUT/DELETE /api/v1/...     - Writes (Bearer token)");

    // Peer addresses feed the per-IP rate limiter
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(utils::shutdown_signal())
    .await
    .map_err(|e| {
        error!("Server error: {e}");
        exitcode::SOFTWARE
    })?;

    // Gracefully shutdown background tasks
    info!("HTTP server stopped, shutting down background tasks...");
    state.shutdown().await;

    info!("Server shutdown complete");
    Ok(())
}
