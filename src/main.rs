//! Flowcache - inspection server
//!
//! Hosts the document cache and the streaming connection registry and exposes
//! them over a small HTTP API.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flowcache::api::create_router;
use flowcache::stream::StreamConnectionManager;
use flowcache::{spawn_sweep_task, AppState, Config};

/// Main entry point.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the document cache and connection registry
/// 4. Start the background expiry sweep
/// 5. Serve the inspection API
/// 6. On SIGINT/SIGTERM, close every streaming connection and stop the sweep
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flowcache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting flowcache");

    let config = Config::from_env();
    info!(
        "Configuration loaded: max_bytes={}, max_entries={}, ttl={}ms, sweep_interval={}s, port={}",
        config.cache_max_bytes,
        config.cache_max_entries,
        config.cache_ttl_ms,
        config.sweep_interval,
        config.server_port
    );

    let state = AppState::from_config(&config);
    let sweep_handle = spawn_sweep_task(state.cache.clone(), config.sweep_interval());
    info!("Background expiry sweep started");

    let connections = state.connections.clone();
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(sweep_handle, connections))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown, every streaming connection is cancelled and the sweep task is
/// aborted.
async fn shutdown_signal(
    sweep_handle: tokio::task::JoinHandle<()>,
    connections: StreamConnectionManager,
) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    let closed = connections.close_all_connections();
    info!("Closed {} streaming connections", closed);

    sweep_handle.abort();
    warn!("Expiry sweep aborted");
}
