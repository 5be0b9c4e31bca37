//! Pessoas API - Person registry with a read-through lookup cache

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use pessoas_api::{
    cache::MemoryStore,
    config::LogFormat,
    create_router,
    repository::{MemoryPersonRepository, PersonRepository, PgPersonRepository},
    spawn_cleanup_task, AppState, Config,
};

/// Main entry point for the Pessoas API server.
///
/// # Startup Sequence
/// 1. Load configuration from environment variables
/// 2. Initialize tracing subscriber for logging
/// 3. Connect the repository (Postgres, or in-memory without DATABASE_URL)
/// 4. Create the cache store and start the background cleanup task
/// 5. Create Axum router with all endpoints
/// 6. Serve until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    init_tracing(config.log_format);

    info!("Starting Pessoas API");
    info!(
        "Configuration loaded: cache_max_items={}, cache_ttl={}s, port={}, cleanup_interval={}s, error_exposure={:?}",
        config.cache_max_items,
        config.cache_ttl_seconds,
        config.server_port,
        config.cleanup_interval,
        config.error_exposure
    );

    let repo: Arc<dyn PersonRepository> = match &config.database_url {
        Some(url) => {
            let pool = PgPersonRepository::connect(url, config.database_max_connections)
                .await
                .context("failed to connect to Postgres")?;
            info!("Postgres repository connected");
            Arc::new(PgPersonRepository::new(pool))
        }
        None => {
            warn!("DATABASE_URL not set, using in-memory repository");
            Arc::new(MemoryPersonRepository::new())
        }
    };

    let store = Arc::new(MemoryStore::new(config.cache_max_items));
    let state = AppState::build(&config, repo, store.clone());
    info!("Cache store initialized");

    let cleanup_handle = spawn_cleanup_task(store, config.cleanup_interval);
    info!("Background cleanup task started");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cleanup_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Installs the global subscriber. Defaults to "info", overridable with RUST_LOG.
fn init_tracing(format: LogFormat) {
    let fmt_layer = match format {
        LogFormat::Json => tracing_subscriber::fmt::layer().json().boxed(),
        LogFormat::Text => tracing_subscriber::fmt::layer().boxed(),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pessoas_api=info,tower_http=info".into()),
        )
        .with(fmt_layer)
        .init();
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then aborts the cleanup task.
async fn shutdown_signal(cleanup_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
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

    cleanup_handle.abort();
    warn!("Cleanup task aborted");
}
