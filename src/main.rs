//! User Cache - a user CRUD service with a read-through TTL cache
//!
//! Serves users from PostgreSQL (or an in-memory store when no database is
//! configured) behind an expiring cache.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use user_cache::api::{create_router, AppState};
use user_cache::config::Config;
use user_cache::repository::{MemoryUserStore, PgUserStore, UserStore};
use user_cache::tasks::spawn_sweeper;
use user_cache::telemetry;

/// Main entry point for the user service.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load and validate configuration from environment variables
/// 3. Install the Prometheus recorder
/// 4. Connect the entity store and apply migrations
/// 5. Wrap the store in the cache and start the expiry sweeper
/// 6. Start HTTP server on configured port
/// 7. On SIGINT/SIGTERM stop accepting requests, then stop the sweeper
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "user_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting user service");

    let config = Config::from_env();
    config.validate()?;
    info!(
        "Configuration loaded: cache_ttl={}s, cleanup_interval={}s, port={}, database={}",
        config.cache_ttl,
        config.cleanup_interval,
        config.server_port,
        if config.database_url.is_some() { "postgres" } else { "memory" }
    );

    let prometheus = telemetry::install_recorder()?;

    let repo: Arc<dyn UserStore> = match &config.database_url {
        Some(url) => Arc::new(
            PgUserStore::connect(url, config.db_max_connections)
                .await
                .context("failed to initialise the user database")?,
        ),
        None => {
            warn!("DATABASE_URL not set, users are kept in memory only");
            Arc::new(MemoryUserStore::new())
        }
    };

    let state = AppState::new(repo, &config).with_prometheus(prometheus);
    info!("User cache initialized");

    let shutdown = CancellationToken::new();
    let sweeper = spawn_sweeper(state.users.clone(), config.sweep_interval(), shutdown.clone());

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await
        .context("server error")?;

    // Covers the case where serve returned without a signal
    shutdown.cancel();
    sweeper.await.context("sweeper task failed")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then cancels `shutdown`.
async fn shutdown_signal(shutdown: CancellationToken) {
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

    shutdown.cancel();
}
