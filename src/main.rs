//! Bookly Server - Library Books Service

use std::net::SocketAddr;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use bookly_server::{
    api,
    config::AppConfig,
    repository::{MemoryStorage, PgStorage, Storage},
    services::{deleter::DeletionBatcher, Services},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("bookly_server={},tower_http=debug", config.logging.level).into()
    });

    let fmt_layer = if config.logging.format == "json" {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Starting Bookly Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::debug!(server = ?config.server, deleter = ?config.deleter, "configuration loaded");

    let storage = connect_storage(&config).await?;

    let cancel = CancellationToken::new();
    let (error_tx, mut error_rx) = mpsc::channel(1);
    let (deletions, batcher) = DeletionBatcher::new(storage.clone(), &config.deleter, error_tx);
    let batcher_handle = tokio::spawn(batcher.run(cancel.child_token()));

    // Supervisor: stop everything on an OS signal or a fatal batcher error
    let supervisor = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown_signal() => {
                    tracing::info!("shutdown signal received");
                }
                Some(err) = error_rx.recv() => {
                    tracing::error!(error = %err, "deletion batcher failed, shutting down");
                }
                _ = cancel.cancelled() => {}
            }
            cancel.cancel();
        })
    };

    let services = Services::new(storage, &config.auth, deletions);
    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    let state = AppState {
        services: Arc::new(services),
    };
    let app = api::router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let shutdown = cancel.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    cancel.cancel();
    supervisor.await?;
    match batcher_handle.await? {
        Ok(()) => {
            tracing::info!("server stopped");
            Ok(())
        }
        Err(e) => {
            tracing::info!(reason = %e, "server stopped");
            Err(e.into())
        }
    }
}

/// Use PostgreSQL when reachable, otherwise fall back to in-memory storage
async fn connect_storage(config: &AppConfig) -> anyhow::Result<Arc<dyn Storage>> {
    if !config.database.enabled {
        tracing::info!("Database disabled, using in-memory storage");
        return Ok(Arc::new(MemoryStorage::new()));
    }

    let pool = match PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "connecting to database failed, using in-memory storage");
            return Ok(Arc::new(MemoryStorage::new()));
        }
    };

    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations").run(&pool).await?;

    tracing::info!("Database migrations completed");

    Ok(Arc::new(PgStorage::new(pool)))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
