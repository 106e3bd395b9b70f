//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, cache setup, worker spawning, and Axum
//! server lifecycle.

use crate::config::{CacheBackendKind, Config};
use crate::domain::click_worker::run_click_worker;
use crate::domain::repositories::LinkRepository;
use crate::infrastructure::cache::{CacheBackend, MemoryBackend, RedisBackend};
use crate::infrastructure::persistence::PgLinkRepository;
use crate::metrics::MetricsRecorder;
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// How long the click worker may keep draining after the server stops.
const WORKER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool and migrations
/// - Cache backend (Redis, or in-process with `CACHE_BACKEND=memory`)
/// - Background click worker
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - The Redis URL is malformed
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let cache_backend = build_cache_backend(&config).await?;

    let repository: Arc<dyn LinkRepository> = Arc::new(PgLinkRepository::new(Arc::new(pool)));

    let (click_tx, click_rx) = mpsc::channel(config.click_queue_capacity);
    let worker = tokio::spawn(run_click_worker(click_rx, repository.clone()));
    tracing::info!("Click worker started");

    let metrics = Arc::new(MetricsRecorder::new().context("Failed to register metrics")?);

    let state = AppState::new(
        repository,
        cache_backend,
        config.cache_settings(),
        metrics,
        config.db_timeout(),
        click_tx,
        &config.base_url,
    );

    let app = app_router(state);

    let addr: SocketAddr = config
        .listen_addr()
        .parse()
        .with_context(|| format!("Invalid listen address '{}'", config.listen_addr()))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router owned every click sender; the worker stops once the queue drains.
    if tokio::time::timeout(WORKER_DRAIN_TIMEOUT, worker).await.is_err() {
        tracing::warn!("Click worker did not drain in time, pending clicks dropped");
    }

    tracing::info!("Server stopped");
    Ok(())
}

/// Selects the cache backend.
///
/// A Redis backend that cannot connect yet is still used: the cache store
/// treats its failures as misses while a background task keeps dialing
/// with exponential backoff.
async fn build_cache_backend(config: &Config) -> Result<Arc<dyn CacheBackend>> {
    if config.cache_backend == CacheBackendKind::Memory {
        tracing::warn!(
            max_entries = config.memory_cache_capacity,
            "CACHE_BACKEND=memory: in-process cache, not shared between instances"
        );
        return Ok(Arc::new(MemoryBackend::with_capacity(
            config.memory_cache_capacity,
        )));
    }

    let redis_url = config
        .redis_url
        .as_deref()
        .context("REDIS_URL must be set when CACHE_BACKEND=redis")?;
    let redis = RedisBackend::configure(redis_url).context("Invalid Redis configuration")?;

    match tokio::time::timeout(Duration::from_secs(5), redis.connect()).await {
        Ok(Ok(_)) => tracing::info!("Cache enabled (Redis)"),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Redis unavailable at startup, running degraded");
            redis.reconnect_in_background();
        }
        Err(_) => {
            tracing::warn!("Redis connect timed out at startup, running degraded");
            redis.reconnect_in_background();
        }
    }

    Ok(Arc::new(redis))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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

    tracing::info!("Shutdown signal received");
}
