//! # TaskHub Worker
//!
//! Runs the VIP notification dispatcher against PostgreSQL and Redis until
//! Ctrl+C or SIGTERM.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p taskhub-worker
//! ```

use std::sync::Arc;

use taskhub_shared::db::migrations::run_migrations;
use taskhub_shared::db::pool::{close_pool, create_pool, DatabaseConfig};
use taskhub_shared::db::PgStore;
use taskhub_shared::redis::{RedisClient, RedisConfig, RedisUserCache, StreamWriter};
use taskhub_shared::store::CacheAsideUserStore;
use taskhub_worker::config::WorkerConfig;
use taskhub_worker::dispatcher::NotificationDispatcher;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskhub_worker=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "TaskHub Worker v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = WorkerConfig::from_env()?;

    let pool = create_pool(DatabaseConfig {
        url: config.database_url.clone(),
        max_connections: config.database_max_connections,
        ..Default::default()
    })
    .await?;
    run_migrations(&pool).await?;

    let redis = RedisClient::new(RedisConfig::new(config.redis_url.clone())).await?;

    let users = CacheAsideUserStore::new(
        Arc::new(PgStore::new(pool.clone())),
        Arc::new(RedisUserCache::new(redis.clone())),
    );
    let publisher = StreamWriter::new(redis, config.notification_topic.clone());
    let dispatcher = NotificationDispatcher::with_config(
        Arc::new(users),
        Arc::new(publisher),
        config.dispatcher.clone(),
    );

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal().await;
            shutdown.cancel();
        }
    });

    dispatcher.run(shutdown).await;

    close_pool(pool).await;
    tracing::info!("Worker stopped");

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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

    tracing::info!("Shutdown signal received, stopping dispatcher...");
}
