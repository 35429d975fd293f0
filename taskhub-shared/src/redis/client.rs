/// Shared Redis connection
///
/// Wraps a [`ConnectionManager`], which reconnects on its own after a
/// dropped connection. Every command issued through [`RedisClient::timed`]
/// is bounded by the configured command timeout, so a hung Redis turns
/// into a fast error instead of a stalled request. That matters for the
/// user cache, whose callers fall back to Postgres on any error.
///
/// # Example
///
/// ```no_run
/// use taskhub_shared::redis::client::{RedisClient, RedisConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = RedisClient::new(RedisConfig::new("redis://localhost:6379")).await?;
/// assert!(client.ping().await?);
/// # Ok(())
/// # }
/// ```

use redis::aio::ConnectionManager;
use redis::{Client, RedisError};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Redis client errors
#[derive(Error, Debug)]
pub enum RedisClientError {
    /// Could not connect, or the connection dropped
    #[error("Redis connection error: {0}")]
    ConnectionError(String),

    /// Command rejected by the server
    #[error("Redis command error: {0}")]
    CommandError(String),

    /// Command did not complete within the timeout
    #[error("Redis command timed out after {0:?}")]
    Timeout(Duration),

    /// Bad URL or settings
    #[error("Redis configuration error: {0}")]
    ConfigError(String),
}

impl From<RedisError> for RedisClientError {
    fn from(err: RedisError) -> Self {
        if err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal() {
            RedisClientError::ConnectionError(err.to_string())
        } else {
            RedisClientError::CommandError(err.to_string())
        }
    }
}

/// Connection settings
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// `redis://[user:pass@]host:port[/db]`
    pub url: String,

    /// Bound on the initial connect
    pub connection_timeout_secs: u64,

    /// Bound on every individual command
    pub command_timeout_secs: u64,
}

impl RedisConfig {
    /// Settings for `url` with default timeouts (5s connect, 2s command)
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connection_timeout_secs: 5,
            command_timeout_secs: 2,
        }
    }
}

/// Cloneable handle to a managed Redis connection
#[derive(Clone)]
pub struct RedisClient {
    manager: ConnectionManager,
    config: Arc<RedisConfig>,
}

impl RedisClient {
    /// Connects to Redis
    ///
    /// # Errors
    ///
    /// Fails on an invalid URL, or if no connection can be established
    /// within `connection_timeout_secs`.
    pub async fn new(config: RedisConfig) -> Result<Self, RedisClientError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| RedisClientError::ConfigError(format!("Invalid Redis URL: {}", e)))?;

        let connect_timeout = Duration::from_secs(config.connection_timeout_secs);
        let manager = tokio::time::timeout(connect_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| RedisClientError::Timeout(connect_timeout))??;

        tracing::info!(url = %sanitize_url(&config.url), "Redis client connected");

        Ok(Self {
            manager,
            config: Arc::new(config),
        })
    }

    /// Returns a connection handle; cheap, shares the underlying socket
    pub fn get_connection(&self) -> ConnectionManager {
        self.manager.clone()
    }

    pub fn config(&self) -> &RedisConfig {
        &self.config
    }

    /// Runs a command future under the command timeout
    pub async fn timed<T, F>(&self, fut: F) -> Result<T, RedisClientError>
    where
        F: Future<Output = Result<T, RedisError>>,
    {
        let limit = Duration::from_secs(self.config.command_timeout_secs);
        match tokio::time::timeout(limit, fut).await {
            Ok(result) => result.map_err(RedisClientError::from),
            Err(_) => Err(RedisClientError::Timeout(limit)),
        }
    }

    /// Health check via `PING`
    pub async fn ping(&self) -> Result<bool, RedisClientError> {
        let mut conn = self.get_connection();
        let pong: String = self
            .timed(redis::cmd("PING").query_async(&mut conn))
            .await?;

        Ok(pong == "PONG")
    }
}

/// Masks credentials in a Redis URL for logging
fn sanitize_url(url: &str) -> String {
    if let (Some(scheme_end), Some(at_pos)) = (url.find("://"), url.rfind('@')) {
        return format!("{}***@{}", &url[..scheme_end + 3], &url[at_pos + 1..]);
    }
    url.to_string()
}
