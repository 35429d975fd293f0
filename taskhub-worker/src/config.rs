/// Worker configuration
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 5)
/// - `REDIS_URL`: Redis connection string (default: redis://localhost:6379)
/// - `NOTIFICATION_TOPIC`: Stream receiving outbound mail (default: notifications)
/// - `DISPATCH_INTERVAL_SECS`: Seconds between dispatcher ticks (default: 60)
/// - `VIP_MIN_ACCOUNT_AGE_DAYS`: Account age required for the VIP message (default: 30)
/// - `RUST_LOG`: Log level (default: taskhub_worker=debug)

use std::env;
use std::time::Duration;

use taskhub_shared::redis::DEFAULT_NOTIFICATION_TOPIC;

use crate::dispatcher::{DispatcherConfig, DEFAULT_DISPATCH_INTERVAL_SECS, DEFAULT_MIN_ACCOUNT_AGE_DAYS};

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub redis_url: String,
    pub notification_topic: String,
    pub dispatcher: DispatcherConfig,
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

impl WorkerConfig {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if `DATABASE_URL` is missing, a value does not
    /// parse, or the interval or account age is zero.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let interval_secs = var_or(
            "DISPATCH_INTERVAL_SECS",
            &DEFAULT_DISPATCH_INTERVAL_SECS.to_string(),
        )
        .parse::<u64>()?;
        let min_age_days = var_or(
            "VIP_MIN_ACCOUNT_AGE_DAYS",
            &DEFAULT_MIN_ACCOUNT_AGE_DAYS.to_string(),
        )
        .parse::<i64>()?;

        if interval_secs == 0 {
            anyhow::bail!("DISPATCH_INTERVAL_SECS must be positive");
        }
        if min_age_days <= 0 {
            anyhow::bail!("VIP_MIN_ACCOUNT_AGE_DAYS must be positive");
        }

        Ok(Self {
            database_url,
            database_max_connections: var_or("DATABASE_MAX_CONNECTIONS", "5").parse::<u32>()?,
            redis_url: var_or("REDIS_URL", "redis://localhost:6379"),
            notification_topic: var_or("NOTIFICATION_TOPIC", DEFAULT_NOTIFICATION_TOPIC),
            dispatcher: DispatcherConfig {
                interval: Duration::from_secs(interval_secs),
                min_account_age: chrono::Duration::days(min_age_days),
            },
        })
    }
}
