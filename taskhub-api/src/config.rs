/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `REDIS_URL`: Redis connection string (default: redis://localhost:6379)
/// - `NOTIFICATION_TOPIC`: Stream receiving outbound mail (default: notifications)
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `CORS_ORIGINS`: Comma-separated allowed origins (default: *)
/// - `COOKIE_SECURE`: Mark the session cookie `Secure` (default: true)
/// - `PUBLIC_URL`: Base URL used in mailed links (default: http://localhost:8080)
/// - `SESSION_TTL_HOURS`: Session lifetime (default: 24)
/// - `INVITATION_TTL_DAYS`: Invitation lifetime (default: 7)
/// - `RUST_LOG`: Log level (default: taskhub_api=debug,tower_http=debug)
///
/// # Example
///
/// ```no_run
/// use taskhub_api::config::Config;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}:{}", config.api.host, config.api.port);
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;
use taskhub_shared::auth::invitation::DEFAULT_INVITATION_TTL_DAYS;
use taskhub_shared::auth::session::DEFAULT_SESSION_TTL_HOURS;
use taskhub_shared::redis::DEFAULT_NOTIFICATION_TOPIC;
use taskhub_shared::services::ServiceConfig;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Redis configuration
    pub redis: RedisSettings,

    /// Session, link and invitation settings
    pub flows: FlowConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `*` means permissive
    pub cors_origins: Vec<String>,

    /// Whether the session cookie carries the `Secure` attribute
    pub cookie_secure: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// Redis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisSettings {
    pub url: String,

    /// Stream that outbound notifications are appended to
    pub notification_topic: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowConfig {
    pub public_url: String,
    pub session_ttl_hours: i64,
    pub invitation_ttl_days: i64,
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_bool(value: &str) -> anyhow::Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("invalid boolean value: {}", other),
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `DATABASE_URL` is missing
    /// - A variable has an unparsable value
    /// - A lifetime is not positive
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let session_ttl_hours =
            var_or("SESSION_TTL_HOURS", &DEFAULT_SESSION_TTL_HOURS.to_string()).parse::<i64>()?;
        let invitation_ttl_days =
            var_or("INVITATION_TTL_DAYS", &DEFAULT_INVITATION_TTL_DAYS.to_string())
                .parse::<i64>()?;

        if session_ttl_hours <= 0 {
            anyhow::bail!("SESSION_TTL_HOURS must be positive");
        }
        if invitation_ttl_days <= 0 {
            anyhow::bail!("INVITATION_TTL_DAYS must be positive");
        }

        Ok(Self {
            api: ApiConfig {
                host: var_or("API_HOST", "0.0.0.0"),
                port: var_or("API_PORT", "8080").parse::<u16>()?,
                cors_origins: var_or("CORS_ORIGINS", "*")
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                cookie_secure: parse_bool(&var_or("COOKIE_SECURE", "true"))?,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: var_or("DATABASE_MAX_CONNECTIONS", "10").parse::<u32>()?,
            },
            redis: RedisSettings {
                url: var_or("REDIS_URL", "redis://localhost:6379"),
                notification_topic: var_or("NOTIFICATION_TOPIC", DEFAULT_NOTIFICATION_TOPIC),
            },
            flows: FlowConfig {
                public_url: var_or("PUBLIC_URL", "http://localhost:8080"),
                session_ttl_hours,
                invitation_ttl_days,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Settings for `Services::build`
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            session_ttl: chrono::Duration::hours(self.flows.session_ttl_hours),
            invitation_ttl: chrono::Duration::days(self.flows.invitation_ttl_days),
            ..ServiceConfig::new(self.flows.public_url.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                cors_origins: vec!["*".to_string()],
                cookie_secure: true,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/test".to_string(),
                max_connections: 10,
            },
            redis: RedisSettings {
                url: "redis://localhost:6379".to_string(),
                notification_topic: "notifications".to_string(),
            },
            flows: FlowConfig {
                public_url: "http://localhost:8080/".to_string(),
                session_ttl_hours: 12,
                invitation_ttl_days: 3,
            },
        }
    }

    #[test]
    fn test_bind_address() {
        assert_eq!(test_config().bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_service_config() {
        let services = test_config().service_config();

        assert_eq!(services.public_url, "http://localhost:8080");
        assert_eq!(services.session_ttl, chrono::Duration::hours(12));
        assert_eq!(services.invitation_ttl, chrono::Duration::days(3));
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("TRUE").unwrap());
        assert!(!parse_bool("0").unwrap());
        assert!(parse_bool("maybe").is_err());
    }
}
