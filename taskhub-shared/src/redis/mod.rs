/// Redis integration: user cache and notification stream
///
/// - [`client`]: managed connection with per-command timeouts
/// - [`user_cache`]: [`RedisUserCache`], the `UserCache` port on Redis
/// - [`stream_writer`]: [`StreamWriter`], the `NotificationPublisher` port
///   on Redis Streams
///
/// # Architecture
///
/// ```text
/// CacheAsideUserStore ──GET/SET EX/DEL──> user:{id}      (TTL 60s)
///
/// flows / dispatcher  ──XADD────────────> {topic} stream ──> mail sender
/// ```

pub mod client;
pub mod stream_writer;
pub mod user_cache;

pub use client::{RedisClient, RedisClientError, RedisConfig};
pub use stream_writer::{StreamWriter, DEFAULT_NOTIFICATION_TOPIC};
pub use user_cache::RedisUserCache;
