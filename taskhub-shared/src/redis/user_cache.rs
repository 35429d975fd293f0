/// Redis-backed [`UserCache`]
///
/// Entries are JSON-encoded [`User`] values under `user:{id}`, written with
/// `SET ... EX`. The cached shape has no password field, so nothing
/// sensitive ever reaches Redis.

use async_trait::async_trait;
use redis::AsyncCommands;
use std::time::Duration;
use uuid::Uuid;

use super::client::{RedisClient, RedisClientError};
use crate::models::User;
use crate::store::{CacheError, UserCache};

/// Cache key for a user
pub fn user_cache_key(id: Uuid) -> String {
    format!("user:{}", id)
}

impl From<RedisClientError> for CacheError {
    fn from(err: RedisClientError) -> Self {
        CacheError::Backend(err.to_string())
    }
}

/// User cache stored in Redis
#[derive(Clone)]
pub struct RedisUserCache {
    client: RedisClient,
}

impl RedisUserCache {
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl UserCache for RedisUserCache {
    async fn get(&self, id: Uuid) -> Result<Option<User>, CacheError> {
        let mut conn = self.client.get_connection();
        let raw: Option<String> = self.client.timed(conn.get(user_cache_key(id))).await?;

        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, user: &User, ttl: Duration) -> Result<(), CacheError> {
        let json = serde_json::to_string(user)?;
        let mut conn = self.client.get_connection();

        let _: () = self
            .client
            .timed(
                redis::cmd("SET")
                    .arg(user_cache_key(user.id))
                    .arg(json)
                    .arg("EX")
                    .arg(ttl.as_secs().max(1))
                    .query_async(&mut conn),
            )
            .await?;

        Ok(())
    }

    async fn invalidate(&self, id: Uuid) -> Result<(), CacheError> {
        let mut conn = self.client.get_connection();
        let _: () = self.client.timed(conn.del(user_cache_key(id))).await?;
        Ok(())
    }
}
