/// Login session records
///
/// The primary key is the SHA-256 hash of the opaque token handed to the
/// client. The token itself is never stored.
///
/// ```sql
/// CREATE TABLE sessions (
///     id TEXT PRIMARY KEY,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Durable session record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
    /// Hex SHA-256 of the session token
    pub id: String,

    /// Owner of the session
    pub user_id: Uuid,

    /// Login time
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Records a new session
    pub async fn create(
        pool: &PgPool,
        token_hash: &str,
        user_id: Uuid,
        created_at: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (id, user_id, created_at)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, created_at
            "#,
        )
        .bind(token_hash)
        .bind(user_id)
        .bind(created_at)
        .fetch_one(pool)
        .await
    }

    /// Looks up a session by token hash
    pub async fn find(pool: &PgPool, token_hash: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Session>(
            "SELECT id, user_id, created_at FROM sessions WHERE id = $1",
        )
        .bind(token_hash)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a session, returning whether it existed
    pub async fn delete(pool: &PgPool, token_hash: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(token_hash)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Returns true once the session is older than `ttl`
    pub fn is_expired(&self, ttl: chrono::Duration, now: DateTime<Utc>) -> bool {
        now - self.created_at >= ttl
    }
}
