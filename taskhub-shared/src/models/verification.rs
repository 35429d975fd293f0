/// Email verification codes
///
/// ```sql
/// CREATE TABLE verification_codes (
///     code_hash TEXT PRIMARY KEY,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Codes are single use. Redemption deletes the row and flips
/// `users.is_verified` inside one transaction, so two concurrent
/// redemptions of the same code cannot both succeed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Stored verification code (hash only)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct VerificationCode {
    pub code_hash: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl VerificationCode {
    /// Stores a new code hash for a user
    pub async fn create(
        pool: &PgPool,
        code_hash: &str,
        user_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, VerificationCode>(
            r#"
            INSERT INTO verification_codes (code_hash, user_id)
            VALUES ($1, $2)
            RETURNING code_hash, user_id, created_at
            "#,
        )
        .bind(code_hash)
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    /// Consumes a code and marks its owner verified
    ///
    /// # Returns
    ///
    /// The verified user's ID, or None if the code is unknown or already
    /// consumed. Nothing is changed in the None case.
    pub async fn redeem(pool: &PgPool, code_hash: &str) -> Result<Option<Uuid>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let user_id: Option<Uuid> = sqlx::query_scalar(
            "DELETE FROM verification_codes WHERE code_hash = $1 RETURNING user_id",
        )
        .bind(code_hash)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(user_id) = user_id else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query("UPDATE users SET is_verified = TRUE WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Some(user_id))
    }
}
