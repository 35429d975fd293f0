/// Project invitation codes
///
/// ```sql
/// CREATE TABLE invitation_codes (
///     code_hash TEXT PRIMARY KEY,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// A code is bound to one invitee and one project. Redemption deletes the
/// code and inserts the membership in a single transaction. An existing
/// membership is left as is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Stored invitation code (hash only)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct InvitationCode {
    pub code_hash: String,
    pub user_id: Uuid,
    pub project_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Membership granted by a redeemed invitation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipGrant {
    pub project_id: Uuid,
    pub user_id: Uuid,
}

impl InvitationCode {
    /// Stores a new invitation code hash
    pub async fn create(
        pool: &PgPool,
        code_hash: &str,
        user_id: Uuid,
        project_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, InvitationCode>(
            r#"
            INSERT INTO invitation_codes (code_hash, user_id, project_id)
            VALUES ($1, $2, $3)
            RETURNING code_hash, user_id, project_id, created_at
            "#,
        )
        .bind(code_hash)
        .bind(user_id)
        .bind(project_id)
        .fetch_one(pool)
        .await
    }

    /// Consumes a code and grants the membership it carries
    ///
    /// Codes issued at or before `issued_after` are expired: they are
    /// deleted but grant nothing.
    ///
    /// # Returns
    ///
    /// The granted membership, or None for unknown, consumed or expired codes
    pub async fn redeem(
        pool: &PgPool,
        code_hash: &str,
        issued_after: DateTime<Utc>,
    ) -> Result<Option<MembershipGrant>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let code = sqlx::query_as::<_, InvitationCode>(
            r#"
            DELETE FROM invitation_codes WHERE code_hash = $1
            RETURNING code_hash, user_id, project_id, created_at
            "#,
        )
        .bind(code_hash)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(code) = code else {
            tx.rollback().await?;
            return Ok(None);
        };

        if code.created_at <= issued_after {
            tx.commit().await?;
            return Ok(None);
        }

        sqlx::query(
            r#"
            INSERT INTO projects_users (project_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (project_id, user_id) DO NOTHING
            "#,
        )
        .bind(code.project_id)
        .bind(code.user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(MembershipGrant {
            project_id: code.project_id,
            user_id: code.user_id,
        }))
    }
}
