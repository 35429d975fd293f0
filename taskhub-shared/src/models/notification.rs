/// Notification idempotency ledger
///
/// ```sql
/// CREATE TABLE email_notifications (
///     email TEXT NOT NULL,
///     subject VARCHAR(255) NOT NULL,
///     sent_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (email, subject)
/// );
/// ```
///
/// Append-only. A row means "this recipient has been handled for this
/// subject"; the primary key is the barrier that keeps two dispatchers
/// from both acting on the same user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// One ledger row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct NotificationRecord {
    pub email: String,
    pub subject: String,
    pub sent_at: DateTime<Utc>,
}

/// Result of an attempt to mark a recipient as notified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOutcome {
    /// Ledger row written and VIP status flipped
    Marked,

    /// A ledger row already existed; nothing changed
    AlreadyMarked,

    /// No user with this email; nothing changed
    UserMissing,
}

impl NotificationRecord {
    /// Records the notification and promotes the user to VIP atomically
    ///
    /// Both writes commit together or not at all. The ledger insert runs
    /// first so a concurrent dispatcher that lost the race sees
    /// [`MarkOutcome::AlreadyMarked`] and does nothing.
    pub async fn mark(pool: &PgPool, email: &str, subject: &str) -> Result<MarkOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO email_notifications (email, subject, sent_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (email, subject) DO NOTHING
            "#,
        )
        .bind(email)
        .bind(subject)
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(MarkOutcome::AlreadyMarked);
        }

        let updated = sqlx::query(
            "UPDATE users SET vip_status = 'active' WHERE lower(email) = lower($1)",
        )
        .bind(email)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(MarkOutcome::UserMissing);
        }

        tx.commit().await?;

        Ok(MarkOutcome::Marked)
    }

    /// Finds the ledger row for a recipient and subject
    pub async fn find(
        pool: &PgPool,
        email: &str,
        subject: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, NotificationRecord>(
            "SELECT email, subject, sent_at FROM email_notifications WHERE email = $1 AND subject = $2",
        )
        .bind(email)
        .bind(subject)
        .fetch_optional(pool)
        .await
    }
}
