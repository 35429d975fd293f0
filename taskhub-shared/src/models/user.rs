/// User model and database operations
///
/// The outbound [`User`] type carries no password field. The Argon2id hash
/// is only ever loaded through [`UserCredentials`], which the login path
/// uses and immediately drops, so a hash cannot leak into a response body
/// or a cache entry.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE vip_status AS ENUM ('none', 'active');
///
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     email TEXT NOT NULL,
///     password_hash VARCHAR(255) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     is_verified BOOLEAN NOT NULL DEFAULT FALSE,
///     vip_status vip_status NOT NULL DEFAULT 'none'
/// );
///
/// CREATE UNIQUE INDEX users_email_lower_idx ON users (lower(email));
/// ```
///
/// # Example
///
/// ```no_run
/// use taskhub_shared::models::user::{User, CreateUser};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(&pool, CreateUser {
///     name: "Alice".to_string(),
///     email: "alice@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     created_at: chrono::Utc::now(),
/// }).await?;
///
/// let found = User::find_by_email(&pool, "alice@example.com").await?;
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, name, email, created_at, is_verified, vip_status";

/// VIP status of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "vip_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VipStatus {
    /// Regular account
    #[default]
    None,

    /// Account has been promoted and notified
    Active,
}

impl VipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VipStatus::None => "none",
            VipStatus::Active => "active",
        }
    }
}

/// User account as exposed outside the credential path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Email address, unique ignoring case
    pub email: String,

    /// When the account was registered
    pub created_at: DateTime<Utc>,

    /// Whether the email verification code has been redeemed
    pub is_verified: bool,

    /// VIP status, flipped by the notification dispatcher
    pub vip_status: VipStatus,
}

/// User together with the stored password hash
///
/// Only produced by the credential lookup used at login. Not serializable
/// on purpose.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserCredentials {
    #[sqlx(flatten)]
    pub user: User,

    /// Argon2id PHC string
    pub password_hash: String,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,

    /// Argon2id hash, never the plaintext
    pub password_hash: String,

    pub created_at: DateTime<Utc>,
}

impl User {
    /// Inserts a new, unverified user
    ///
    /// # Errors
    ///
    /// Fails with a unique violation if the email is already registered.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (name, email, password_hash, created_at) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(data.name)
            .bind(data.email)
            .bind(data.password_hash)
            .bind(data.created_at)
            .fetch_one(pool)
            .await
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by email, ignoring case
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM users WHERE lower(email) = lower($1)",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Loads a user together with the password hash for login
    pub async fn find_credentials_by_email(
        pool: &PgPool,
        email: &str,
    ) -> Result<Option<UserCredentials>, sqlx::Error> {
        let query = format!(
            "SELECT {}, password_hash FROM users WHERE lower(email) = lower($1)",
            USER_COLUMNS
        );

        sqlx::query_as::<_, UserCredentials>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Deletes a user, returning whether a row was removed
    ///
    /// Sessions, codes, memberships and owned projects cascade.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists the members of a project
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.name, u.email, u.created_at, u.is_verified, u.vip_status
            FROM users u
            JOIN projects_users pu ON pu.user_id = u.id
            WHERE pu.project_id = $1
            ORDER BY u.created_at ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    /// Lists users registered before `created_before` that have no
    /// notification record for `subject`
    ///
    /// The whole eligibility predicate runs in the database so concurrent
    /// dispatchers never act on a stale in-memory snapshot.
    pub async fn list_eligible_for_notification(
        pool: &PgPool,
        subject: &str,
        created_before: DateTime<Utc>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.name, u.email, u.created_at, u.is_verified, u.vip_status
            FROM users u
            WHERE u.created_at < $1
              AND NOT EXISTS (
                  SELECT 1 FROM email_notifications n
                  WHERE n.email = u.email AND n.subject = $2
              )
            ORDER BY u.created_at ASC
            "#,
        )
        .bind(created_before)
        .bind(subject)
        .fetch_all(pool)
        .await
    }
}
