/// Storage ports
///
/// Flows and services depend on these traits, never on a concrete backend.
/// [`crate::db::PgStore`] implements every durable port on Postgres,
/// [`crate::redis::user_cache::RedisUserCache`] implements [`UserCache`],
/// and [`crate::memory`] provides in-process implementations of all of them
/// for tests.
///
/// Lookups return `Option`; turning an absent row into
/// [`CoreError::NotFound`](crate::error::CoreError::NotFound) is the
/// caller's decision.
///
/// ```text
/// services / flows
///        │
///        ▼
/// CacheAsideUserStore ──► UserCache (Redis)
///        │
///        ▼
///     PgStore (Postgres)
/// ```

pub mod cache_aside;

pub use cache_aside::{CacheAsideUserStore, USER_CACHE_TTL};

use crate::error::CoreResult;
use crate::models::{
    CreateProject, CreateTask, CreateUser, MarkOutcome, MembershipGrant, Project, Session, Task,
    UpdateProject, UpdateTask, User, UserCredentials,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// User persistence
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user; a duplicate email is `CoreError::Conflict`
    async fn create_user(&self, data: CreateUser) -> CoreResult<User>;

    /// Deletes a user, returning whether one existed
    async fn delete_user(&self, id: Uuid) -> CoreResult<bool>;

    async fn user_by_id(&self, id: Uuid) -> CoreResult<Option<User>>;

    async fn user_by_email(&self, email: &str) -> CoreResult<Option<User>>;

    /// Credential lookup for login; the only read that returns a hash
    async fn credentials_by_email(&self, email: &str) -> CoreResult<Option<UserCredentials>>;

    /// Members of a project
    async fn project_users(&self, project_id: Uuid) -> CoreResult<Vec<User>>;

    /// Users created before `created_before` without a ledger row for `subject`
    async fn users_to_notify(
        &self,
        subject: &str,
        created_before: DateTime<Utc>,
    ) -> CoreResult<Vec<User>>;

    /// Writes the ledger row and flips VIP status in one atomic step
    async fn mark_notified(&self, email: &str, subject: &str) -> CoreResult<MarkOutcome>;
}

/// Errors from the user cache
///
/// Never escapes [`CacheAsideUserStore`].
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),

    #[error("cache entry could not be decoded: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Fast, lossy user cache
#[async_trait]
pub trait UserCache: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<User>, CacheError>;

    async fn put(&self, user: &User, ttl: Duration) -> Result<(), CacheError>;

    async fn invalidate(&self, id: Uuid) -> Result<(), CacheError>;
}

/// Session persistence keyed by token hash
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create_session(
        &self,
        token_hash: &str,
        user_id: Uuid,
        created_at: DateTime<Utc>,
    ) -> CoreResult<Session>;

    async fn find_session(&self, token_hash: &str) -> CoreResult<Option<Session>>;

    async fn delete_session(&self, token_hash: &str) -> CoreResult<bool>;
}

/// Verification code persistence
#[async_trait]
pub trait VerificationStore: Send + Sync {
    async fn save_verification_code(&self, code_hash: &str, user_id: Uuid) -> CoreResult<()>;

    /// Atomically consumes the code and marks the owner verified
    ///
    /// Returns the user ID, or None if the code was unknown or consumed.
    async fn redeem_verification_code(&self, code_hash: &str) -> CoreResult<Option<Uuid>>;
}

/// Project, membership and invitation persistence
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Creates a project and adds the owner as a member
    async fn create_project(&self, data: CreateProject) -> CoreResult<Project>;

    async fn project_by_id(&self, id: Uuid) -> CoreResult<Option<Project>>;

    async fn projects_by_owner(&self, owner_id: Uuid) -> CoreResult<Vec<Project>>;

    async fn update_project(&self, id: Uuid, data: UpdateProject) -> CoreResult<Option<Project>>;

    async fn delete_project(&self, id: Uuid) -> CoreResult<bool>;

    async fn save_invitation_code(
        &self,
        code_hash: &str,
        user_id: Uuid,
        project_id: Uuid,
    ) -> CoreResult<()>;

    /// Atomically consumes the code and inserts the membership
    ///
    /// Codes issued at or before `issued_after` are consumed without
    /// granting anything.
    async fn redeem_invitation_code(
        &self,
        code_hash: &str,
        issued_after: DateTime<Utc>,
    ) -> CoreResult<Option<MembershipGrant>>;
}

/// Task persistence
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn create_task(&self, data: CreateTask) -> CoreResult<Task>;

    async fn task_by_id(&self, id: Uuid) -> CoreResult<Option<Task>>;

    async fn tasks_by_project(&self, project_id: Uuid) -> CoreResult<Vec<Task>>;

    async fn tasks_by_owner(&self, owner_id: Uuid) -> CoreResult<Vec<Task>>;

    async fn update_task(&self, id: Uuid, data: UpdateTask) -> CoreResult<Option<Task>>;

    async fn delete_task(&self, id: Uuid) -> CoreResult<bool>;
}
