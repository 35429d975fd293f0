/// Postgres implementation of the storage ports
///
/// Thin adapter over the model functions in [`crate::models`]. The only
/// logic here is error translation: a unique violation on `users.email`
/// becomes `CoreError::Conflict`, everything else is `CoreError::Database`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::models::{
    CreateProject, CreateTask, CreateUser, InvitationCode, MarkOutcome, MembershipGrant,
    NotificationRecord, Project, Session, Task, UpdateProject, UpdateTask, User, UserCredentials,
    VerificationCode,
};
use crate::store::{ProjectStore, SessionStore, TaskStore, UserStore, VerificationStore};

/// Durable store backed by a Postgres pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, data: CreateUser) -> CoreResult<User> {
        let email = data.email.clone();

        User::create(&self.pool, data).await.map_err(|e| {
            if CoreError::is_unique_violation(&e) {
                CoreError::Conflict(format!("email {} already exists", email))
            } else {
                CoreError::Database(e)
            }
        })
    }

    async fn delete_user(&self, id: Uuid) -> CoreResult<bool> {
        Ok(User::delete(&self.pool, id).await?)
    }

    async fn user_by_id(&self, id: Uuid) -> CoreResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn user_by_email(&self, email: &str) -> CoreResult<Option<User>> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn credentials_by_email(&self, email: &str) -> CoreResult<Option<UserCredentials>> {
        Ok(User::find_credentials_by_email(&self.pool, email).await?)
    }

    async fn project_users(&self, project_id: Uuid) -> CoreResult<Vec<User>> {
        Ok(User::list_by_project(&self.pool, project_id).await?)
    }

    async fn users_to_notify(
        &self,
        subject: &str,
        created_before: DateTime<Utc>,
    ) -> CoreResult<Vec<User>> {
        Ok(User::list_eligible_for_notification(&self.pool, subject, created_before).await?)
    }

    async fn mark_notified(&self, email: &str, subject: &str) -> CoreResult<MarkOutcome> {
        Ok(NotificationRecord::mark(&self.pool, email, subject).await?)
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn create_session(
        &self,
        token_hash: &str,
        user_id: Uuid,
        created_at: DateTime<Utc>,
    ) -> CoreResult<Session> {
        Ok(Session::create(&self.pool, token_hash, user_id, created_at).await?)
    }

    async fn find_session(&self, token_hash: &str) -> CoreResult<Option<Session>> {
        Ok(Session::find(&self.pool, token_hash).await?)
    }

    async fn delete_session(&self, token_hash: &str) -> CoreResult<bool> {
        Ok(Session::delete(&self.pool, token_hash).await?)
    }
}

#[async_trait]
impl VerificationStore for PgStore {
    async fn save_verification_code(&self, code_hash: &str, user_id: Uuid) -> CoreResult<()> {
        VerificationCode::create(&self.pool, code_hash, user_id).await?;
        Ok(())
    }

    async fn redeem_verification_code(&self, code_hash: &str) -> CoreResult<Option<Uuid>> {
        Ok(VerificationCode::redeem(&self.pool, code_hash).await?)
    }
}

#[async_trait]
impl ProjectStore for PgStore {
    async fn create_project(&self, data: CreateProject) -> CoreResult<Project> {
        Ok(Project::create(&self.pool, data).await?)
    }

    async fn project_by_id(&self, id: Uuid) -> CoreResult<Option<Project>> {
        Ok(Project::find_by_id(&self.pool, id).await?)
    }

    async fn projects_by_owner(&self, owner_id: Uuid) -> CoreResult<Vec<Project>> {
        Ok(Project::list_by_owner(&self.pool, owner_id).await?)
    }

    async fn update_project(&self, id: Uuid, data: UpdateProject) -> CoreResult<Option<Project>> {
        Ok(Project::update(&self.pool, id, data).await?)
    }

    async fn delete_project(&self, id: Uuid) -> CoreResult<bool> {
        Ok(Project::delete(&self.pool, id).await?)
    }

    async fn save_invitation_code(
        &self,
        code_hash: &str,
        user_id: Uuid,
        project_id: Uuid,
    ) -> CoreResult<()> {
        InvitationCode::create(&self.pool, code_hash, user_id, project_id).await?;
        Ok(())
    }

    async fn redeem_invitation_code(
        &self,
        code_hash: &str,
        issued_after: DateTime<Utc>,
    ) -> CoreResult<Option<MembershipGrant>> {
        Ok(InvitationCode::redeem(&self.pool, code_hash, issued_after).await?)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn create_task(&self, data: CreateTask) -> CoreResult<Task> {
        Ok(Task::create(&self.pool, data).await?)
    }

    async fn task_by_id(&self, id: Uuid) -> CoreResult<Option<Task>> {
        Ok(Task::find_by_id(&self.pool, id).await?)
    }

    async fn tasks_by_project(&self, project_id: Uuid) -> CoreResult<Vec<Task>> {
        Ok(Task::list_by_project(&self.pool, project_id).await?)
    }

    async fn tasks_by_owner(&self, owner_id: Uuid) -> CoreResult<Vec<Task>> {
        Ok(Task::list_by_owner(&self.pool, owner_id).await?)
    }

    async fn update_task(&self, id: Uuid, data: UpdateTask) -> CoreResult<Option<Task>> {
        Ok(Task::update(&self.pool, id, data).await?)
    }

    async fn delete_task(&self, id: Uuid) -> CoreResult<bool> {
        Ok(Task::delete(&self.pool, id).await?)
    }
}
