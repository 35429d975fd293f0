/// User operations exposed to the API
///
/// Every read of a user goes through the cache-aside store handed in at
/// construction.

use std::sync::Arc;

use uuid::Uuid;

use crate::auth::authorization::{authorize, Actor};
use crate::error::{CoreError, CoreResult};
use crate::models::User;
use crate::store::{ProjectStore, UserStore};

pub struct UserService {
    users: Arc<dyn UserStore>,
    projects: Arc<dyn ProjectStore>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserStore>, projects: Arc<dyn ProjectStore>) -> Self {
        Self { users, projects }
    }

    /// Looks up a user by ID
    pub async fn user_by_id(&self, id: Uuid) -> CoreResult<User> {
        self.users
            .user_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found("user"))
    }

    /// Deletes an account; only the account itself may do this
    pub async fn delete_user(&self, actor: &Actor, id: Uuid) -> CoreResult<()> {
        let user = self
            .users
            .user_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found("user"))?;

        if user.id != actor.user_id {
            return Err(CoreError::forbidden("not your account"));
        }

        self.users.delete_user(id).await?;
        tracing::info!(user_id = %id, "User deleted");

        Ok(())
    }

    /// Lists the members of a project owned by `actor`
    pub async fn project_users(&self, actor: &Actor, project_id: Uuid) -> CoreResult<Vec<User>> {
        let project = authorize(
            actor,
            self.projects.project_by_id(project_id).await?,
            "project",
        )?;

        self.users.project_users(project.id).await
    }
}
