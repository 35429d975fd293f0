/// Project and task operations
///
/// Every operation on an existing project or task loads it, then passes it
/// through [`authorize`]: missing resources are `NotFound`, resources owned
/// by someone else are `Forbidden`, and only then is data read or changed.

use std::sync::Arc;

use uuid::Uuid;

use crate::auth::authorization::{authorize, Actor};
use crate::error::{CoreError, CoreResult};
use crate::models::{CreateProject, CreateTask, Project, Task, UpdateProject, UpdateTask};
use crate::store::{ProjectStore, TaskStore};

const PROJECT: &str = "project";
const TASK: &str = "task";

/// Project fields supplied by a client
#[derive(Debug, Clone, serde::Deserialize, validator::Validate)]
pub struct NewProject {
    #[validate(length(min = 1, max = 255, message = "Name must be 1 to 255 characters"))]
    pub name: String,
    pub description: Option<String>,
}

/// Task fields supplied by a client
#[derive(Debug, Clone, serde::Deserialize, validator::Validate)]
pub struct NewTask {
    pub project_id: Uuid,

    #[validate(length(min = 1, max = 255, message = "Name must be 1 to 255 characters"))]
    pub name: String,
    pub description: Option<String>,
}

fn validate<T: validator::Validate>(input: &T) -> CoreResult<()> {
    input
        .validate()
        .map_err(|e| CoreError::BadRequest(e.to_string()))
}

pub struct ProjectService {
    projects: Arc<dyn ProjectStore>,
    tasks: Arc<dyn TaskStore>,
}

impl ProjectService {
    pub fn new(projects: Arc<dyn ProjectStore>, tasks: Arc<dyn TaskStore>) -> Self {
        Self { projects, tasks }
    }

    async fn owned_project(&self, actor: &Actor, id: Uuid) -> CoreResult<Project> {
        authorize(actor, self.projects.project_by_id(id).await?, PROJECT)
    }

    async fn owned_task(&self, actor: &Actor, id: Uuid) -> CoreResult<Task> {
        authorize(actor, self.tasks.task_by_id(id).await?, TASK)
    }

    pub async fn create_project(&self, actor: &Actor, input: NewProject) -> CoreResult<Project> {
        validate(&input)?;

        let project = self
            .projects
            .create_project(CreateProject {
                name: input.name,
                description: input.description,
                owner_id: actor.user_id,
            })
            .await?;

        tracing::info!(project_id = %project.id, owner_id = %actor.user_id, "Project created");
        Ok(project)
    }

    pub async fn project_by_id(&self, actor: &Actor, id: Uuid) -> CoreResult<Project> {
        self.owned_project(actor, id).await
    }

    /// Projects owned by the actor
    pub async fn user_projects(&self, actor: &Actor) -> CoreResult<Vec<Project>> {
        self.projects.projects_by_owner(actor.user_id).await
    }

    pub async fn update_project(
        &self,
        actor: &Actor,
        id: Uuid,
        update: UpdateProject,
    ) -> CoreResult<Project> {
        self.owned_project(actor, id).await?;

        if matches!(update.name.as_deref(), Some("")) {
            return Err(CoreError::BadRequest("name must not be empty".to_string()));
        }

        self.projects
            .update_project(id, update)
            .await?
            .ok_or_else(|| CoreError::not_found(PROJECT))
    }

    pub async fn delete_project(&self, actor: &Actor, id: Uuid) -> CoreResult<()> {
        self.owned_project(actor, id).await?;
        self.projects.delete_project(id).await?;

        tracing::info!(project_id = %id, "Project deleted");
        Ok(())
    }

    /// Creates a task in a project owned by the actor
    pub async fn create_task(&self, actor: &Actor, input: NewTask) -> CoreResult<Task> {
        validate(&input)?;
        let project = self.owned_project(actor, input.project_id).await?;

        self.tasks
            .create_task(CreateTask {
                name: input.name,
                description: input.description,
                project_id: project.id,
                owner_id: actor.user_id,
            })
            .await
    }

    pub async fn task_by_id(&self, actor: &Actor, id: Uuid) -> CoreResult<Task> {
        self.owned_task(actor, id).await
    }

    /// Tasks of a project owned by the actor
    pub async fn project_tasks(&self, actor: &Actor, project_id: Uuid) -> CoreResult<Vec<Task>> {
        let project = self.owned_project(actor, project_id).await?;
        self.tasks.tasks_by_project(project.id).await
    }

    /// Tasks owned by the actor across all projects
    pub async fn user_tasks(&self, actor: &Actor) -> CoreResult<Vec<Task>> {
        self.tasks.tasks_by_owner(actor.user_id).await
    }

    pub async fn update_task(&self, actor: &Actor, id: Uuid, update: UpdateTask) -> CoreResult<Task> {
        self.owned_task(actor, id).await?;

        if matches!(update.name.as_deref(), Some("")) {
            return Err(CoreError::BadRequest("name must not be empty".to_string()));
        }

        self.tasks
            .update_task(id, update)
            .await?
            .ok_or_else(|| CoreError::not_found(TASK))
    }

    pub async fn delete_task(&self, actor: &Actor, id: Uuid) -> CoreResult<()> {
        self.owned_task(actor, id).await?;
        self.tasks.delete_task(id).await?;
        Ok(())
    }
}
