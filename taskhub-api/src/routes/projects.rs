/// Project endpoints
///
/// All routes require a session. Reads and writes on a single project are
/// limited to its owner.
///
/// - `POST /projects` - Create a project
/// - `GET /projects` - List own projects
/// - `GET|PUT|DELETE /projects/:id`
/// - `GET /projects/:id/users` - Members
/// - `GET /projects/:id/tasks` - Tasks

use crate::{
    app::AppState,
    error::{parse_id, ApiResult},
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use taskhub_shared::{
    auth::authorization::Actor,
    models::{Project, Task, UpdateProject, User},
    services::NewProject,
};

pub async fn create_project(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    payload: Result<Json<NewProject>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    let Json(req) = payload?;
    let project = state.services.projects.create_project(&actor, req).await?;

    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn list_projects(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<Vec<Project>>> {
    Ok(Json(state.services.projects.user_projects(&actor).await?))
}

pub async fn get_project(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> ApiResult<Json<Project>> {
    let project = state
        .services
        .projects
        .project_by_id(&actor, parse_id(&id)?)
        .await?;

    Ok(Json(project))
}

pub async fn update_project(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateProject>, JsonRejection>,
) -> ApiResult<Json<Project>> {
    let id = parse_id(&id)?;
    let Json(update) = payload?;

    let project = state
        .services
        .projects
        .update_project(&actor, id, update)
        .await?;

    Ok(Json(project))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .services
        .projects
        .delete_project(&actor, parse_id(&id)?)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn project_users(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<User>>> {
    let users = state
        .services
        .accounts
        .project_users(&actor, parse_id(&id)?)
        .await?;

    Ok(Json(users))
}

pub async fn project_tasks(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = state
        .services
        .projects
        .project_tasks(&actor, parse_id(&id)?)
        .await?;

    Ok(Json(tasks))
}
