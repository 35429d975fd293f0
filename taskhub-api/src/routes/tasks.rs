/// Task endpoints
///
/// - `POST /tasks` - Create a task in one of your projects
/// - `GET /tasks` - List own tasks
/// - `GET|PUT|DELETE /tasks/:id`

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
    models::{Task, UpdateTask},
    services::NewTask,
};

pub async fn create_task(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    payload: Result<Json<NewTask>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let Json(req) = payload?;
    let task = state.services.projects.create_task(&actor, req).await?;

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<Vec<Task>>> {
    Ok(Json(state.services.projects.user_tasks(&actor).await?))
}

pub async fn get_task(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> ApiResult<Json<Task>> {
    let task = state
        .services
        .projects
        .task_by_id(&actor, parse_id(&id)?)
        .await?;

    Ok(Json(task))
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTask>, JsonRejection>,
) -> ApiResult<Json<Task>> {
    let id = parse_id(&id)?;
    let Json(update) = payload?;

    let task = state
        .services
        .projects
        .update_task(&actor, id, update)
        .await?;

    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .services
        .projects
        .delete_task(&actor, parse_id(&id)?)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
