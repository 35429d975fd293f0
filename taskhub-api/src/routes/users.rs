/// User endpoints
///
/// - `GET /users/:id` - Look up a user
/// - `DELETE /users/:id` - Delete your own account

use crate::{
    app::AppState,
    error::{parse_id, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use taskhub_shared::{auth::authorization::Actor, models::User};

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<User>> {
    let user = state.services.accounts.user_by_id(parse_id(&id)?).await?;
    Ok(Json(user))
}

/// Deletes the account; sessions, owned projects and tasks go with it
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .services
        .accounts
        .delete_user(&actor, parse_id(&id)?)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
