/// Invitation endpoints
///
/// - `POST /invitations` - Invite a registered user to one of your projects
/// - `GET /invitations/accept?code=` - Redeem the code from an invitation link

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::CodeQuery,
};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use taskhub_shared::{auth::authorization::Actor, models::MembershipGrant};
use uuid::Uuid;
use validator::Validate;

/// Invitation request
#[derive(Debug, Deserialize, Validate)]
pub struct InviteRequest {
    pub project_id: Uuid,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// Sends an invitation link to the user registered under `email`
///
/// # Errors
///
/// - `400 Bad Request`: Malformed body
/// - `403 Forbidden`: Not the project owner
/// - `404 Not Found`: Unknown project or no user with that email
pub async fn invite(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    payload: Result<Json<InviteRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(req) = payload?;
    req.validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    state
        .services
        .invitations
        .invite(&actor, req.project_id, &req.email)
        .await?;

    Ok(StatusCode::ACCEPTED)
}

/// Adds the invitee to the project; codes are single use
pub async fn accept(
    State(state): State<AppState>,
    query: Result<Query<CodeQuery>, QueryRejection>,
) -> ApiResult<Json<MembershipGrant>> {
    let Query(query) = query?;
    let grant = state.services.invitations.redeem(&query.code).await?;

    Ok(Json(grant))
}
