/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /auth/register` - Register a new account and mail a verification link
/// - `POST /auth/login` - Open a session; sets the `session_id` cookie
/// - `GET /auth/verify?code=` - Redeem a verification code
/// - `POST /auth/logout` - Revoke the current session
/// - `GET /auth/me` - The signed-in user

use crate::{app::AppState, error::ApiResult, routes::CodeQuery};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskhub_shared::{
    auth::{
        middleware::{removal_cookie, session_cookie, session_token},
        registration::RegisterUser,
    },
    models::User,
};
use uuid::Uuid;

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Seconds until the session expires
    pub expires_in: i64,
}

/// Verification response
#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub user_id: Uuid,
    pub verified: bool,
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /auth/register
/// Content-Type: application/json
///
/// {
///   "name": "Alice",
///   "email": "alice@example.com",
///   "password": "correct horse battery"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `409 Conflict`: Email already exists
/// - `500 Internal Server Error`: Store or queue failure
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterUser>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let Json(req) = payload?;
    let user = state.services.registration.register(req).await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Log in with email and password
///
/// Unknown emails and wrong passwords get the same `401`; an unverified
/// account gets its own `401` message.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = payload?;
    let sessions = &state.services.sessions;

    let token = sessions.login(&req.email, &req.password).await?;
    let cookie = session_cookie(token, sessions.ttl(), state.cookie_secure());

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie.to_string())]),
        Json(LoginResponse {
            expires_in: sessions.ttl().num_seconds(),
        }),
    ))
}

/// Redeem the code from a verification link
pub async fn verify(
    State(state): State<AppState>,
    query: Result<Query<CodeQuery>, QueryRejection>,
) -> ApiResult<Json<VerifyResponse>> {
    let Query(query) = query?;
    let user_id = state.services.verification.redeem(&query.code).await?;

    Ok(Json(VerifyResponse {
        user_id,
        verified: true,
    }))
}

/// Revoke the current session and clear the cookie
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    if let Some(token) = session_token(&headers) {
        state.services.sessions.revoke(&token).await?;
    }

    Ok((
        StatusCode::NO_CONTENT,
        AppendHeaders([(
            header::SET_COOKIE,
            removal_cookie(state.cookie_secure()).to_string(),
        )]),
    ))
}

/// The signed-in user
pub async fn me(Extension(user): Extension<User>) -> Json<User> {
    Json(user)
}
