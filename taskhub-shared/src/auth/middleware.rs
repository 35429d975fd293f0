/// Session cookie authentication middleware for Axum
///
/// Reads the `session_id` cookie, resolves it through the
/// [`SessionManager`] and adds the resulting [`Actor`] and [`User`] to the
/// request extensions. Requests without a valid session are rejected with
/// `401` and a JSON body `{"error": "..."}`.
///
/// # Cookie
///
/// `session_id=<token>; Path=/; Secure; HttpOnly; Max-Age=86400`
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use axum::{Router, routing::get, middleware, Extension};
/// use taskhub_shared::auth::authorization::Actor;
/// use taskhub_shared::auth::middleware::create_session_middleware;
/// use taskhub_shared::auth::session::SessionManager;
///
/// async fn whoami(Extension(actor): Extension<Actor>) -> String {
///     actor.email
/// }
///
/// fn router(sessions: Arc<SessionManager>) -> Router {
///     Router::new()
///         .route("/auth/me", get(whoami))
///         .layer(middleware::from_fn(create_session_middleware(sessions)))
/// }
/// ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::{
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use cookie::Cookie;
use serde_json::json;

use super::authorization::Actor;
use super::session::SessionManager;
use crate::error::{CoreError, ErrorKind};

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session_id";

/// Error type for the session middleware
#[derive(Debug)]
pub enum AuthError {
    /// No session cookie on the request
    MissingCredentials,

    /// Cookie present but not a live session
    InvalidSession(String),

    /// Store failure while resolving
    Internal(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingCredentials => {
                (StatusCode::UNAUTHORIZED, "missing session".to_string())
            }
            AuthError::InvalidSession(msg) => (StatusCode::UNAUTHORIZED, msg),
            AuthError::Internal(msg) => {
                tracing::error!(error = %msg, "Session resolution failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<CoreError> for AuthError {
    fn from(err: CoreError) -> Self {
        match err.kind() {
            ErrorKind::Internal => AuthError::Internal(err.to_string()),
            _ => AuthError::InvalidSession(err.to_string()),
        }
    }
}

/// Builds the cookie that carries a freshly issued session token
pub fn session_cookie(token: String, ttl: chrono::Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .secure(secure)
        .http_only(true)
        .max_age(cookie::time::Duration::seconds(ttl.num_seconds()))
        .build()
}

/// Builds a cookie that makes the client drop its session cookie
pub fn removal_cookie(secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .secure(secure)
        .http_only(true)
        .build();
    cookie.make_removal();
    cookie
}

/// Extracts the session token from the `Cookie` headers, if present
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
}

/// Session authentication middleware
///
/// # Errors
///
/// Returns 401 if the cookie is missing or does not resolve to a live
/// session, 500 if the store fails.
pub async fn session_auth_middleware(
    sessions: Arc<SessionManager>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = session_token(req.headers()).ok_or(AuthError::MissingCredentials)?;

    let user = sessions.resolve(&token).await?;

    req.extensions_mut().insert(Actor::from_user(&user));
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

/// Creates a session middleware closure for `axum::middleware::from_fn`
pub fn create_session_middleware(
    sessions: Arc<SessionManager>,
) -> impl Fn(Request, Next) -> Pin<Box<dyn Future<Output = Result<Response, AuthError>> + Send>>
       + Clone {
    move |req, next| {
        let sessions = sessions.clone();
        Box::pin(session_auth_middleware(sessions, req, next))
    }
}
