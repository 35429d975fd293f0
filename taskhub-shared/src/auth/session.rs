/// Session management: login, resolution and logout
///
/// A session is an opaque random token handed to the client in the
/// `session_id` cookie. The durable store keeps only the token's SHA-256
/// hash, the owning user and the login time.
///
/// # Flow
///
/// ```text
/// login(email, password)
///     │ credentials_by_email ─► Unauthorized (unknown email)
///     │ verify_password ──────► Unauthorized (wrong password)
///     │ is_verified ──────────► Unauthorized (not verified)
///     ▼
/// token ──► client cookie
///
/// resolve(token)
///     │ format check, find_session(hash), age check
///     ▼
/// user_by_id (through the cache-aside store)
/// ```
///
/// Unknown email and wrong password produce the same error so the
/// response does not reveal which accounts exist.

use std::sync::Arc;

use chrono::Utc;

use super::password::verify_password;
use super::token::{generate_token, hash_token, validate_token_format};
use crate::error::{CoreError, CoreResult};
use crate::models::User;
use crate::store::{SessionStore, UserStore};

/// Default session lifetime in hours (same as the cookie max-age)
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24;

const INVALID_CREDENTIALS: &str = "invalid email or password";
const INVALID_SESSION: &str = "invalid or expired session";

/// Issues, resolves and revokes sessions
pub struct SessionManager {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    ttl: chrono::Duration,
}

impl SessionManager {
    pub fn new(users: Arc<dyn UserStore>, sessions: Arc<dyn SessionStore>) -> Self {
        Self::with_ttl(
            users,
            sessions,
            chrono::Duration::hours(DEFAULT_SESSION_TTL_HOURS),
        )
    }

    pub fn with_ttl(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        ttl: chrono::Duration,
    ) -> Self {
        Self {
            users,
            sessions,
            ttl,
        }
    }

    /// Session lifetime, also used for the cookie max-age
    pub fn ttl(&self) -> chrono::Duration {
        self.ttl
    }

    /// Authenticates a user and opens a new session
    ///
    /// # Returns
    ///
    /// The plaintext session token
    ///
    /// # Errors
    ///
    /// - `Unauthorized` for an unknown email or a wrong password
    /// - `NotVerified` if the email has not been verified yet
    pub async fn login(&self, email: &str, password: &str) -> CoreResult<String> {
        let credentials = self
            .users
            .credentials_by_email(email)
            .await?
            .ok_or_else(|| CoreError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        if !verify_password(password, &credentials.password_hash)? {
            tracing::info!(user_id = %credentials.user.id, "Login rejected: wrong password");
            return Err(CoreError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let user = credentials.user;
        if !user.is_verified {
            tracing::info!(user_id = %user.id, "Login rejected: email not verified");
            return Err(CoreError::NotVerified);
        }

        let (token, token_hash) = generate_token();
        self.sessions
            .create_session(&token_hash, user.id, Utc::now())
            .await?;

        tracing::info!(user_id = %user.id, "Session created");

        Ok(token)
    }

    /// Resolves a session token to its user
    ///
    /// # Errors
    ///
    /// `Unauthorized` if the token is malformed, unknown, expired, or its
    /// user no longer exists
    pub async fn resolve(&self, token: &str) -> CoreResult<User> {
        if !validate_token_format(token) {
            return Err(CoreError::Unauthorized(INVALID_SESSION.to_string()));
        }

        let session = self
            .sessions
            .find_session(&hash_token(token))
            .await?
            .ok_or_else(|| CoreError::Unauthorized(INVALID_SESSION.to_string()))?;

        if session.is_expired(self.ttl, Utc::now()) {
            tracing::debug!(user_id = %session.user_id, "Session expired");
            return Err(CoreError::Unauthorized(INVALID_SESSION.to_string()));
        }

        self.users
            .user_by_id(session.user_id)
            .await?
            .ok_or_else(|| CoreError::Unauthorized(INVALID_SESSION.to_string()))
    }

    /// Ends a session; unknown tokens are ignored
    pub async fn revoke(&self, token: &str) -> CoreResult<()> {
        if !validate_token_format(token) {
            return Ok(());
        }

        if self.sessions.delete_session(&hash_token(token)).await? {
            tracing::info!("Session revoked");
        }

        Ok(())
    }
}
