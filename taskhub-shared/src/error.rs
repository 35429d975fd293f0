/// Domain error taxonomy shared by every TaskHub component
///
/// All flows and services return [`CoreError`]. The HTTP layer classifies
/// errors through [`CoreError::kind`] rather than matching on variants, so new
/// infrastructure variants fall into the generic internal class automatically.
///
/// # Classification
///
/// | Kind           | Meaning                                                   |
/// |----------------|-----------------------------------------------------------|
/// | `NotFound`     | Resource, credential or one-time code absent              |
/// | `Unauthorized` | Missing/invalid session, bad credentials, unverified user |
/// | `Forbidden`    | Authenticated, but not the owner of the resource          |
/// | `BadRequest`   | Malformed input                                           |
/// | `Conflict`     | Duplicate email at registration                           |
/// | `Internal`     | Database, queue and hashing failures                      |
///
/// Cache failures never appear here: the cache-aside store recovers from them
/// locally.

use crate::auth::password::PasswordError;
use crate::events::PublishError;

/// Result alias used across the shared crate
pub type CoreResult<T> = Result<T, CoreError>;

/// Coarse error classification used for transport mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Unauthorized,
    Forbidden,
    BadRequest,
    Conflict,
    Internal,
}

/// Unified error type for the identity, session and authorization core
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Resource, credential or code does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller is not authenticated or presented bad credentials
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Credentials were valid but the account has not verified its email
    #[error("unauthorized: not verified, check your email")]
    NotVerified,

    /// Caller is authenticated but does not own the resource
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Malformed request input
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Uniqueness violation (duplicate email)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Durable store failure
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Message queue failure
    #[error("publish error: {0}")]
    Publish(#[from] PublishError),

    /// Password hashing failure
    #[error("password error: {0}")]
    Password(#[from] PasswordError),

    /// Anything else that should surface as a generic failure
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Returns the transport-level classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::NotFound(_) => ErrorKind::NotFound,
            CoreError::Unauthorized(_) | CoreError::NotVerified => ErrorKind::Unauthorized,
            CoreError::Forbidden(_) => ErrorKind::Forbidden,
            CoreError::BadRequest(_) => ErrorKind::BadRequest,
            CoreError::Conflict(_) => ErrorKind::Conflict,
            CoreError::Database(_)
            | CoreError::Publish(_)
            | CoreError::Password(_)
            | CoreError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Shorthand for a `NotFound` error
    pub fn not_found(what: impl Into<String>) -> Self {
        CoreError::NotFound(what.into())
    }

    /// Shorthand for a `Forbidden` error
    pub fn forbidden(reason: impl Into<String>) -> Self {
        CoreError::Forbidden(reason.into())
    }

    /// Returns true when the underlying database error is a unique violation
    pub fn is_unique_violation(err: &sqlx::Error) -> bool {
        matches!(
            err,
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505")
        )
    }
}
