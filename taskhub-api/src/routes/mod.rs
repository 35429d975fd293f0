/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login, logout, email verification, current user
/// - `users`: Account lookup and deletion
/// - `projects`: Project CRUD, members and project tasks
/// - `tasks`: Task CRUD
/// - `invitations`: Inviting users to projects and accepting invitations

pub mod auth;
pub mod health;
pub mod invitations;
pub mod projects;
pub mod tasks;
pub mod users;

/// `?code=` query of the verification and invitation links
#[derive(Debug, serde::Deserialize)]
pub struct CodeQuery {
    pub code: String,
}
