/// Project invitations
///
/// A project owner invites an existing user by email. The invitee receives
/// a single-use link; following it adds them to the project's membership
/// set. Codes expire after a configurable TTL.
///
/// # Check order for `invite`
///
/// 1. Project exists, else `NotFound`
/// 2. Caller owns it, else `Forbidden`
/// 3. Invitee exists, else `NotFound`
///
/// The invitation message is published synchronously; a queue failure is
/// returned to the caller and the stored code simply stays unused.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::authorization::{authorize, Actor};
use super::token::{generate_token, hash_token, validate_token_format};
use crate::error::{CoreError, CoreResult};
use crate::events::{invitation_message, NotificationPublisher};
use crate::models::MembershipGrant;
use crate::store::{ProjectStore, UserStore};

/// Default invitation lifetime in days
pub const DEFAULT_INVITATION_TTL_DAYS: i64 = 7;

const UNKNOWN_CODE: &str = "invitation code";

/// Issues and redeems project invitations
pub struct InvitationFlow {
    projects: Arc<dyn ProjectStore>,
    users: Arc<dyn UserStore>,
    publisher: Arc<dyn NotificationPublisher>,
    public_url: String,
    ttl: chrono::Duration,
}

impl InvitationFlow {
    pub fn new(
        projects: Arc<dyn ProjectStore>,
        users: Arc<dyn UserStore>,
        publisher: Arc<dyn NotificationPublisher>,
        public_url: impl Into<String>,
    ) -> Self {
        Self {
            projects,
            users,
            publisher,
            public_url: public_url.into(),
            ttl: chrono::Duration::days(DEFAULT_INVITATION_TTL_DAYS),
        }
    }

    /// Overrides the invitation lifetime
    pub fn with_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Invites the user registered under `email` to `project_id`
    pub async fn invite(&self, actor: &Actor, project_id: Uuid, email: &str) -> CoreResult<()> {
        let project = authorize(
            actor,
            self.projects.project_by_id(project_id).await?,
            "project",
        )?;

        let invitee = self
            .users
            .user_by_email(email)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("user {}", email)))?;

        let (code, code_hash) = generate_token();
        self.projects
            .save_invitation_code(&code_hash, invitee.id, project.id)
            .await?;

        let message = invitation_message(&invitee.email, &code, &project.name, &self.public_url);
        let entry_id = self.publisher.publish(&code, &message).await?;

        tracing::info!(
            project_id = %project.id,
            invitee_id = %invitee.id,
            entry_id = %entry_id,
            "Invitation sent"
        );

        Ok(())
    }

    /// Consumes `code` and adds the invitee to the project
    ///
    /// Redeeming when already a member succeeds and changes nothing.
    ///
    /// # Errors
    ///
    /// `NotFound` for malformed, unknown, expired or already redeemed codes
    pub async fn redeem(&self, code: &str) -> CoreResult<MembershipGrant> {
        if !validate_token_format(code) {
            return Err(CoreError::not_found(UNKNOWN_CODE));
        }

        let issued_after = Utc::now() - self.ttl;
        let grant = self
            .projects
            .redeem_invitation_code(&hash_token(code), issued_after)
            .await?
            .ok_or_else(|| CoreError::not_found(UNKNOWN_CODE))?;

        tracing::info!(
            project_id = %grant.project_id,
            user_id = %grant.user_id,
            "Invitation accepted"
        );

        Ok(grant)
    }
}
