/// Outbound notification messages
///
/// Every email-bound message in the system has the same three-field shape
/// (`subject`, `receiver`, `message`) and is published under a partition
/// key. Verification and invitation messages are keyed by their one-time
/// code; the VIP status message uses the fixed key [`VIP_MESSAGE_KEY`].
///
/// Publishing goes through the [`NotificationPublisher`] port. The Redis
/// Streams implementation lives in [`crate::redis::stream_writer`]; tests
/// use [`crate::memory::MemoryPublisher`].
///
/// # Example
///
/// ```
/// use taskhub_shared::events::verification_message;
///
/// let msg = verification_message("alice@example.com", "c1", "https://taskhub.dev");
/// assert_eq!(msg.subject, "Verification");
/// assert!(msg.message.contains("https://taskhub.dev/auth/verify?code=c1"));
/// ```

pub mod serialization;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use serialization::{deserialize_notification, serialize_notification, SerializationError};

/// Subject of the email verification message
pub const VERIFICATION_SUBJECT: &str = "Verification";

/// Subject of the project invitation message
pub const INVITATION_SUBJECT: &str = "Invitation";

/// Notification subject recorded in the idempotency ledger for VIP promotion
pub const STATUS_UPDATE_SUBJECT: &str = "status update";

/// Partition key used for every VIP status message
pub const VIP_MESSAGE_KEY: &str = "notification";

const VIP_MESSAGE_TEXT: &str = "You are VIP client now";

/// A message bound for a single recipient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub subject: String,
    pub receiver: String,
    pub message: String,
}

/// Errors raised while handing a message to the queue
#[derive(Debug, Error)]
pub enum PublishError {
    /// Queue backend rejected the write or is unreachable
    #[error("queue unavailable: {0}")]
    Unavailable(String),

    /// Message could not be encoded
    #[error("failed to encode message: {0}")]
    Encode(#[from] SerializationError),
}

/// Port for publishing notifications to the message queue
///
/// Implementations perform a single attempt. Callers decide what a failure
/// means; nothing in the core retries.
#[async_trait]
pub trait NotificationPublisher: Send + Sync {
    /// Publishes `notification` under `key`, returning the queue entry ID
    async fn publish(&self, key: &str, notification: &Notification)
        -> Result<String, PublishError>;
}

/// Builds the email verification message
pub fn verification_message(email: &str, code: &str, public_url: &str) -> Notification {
    Notification {
        subject: VERIFICATION_SUBJECT.to_string(),
        receiver: email.to_string(),
        message: format!(
            "Follow link to verify your email\n {}/auth/verify?code={}",
            public_url.trim_end_matches('/'),
            code
        ),
    }
}

/// Builds the project invitation message
pub fn invitation_message(
    email: &str,
    code: &str,
    project_name: &str,
    public_url: &str,
) -> Notification {
    Notification {
        subject: INVITATION_SUBJECT.to_string(),
        receiver: email.to_string(),
        message: format!(
            "You are invited to {}\nFollow link to accept invitation\n {}/invitations/accept?code={}",
            project_name,
            public_url.trim_end_matches('/'),
            code
        ),
    }
}

/// Builds the VIP promotion message
pub fn vip_status_message(email: &str) -> Notification {
    Notification {
        subject: format!("New notification: {}", STATUS_UPDATE_SUBJECT),
        receiver: email.to_string(),
        message: VIP_MESSAGE_TEXT.to_string(),
    }
}
