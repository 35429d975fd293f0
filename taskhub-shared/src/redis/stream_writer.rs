/// Redis Stream writer for outbound notifications
///
/// Implements [`NotificationPublisher`] by appending one entry per message
/// to the configured topic stream.
///
/// # Architecture
///
/// ```text
/// VerificationFlow / InvitationFlow / NotificationDispatcher
///     │
///     │ publish(key, notification)
///     ▼
/// StreamWriter
///     │
///     │ XADD {topic} * key .. subject .. receiver .. message ..
///     ▼
/// Redis Stream ──> mail sender (deduplicates on key)
/// ```
///
/// Each publish is a single XADD attempt. A failure is returned to the
/// caller as [`PublishError::Unavailable`]; nothing here retries.
///
/// # Example
///
/// ```no_run
/// use taskhub_shared::events::{vip_status_message, NotificationPublisher, VIP_MESSAGE_KEY};
/// use taskhub_shared::redis::client::{RedisClient, RedisConfig};
/// use taskhub_shared::redis::stream_writer::StreamWriter;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = RedisClient::new(RedisConfig::new("redis://localhost:6379")).await?;
/// let writer = StreamWriter::new(client, "notifications");
///
/// let entry_id = writer
///     .publish(VIP_MESSAGE_KEY, &vip_status_message("carol@example.com"))
///     .await?;
/// println!("Published entry {}", entry_id);
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use redis::AsyncCommands;

use super::client::RedisClient;
use crate::events::{serialize_notification, Notification, NotificationPublisher, PublishError};

/// Default stream name for notifications
pub const DEFAULT_NOTIFICATION_TOPIC: &str = "notifications";

/// Publishes notifications to a Redis Stream
#[derive(Clone)]
pub struct StreamWriter {
    client: RedisClient,
    topic: String,
}

impl StreamWriter {
    /// Creates a writer appending to stream `topic`
    pub fn new(client: RedisClient, topic: impl Into<String>) -> Self {
        Self {
            client,
            topic: topic.into(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[async_trait]
impl NotificationPublisher for StreamWriter {
    async fn publish(
        &self,
        key: &str,
        notification: &Notification,
    ) -> Result<String, PublishError> {
        let fields = serialize_notification(key, notification)?;
        let items: Vec<(&str, &str)> = fields.iter().map(|(k, v)| (*k, v.as_str())).collect();

        let mut conn = self.client.get_connection();
        let entry_id: String = self
            .client
            .timed(conn.xadd(&self.topic, "*", &items))
            .await
            .map_err(|e| {
                tracing::warn!(
                    topic = %self.topic,
                    subject = %notification.subject,
                    error = %e,
                    "XADD failed"
                );
                PublishError::Unavailable(e.to_string())
            })?;

        tracing::debug!(
            topic = %self.topic,
            subject = %notification.subject,
            entry_id = %entry_id,
            "Published notification"
        );

        Ok(entry_id)
    }
}
