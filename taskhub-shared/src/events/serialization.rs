/// Notification serialization for Redis Streams
///
/// Redis Streams store entries as flat field-value string pairs. Each
/// published notification becomes one entry:
///
/// ```text
/// key: "Xk3...Q9"            (code, or "notification" for VIP messages)
/// subject: "Verification"
/// receiver: "alice@example.com"
/// message: "Follow link to verify your email\n ..."
/// ```
///
/// Consumers (the mail sender) deduplicate on `key`.

use super::Notification;
use std::collections::HashMap;
use thiserror::Error;

/// Serialization errors
#[derive(Error, Debug)]
pub enum SerializationError {
    /// Missing required field
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// Field present but unusable
    #[error("Invalid field value for {field}: {error}")]
    InvalidValue { field: String, error: String },
}

/// Converts a keyed notification into XADD field-value pairs
///
/// Field order is fixed so entries read back identically.
pub fn serialize_notification(
    key: &str,
    notification: &Notification,
) -> Result<Vec<(&'static str, String)>, SerializationError> {
    if key.is_empty() {
        return Err(SerializationError::InvalidValue {
            field: "key".to_string(),
            error: "must not be empty".to_string(),
        });
    }

    if notification.receiver.is_empty() {
        return Err(SerializationError::InvalidValue {
            field: "receiver".to_string(),
            error: "must not be empty".to_string(),
        });
    }

    Ok(vec![
        ("key", key.to_string()),
        ("subject", notification.subject.clone()),
        ("receiver", notification.receiver.clone()),
        ("message", notification.message.clone()),
    ])
}

/// Reads a stream entry back into `(key, notification)`
pub fn deserialize_notification(
    fields: &HashMap<String, String>,
) -> Result<(String, Notification), SerializationError> {
    let get = |name: &str| -> Result<String, SerializationError> {
        fields
            .get(name)
            .cloned()
            .ok_or_else(|| SerializationError::MissingField(name.to_string()))
    };

    let key = get("key")?;
    let notification = Notification {
        subject: get("subject")?,
        receiver: get("receiver")?,
        message: get("message")?,
    };

    Ok((key, notification))
}
