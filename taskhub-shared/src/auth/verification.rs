/// Email verification codes
///
/// Registration issues one code per new account and mails a link carrying
/// it. Redeeming the code flips the account to verified, which is the only
/// way an account becomes able to log in.
///
/// Codes are single use: the first redemption consumes the code, any later
/// one fails with `NotFound`, exactly like a code that never existed.

use std::sync::Arc;

use uuid::Uuid;

use super::token::{generate_token, hash_token, validate_token_format};
use crate::error::{CoreError, CoreResult};
use crate::events::{verification_message, NotificationPublisher};
use crate::store::{UserCache, VerificationStore};

const UNKNOWN_CODE: &str = "verification code";

/// Issues, mails and redeems verification codes
pub struct VerificationFlow {
    codes: Arc<dyn VerificationStore>,
    publisher: Arc<dyn NotificationPublisher>,
    public_url: String,
    cache: Option<Arc<dyn UserCache>>,
}

impl VerificationFlow {
    /// Creates the flow
    ///
    /// `public_url` is the externally reachable base URL used in links.
    pub fn new(
        codes: Arc<dyn VerificationStore>,
        publisher: Arc<dyn NotificationPublisher>,
        public_url: impl Into<String>,
    ) -> Self {
        Self {
            codes,
            publisher,
            public_url: public_url.into(),
            cache: None,
        }
    }

    /// Evicts the cached user entry whenever a code is redeemed
    pub fn with_cache(mut self, cache: Arc<dyn UserCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Generates and stores a fresh code for `user_id`
    pub async fn issue_code(&self, user_id: Uuid) -> CoreResult<String> {
        let (code, code_hash) = generate_token();
        self.codes.save_verification_code(&code_hash, user_id).await?;

        tracing::debug!(user_id = %user_id, "Verification code issued");

        Ok(code)
    }

    /// Consumes `code` and marks its owner verified
    ///
    /// # Returns
    ///
    /// The ID of the verified user
    ///
    /// The cached user entry is evicted after the commit. A concurrent cache
    /// miss that read the row before the commit can still refill the entry
    /// with `is_verified = false`; it expires within the cache TTL. Login reads
    /// credentials from the durable store and is not affected.
    ///
    /// # Errors
    ///
    /// `NotFound` for malformed, unknown or already redeemed codes
    pub async fn redeem(&self, code: &str) -> CoreResult<Uuid> {
        if !validate_token_format(code) {
            return Err(CoreError::not_found(UNKNOWN_CODE));
        }

        let user_id = self
            .codes
            .redeem_verification_code(&hash_token(code))
            .await?
            .ok_or_else(|| CoreError::not_found(UNKNOWN_CODE))?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.invalidate(user_id).await {
                tracing::warn!(user_id = %user_id, error = %e, "Failed to evict verified user from cache");
            }
        }

        tracing::info!(user_id = %user_id, "Email verified");

        Ok(user_id)
    }

    /// Publishes the verification link for `code` to `email`
    ///
    /// The message is keyed by the code.
    pub async fn send_link(&self, code: &str, email: &str) -> CoreResult<()> {
        let message = verification_message(email, code, &self.public_url);
        let entry_id = self.publisher.publish(code, &message).await?;

        tracing::debug!(entry_id = %entry_id, "Verification link published");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::VERIFICATION_SUBJECT;
    use crate::memory::{MemoryPublisher, MemoryStore};
    use crate::models::CreateUser;
    use crate::store::UserStore;
    use chrono::Utc;

    async fn setup() -> (Arc<MemoryStore>, Arc<MemoryPublisher>, VerificationFlow, Uuid) {
        let store = Arc::new(MemoryStore::new());
        let publisher = Arc::new(MemoryPublisher::new());
        let user = store
            .create_user(CreateUser {
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
                password_hash: "hash".to_string(),
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        let flow = VerificationFlow::new(store.clone(), publisher.clone(), "http://localhost:8080");
        (store, publisher, flow, user.id)
    }

    #[tokio::test]
    async fn test_redeem_marks_verified() {
        let (store, _, flow, user_id) = setup().await;

        let code = flow.issue_code(user_id).await.unwrap();
        assert_eq!(flow.redeem(&code).await.unwrap(), user_id);

        let user = store.user_by_id(user_id).await.unwrap().unwrap();
        assert!(user.is_verified);
    }

    #[tokio::test]
    async fn test_redeem_evicts_cached_user() {
        let (store, _, flow, user_id) = setup().await;
        let cache = Arc::new(crate::memory::MemoryUserCache::new());
        let stale = store.user_by_id(user_id).await.unwrap().unwrap();
        cache
            .put(&stale, std::time::Duration::from_secs(60))
            .await
            .unwrap();
        let flow = flow.with_cache(cache.clone());

        let code = flow.issue_code(user_id).await.unwrap();
        flow.redeem(&code).await.unwrap();

        assert!(cache.peek(user_id).is_none());
    }

    #[tokio::test]
    async fn test_second_redeem_is_not_found() {
        let (_, _, flow, user_id) = setup().await;

        let code = flow.issue_code(user_id).await.unwrap();
        flow.redeem(&code).await.unwrap();

        let err = flow.redeem(&code).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_codes() {
        let (_, _, flow, _) = setup().await;

        let unknown = flow.redeem(&generate_token().0).await.unwrap_err();
        let malformed = flow.redeem("not a code").await.unwrap_err();

        assert!(matches!(unknown, CoreError::NotFound(_)));
        assert_eq!(unknown.to_string(), malformed.to_string());
    }

    #[tokio::test]
    async fn test_send_link_keys_by_code() {
        let (_, publisher, flow, user_id) = setup().await;
        let code = flow.issue_code(user_id).await.unwrap();

        flow.send_link(&code, "alice@example.com").await.unwrap();

        let published = publisher.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, code);
        assert_eq!(published[0].1.subject, VERIFICATION_SUBJECT);
        assert!(published[0]
            .1
            .message
            .contains(&format!("http://localhost:8080/auth/verify?code={}", code)));
    }

    #[tokio::test]
    async fn test_send_link_failure_is_returned() {
        let (_, publisher, flow, _) = setup().await;
        publisher.set_failing(true);

        let err = flow.send_link("code", "alice@example.com").await.unwrap_err();
        assert!(matches!(err, CoreError::Publish(_)));
    }
}
