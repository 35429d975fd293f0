/// Cache-aside decorator for [`UserStore`]
///
/// Wraps a durable store and a [`UserCache`]. The durable store is the
/// source of truth; the cache is an accelerator that may be empty, stale by
/// at most [`USER_CACHE_TTL`], or down entirely.
///
/// # Read path (`user_by_id`)
///
/// 1. Cache hit: return the cached user.
/// 2. Miss, backend error or undecodable entry: read the durable store.
/// 3. Durable hit: best-effort cache fill.
///
/// # Write path
///
/// - `create_user`: durable insert, then best-effort cache fill.
/// - `delete_user`: durable delete, then best-effort invalidation.
/// - `mark_notified`: durable mark, then a best-effort refresh of the
///   cached copy. Once the mark commits the call returns `Ok`.
///
/// Cache failures are logged at `warn` and never returned.

use super::{CacheError, UserCache, UserStore};
use crate::error::CoreResult;
use crate::models::{CreateUser, MarkOutcome, User, UserCredentials};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Lifetime of a cached user entry
pub const USER_CACHE_TTL: Duration = Duration::from_secs(60);

/// [`UserStore`] that consults a cache before the durable layer
pub struct CacheAsideUserStore<S: ?Sized, C: ?Sized> {
    durable: Arc<S>,
    cache: Arc<C>,
    ttl: Duration,
}

impl<S, C> CacheAsideUserStore<S, C>
where
    S: UserStore + ?Sized,
    C: UserCache + ?Sized,
{
    /// Creates the decorator with the default TTL
    pub fn new(durable: Arc<S>, cache: Arc<C>) -> Self {
        Self::with_ttl(durable, cache, USER_CACHE_TTL)
    }

    pub fn with_ttl(durable: Arc<S>, cache: Arc<C>, ttl: Duration) -> Self {
        Self {
            durable,
            cache,
            ttl,
        }
    }

    async fn fill(&self, user: &User) {
        if let Err(e) = self.cache.put(user, self.ttl).await {
            log_cache_error("put", user.id, &e);
        }
    }
}

fn log_cache_error(op: &'static str, user_id: Uuid, err: &CacheError) {
    tracing::warn!(op, user_id = %user_id, error = %err, "User cache unavailable, continuing without it");
}

#[async_trait]
impl<S, C> UserStore for CacheAsideUserStore<S, C>
where
    S: UserStore + ?Sized,
    C: UserCache + ?Sized,
{
    async fn create_user(&self, data: CreateUser) -> CoreResult<User> {
        let user = self.durable.create_user(data).await?;
        self.fill(&user).await;
        Ok(user)
    }

    async fn delete_user(&self, id: Uuid) -> CoreResult<bool> {
        let deleted = self.durable.delete_user(id).await?;

        if let Err(e) = self.cache.invalidate(id).await {
            log_cache_error("invalidate", id, &e);
        }

        Ok(deleted)
    }

    async fn user_by_id(&self, id: Uuid) -> CoreResult<Option<User>> {
        match self.cache.get(id).await {
            Ok(Some(user)) => {
                tracing::trace!(user_id = %id, "User cache hit");
                return Ok(Some(user));
            }
            Ok(None) => tracing::trace!(user_id = %id, "User cache miss"),
            Err(e) => log_cache_error("get", id, &e),
        }

        let user = self.durable.user_by_id(id).await?;
        if let Some(user) = &user {
            self.fill(user).await;
        }

        Ok(user)
    }

    async fn user_by_email(&self, email: &str) -> CoreResult<Option<User>> {
        self.durable.user_by_email(email).await
    }

    async fn credentials_by_email(&self, email: &str) -> CoreResult<Option<UserCredentials>> {
        self.durable.credentials_by_email(email).await
    }

    async fn project_users(&self, project_id: Uuid) -> CoreResult<Vec<User>> {
        self.durable.project_users(project_id).await
    }

    async fn users_to_notify(
        &self,
        subject: &str,
        created_before: DateTime<Utc>,
    ) -> CoreResult<Vec<User>> {
        self.durable.users_to_notify(subject, created_before).await
    }

    async fn mark_notified(&self, email: &str, subject: &str) -> CoreResult<MarkOutcome> {
        let outcome = self.durable.mark_notified(email, subject).await?;

        // VIP status changed; replace the cached copy. The mark has
        // committed, so a failed re-read must not surface as an error.
        if outcome == MarkOutcome::Marked {
            match self.durable.user_by_email(email).await {
                Ok(Some(user)) => self.fill(&user).await,
                Ok(None) => {}
                Err(e) => tracing::warn!(
                    error = %e,
                    "Failed to re-read marked user, cached copy left to expire"
                ),
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::memory::{MemoryStore, MemoryUserCache};
    use crate::models::VipStatus;

    fn new_user(email: &str) -> CreateUser {
        CreateUser {
            name: "Test".to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$test".to_string(),
            created_at: Utc::now(),
        }
    }

    fn setup() -> (
        Arc<MemoryStore>,
        Arc<MemoryUserCache>,
        CacheAsideUserStore<MemoryStore, MemoryUserCache>,
    ) {
        let durable = Arc::new(MemoryStore::new());
        let cache = Arc::new(MemoryUserCache::new());
        let store = CacheAsideUserStore::new(durable.clone(), cache.clone());
        (durable, cache, store)
    }

    #[tokio::test]
    async fn test_create_fills_cache() {
        let (_, cache, store) = setup();

        let user = store.create_user(new_user("a@example.com")).await.unwrap();

        assert_eq!(cache.peek(user.id), Some(user));
    }

    #[tokio::test]
    async fn test_read_with_unavailable_cache_hits_durable_store() {
        let (_, cache, store) = setup();
        let user = store.create_user(new_user("a@example.com")).await.unwrap();

        cache.set_available(false);

        let found = store.user_by_id(user.id).await.unwrap();
        assert_eq!(found, Some(user));
    }

    #[tokio::test]
    async fn test_create_succeeds_with_unavailable_cache() {
        let (durable, cache, store) = setup();
        cache.set_available(false);

        let user = store.create_user(new_user("a@example.com")).await.unwrap();

        assert!(durable.user_by_id(user.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_miss_repopulates_cache() {
        let (durable, cache, store) = setup();
        let user = durable.create_user(new_user("a@example.com")).await.unwrap();
        assert!(cache.peek(user.id).is_none());

        store.user_by_id(user.id).await.unwrap();

        assert_eq!(cache.peek(user.id), Some(user));
    }

    #[tokio::test]
    async fn test_cache_hit_skips_durable_store() {
        let (durable, cache, store) = setup();
        let user = store.create_user(new_user("a@example.com")).await.unwrap();

        // Change the durable copy behind the cache's back
        durable
            .mark_notified(&user.email, "status update")
            .await
            .unwrap();

        let cached = store.user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(cached.vip_status, VipStatus::None);

        cache.clear();
        let fresh = store.user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(fresh.vip_status, VipStatus::Active);
    }

    #[tokio::test]
    async fn test_delete_invalidates_cache() {
        let (_, cache, store) = setup();
        let user = store.create_user(new_user("a@example.com")).await.unwrap();

        assert!(store.delete_user(user.id).await.unwrap());

        assert!(cache.peek(user.id).is_none());
        assert!(store.user_by_id(user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mark_notified_refreshes_cached_user() {
        let (_, cache, store) = setup();
        let user = store.create_user(new_user("a@example.com")).await.unwrap();

        let outcome = store
            .mark_notified("A@example.com", "status update")
            .await
            .unwrap();

        assert_eq!(outcome, MarkOutcome::Marked);
        assert_eq!(cache.peek(user.id).unwrap().vip_status, VipStatus::Active);
    }

    /// Durable store whose email lookup is down
    struct EmailLookupDown(Arc<MemoryStore>);

    #[async_trait]
    impl UserStore for EmailLookupDown {
        async fn create_user(&self, data: CreateUser) -> CoreResult<User> {
            self.0.create_user(data).await
        }

        async fn delete_user(&self, id: Uuid) -> CoreResult<bool> {
            self.0.delete_user(id).await
        }

        async fn user_by_id(&self, id: Uuid) -> CoreResult<Option<User>> {
            self.0.user_by_id(id).await
        }

        async fn user_by_email(&self, _email: &str) -> CoreResult<Option<User>> {
            Err(CoreError::Internal("connection reset".to_string()))
        }

        async fn credentials_by_email(&self, email: &str) -> CoreResult<Option<UserCredentials>> {
            self.0.credentials_by_email(email).await
        }

        async fn project_users(&self, project_id: Uuid) -> CoreResult<Vec<User>> {
            self.0.project_users(project_id).await
        }

        async fn users_to_notify(
            &self,
            subject: &str,
            created_before: DateTime<Utc>,
        ) -> CoreResult<Vec<User>> {
            self.0.users_to_notify(subject, created_before).await
        }

        async fn mark_notified(&self, email: &str, subject: &str) -> CoreResult<MarkOutcome> {
            self.0.mark_notified(email, subject).await
        }
    }

    #[tokio::test]
    async fn test_mark_notified_survives_failed_refresh() {
        let inner = Arc::new(MemoryStore::new());
        let cache = Arc::new(MemoryUserCache::new());
        let store =
            CacheAsideUserStore::new(Arc::new(EmailLookupDown(inner.clone())), cache.clone());
        let user = store.create_user(new_user("a@example.com")).await.unwrap();

        let outcome = store
            .mark_notified("a@example.com", "status update")
            .await
            .unwrap();

        assert_eq!(outcome, MarkOutcome::Marked);
        assert!(inner
            .notification_record("a@example.com", "status update")
            .is_some());
        // Refresh failed, the previous entry stays until it expires
        assert_eq!(cache.peek(user.id).unwrap().vip_status, VipStatus::None);
    }

    #[tokio::test]
    async fn test_missing_user_is_none() {
        let (_, _, store) = setup();
        assert!(store.user_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }
}
