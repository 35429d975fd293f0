/// Application services and their wiring
///
/// [`Services::build`] assembles every flow on top of one durable store, one
/// user cache and one publisher. All user reads made by the flows go through
/// a single [`CacheAsideUserStore`].

pub mod projects;
pub mod users;

use std::sync::Arc;

use crate::auth::invitation::{InvitationFlow, DEFAULT_INVITATION_TTL_DAYS};
use crate::auth::registration::Registration;
use crate::auth::session::{SessionManager, DEFAULT_SESSION_TTL_HOURS};
use crate::auth::verification::VerificationFlow;
use crate::events::NotificationPublisher;
use crate::store::{
    CacheAsideUserStore, ProjectStore, SessionStore, TaskStore, UserCache, UserStore,
    VerificationStore,
};

pub use projects::{NewProject, NewTask, ProjectService};
pub use users::UserService;

/// Settings shared by the flows
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Externally reachable base URL used in mailed links
    pub public_url: String,
    pub session_ttl: chrono::Duration,
    pub invitation_ttl: chrono::Duration,
}

impl ServiceConfig {
    pub fn new(public_url: impl Into<String>) -> Self {
        Self {
            public_url: public_url.into().trim_end_matches('/').to_string(),
            session_ttl: chrono::Duration::hours(DEFAULT_SESSION_TTL_HOURS),
            invitation_ttl: chrono::Duration::days(DEFAULT_INVITATION_TTL_DAYS),
        }
    }
}

/// Everything a request handler needs
#[derive(Clone)]
pub struct Services {
    pub users: Arc<dyn UserStore>,
    pub sessions: Arc<SessionManager>,
    pub registration: Arc<Registration>,
    pub verification: Arc<VerificationFlow>,
    pub invitations: Arc<InvitationFlow>,
    pub accounts: Arc<UserService>,
    pub projects: Arc<ProjectService>,
}

impl Services {
    /// Wires the services over `store`, which backs every durable port
    pub fn build<S>(
        store: Arc<S>,
        cache: Arc<dyn UserCache>,
        publisher: Arc<dyn NotificationPublisher>,
        config: ServiceConfig,
    ) -> Self
    where
        S: UserStore + SessionStore + VerificationStore + ProjectStore + TaskStore + 'static,
    {
        let users: Arc<dyn UserStore> =
            Arc::new(CacheAsideUserStore::new(store.clone(), cache.clone()));
        let session_store: Arc<dyn SessionStore> = store.clone();
        let verification_store: Arc<dyn VerificationStore> = store.clone();
        let project_store: Arc<dyn ProjectStore> = store.clone();
        let task_store: Arc<dyn TaskStore> = store;

        let verification = Arc::new(
            VerificationFlow::new(verification_store, publisher.clone(), config.public_url.clone())
                .with_cache(cache),
        );

        let invitations = InvitationFlow::new(
            project_store.clone(),
            users.clone(),
            publisher,
            config.public_url.clone(),
        )
        .with_ttl(config.invitation_ttl);

        Self {
            sessions: Arc::new(SessionManager::with_ttl(
                users.clone(),
                session_store,
                config.session_ttl,
            )),
            registration: Arc::new(Registration::new(users.clone(), verification.clone())),
            verification,
            invitations: Arc::new(invitations),
            accounts: Arc::new(UserService::new(users.clone(), project_store.clone())),
            projects: Arc::new(ProjectService::new(project_store, task_store)),
            users,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_config_defaults() {
        let config = ServiceConfig::new("http://localhost:3000/");

        assert_eq!(config.public_url, "http://localhost:3000");
        assert_eq!(config.session_ttl, chrono::Duration::hours(24));
        assert_eq!(config.invitation_ttl, chrono::Duration::days(7));
    }
}
