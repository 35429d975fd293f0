/// In-process implementations of every port
///
/// Used by unit and integration tests across the workspace, and handy for
/// running the API without infrastructure. All state sits behind a single
/// mutex per adapter, so each store operation is atomic exactly like the
/// corresponding Postgres transaction.
///
/// Fault injection:
/// - [`MemoryUserCache::set_available`] makes every cache call fail.
/// - [`MemoryPublisher::set_failing`] makes every publish fail.
///
/// Emails are compared case-insensitively, matching the `lower(email)`
/// unique index.

use crate::error::{CoreError, CoreResult};
use crate::events::{Notification, NotificationPublisher, PublishError};
use crate::models::{
    CreateProject, CreateTask, CreateUser, InvitationCode, MarkOutcome, MembershipGrant,
    NotificationRecord, Project, Session, Task, UpdateProject, UpdateTask, User, UserCredentials,
    VipStatus,
};
use crate::store::{
    CacheError, ProjectStore, SessionStore, TaskStore, UserCache, UserStore, VerificationStore,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use uuid::Uuid;

fn same_email(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

#[derive(Default)]
struct State {
    users: HashMap<Uuid, UserCredentials>,
    sessions: HashMap<String, Session>,
    verification_codes: HashMap<String, Uuid>,
    invitation_codes: HashMap<String, InvitationCode>,
    projects: HashMap<Uuid, Project>,
    members: HashSet<(Uuid, Uuid)>,
    tasks: HashMap<Uuid, Task>,
    notifications: Vec<NotificationRecord>,
}

impl State {
    fn find_by_email(&self, email: &str) -> Option<&UserCredentials> {
        self.users.values().find(|c| same_email(&c.user.email, email))
    }

    fn remove_project(&mut self, id: Uuid) -> bool {
        if self.projects.remove(&id).is_none() {
            return false;
        }
        self.members.retain(|(p, _)| *p != id);
        self.tasks.retain(|_, t| t.project_id != id);
        self.invitation_codes.retain(|_, c| c.project_id != id);
        true
    }
}

/// In-memory durable store implementing every persistence port
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> CoreResult<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| CoreError::Internal("memory store poisoned".to_string()))
    }

    /// Returns the ledger row for a recipient and subject, if any
    pub fn notification_record(&self, email: &str, subject: &str) -> Option<NotificationRecord> {
        let state = self.state.lock().ok()?;
        state
            .notifications
            .iter()
            .find(|r| same_email(&r.email, email) && r.subject == subject)
            .cloned()
    }

    /// Number of stored sessions
    pub fn session_count(&self) -> usize {
        self.state.lock().map(|s| s.sessions.len()).unwrap_or(0)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, data: CreateUser) -> CoreResult<User> {
        let mut state = self.lock()?;

        if state.find_by_email(&data.email).is_some() {
            return Err(CoreError::Conflict(format!(
                "email {} already exists",
                data.email
            )));
        }

        let user = User {
            id: Uuid::new_v4(),
            name: data.name,
            email: data.email,
            created_at: data.created_at,
            is_verified: false,
            vip_status: VipStatus::None,
        };
        state.users.insert(
            user.id,
            UserCredentials {
                user: user.clone(),
                password_hash: data.password_hash,
            },
        );

        Ok(user)
    }

    async fn delete_user(&self, id: Uuid) -> CoreResult<bool> {
        let mut state = self.lock()?;

        if state.users.remove(&id).is_none() {
            return Ok(false);
        }

        let owned: Vec<Uuid> = state
            .projects
            .values()
            .filter(|p| p.owner_id == id)
            .map(|p| p.id)
            .collect();
        for project_id in owned {
            state.remove_project(project_id);
        }

        state.sessions.retain(|_, s| s.user_id != id);
        state.verification_codes.retain(|_, u| *u != id);
        state.invitation_codes.retain(|_, c| c.user_id != id);
        state.members.retain(|(_, u)| *u != id);
        state.tasks.retain(|_, t| t.owner_id != id);

        Ok(true)
    }

    async fn user_by_id(&self, id: Uuid) -> CoreResult<Option<User>> {
        Ok(self.lock()?.users.get(&id).map(|c| c.user.clone()))
    }

    async fn user_by_email(&self, email: &str) -> CoreResult<Option<User>> {
        Ok(self.lock()?.find_by_email(email).map(|c| c.user.clone()))
    }

    async fn credentials_by_email(&self, email: &str) -> CoreResult<Option<UserCredentials>> {
        Ok(self.lock()?.find_by_email(email).cloned())
    }

    async fn project_users(&self, project_id: Uuid) -> CoreResult<Vec<User>> {
        let state = self.lock()?;

        let mut users: Vec<User> = state
            .members
            .iter()
            .filter(|(p, _)| *p == project_id)
            .filter_map(|(_, u)| state.users.get(u).map(|c| c.user.clone()))
            .collect();
        users.sort_by_key(|u| (u.created_at, u.id));

        Ok(users)
    }

    async fn users_to_notify(
        &self,
        subject: &str,
        created_before: DateTime<Utc>,
    ) -> CoreResult<Vec<User>> {
        let state = self.lock()?;

        let mut users: Vec<User> = state
            .users
            .values()
            .map(|c| &c.user)
            .filter(|u| u.created_at < created_before)
            .filter(|u| {
                !state
                    .notifications
                    .iter()
                    .any(|r| same_email(&r.email, &u.email) && r.subject == subject)
            })
            .cloned()
            .collect();
        users.sort_by_key(|u| (u.created_at, u.id));

        Ok(users)
    }

    async fn mark_notified(&self, email: &str, subject: &str) -> CoreResult<MarkOutcome> {
        let mut state = self.lock()?;

        let already = state
            .notifications
            .iter()
            .any(|r| same_email(&r.email, email) && r.subject == subject);
        if already {
            return Ok(MarkOutcome::AlreadyMarked);
        }

        let Some(creds) = state
            .users
            .values_mut()
            .find(|c| same_email(&c.user.email, email))
        else {
            return Ok(MarkOutcome::UserMissing);
        };
        creds.user.vip_status = VipStatus::Active;

        state.notifications.push(NotificationRecord {
            email: email.to_string(),
            subject: subject.to_string(),
            sent_at: Utc::now(),
        });

        Ok(MarkOutcome::Marked)
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create_session(
        &self,
        token_hash: &str,
        user_id: Uuid,
        created_at: DateTime<Utc>,
    ) -> CoreResult<Session> {
        let session = Session {
            id: token_hash.to_string(),
            user_id,
            created_at,
        };
        self.lock()?
            .sessions
            .insert(token_hash.to_string(), session.clone());
        Ok(session)
    }

    async fn find_session(&self, token_hash: &str) -> CoreResult<Option<Session>> {
        Ok(self.lock()?.sessions.get(token_hash).cloned())
    }

    async fn delete_session(&self, token_hash: &str) -> CoreResult<bool> {
        Ok(self.lock()?.sessions.remove(token_hash).is_some())
    }
}

#[async_trait]
impl VerificationStore for MemoryStore {
    async fn save_verification_code(&self, code_hash: &str, user_id: Uuid) -> CoreResult<()> {
        self.lock()?
            .verification_codes
            .insert(code_hash.to_string(), user_id);
        Ok(())
    }

    async fn redeem_verification_code(&self, code_hash: &str) -> CoreResult<Option<Uuid>> {
        let mut state = self.lock()?;

        let Some(user_id) = state.verification_codes.remove(code_hash) else {
            return Ok(None);
        };
        if let Some(creds) = state.users.get_mut(&user_id) {
            creds.user.is_verified = true;
        }

        Ok(Some(user_id))
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn create_project(&self, data: CreateProject) -> CoreResult<Project> {
        let mut state = self.lock()?;

        let project = Project {
            id: Uuid::new_v4(),
            name: data.name,
            description: data.description,
            owner_id: data.owner_id,
            created_at: Utc::now(),
        };
        state.projects.insert(project.id, project.clone());
        state.members.insert((project.id, project.owner_id));

        Ok(project)
    }

    async fn project_by_id(&self, id: Uuid) -> CoreResult<Option<Project>> {
        Ok(self.lock()?.projects.get(&id).cloned())
    }

    async fn projects_by_owner(&self, owner_id: Uuid) -> CoreResult<Vec<Project>> {
        let mut projects: Vec<Project> = self
            .lock()?
            .projects
            .values()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(projects)
    }

    async fn update_project(&self, id: Uuid, data: UpdateProject) -> CoreResult<Option<Project>> {
        let mut state = self.lock()?;

        let Some(project) = state.projects.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = data.name {
            project.name = name;
        }
        if let Some(description) = data.description {
            project.description = Some(description);
        }

        Ok(Some(project.clone()))
    }

    async fn delete_project(&self, id: Uuid) -> CoreResult<bool> {
        Ok(self.lock()?.remove_project(id))
    }

    async fn save_invitation_code(
        &self,
        code_hash: &str,
        user_id: Uuid,
        project_id: Uuid,
    ) -> CoreResult<()> {
        let code = InvitationCode {
            code_hash: code_hash.to_string(),
            user_id,
            project_id,
            created_at: Utc::now(),
        };
        self.lock()?
            .invitation_codes
            .insert(code_hash.to_string(), code);
        Ok(())
    }

    async fn redeem_invitation_code(
        &self,
        code_hash: &str,
        issued_after: DateTime<Utc>,
    ) -> CoreResult<Option<MembershipGrant>> {
        let mut state = self.lock()?;

        let Some(code) = state.invitation_codes.remove(code_hash) else {
            return Ok(None);
        };
        if code.created_at <= issued_after {
            return Ok(None);
        }

        state.members.insert((code.project_id, code.user_id));

        Ok(Some(MembershipGrant {
            project_id: code.project_id,
            user_id: code.user_id,
        }))
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn create_task(&self, data: CreateTask) -> CoreResult<Task> {
        let task = Task {
            id: Uuid::new_v4(),
            name: data.name,
            description: data.description,
            project_id: data.project_id,
            owner_id: data.owner_id,
            created_at: Utc::now(),
        };
        self.lock()?.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn task_by_id(&self, id: Uuid) -> CoreResult<Option<Task>> {
        Ok(self.lock()?.tasks.get(&id).cloned())
    }

    async fn tasks_by_project(&self, project_id: Uuid) -> CoreResult<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .lock()?
            .tasks
            .values()
            .filter(|t| t.project_id == project_id)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| (t.created_at, t.id));
        Ok(tasks)
    }

    async fn tasks_by_owner(&self, owner_id: Uuid) -> CoreResult<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .lock()?
            .tasks
            .values()
            .filter(|t| t.owner_id == owner_id)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| (t.created_at, t.id));
        Ok(tasks)
    }

    async fn update_task(&self, id: Uuid, data: UpdateTask) -> CoreResult<Option<Task>> {
        let mut state = self.lock()?;

        let Some(task) = state.tasks.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = data.name {
            task.name = name;
        }
        if let Some(description) = data.description {
            task.description = Some(description);
        }

        Ok(Some(task.clone()))
    }

    async fn delete_task(&self, id: Uuid) -> CoreResult<bool> {
        Ok(self.lock()?.tasks.remove(&id).is_some())
    }
}

/// In-memory [`UserCache`] storing JSON entries with expiry
pub struct MemoryUserCache {
    entries: Mutex<HashMap<Uuid, (String, Instant)>>,
    available: AtomicBool,
}

impl Default for MemoryUserCache {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }
}

impl MemoryUserCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggles simulated cache outage
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Reads an unexpired entry without going through the port
    pub fn peek(&self, id: Uuid) -> Option<User> {
        let entries = self.entries.lock().ok()?;
        let (json, expires_at) = entries.get(&id)?;
        if *expires_at <= Instant::now() {
            return None;
        }
        serde_json::from_str(json).ok()
    }

    /// Stores a raw entry, e.g. to simulate corruption
    pub fn insert_raw(&self, id: Uuid, raw: &str, ttl: Duration) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(id, (raw.to_string(), Instant::now() + ttl));
        }
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    fn check(&self) -> Result<MutexGuard<'_, HashMap<Uuid, (String, Instant)>>, CacheError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(CacheError::Backend("connection refused".to_string()));
        }
        self.entries
            .lock()
            .map_err(|_| CacheError::Backend("cache poisoned".to_string()))
    }
}

#[async_trait]
impl UserCache for MemoryUserCache {
    async fn get(&self, id: Uuid) -> Result<Option<User>, CacheError> {
        let mut entries = self.check()?;

        let now = Instant::now();
        entries.retain(|_, (_, expires_at)| *expires_at > now);

        match entries.get(&id) {
            Some((json, _)) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, user: &User, ttl: Duration) -> Result<(), CacheError> {
        let json = serde_json::to_string(user)?;
        self.check()?.insert(user.id, (json, Instant::now() + ttl));
        Ok(())
    }

    async fn invalidate(&self, id: Uuid) -> Result<(), CacheError> {
        self.check()?.remove(&id);
        Ok(())
    }
}

/// In-memory [`NotificationPublisher`] recording every accepted message
#[derive(Default)]
pub struct MemoryPublisher {
    messages: Mutex<Vec<(String, Notification)>>,
    failing: AtomicBool,
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggles simulated queue outage
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// All accepted `(key, notification)` pairs in publish order
    pub fn published(&self) -> Vec<(String, Notification)> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }

    /// Accepted messages for one receiver
    pub fn messages_for(&self, receiver: &str) -> Vec<(String, Notification)> {
        self.published()
            .into_iter()
            .filter(|(_, n)| same_email(&n.receiver, receiver))
            .collect()
    }

    /// Key of the most recent message with `subject` sent to `receiver`
    ///
    /// For verification and invitation messages the key is the code.
    pub fn last_key(&self, receiver: &str, subject: &str) -> Option<String> {
        self.messages_for(receiver)
            .into_iter()
            .rev()
            .find(|(_, n)| n.subject == subject)
            .map(|(key, _)| key)
    }
}

#[async_trait]
impl NotificationPublisher for MemoryPublisher {
    async fn publish(&self, key: &str, notification: &Notification) -> Result<String, PublishError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PublishError::Unavailable("broker unreachable".to_string()));
        }

        let mut messages = self
            .messages
            .lock()
            .map_err(|_| PublishError::Unavailable("publisher poisoned".to_string()))?;
        messages.push((key.to_string(), notification.clone()));

        Ok(format!("0-{}", messages.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_user(email: &str) -> CreateUser {
        CreateUser {
            name: "Test".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict_case_insensitive() {
        let store = MemoryStore::new();
        store.create_user(create_user("alice@example.com")).await.unwrap();

        let err = store
            .create_user(create_user("ALICE@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_mark_notified_outcomes() {
        let store = MemoryStore::new();
        let user = store.create_user(create_user("a@example.com")).await.unwrap();

        assert_eq!(
            store.mark_notified("a@example.com", "s").await.unwrap(),
            MarkOutcome::Marked
        );
        assert_eq!(
            store.mark_notified("a@example.com", "s").await.unwrap(),
            MarkOutcome::AlreadyMarked
        );
        assert_eq!(
            store.mark_notified("ghost@example.com", "s").await.unwrap(),
            MarkOutcome::UserMissing
        );
        assert!(store.notification_record("ghost@example.com", "s").is_none());

        let user = store.user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(user.vip_status, VipStatus::Active);
    }

    #[tokio::test]
    async fn test_delete_project_cascades() {
        let store = MemoryStore::new();
        let owner = store.create_user(create_user("o@example.com")).await.unwrap();
        let project = store
            .create_project(CreateProject {
                name: "P".to_string(),
                description: None,
                owner_id: owner.id,
            })
            .await
            .unwrap();
        let task = store
            .create_task(CreateTask {
                name: "T".to_string(),
                description: None,
                project_id: project.id,
                owner_id: owner.id,
            })
            .await
            .unwrap();

        assert!(store.delete_project(project.id).await.unwrap());
        assert!(store.task_by_id(task.id).await.unwrap().is_none());
        assert!(store.project_users(project.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cache_unavailable_and_expiry() {
        let cache = MemoryUserCache::new();
        let user = User {
            id: Uuid::new_v4(),
            name: "A".to_string(),
            email: "a@example.com".to_string(),
            created_at: Utc::now(),
            is_verified: true,
            vip_status: VipStatus::None,
        };

        cache.put(&user, Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get(user.id).await.unwrap(), Some(user.clone()));

        cache.set_available(false);
        assert!(cache.get(user.id).await.is_err());

        cache.set_available(true);
        cache.put(&user, Duration::ZERO).await.unwrap();
        assert!(cache.get(user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_publisher_failing() {
        let publisher = MemoryPublisher::new();
        let n = crate::events::vip_status_message("a@example.com");

        publisher.set_failing(true);
        assert!(publisher.publish("notification", &n).await.is_err());
        assert!(publisher.published().is_empty());

        publisher.set_failing(false);
        publisher.publish("notification", &n).await.unwrap();
        assert_eq!(publisher.messages_for("A@example.com").len(), 1);
    }
}
