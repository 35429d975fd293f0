/// Identity, session and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and policy
/// - [`token`]: opaque random tokens and their storage hashes
/// - [`session`]: login, session resolution and logout
/// - [`verification`]: email verification codes
/// - [`registration`]: account creation
/// - [`invitation`]: project invitations
/// - [`authorization`]: the request actor and ownership checks
/// - [`middleware`]: session cookie middleware for Axum
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id with 64 MB memory, 3 iterations
/// - **Tokens**: 32 base62 characters from a CSPRNG, stored only as SHA-256
/// - **Single-use codes**: consumed atomically with the state change they grant
/// - **Uniform failures**: unknown email and wrong password are indistinguishable
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskhub_shared::auth::session::SessionManager;
/// use taskhub_shared::memory::MemoryStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = Arc::new(MemoryStore::new());
/// let sessions = SessionManager::new(store.clone(), store);
///
/// let token = sessions.login("alice@example.com", "alice-password").await?;
/// let user = sessions.resolve(&token).await?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod invitation;
pub mod middleware;
pub mod password;
pub mod registration;
pub mod session;
pub mod token;
pub mod verification;
