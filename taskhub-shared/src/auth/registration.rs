/// Account registration
///
/// Creates an unverified account and mails its verification link:
///
/// 1. Validate name, email format and password policy (`BadRequest`)
/// 2. Reject an already registered email (`Conflict`)
/// 3. Hash the password
/// 4. Insert the user through the cache-aside store
/// 5. Issue a verification code and publish the link
///
/// The duplicate check in step 2 gives a readable error in the common
/// case; the unique constraint in the durable store still decides races
/// and also surfaces as `Conflict`.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use validator::Validate;

use super::password::{hash_password, validate_password_strength};
use super::verification::VerificationFlow;
use crate::error::{CoreError, CoreResult};
use crate::models::{CreateUser, User};
use crate::store::UserStore;

/// Registration input
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterUser {
    #[validate(length(min = 1, max = 255, message = "Name must be 1 to 255 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

/// Registers new accounts
pub struct Registration {
    users: Arc<dyn UserStore>,
    verification: Arc<VerificationFlow>,
}

impl Registration {
    pub fn new(users: Arc<dyn UserStore>, verification: Arc<VerificationFlow>) -> Self {
        Self {
            users,
            verification,
        }
    }

    /// Registers a user and sends the verification link
    ///
    /// # Errors
    ///
    /// - `BadRequest` for invalid input
    /// - `Conflict` if the email is taken
    /// - `Password`, `Database` or `Publish` for infrastructure failures
    pub async fn register(&self, input: RegisterUser) -> CoreResult<User> {
        input
            .validate()
            .map_err(|e| CoreError::BadRequest(e.to_string()))?;
        validate_password_strength(&input.password).map_err(CoreError::BadRequest)?;

        if self.users.user_by_email(&input.email).await?.is_some() {
            return Err(CoreError::Conflict(format!(
                "email {} already exists",
                input.email
            )));
        }

        let password_hash = hash_password(&input.password)?;

        let user = self
            .users
            .create_user(CreateUser {
                name: input.name,
                email: input.email,
                password_hash,
                created_at: Utc::now(),
            })
            .await?;

        tracing::info!(user_id = %user.id, "User registered");

        let code = self.verification.issue_code(user.id).await?;
        self.verification.send_link(&code, &user.email).await?;

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::verify_password;
    use crate::auth::token::validate_token_format;
    use crate::events::VERIFICATION_SUBJECT;
    use crate::memory::{MemoryPublisher, MemoryStore};

    fn setup() -> (Arc<MemoryStore>, Arc<MemoryPublisher>, Registration) {
        let store = Arc::new(MemoryStore::new());
        let publisher = Arc::new(MemoryPublisher::new());
        let verification = Arc::new(VerificationFlow::new(
            store.clone(),
            publisher.clone(),
            "http://localhost:8080",
        ));
        let registration = Registration::new(store.clone(), verification);
        (store, publisher, registration)
    }

    fn input(email: &str, password: &str) -> RegisterUser {
        RegisterUser {
            name: "Alice".to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_creates_unverified_user_and_sends_link() {
        let (store, publisher, registration) = setup();

        let user = registration
            .register(input("alice@example.com", "alice-password"))
            .await
            .unwrap();
        assert!(!user.is_verified);

        let creds = store
            .credentials_by_email("alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_ne!(creds.password_hash, "alice-password");
        assert!(verify_password("alice-password", &creds.password_hash).unwrap());

        let key = publisher
            .last_key("alice@example.com", VERIFICATION_SUBJECT)
            .unwrap();
        assert!(validate_token_format(&key));
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let (_, _, registration) = setup();

        registration
            .register(input("alice@example.com", "alice-password"))
            .await
            .unwrap();
        let err = registration
            .register(input("alice@example.com", "other-password"))
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Conflict(_)));
        assert!(err.to_string().contains("alice@example.com"));
    }

    #[tokio::test]
    async fn test_invalid_input_is_bad_request() {
        let (store, publisher, registration) = setup();

        for bad in [input("not-an-email", "alice-password"), input("a@example.com", "short")] {
            let err = registration.register(bad).await.unwrap_err();
            assert!(matches!(err, CoreError::BadRequest(_)));
        }

        let mut nameless = input("a@example.com", "alice-password");
        nameless.name.clear();
        assert!(matches!(
            registration.register(nameless).await,
            Err(CoreError::BadRequest(_))
        ));

        assert!(store.user_by_email("a@example.com").await.unwrap().is_none());
        assert!(publisher.published().is_empty());
    }
}
