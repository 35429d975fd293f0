/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - An app wired to the in-memory store, cache and publisher
/// - Request helpers returning status, headers and JSON body
/// - Sign-up helpers that register, verify and log in a user

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use serde_json::Value;
use taskhub_api::app::{build_router, AppState};
use taskhub_api::config::{ApiConfig, Config, DatabaseConfig, FlowConfig, RedisSettings};
use taskhub_shared::events::VERIFICATION_SUBJECT;
use taskhub_shared::memory::{MemoryPublisher, MemoryStore, MemoryUserCache};
use taskhub_shared::services::Services;
use tower::Service as _;

pub const PASSWORD: &str = "Correct-Horse-9";

/// Test context containing all necessary resources
pub struct TestContext {
    pub app: axum::Router,
    pub store: Arc<MemoryStore>,
    pub cache: Arc<MemoryUserCache>,
    pub publisher: Arc<MemoryPublisher>,
}

/// A decoded response
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// A signed-in user
pub struct SignedIn {
    pub id: String,
    pub cookie: String,
}

fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            cookie_secure: true,
        },
        database: DatabaseConfig {
            url: "postgresql://unused".to_string(),
            max_connections: 1,
        },
        redis: RedisSettings {
            url: "redis://unused".to_string(),
            notification_topic: "notifications".to_string(),
        },
        flows: FlowConfig {
            public_url: "http://taskhub.test".to_string(),
            session_ttl_hours: 24,
            invitation_ttl_days: 7,
        },
    }
}

impl TestContext {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(MemoryUserCache::new());
        let publisher = Arc::new(MemoryPublisher::new());
        let config = test_config();

        let services = Services::build(
            store.clone(),
            cache.clone(),
            publisher.clone(),
            config.service_config(),
        );
        let app = build_router(AppState::new(services, config, None));

        Self {
            app,
            store,
            cache,
            publisher,
        }
    }

    /// Sends a request, optionally with a session cookie and JSON body
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Registers a user and returns the registration response
    pub async fn register(&self, name: &str, email: &str) -> TestResponse {
        self.send(
            Method::POST,
            "/auth/register",
            None,
            Some(serde_json::json!({
                "name": name,
                "email": email,
                "password": PASSWORD,
            })),
        )
        .await
    }

    /// Logs in with the shared test password
    pub async fn login(&self, email: &str) -> TestResponse {
        self.send(
            Method::POST,
            "/auth/login",
            None,
            Some(serde_json::json!({ "email": email, "password": PASSWORD })),
        )
        .await
    }

    /// Registers, verifies through the mailed code and logs in
    pub async fn sign_up(&self, name: &str, email: &str) -> SignedIn {
        let registered = self.register(name, email).await;
        assert_eq!(registered.status, StatusCode::CREATED);

        let code = self
            .publisher
            .last_key(email, VERIFICATION_SUBJECT)
            .expect("verification link should be published");
        let verified = self
            .send(Method::GET, &format!("/auth/verify?code={}", code), None, None)
            .await;
        assert_eq!(verified.status, StatusCode::OK);

        let login = self.login(email).await;
        assert_eq!(login.status, StatusCode::OK);

        SignedIn {
            id: registered.body["id"].as_str().unwrap().to_string(),
            cookie: session_cookie_pair(&login.headers).expect("login should set a cookie"),
        }
    }
}

/// Extracts `session_id=<token>` from a `Set-Cookie` header
pub fn session_cookie_pair(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("session_id="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}
