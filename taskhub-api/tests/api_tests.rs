/// Integration tests for the TaskHub HTTP API
///
/// These tests drive the full router over the in-memory adapters:
/// - registration, verification, login, logout
/// - session cookie handling
/// - ownership checks on projects, tasks and users
/// - the invitation round trip
/// - error mapping and body shape

mod common;

use axum::http::{header, Method, StatusCode};
use common::{session_cookie_pair, TestContext};
use serde_json::json;
use taskhub_shared::events::INVITATION_SUBJECT;

#[tokio::test]
async fn test_health() {
    let ctx = TestContext::new();

    let response = ctx.send(Method::GET, "/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "healthy");
    assert_eq!(response.body["database"], "in-memory");
}

#[tokio::test]
async fn test_register_returns_user_without_password() {
    let ctx = TestContext::new();

    let response = ctx.register("Alice", "alice@example.com").await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["email"], "alice@example.com");
    assert_eq!(response.body["is_verified"], false);
    assert!(response.body.get("password_hash").is_none());
    assert!(response.body.get("password").is_none());
}

#[tokio::test]
async fn test_duplicate_registration_is_conflict() {
    let ctx = TestContext::new();
    ctx.register("Alice", "alice@example.com").await;

    let response = ctx.register("Alice Again", "Alice@Example.com").await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert!(response.body["error"].is_string());
}

#[tokio::test]
async fn test_invalid_registration_is_bad_request() {
    let ctx = TestContext::new();

    let bad_email = ctx.register("Alice", "not-an-email").await;
    assert_eq!(bad_email.status, StatusCode::BAD_REQUEST);

    let malformed = ctx
        .send(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "name": "Alice" })),
        )
        .await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_requires_verification() {
    let ctx = TestContext::new();
    ctx.register("Alice", "alice@example.com").await;

    let response = ctx.login("alice@example.com").await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(session_cookie_pair(&response.headers).is_none());
}

#[tokio::test]
async fn test_login_sets_session_cookie() {
    let ctx = TestContext::new();
    let alice = ctx.sign_up("Alice", "alice@example.com").await;

    let login = ctx.login("alice@example.com").await;
    let set_cookie = login
        .headers
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("Secure"));
    assert!(set_cookie.contains("Path=/"));
    assert!(set_cookie.contains("Max-Age=86400"));

    let me = ctx
        .send(Method::GET, "/auth/me", Some(&alice.cookie), None)
        .await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["id"], alice.id.as_str());
    assert_eq!(me.body["is_verified"], true);
}

#[tokio::test]
async fn test_protected_routes_require_session() {
    let ctx = TestContext::new();

    let missing = ctx.send(Method::GET, "/auth/me", None, None).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
    assert!(missing.body["error"].is_string());

    let bogus = ctx
        .send(
            Method::GET,
            "/projects",
            Some("session_id=0123456789abcdef0123456789abcdef"),
            None,
        )
        .await;
    assert_eq!(bogus.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_revokes_session() {
    let ctx = TestContext::new();
    let alice = ctx.sign_up("Alice", "alice@example.com").await;

    let logout = ctx
        .send(Method::POST, "/auth/logout", Some(&alice.cookie), None)
        .await;
    assert_eq!(logout.status, StatusCode::NO_CONTENT);
    assert!(logout
        .headers
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .contains("Max-Age=0"));

    let me = ctx
        .send(Method::GET, "/auth/me", Some(&alice.cookie), None)
        .await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);
    assert_eq!(ctx.store.session_count(), 0);
}

#[tokio::test]
async fn test_verification_code_is_single_use() {
    let ctx = TestContext::new();
    ctx.register("Alice", "alice@example.com").await;
    let code = ctx
        .publisher
        .last_key("alice@example.com", taskhub_shared::events::VERIFICATION_SUBJECT)
        .unwrap();
    let uri = format!("/auth/verify?code={}", code);

    let first = ctx.send(Method::GET, &uri, None, None).await;
    let second = ctx.send(Method::GET, &uri, None, None).await;

    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(second.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_project_lifecycle_and_ownership() {
    let ctx = TestContext::new();
    let alice = ctx.sign_up("Alice", "alice@example.com").await;
    let mallory = ctx.sign_up("Mallory", "mallory@example.com").await;

    let created = ctx
        .send(
            Method::POST,
            "/projects",
            Some(&alice.cookie),
            Some(json!({ "name": "Launch", "description": "Q3" })),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let project_id = created.body["id"].as_str().unwrap().to_string();
    let project_uri = format!("/projects/{}", project_id);

    let foreign = ctx
        .send(Method::GET, &project_uri, Some(&mallory.cookie), None)
        .await;
    assert_eq!(foreign.status, StatusCode::FORBIDDEN);

    let missing = ctx
        .send(
            Method::GET,
            &format!("/projects/{}", uuid::Uuid::new_v4()),
            Some(&mallory.cookie),
            None,
        )
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let bad_id = ctx
        .send(Method::GET, "/projects/42", Some(&alice.cookie), None)
        .await;
    assert_eq!(bad_id.status, StatusCode::BAD_REQUEST);

    let updated = ctx
        .send(
            Method::PUT,
            &project_uri,
            Some(&alice.cookie),
            Some(json!({ "name": "Launch v2" })),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["name"], "Launch v2");
    assert_eq!(updated.body["description"], "Q3");

    let listed = ctx
        .send(Method::GET, "/projects", Some(&alice.cookie), None)
        .await;
    assert_eq!(listed.body.as_array().unwrap().len(), 1);

    let deleted = ctx
        .send(Method::DELETE, &project_uri, Some(&alice.cookie), None)
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let gone = ctx
        .send(Method::GET, &project_uri, Some(&alice.cookie), None)
        .await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_task_routes() {
    let ctx = TestContext::new();
    let alice = ctx.sign_up("Alice", "alice@example.com").await;
    let mallory = ctx.sign_up("Mallory", "mallory@example.com").await;

    let project = ctx
        .send(
            Method::POST,
            "/projects",
            Some(&alice.cookie),
            Some(json!({ "name": "Launch" })),
        )
        .await;
    let project_id = project.body["id"].as_str().unwrap().to_string();

    let intruding = ctx
        .send(
            Method::POST,
            "/tasks",
            Some(&mallory.cookie),
            Some(json!({ "project_id": project_id, "name": "Sneaky" })),
        )
        .await;
    assert_eq!(intruding.status, StatusCode::FORBIDDEN);

    let task = ctx
        .send(
            Method::POST,
            "/tasks",
            Some(&alice.cookie),
            Some(json!({ "project_id": project_id, "name": "Write docs" })),
        )
        .await;
    assert_eq!(task.status, StatusCode::CREATED);
    let task_uri = format!("/tasks/{}", task.body["id"].as_str().unwrap());

    let project_tasks = ctx
        .send(
            Method::GET,
            &format!("/projects/{}/tasks", project_id),
            Some(&alice.cookie),
            None,
        )
        .await;
    assert_eq!(project_tasks.body.as_array().unwrap().len(), 1);

    let renamed = ctx
        .send(
            Method::PUT,
            &task_uri,
            Some(&alice.cookie),
            Some(json!({ "name": "Write more docs" })),
        )
        .await;
    assert_eq!(renamed.body["name"], "Write more docs");

    let foreign = ctx
        .send(Method::DELETE, &task_uri, Some(&mallory.cookie), None)
        .await;
    assert_eq!(foreign.status, StatusCode::FORBIDDEN);

    let deleted = ctx
        .send(Method::DELETE, &task_uri, Some(&alice.cookie), None)
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let mine = ctx
        .send(Method::GET, "/tasks", Some(&alice.cookie), None)
        .await;
    assert!(mine.body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_invitation_round_trip() {
    let ctx = TestContext::new();
    let alice = ctx.sign_up("Alice", "alice@example.com").await;
    let bob = ctx.sign_up("Bob", "bob@example.com").await;

    let project = ctx
        .send(
            Method::POST,
            "/projects",
            Some(&alice.cookie),
            Some(json!({ "name": "Launch" })),
        )
        .await;
    let project_id = project.body["id"].as_str().unwrap().to_string();

    let invite = ctx
        .send(
            Method::POST,
            "/invitations",
            Some(&alice.cookie),
            Some(json!({ "project_id": project_id, "email": "bob@example.com" })),
        )
        .await;
    assert_eq!(invite.status, StatusCode::ACCEPTED);

    let code = ctx
        .publisher
        .last_key("bob@example.com", INVITATION_SUBJECT)
        .unwrap();
    let accept_uri = format!("/invitations/accept?code={}", code);

    let accepted = ctx.send(Method::GET, &accept_uri, None, None).await;
    assert_eq!(accepted.status, StatusCode::OK);
    assert_eq!(accepted.body["user_id"], bob.id.as_str());

    let members = ctx
        .send(
            Method::GET,
            &format!("/projects/{}/users", project_id),
            Some(&alice.cookie),
            None,
        )
        .await;
    let emails: Vec<&str> = members
        .body
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|u| u["email"].as_str())
        .collect();
    assert!(emails.contains(&"bob@example.com"));
    assert!(emails.contains(&"alice@example.com"));

    let again = ctx.send(Method::GET, &accept_uri, None, None).await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invitation_publish_failure_is_internal_error() {
    let ctx = TestContext::new();
    let alice = ctx.sign_up("Alice", "alice@example.com").await;
    ctx.sign_up("Bob", "bob@example.com").await;

    let project = ctx
        .send(
            Method::POST,
            "/projects",
            Some(&alice.cookie),
            Some(json!({ "name": "Launch" })),
        )
        .await;
    ctx.publisher.set_failing(true);

    let invite = ctx
        .send(
            Method::POST,
            "/invitations",
            Some(&alice.cookie),
            Some(json!({ "project_id": project.body["id"], "email": "bob@example.com" })),
        )
        .await;

    assert_eq!(invite.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(invite.body["error"], "internal server error");
}

#[tokio::test]
async fn test_users_can_only_delete_themselves() {
    let ctx = TestContext::new();
    let alice = ctx.sign_up("Alice", "alice@example.com").await;
    let mallory = ctx.sign_up("Mallory", "mallory@example.com").await;
    let alice_uri = format!("/users/{}", alice.id);

    let lookup = ctx
        .send(Method::GET, &alice_uri, Some(&mallory.cookie), None)
        .await;
    assert_eq!(lookup.status, StatusCode::OK);
    assert_eq!(lookup.body["name"], "Alice");

    let forbidden = ctx
        .send(Method::DELETE, &alice_uri, Some(&mallory.cookie), None)
        .await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

    let deleted = ctx
        .send(Method::DELETE, &alice_uri, Some(&alice.cookie), None)
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let missing = ctx
        .send(Method::GET, &alice_uri, Some(&mallory.cookie), None)
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert!(ctx.cache.peek(alice.id.parse().unwrap()).is_none());
}
