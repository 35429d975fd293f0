/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskhub_api::{app::AppState, config::Config};
/// use taskhub_shared::memory::{MemoryPublisher, MemoryStore, MemoryUserCache};
/// use taskhub_shared::services::Services;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let services = Services::build(
///     Arc::new(MemoryStore::new()),
///     Arc::new(MemoryUserCache::new()),
///     Arc::new(MemoryPublisher::new()),
///     config.service_config(),
/// );
/// let app = taskhub_api::app::build_router(AppState::new(services, config, None));
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskhub_shared::auth::middleware::create_session_middleware;
use taskhub_shared::services::Services;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Wired business services
    pub services: Services,

    /// Application configuration
    pub config: Arc<Config>,

    /// Database pool, probed by `/health`; absent when running on
    /// in-memory stores
    pub db: Option<PgPool>,
}

impl AppState {
    /// Creates new application state
    pub fn new(services: Services, config: Config, db: Option<PgPool>) -> Self {
        Self {
            services,
            config: Arc::new(config),
            db,
        }
    }

    /// Whether session cookies carry the `Secure` attribute
    pub fn cookie_secure(&self) -> bool {
        self.config.api.cookie_secure
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /health                       # public
/// ├── /auth
/// │   ├── POST /register                 # public
/// │   ├── POST /login                    # public, sets session cookie
/// │   ├── GET  /verify?code=             # public
/// │   ├── POST /logout                   # session
/// │   └── GET  /me                       # session
/// ├── /users/:id         GET DELETE      # session
/// ├── /projects          POST GET        # session
/// │   └── /:id           GET PUT DELETE
/// │       ├── /users     GET
/// │       └── /tasks     GET
/// ├── /tasks             POST GET        # session
/// │   └── /:id           GET PUT DELETE
/// └── /invitations       POST            # session
///     └── /accept?code=  GET             # public
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Session authentication (protected routes only)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/verify", get(routes::auth::verify))
        .route("/invitations/accept", get(routes::invitations::accept));

    let protected_routes = Router::new()
        .route("/auth/logout", post(routes::auth::logout))
        .route("/auth/me", get(routes::auth::me))
        .route(
            "/users/:id",
            get(routes::users::get_user).delete(routes::users::delete_user),
        )
        .route(
            "/projects",
            post(routes::projects::create_project).get(routes::projects::list_projects),
        )
        .route(
            "/projects/:id",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route("/projects/:id/users", get(routes::projects::project_users))
        .route("/projects/:id/tasks", get(routes::projects::project_tasks))
        .route(
            "/tasks",
            post(routes::tasks::create_task).get(routes::tasks::list_tasks),
        )
        .route(
            "/tasks/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/invitations", post(routes::invitations::invite))
        .layer(axum::middleware::from_fn(create_session_middleware(
            state.services.sessions.clone(),
        )));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.api.cors_origins.iter().any(|origin| origin == "*") {
        // Development mode: permissive CORS
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::COOKIE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}
