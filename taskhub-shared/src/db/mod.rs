/// Database layer for TaskHub
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool with a startup health check
/// - `migrations`: embedded schema migrations
/// - `postgres`: [`PgStore`], the Postgres implementation of the storage ports
///
/// SQL lives with the model types in [`crate::models`].
///
/// # Example
///
/// ```no_run
/// use taskhub_shared::db::{pool::{create_pool, DatabaseConfig}, migrations::run_migrations, PgStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let pool = create_pool(DatabaseConfig {
///         url: std::env::var("DATABASE_URL")?,
///         ..Default::default()
///     })
///     .await?;
///     run_migrations(&pool).await?;
///
///     let store = PgStore::new(pool);
///     Ok(())
/// }
/// ```

pub mod migrations;
pub mod pool;
pub mod postgres;

pub use postgres::PgStore;
