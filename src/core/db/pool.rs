//! PostgreSQL connection setup
//!
//! `connect` is the only way the server reaches the database: it opens the
//! pool, applies `migrations/` and confirms the connection answers before
//! the credential store is handed out.

use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;

const MAX_CONNECTIONS: u32 = 10;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// Database startup errors
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Failed to connect to database: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("Failed to run migrations: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Database health check failed: {0}")]
    HealthCheck(#[source] sqlx::Error),
}

/// Open a pool, bring the schema up to date and check it responds
pub async fn connect(database_url: &str) -> Result<PgPool, DbError> {
    let pool = PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(database_url)
        .await
        .map_err(DbError::Connect)?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .map_err(DbError::HealthCheck)?;

    Ok(pool)
}
