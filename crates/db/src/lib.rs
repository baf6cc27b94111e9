//! Postgres collaborators of the startup sequence: the readiness probe and
//! the migration engine. Each step opens its own pool and closes it before
//! returning.

use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

pub mod config;
pub mod migrate;
pub mod readiness;

pub use config::DbConfig;
pub use migrate::MigrateStep;
pub use readiness::DbReadyStep;

pub type DbPool = sqlx::PgPool;

/// Open a single-connection pool. Startup steps run one at a time, so one
/// connection is all any of them needs.
pub async fn create_pool(
    options: PgConnectOptions,
    acquire_timeout: Duration,
) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(acquire_timeout)
        .connect_with(options)
        .await
}

/// Round-trip a trivial query to prove the server accepts work.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
