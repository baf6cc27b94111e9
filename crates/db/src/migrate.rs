//! Migration engine: bring the schema to the latest revision.
//!
//! Migrations are plain SQL files read from disk at run time. Versions
//! already recorded in `_sqlx_migrations` are skipped, so the step can run
//! on every start.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use prestart_core::error::StepError;
use prestart_core::step::Step;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgConnectOptions;

use crate::config::DbConfig;

pub const STEP_NAME: &str = "migrate";

pub struct MigrateStep {
    connect_options: PgConnectOptions,
    connect_timeout: Duration,
    migrations_dir: PathBuf,
}

impl MigrateStep {
    pub fn new(config: &DbConfig) -> Self {
        Self {
            connect_options: config.connect_options.clone(),
            connect_timeout: config.connect_timeout,
            migrations_dir: config.migrations_dir.clone(),
        }
    }

    pub fn migrations_dir(&self) -> &Path {
        &self.migrations_dir
    }

    /// Read the migration set from disk without touching the database.
    pub async fn load(&self) -> Result<Migrator, StepError> {
        let migrator = Migrator::new(self.migrations_dir.clone())
            .await
            .map_err(StepError::wrap)?;

        tracing::info!(
            dir = %self.migrations_dir.display(),
            known = migrator.iter().count(),
            latest = migrator.iter().map(|m| m.version).max(),
            "Loaded migrations",
        );

        Ok(migrator)
    }
}

#[async_trait]
impl Step for MigrateStep {
    fn name(&self) -> &str {
        STEP_NAME
    }

    async fn invoke(&self) -> Result<(), StepError> {
        let migrator = self.load().await?;

        let pool = crate::create_pool(self.connect_options.clone(), self.connect_timeout)
            .await
            .map_err(StepError::wrap)?;
        let result = migrator.run(&pool).await;
        pool.close().await;

        result.map_err(StepError::wrap)?;
        tracing::info!("Database migrations applied");
        Ok(())
    }
}
