//! Readiness probe for the backing database.
//!
//! The database container usually starts alongside this program, so the
//! probe polls until the server answers `SELECT 1` or the attempt budget
//! runs out. The polling belongs to the probe; the orchestrator still
//! invokes the step exactly once.

use std::time::Duration;

use async_trait::async_trait;
use prestart_core::error::StepError;
use prestart_core::step::Step;
use sqlx::postgres::PgConnectOptions;

use crate::config::DbConfig;

pub const STEP_NAME: &str = "db-ready";

pub struct DbReadyStep {
    connect_options: PgConnectOptions,
    connect_timeout: Duration,
    max_attempts: u32,
    interval: Duration,
}

impl DbReadyStep {
    pub fn new(config: &DbConfig) -> Self {
        Self {
            connect_options: config.connect_options.clone(),
            connect_timeout: config.connect_timeout,
            max_attempts: config.ready_max_attempts.max(1),
            interval: config.ready_interval,
        }
    }

    /// Poll until the database answers. Returns the attempt number that
    /// succeeded.
    pub async fn wait_for_db(&self) -> Result<u32, StepError> {
        let mut last_error = String::new();

        for attempt in 1..=self.max_attempts {
            match self.probe().await {
                Ok(()) => {
                    tracing::info!(
                        attempt,
                        host = self.connect_options.get_host(),
                        "Database is ready"
                    );
                    return Ok(attempt);
                }
                Err(e) => {
                    tracing::warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "Database not ready yet",
                    );
                    last_error = e.to_string();
                    if attempt < self.max_attempts {
                        tokio::time::sleep(self.interval).await;
                    }
                }
            }
        }

        Err(StepError::Failed(format!(
            "database not ready after {} attempts: {last_error}",
            self.max_attempts
        )))
    }

    /// One attempt: connect, `SELECT 1`, close.
    async fn probe(&self) -> Result<(), sqlx::Error> {
        let pool = crate::create_pool(self.connect_options.clone(), self.connect_timeout).await?;
        let result = crate::health_check(&pool).await;
        pool.close().await;
        result
    }
}

#[async_trait]
impl Step for DbReadyStep {
    fn name(&self) -> &str {
        STEP_NAME
    }

    async fn invoke(&self) -> Result<(), StepError> {
        self.wait_for_db().await.map(|_| ())
    }
}
