//! `prestart` -- runs the startup sequence before the application starts.
//!
//! Waits for the database, applies migrations, then runs every seed-data
//! loader in order. Stops at the first failing step. Takes no arguments.
//!
//! # Exit codes
//!
//! | Code    | Meaning                                              |
//! |---------|------------------------------------------------------|
//! | `0`     | every step succeeded                                 |
//! | `1..255`| exit code of the failing seed loader                 |
//! | `1`     | invalid configuration, or a step failed without one  |
//!
//! See [`prestart::config::PrestartConfig::from_env`] and
//! [`prestart_db::DbConfig::from_env`] for environment variables.

use std::process::ExitCode;

use prestart::config::{LogFormat, PrestartConfig};
use prestart::{logging, plan};
use prestart_core::error::GENERIC_FAILURE_CODE;
use prestart_core::orchestrator::{Orchestrator, RunReport};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    logging::init(LogFormat::from_env());

    let config = match PrestartConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::from(GENERIC_FAILURE_CODE);
        }
    };

    let steps = match plan::build(&config) {
        Ok(steps) => steps,
        Err(e) => {
            tracing::error!(error = %e, "Invalid startup plan");
            return ExitCode::from(GENERIC_FAILURE_CODE);
        }
    };

    let mut orchestrator = Orchestrator::new(steps);
    tracing::info!(steps = ?orchestrator.step_names(), "Startup plan loaded");

    match orchestrator.run().await {
        Ok(report) => {
            log_report(&report);
            ExitCode::SUCCESS
        }
        Err(failed) => {
            tracing::error!(
                step = %failed.step,
                position = failed.position(),
                completed = failed.report.succeeded().count(),
                error = %failed.source,
                "Startup failed",
            );
            log_report(&failed.report);
            ExitCode::from(failed.exit_code())
        }
    }
}

fn log_report(report: &RunReport) {
    match serde_json::to_string(report) {
        Ok(json) => tracing::info!(report = %json, "Run report"),
        Err(e) => tracing::warn!(error = %e, "Failed to serialize run report"),
    }
}
