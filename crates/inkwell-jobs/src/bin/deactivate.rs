//! inkwell-deactivate: deactivate accounts with no recent sign-in.
//!
//! Exits 0 on success and 1 on any failure, so a scheduler can alert on it.

use std::process::ExitCode;

use anyhow::Context;
use tracing::{error, info};

use inkwell_core::logging::{self, LogConfig};
use inkwell_db::{Database, PoolConfig};
use inkwell_jobs::{inactive_days_from_env, BatchJob, DeactivateInactiveAccounts};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let log_config = LogConfig::from_env("inkwell_jobs=info,inkwell_db=info");
    let _log_guard = logging::init(&log_config);

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(subsystem = "jobs", error = %format!("{:#}", e), "Deactivation job failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let inactive_days = inactive_days_from_env()?;

    let db = Database::connect_with_config(&database_url, PoolConfig::from_env())
        .await
        .context("failed to connect to database")?;

    let report = DeactivateInactiveAccounts::new(db)
        .with_inactive_days(inactive_days)
        .run()
        .await?;

    info!(
        subsystem = "jobs",
        job = %report.job,
        affected = report.affected,
        threshold = %report.threshold,
        duration_ms = report.duration_ms,
        "Deactivated {} inactive account(s)",
        report.affected
    );
    Ok(())
}
