//! # inkwell-jobs
//!
//! Scheduled maintenance jobs for inkwell.
//!
//! Jobs are one-shot: a scheduler starts the `inkwell-deactivate` binary,
//! which runs the job once and exits with a status code.
//!
//! ## Example
//!
//! ```ignore
//! use inkwell_db::Database;
//! use inkwell_jobs::{BatchJob, DeactivateInactiveAccounts};
//!
//! let db = Database::connect("postgres://...").await?;
//! let report = DeactivateInactiveAccounts::new(db)
//!     .with_inactive_days(90)
//!     .run()
//!     .await?;
//! println!("{} accounts deactivated", report.affected);
//! ```

pub mod deactivate;
pub mod handler;

pub use deactivate::{DeactivateInactiveAccounts, DEFAULT_INACTIVE_DAYS};
pub use handler::{BatchJob, JobReport};

/// Read `INACTIVE_DAYS`, falling back to [`DEFAULT_INACTIVE_DAYS`].
pub fn inactive_days_from_env() -> inkwell_core::Result<u32> {
    match std::env::var("INACTIVE_DAYS") {
        Ok(raw) => parse_inactive_days(&raw),
        Err(_) => Ok(DEFAULT_INACTIVE_DAYS),
    }
}

fn parse_inactive_days(raw: &str) -> inkwell_core::Result<u32> {
    match raw.trim().parse::<u32>() {
        Ok(days) if days > 0 => Ok(days),
        _ => Err(inkwell_core::Error::Config(format!(
            "INACTIVE_DAYS must be a positive integer, got '{}'",
            raw
        ))),
    }
}
