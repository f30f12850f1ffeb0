//! Batch job abstraction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use inkwell_core::Result;

/// Outcome of one batch job run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobReport {
    /// Job name, as returned by [`BatchJob::name`].
    pub job: String,
    /// Rows changed by this run.
    pub affected: u64,
    /// Cut-off the job compared against.
    pub threshold: DateTime<Utc>,
    pub duration_ms: u64,
}

/// A one-shot job run to completion by a scheduler (cron, systemd timer).
#[async_trait]
pub trait BatchJob: Send + Sync {
    /// Stable name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Run the job once.
    async fn run(&self) -> Result<JobReport>;
}
