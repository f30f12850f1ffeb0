//! Deactivation of accounts that have not signed in recently.

use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use inkwell_core::{AccountRepository, Error, Result, Storage};

use crate::handler::{BatchJob, JobReport};

/// Days without a sign-in after which an account is deactivated.
pub const DEFAULT_INACTIVE_DAYS: u32 = 90;

/// Marks active accounts whose last sign-in is older than `inactive_days`
/// as inactive. Accounts that never signed in are left alone. Running it
/// again with the same threshold changes nothing.
pub struct DeactivateInactiveAccounts<S> {
    storage: S,
    inactive_days: u32,
}

impl<S: Storage> DeactivateInactiveAccounts<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            inactive_days: DEFAULT_INACTIVE_DAYS,
        }
    }

    pub fn with_inactive_days(mut self, days: u32) -> Self {
        self.inactive_days = days;
        self
    }

    pub fn inactive_days(&self) -> u32 {
        self.inactive_days
    }

    /// Deactivate accounts last seen before `now - inactive_days`.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<JobReport> {
        if self.inactive_days == 0 {
            return Err(Error::Config("inactive_days must be at least 1".to_string()));
        }

        let start = Instant::now();
        let threshold = now - Duration::days(i64::from(self.inactive_days));

        let mut tx = self.storage.begin().await?;
        let affected = match self
            .storage
            .accounts()
            .deactivate_by_last_login_before(&mut tx, threshold)
            .await
        {
            Ok(affected) => affected,
            Err(e) => {
                if let Err(rollback_err) = self.storage.rollback(tx).await {
                    warn!(
                        subsystem = "jobs",
                        op = "rollback",
                        error = %rollback_err,
                        "Transaction rollback failed"
                    );
                }
                return Err(e);
            }
        };
        self.storage.commit(tx).await?;

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            subsystem = "jobs",
            component = "deactivate",
            op = self.name(),
            affected,
            threshold = %threshold,
            duration_ms,
            "Inactive accounts deactivated"
        );

        Ok(JobReport {
            job: self.name().to_string(),
            affected,
            threshold,
            duration_ms,
        })
    }
}

#[async_trait]
impl<S: Storage> BatchJob for DeactivateInactiveAccounts<S> {
    fn name(&self) -> &'static str {
        "deactivate_inactive_accounts"
    }

    async fn run(&self) -> Result<JobReport> {
        self.run_at(Utc::now()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkwell_core::mock::MemoryStorage;
    use inkwell_core::Account;

    fn account(
        storage: &MemoryStorage,
        email: &str,
        is_active: bool,
        days_ago: Option<i64>,
    ) -> Account {
        let now = Utc::now();
        let account = Account {
            id: inkwell_core::new_v7(),
            email: email.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            is_active,
            provider: "google".to_string(),
            provider_account_id: email.to_string(),
            thumbnail: None,
            last_login_at: days_ago.map(|d| now - Duration::days(d)),
            created_at: now,
            updated_at: now,
        };
        storage.insert_account(account.clone());
        account
    }

    #[tokio::test]
    async fn test_deactivates_stale_accounts_once() {
        let storage = MemoryStorage::new();
        let stale = account(&storage, "stale@example.com", true, Some(120));
        let recent = account(&storage, "recent@example.com", true, Some(5));
        let never = account(&storage, "never@example.com", true, None);
        let dormant = account(&storage, "dormant@example.com", false, Some(400));

        let job = DeactivateInactiveAccounts::new(storage.clone());
        let now = Utc::now();

        let first = job.run_at(now).await.unwrap();
        assert_eq!(first.affected, 1);
        assert_eq!(first.job, "deactivate_inactive_accounts");
        assert_eq!(first.threshold, now - Duration::days(90));

        let second = job.run_at(now).await.unwrap();
        assert_eq!(second.affected, 0);

        assert!(!storage.account(stale.id).unwrap().is_active);
        assert!(storage.account(recent.id).unwrap().is_active);
        assert!(storage.account(never.id).unwrap().is_active);
        assert!(!storage.account(dormant.id).unwrap().is_active);
    }

    #[tokio::test]
    async fn test_custom_window() {
        let storage = MemoryStorage::new();
        let week_old = account(&storage, "week@example.com", true, Some(8));

        let job = DeactivateInactiveAccounts::new(storage.clone()).with_inactive_days(7);
        assert_eq!(job.inactive_days(), 7);

        let report = job.run().await.unwrap();
        assert_eq!(report.affected, 1);
        assert!(!storage.account(week_old.id).unwrap().is_active);
    }

    #[tokio::test]
    async fn test_zero_days_is_config_error() {
        let storage = MemoryStorage::new();
        let job = DeactivateInactiveAccounts::new(storage.clone()).with_inactive_days(0);

        let err = job.run().await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(storage.tx_stats().begins, 0);
    }
}
