//! Account repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use inkwell_core::{new_v7, Account, AccountRepository, Error, OAuthAccountInput, Result};

use crate::PgTx;

pub(crate) const ACCOUNT_COLUMNS: &str = "id, email, first_name, last_name, is_active, provider, \
     provider_account_id, thumbnail, last_login_at, created_at, updated_at";

/// PostgreSQL implementation of AccountRepository.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgAccountRepository;

impl PgAccountRepository {
    pub fn new() -> Self {
        Self
    }
}

fn account_from_row(r: &PgRow) -> Account {
    Account {
        id: r.get("id"),
        email: r.get("email"),
        first_name: r.get("first_name"),
        last_name: r.get("last_name"),
        is_active: r.get("is_active"),
        provider: r.get("provider"),
        provider_account_id: r.get("provider_account_id"),
        thumbnail: r.get("thumbnail"),
        last_login_at: r.get("last_login_at"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    }
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    type Tx = PgTx;

    async fn get_by_id(&self, tx: &mut PgTx, id: Uuid) -> Result<Account> {
        let query = format!("SELECT {} FROM accounts WHERE id = $1", ACCOUNT_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(Error::Database)?;

        row.map(|r| account_from_row(&r))
            .ok_or_else(|| Error::NotFound(format!("Account {} not found", id)))
    }

    async fn get_by_email(&self, tx: &mut PgTx, email: &str) -> Result<Account> {
        let query = format!("SELECT {} FROM accounts WHERE email = $1", ACCOUNT_COLUMNS);
        let row = sqlx::query(&query)
            .bind(email)
            .fetch_optional(&mut **tx)
            .await
            .map_err(Error::Database)?;

        row.map(|r| account_from_row(&r))
            .ok_or_else(|| Error::NotFound(format!("Account with email {} not found", email)))
    }

    async fn upsert_oauth_account(
        &self,
        tx: &mut PgTx,
        input: OAuthAccountInput,
    ) -> Result<Account> {
        let now = Utc::now();
        let query = format!(
            r#"
            INSERT INTO accounts (id, email, first_name, last_name, is_active, provider,
                                  provider_account_id, thumbnail, last_login_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, TRUE, $5, $6, $7, $8, $8, $8)
            ON CONFLICT (provider, provider_account_id) DO UPDATE SET
                email = EXCLUDED.email,
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                thumbnail = EXCLUDED.thumbnail,
                is_active = TRUE,
                last_login_at = EXCLUDED.last_login_at,
                updated_at = EXCLUDED.updated_at
            RETURNING {}
            "#,
            ACCOUNT_COLUMNS
        );

        // email clashes with another identity surface as Unique
        let row = sqlx::query(&query)
            .bind(new_v7())
            .bind(&input.email)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.provider)
            .bind(&input.provider_account_id)
            .bind(&input.thumbnail)
            .bind(now)
            .fetch_one(&mut **tx)
            .await
            .map_err(Error::from)?;

        Ok(account_from_row(&row))
    }

    async fn deactivate_by_last_login_before(
        &self,
        tx: &mut PgTx,
        threshold: DateTime<Utc>,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET is_active = FALSE, updated_at = $2
            WHERE is_active AND last_login_at < $1
            "#,
        )
        .bind(threshold)
        .bind(Utc::now())
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;

        Ok(result.rows_affected())
    }
}
