//! # inkwell-db
//!
//! PostgreSQL database layer for inkwell.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for accounts, templates and notes
//! - [`Database`], the transaction manager that use cases run against
//!
//! ## Example
//!
//! ```rust,ignore
//! use inkwell_db::{Database, Storage, TemplateRepository, TransactionManager};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/inkwell").await?;
//!
//!     let mut tx = db.begin().await?;
//!     let view = db.templates().get(&mut tx, template_id).await?;
//!     db.commit(tx).await?;
//!
//!     println!("{} has {} fields", view.template.name, view.template.fields.len());
//!     Ok(())
//! }
//! ```

pub mod accounts;
pub mod notes;
pub mod pool;
pub mod templates;

// Test fixtures for integration tests
// Note: Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

// Re-export core types
pub use inkwell_core::*;

pub use accounts::PgAccountRepository;
pub use notes::PgNoteRepository;
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
pub use templates::PgTemplateRepository;

/// Transaction handle used by every Pg repository.
pub type PgTx = Transaction<'static, Postgres>;

/// Escape LIKE/ILIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Database handle: the connection pool plus the repositories that run
/// inside its transactions.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
    /// Account repository.
    pub accounts: PgAccountRepository,
    /// Template aggregate repository.
    pub templates: PgTemplateRepository,
    /// Note aggregate repository.
    pub notes: PgNoteRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            accounts: PgAccountRepository::new(),
            templates: PgTemplateRepository::new(),
            notes: PgNoteRepository::new(),
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl TransactionManager for Database {
    type Tx = PgTx;

    async fn begin(&self) -> Result<PgTx> {
        self.pool.begin().await.map_err(Error::Database)
    }

    async fn commit(&self, tx: PgTx) -> Result<()> {
        tx.commit().await.map_err(Error::Database)
    }

    async fn rollback(&self, tx: PgTx) -> Result<()> {
        tx.rollback().await.map_err(Error::Database)
    }
}

impl Storage for Database {
    type Accounts = PgAccountRepository;
    type Templates = PgTemplateRepository;
    type Notes = PgNoteRepository;

    fn accounts(&self) -> &PgAccountRepository {
        &self.accounts
    }

    fn templates(&self) -> &PgTemplateRepository {
        &self.templates
    }

    fn notes(&self) -> &PgNoteRepository {
        &self.notes
    }
}
