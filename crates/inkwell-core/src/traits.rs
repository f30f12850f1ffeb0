//! Core traits for inkwell abstractions.
//!
//! Every store operation takes the transaction it runs in. Use cases open the
//! transaction through a [`TransactionManager`], pass it to one or more stores
//! and commit or roll back once, so an aggregate (parent row + children) is
//! always written atomically.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// TRANSACTIONS
// =============================================================================

/// Supplies transaction scopes to use cases.
///
/// Dropping a transaction without committing must roll it back.
#[async_trait]
pub trait TransactionManager: Send + Sync {
    /// Transaction handle passed to store operations.
    type Tx: Send;

    /// Open a transaction before the first read or write.
    async fn begin(&self) -> Result<Self::Tx>;

    /// Make every write done through `tx` visible.
    async fn commit(&self, tx: Self::Tx) -> Result<()>;

    /// Discard every write done through `tx`.
    async fn rollback(&self, tx: Self::Tx) -> Result<()>;
}

/// A transaction manager together with the stores that run inside its
/// transactions.
pub trait Storage: TransactionManager {
    type Accounts: AccountRepository<Tx = Self::Tx>;
    type Templates: TemplateRepository<Tx = Self::Tx>;
    type Notes: NoteRepository<Tx = Self::Tx>;

    fn accounts(&self) -> &Self::Accounts;
    fn templates(&self) -> &Self::Templates;
    fn notes(&self) -> &Self::Notes;
}

// =============================================================================
// ACCOUNT REPOSITORY
// =============================================================================

/// Repository for owner identities.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    type Tx: Send;

    /// Fetch an account by id.
    async fn get_by_id(&self, tx: &mut Self::Tx, id: Uuid) -> Result<Account>;

    /// Fetch an account by email.
    async fn get_by_email(&self, tx: &mut Self::Tx, email: &str) -> Result<Account>;

    /// Insert or refresh the account for `(provider, provider_account_id)`,
    /// stamping `last_login_at` and re-activating it.
    async fn upsert_oauth_account(
        &self,
        tx: &mut Self::Tx,
        input: OAuthAccountInput,
    ) -> Result<Account>;

    /// Deactivate active accounts whose last login is before `threshold`.
    /// Returns the number of accounts changed.
    async fn deactivate_by_last_login_before(
        &self,
        tx: &mut Self::Tx,
        threshold: DateTime<Utc>,
    ) -> Result<u64>;
}

// =============================================================================
// TEMPLATE REPOSITORY
// =============================================================================

/// Repository for the template aggregate (template row + ordered fields).
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    type Tx: Send;

    /// Insert a template row (no fields yet).
    async fn create(&self, tx: &mut Self::Tx, template: NewTemplate) -> Result<Template>;

    /// Template, fields, owner and `is_used`.
    async fn get(&self, tx: &mut Self::Tx, id: Uuid) -> Result<TemplateView>;

    /// Update mutable columns.
    async fn update(&self, tx: &mut Self::Tx, update: TemplateUpdate) -> Result<Template>;

    /// Delete a template; fails with `InUse` while notes reference it.
    async fn delete(&self, tx: &mut Self::Tx, id: Uuid) -> Result<()>;

    /// Delete every field of the template and insert `fields`.
    async fn replace_fields(
        &self,
        tx: &mut Self::Tx,
        template_id: Uuid,
        fields: Vec<NewField>,
    ) -> Result<()>;

    /// Filtered list, newest first.
    async fn list(&self, tx: &mut Self::Tx, filters: TemplateFilters) -> Result<Vec<TemplateView>>;
}

// =============================================================================
// NOTE REPOSITORY
// =============================================================================

/// Repository for the note aggregate (note row + sections).
#[async_trait]
pub trait NoteRepository: Send + Sync {
    type Tx: Send;

    /// Insert a note row. Status defaults to Draft.
    async fn create(&self, tx: &mut Self::Tx, note: NewNote) -> Result<Note>;

    /// Insert sections for a note. Each field must belong to the note's
    /// template and appear at most once.
    async fn create_sections(
        &self,
        tx: &mut Self::Tx,
        note_id: Uuid,
        sections: Vec<NewSection>,
    ) -> Result<Vec<Section>>;

    /// Note with template name, owner names and labelled sections.
    async fn get(&self, tx: &mut Self::Tx, id: Uuid) -> Result<NoteView>;

    /// Partial update of mutable columns.
    async fn update(&self, tx: &mut Self::Tx, update: NoteUpdate) -> Result<Note>;

    /// Set the status; both directions are allowed.
    async fn update_status(&self, tx: &mut Self::Tx, id: Uuid, status: NoteStatus) -> Result<Note>;

    /// Delete a note and its sections.
    async fn delete(&self, tx: &mut Self::Tx, id: Uuid) -> Result<()>;

    /// Update section content by section id. Ids that are not sections of
    /// `note_id` fail with a `Membership` violation; nothing is inserted.
    async fn replace_sections(
        &self,
        tx: &mut Self::Tx,
        note_id: Uuid,
        sections: Vec<SectionUpdate>,
    ) -> Result<()>;

    /// Filtered list without section bodies, newest first.
    async fn list(&self, tx: &mut Self::Tx, filters: NoteFilters) -> Result<Vec<NoteSummary>>;
}
