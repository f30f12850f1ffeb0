//! In-process storage for deterministic testing.
//!
//! [`MemoryStorage`] implements [`Storage`] without a database. It applies the
//! same rules the relational schema enforces (foreign keys, unique keys,
//! restrict-on-delete, template membership of sections) so use cases and
//! HTTP handlers can be exercised end to end.
//!
//! ## Usage
//!
//! ```rust
//! use inkwell_core::mock::MemoryStorage;
//!
//! let storage = MemoryStorage::new();
//! let owner = storage.seed_account("Ada", "Lovelace", "ada@example.com");
//! assert!(storage.account(owner.id).is_some());
//! ```
//!
//! A transaction works on a private copy of the state taken at `begin`.
//! `commit` replays the rows it inserted, changed or deleted onto the current
//! state; `rollback` (or dropping it) discards them. Rows touched by no one
//! else survive overlapping commits; a row written by two transactions is
//! last-write-wins.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{ConstraintKind, Error, Result};
use crate::models::*;
use crate::traits::*;
use crate::uuid_utils::new_v7;

#[derive(Debug, Clone, PartialEq)]
struct TemplateRow {
    id: Uuid,
    name: String,
    owner_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Table contents held by [`MemoryStorage`].
#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    accounts: Vec<Account>,
    templates: Vec<TemplateRow>,
    fields: Vec<Field>,
    notes: Vec<Note>,
    sections: Vec<Section>,
}

/// Counts of transaction calls, for asserting that a request never reached
/// storage or that a failure rolled back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TxStats {
    pub begins: usize,
    pub commits: usize,
    pub rollbacks: usize,
}

/// Open transaction of a [`MemoryStorage`].
#[derive(Debug)]
pub struct MemoryTx {
    base: MemoryState,
    state: MemoryState,
}

/// In-memory implementation of every store and the transaction manager.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    state: Arc<Mutex<MemoryState>>,
    stats: Arc<Mutex<TxStats>>,
    accounts: MemoryAccounts,
    templates: MemoryTemplates,
    notes: MemoryNotes,
}

/// Account store over a [`MemoryTx`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryAccounts;

/// Template store over a [`MemoryTx`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryTemplates;

/// Note store over a [`MemoryTx`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryNotes;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an active account directly, bypassing transactions.
    pub fn seed_account(&self, first_name: &str, last_name: &str, email: &str) -> Account {
        let now = Utc::now();
        let account = Account {
            id: new_v7(),
            email: email.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            is_active: true,
            provider: "google".to_string(),
            provider_account_id: format!("seed-{}", email),
            thumbnail: None,
            last_login_at: Some(now),
            created_at: now,
            updated_at: now,
        };
        self.insert_account(account.clone());
        account
    }

    /// Insert a fully specified account row, bypassing transactions.
    pub fn insert_account(&self, account: Account) {
        lock(&self.state).accounts.push(account);
    }

    pub fn account(&self, id: Uuid) -> Option<Account> {
        lock(&self.state)
            .accounts
            .iter()
            .find(|a| a.id == id)
            .cloned()
    }

    pub fn note_count(&self) -> usize {
        lock(&self.state).notes.len()
    }

    pub fn template_count(&self) -> usize {
        lock(&self.state).templates.len()
    }

    pub fn section_count(&self) -> usize {
        lock(&self.state).sections.len()
    }

    pub fn field_count(&self) -> usize {
        lock(&self.state).fields.len()
    }

    pub fn tx_stats(&self) -> TxStats {
        *lock(&self.stats)
    }
}

#[async_trait]
impl TransactionManager for MemoryStorage {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx> {
        lock(&self.stats).begins += 1;
        let snapshot = lock(&self.state).clone();
        Ok(MemoryTx {
            base: snapshot.clone(),
            state: snapshot,
        })
    }

    async fn commit(&self, tx: MemoryTx) -> Result<()> {
        lock(&self.stats).commits += 1;
        lock(&self.state).apply(&tx.base, tx.state);
        Ok(())
    }

    async fn rollback(&self, tx: MemoryTx) -> Result<()> {
        lock(&self.stats).rollbacks += 1;
        drop(tx);
        Ok(())
    }
}

impl Storage for MemoryStorage {
    type Accounts = MemoryAccounts;
    type Templates = MemoryTemplates;
    type Notes = MemoryNotes;

    fn accounts(&self) -> &MemoryAccounts {
        &self.accounts
    }

    fn templates(&self) -> &MemoryTemplates {
        &self.templates
    }

    fn notes(&self) -> &MemoryNotes {
        &self.notes
    }
}

/// Replay the difference between `base` and `ours` onto `current`, keyed by id.
fn merge_rows<T, F>(current: &mut Vec<T>, base: &[T], ours: Vec<T>, id: F)
where
    T: PartialEq,
    F: Fn(&T) -> Uuid,
{
    let kept: HashSet<Uuid> = ours.iter().map(&id).collect();
    let deleted: HashSet<Uuid> = base
        .iter()
        .map(&id)
        .filter(|row_id| !kept.contains(row_id))
        .collect();
    current.retain(|row| !deleted.contains(&id(row)));

    for row in ours {
        let row_id = id(&row);
        if base.iter().any(|b| id(b) == row_id && *b == row) {
            continue;
        }
        match current.iter_mut().find(|c| id(c) == row_id) {
            Some(existing) => *existing = row,
            None => current.push(row),
        }
    }
}

impl MemoryState {
    /// Apply the writes a transaction made since `base` was taken.
    fn apply(&mut self, base: &MemoryState, ours: MemoryState) {
        merge_rows(&mut self.accounts, &base.accounts, ours.accounts, |r| r.id);
        merge_rows(&mut self.templates, &base.templates, ours.templates, |r| r.id);
        merge_rows(&mut self.fields, &base.fields, ours.fields, |r| r.id);
        merge_rows(&mut self.notes, &base.notes, ours.notes, |r| r.id);
        merge_rows(&mut self.sections, &base.sections, ours.sections, |r| r.id);
    }
}

// =============================================================================
// Shared lookups
// =============================================================================

impl MemoryState {
    fn account(&self, id: Uuid) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == id)
    }

    fn template(&self, id: Uuid) -> Option<&TemplateRow> {
        self.templates.iter().find(|t| t.id == id)
    }

    fn field(&self, id: Uuid) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == id)
    }

    fn note(&self, id: Uuid) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    fn fields_of(&self, template_id: Uuid) -> Vec<Field> {
        let mut fields: Vec<Field> = self
            .fields
            .iter()
            .filter(|f| f.template_id == template_id)
            .cloned()
            .collect();
        fields.sort_by_key(|f| f.order);
        fields
    }

    fn template_view(&self, row: &TemplateRow) -> Result<TemplateView> {
        let owner = self
            .account(row.owner_id)
            .ok_or_else(|| Error::Internal(format!("template {} has no owner row", row.id)))?
            .summary();
        Ok(TemplateView {
            template: Template {
                id: row.id,
                name: row.name.clone(),
                owner_id: row.owner_id,
                fields: self.fields_of(row.id),
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            owner,
            is_used: self.notes.iter().any(|n| n.template_id == row.id),
        })
    }

    fn note_summary(&self, note: &Note) -> Result<NoteSummary> {
        let template = self
            .template(note.template_id)
            .ok_or_else(|| Error::Internal(format!("note {} has no template row", note.id)))?;
        let owner = self
            .account(note.owner_id)
            .ok_or_else(|| Error::Internal(format!("note {} has no owner row", note.id)))?;
        Ok(NoteSummary {
            note: note.clone(),
            template_name: template.name.clone(),
            owner_first_name: owner.first_name.clone(),
            owner_last_name: owner.last_name.clone(),
        })
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

// =============================================================================
// Accounts
// =============================================================================

#[async_trait]
impl AccountRepository for MemoryAccounts {
    type Tx = MemoryTx;

    async fn get_by_id(&self, tx: &mut MemoryTx, id: Uuid) -> Result<Account> {
        tx.state
            .account(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Account {} not found", id)))
    }

    async fn get_by_email(&self, tx: &mut MemoryTx, email: &str) -> Result<Account> {
        tx.state
            .accounts
            .iter()
            .find(|a| a.email == email)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Account with email {} not found", email)))
    }

    async fn upsert_oauth_account(
        &self,
        tx: &mut MemoryTx,
        input: OAuthAccountInput,
    ) -> Result<Account> {
        let now = Utc::now();
        let existing = tx.state.accounts.iter().position(|a| {
            a.provider == input.provider && a.provider_account_id == input.provider_account_id
        });
        let existing_id = existing.map(|idx| tx.state.accounts[idx].id);

        if tx
            .state
            .accounts
            .iter()
            .any(|a| a.email == input.email && Some(a.id) != existing_id)
        {
            return Err(Error::constraint(
                ConstraintKind::Unique,
                format!("email {} already belongs to another account", input.email),
            ));
        }

        match existing {
            Some(idx) => {
                let account = &mut tx.state.accounts[idx];
                account.email = input.email;
                account.first_name = input.first_name;
                account.last_name = input.last_name;
                account.thumbnail = input.thumbnail;
                account.is_active = true;
                account.last_login_at = Some(now);
                account.updated_at = now;
                Ok(account.clone())
            }
            None => {
                let account = Account {
                    id: new_v7(),
                    email: input.email,
                    first_name: input.first_name,
                    last_name: input.last_name,
                    is_active: true,
                    provider: input.provider,
                    provider_account_id: input.provider_account_id,
                    thumbnail: input.thumbnail,
                    last_login_at: Some(now),
                    created_at: now,
                    updated_at: now,
                };
                tx.state.accounts.push(account.clone());
                Ok(account)
            }
        }
    }

    async fn deactivate_by_last_login_before(
        &self,
        tx: &mut MemoryTx,
        threshold: DateTime<Utc>,
    ) -> Result<u64> {
        let now = Utc::now();
        let mut affected = 0;
        for account in tx.state.accounts.iter_mut() {
            let stale = matches!(account.last_login_at, Some(at) if at < threshold);
            if account.is_active && stale {
                account.is_active = false;
                account.updated_at = now;
                affected += 1;
            }
        }
        Ok(affected)
    }
}

// =============================================================================
// Templates
// =============================================================================

#[async_trait]
impl TemplateRepository for MemoryTemplates {
    type Tx = MemoryTx;

    async fn create(&self, tx: &mut MemoryTx, template: NewTemplate) -> Result<Template> {
        if tx.state.account(template.owner_id).is_none() {
            return Err(Error::constraint(
                ConstraintKind::ForeignKey,
                format!("owner {} does not exist", template.owner_id),
            ));
        }
        let now = Utc::now();
        let row = TemplateRow {
            id: new_v7(),
            name: template.name,
            owner_id: template.owner_id,
            created_at: now,
            updated_at: now,
        };
        tx.state.templates.push(row.clone());
        Ok(Template {
            id: row.id,
            name: row.name,
            owner_id: row.owner_id,
            fields: Vec::new(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    async fn get(&self, tx: &mut MemoryTx, id: Uuid) -> Result<TemplateView> {
        let row = tx
            .state
            .template(id)
            .ok_or_else(|| Error::NotFound(format!("Template {} not found", id)))?;
        tx.state.template_view(row)
    }

    async fn update(&self, tx: &mut MemoryTx, update: TemplateUpdate) -> Result<Template> {
        let row = tx
            .state
            .templates
            .iter_mut()
            .find(|t| t.id == update.id)
            .ok_or_else(|| Error::NotFound(format!("Template {} not found", update.id)))?;
        if let Some(name) = update.name {
            row.name = name;
        }
        row.updated_at = Utc::now();
        let row = row.clone();
        Ok(Template {
            id: row.id,
            name: row.name,
            owner_id: row.owner_id,
            fields: tx.state.fields_of(row.id),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    async fn delete(&self, tx: &mut MemoryTx, id: Uuid) -> Result<()> {
        if tx.state.template(id).is_none() {
            return Err(Error::NotFound(format!("Template {} not found", id)));
        }
        if tx.state.notes.iter().any(|n| n.template_id == id) {
            return Err(Error::constraint(
                ConstraintKind::InUse,
                format!("template {} is referenced by notes", id),
            ));
        }
        tx.state.fields.retain(|f| f.template_id != id);
        tx.state.templates.retain(|t| t.id != id);
        Ok(())
    }

    async fn replace_fields(
        &self,
        tx: &mut MemoryTx,
        template_id: Uuid,
        fields: Vec<NewField>,
    ) -> Result<()> {
        if tx.state.template(template_id).is_none() {
            return Err(Error::constraint(
                ConstraintKind::ForeignKey,
                format!("template {} does not exist", template_id),
            ));
        }

        let old: HashSet<Uuid> = tx
            .state
            .fields
            .iter()
            .filter(|f| f.template_id == template_id)
            .map(|f| f.id)
            .collect();
        if tx.state.sections.iter().any(|s| old.contains(&s.field_id)) {
            return Err(Error::constraint(
                ConstraintKind::InUse,
                format!("fields of template {} are referenced by sections", template_id),
            ));
        }
        tx.state.fields.retain(|f| f.template_id != template_id);

        let mut orders = HashSet::new();
        for field in fields {
            if field.order < 1 {
                return Err(Error::constraint(
                    ConstraintKind::Check,
                    format!("field order {} must be positive", field.order),
                ));
            }
            if !orders.insert(field.order) {
                return Err(Error::constraint(
                    ConstraintKind::Unique,
                    format!("duplicate field order {}", field.order),
                ));
            }
            tx.state.fields.push(Field {
                id: new_v7(),
                template_id,
                label: field.label,
                order: field.order,
                is_required: field.is_required,
            });
        }
        Ok(())
    }

    async fn list(&self, tx: &mut MemoryTx, filters: TemplateFilters) -> Result<Vec<TemplateView>> {
        let mut rows: Vec<&TemplateRow> = tx
            .state
            .templates
            .iter()
            .filter(|t| filters.owner_id.map_or(true, |o| t.owner_id == o))
            .filter(|t| {
                filters
                    .query
                    .as_deref()
                    .map_or(true, |q| contains_ci(&t.name, q))
            })
            .collect();
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        rows.into_iter()
            .map(|row| tx.state.template_view(row))
            .collect()
    }
}

// =============================================================================
// Notes
// =============================================================================

#[async_trait]
impl NoteRepository for MemoryNotes {
    type Tx = MemoryTx;

    async fn create(&self, tx: &mut MemoryTx, note: NewNote) -> Result<Note> {
        if tx.state.template(note.template_id).is_none() {
            return Err(Error::constraint(
                ConstraintKind::ForeignKey,
                format!("template {} does not exist", note.template_id),
            ));
        }
        if tx.state.account(note.owner_id).is_none() {
            return Err(Error::constraint(
                ConstraintKind::ForeignKey,
                format!("owner {} does not exist", note.owner_id),
            ));
        }
        let now = Utc::now();
        let row = Note {
            id: new_v7(),
            title: note.title,
            template_id: note.template_id,
            owner_id: note.owner_id,
            status: note.status.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };
        tx.state.notes.push(row.clone());
        Ok(row)
    }

    async fn create_sections(
        &self,
        tx: &mut MemoryTx,
        note_id: Uuid,
        sections: Vec<NewSection>,
    ) -> Result<Vec<Section>> {
        let template_id = tx
            .state
            .note(note_id)
            .map(|n| n.template_id)
            .ok_or_else(|| Error::NotFound(format!("Note {} not found", note_id)))?;

        let mut created = Vec::with_capacity(sections.len());
        for section in sections {
            let in_template = tx
                .state
                .field(section.field_id)
                .is_some_and(|f| f.template_id == template_id);
            if !in_template {
                return Err(Error::constraint(
                    ConstraintKind::Membership,
                    format!(
                        "field {} is not part of the note's template",
                        section.field_id
                    ),
                ));
            }
            if tx
                .state
                .sections
                .iter()
                .any(|s| s.note_id == note_id && s.field_id == section.field_id)
            {
                return Err(Error::constraint(
                    ConstraintKind::Unique,
                    format!("note already has a section for field {}", section.field_id),
                ));
            }
            let row = Section {
                id: new_v7(),
                note_id,
                field_id: section.field_id,
                content: section.content,
            };
            tx.state.sections.push(row.clone());
            created.push(row);
        }
        Ok(created)
    }

    async fn get(&self, tx: &mut MemoryTx, id: Uuid) -> Result<NoteView> {
        let state = &tx.state;
        let note = state
            .note(id)
            .ok_or_else(|| Error::NotFound(format!("Note {} not found", id)))?;
        let summary = state.note_summary(note)?;

        let mut sections = Vec::new();
        for section in state.sections.iter().filter(|s| s.note_id == id) {
            let field = state.field(section.field_id).ok_or_else(|| {
                Error::Internal(format!("section {} has no field row", section.id))
            })?;
            sections.push(SectionView {
                section: section.clone(),
                field_label: field.label.clone(),
                field_order: field.order,
                is_required: field.is_required,
            });
        }
        sections.sort_by_key(|s| s.field_order);

        Ok(NoteView {
            note: summary.note,
            template_name: summary.template_name,
            owner_first_name: summary.owner_first_name,
            owner_last_name: summary.owner_last_name,
            sections,
        })
    }

    async fn update(&self, tx: &mut MemoryTx, update: NoteUpdate) -> Result<Note> {
        let note = tx
            .state
            .notes
            .iter_mut()
            .find(|n| n.id == update.id)
            .ok_or_else(|| Error::NotFound(format!("Note {} not found", update.id)))?;
        if let Some(title) = update.title {
            note.title = title;
        }
        note.updated_at = Utc::now();
        Ok(note.clone())
    }

    async fn update_status(&self, tx: &mut MemoryTx, id: Uuid, status: NoteStatus) -> Result<Note> {
        let note = tx
            .state
            .notes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| Error::NotFound(format!("Note {} not found", id)))?;
        note.status = status;
        note.updated_at = Utc::now();
        Ok(note.clone())
    }

    async fn delete(&self, tx: &mut MemoryTx, id: Uuid) -> Result<()> {
        if tx.state.note(id).is_none() {
            return Err(Error::NotFound(format!("Note {} not found", id)));
        }
        tx.state.sections.retain(|s| s.note_id != id);
        tx.state.notes.retain(|n| n.id != id);
        Ok(())
    }

    async fn replace_sections(
        &self,
        tx: &mut MemoryTx,
        note_id: Uuid,
        sections: Vec<SectionUpdate>,
    ) -> Result<()> {
        if tx.state.note(note_id).is_none() {
            return Err(Error::NotFound(format!("Note {} not found", note_id)));
        }
        for update in sections {
            let section = tx
                .state
                .sections
                .iter_mut()
                .find(|s| s.id == update.id && s.note_id == note_id)
                .ok_or_else(|| {
                    Error::constraint(
                        ConstraintKind::Membership,
                        format!("section {} does not belong to note {}", update.id, note_id),
                    )
                })?;
            section.content = update.content;
        }
        Ok(())
    }

    async fn list(&self, tx: &mut MemoryTx, filters: NoteFilters) -> Result<Vec<NoteSummary>> {
        let mut notes: Vec<&Note> = tx
            .state
            .notes
            .iter()
            .filter(|n| filters.status.map_or(true, |s| n.status == s))
            .filter(|n| filters.owner_id.map_or(true, |o| n.owner_id == o))
            .filter(|n| filters.template_id.map_or(true, |t| n.template_id == t))
            .filter(|n| {
                filters
                    .query
                    .as_deref()
                    .map_or(true, |q| contains_ci(&n.title, q))
            })
            .collect();
        notes.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        notes
            .into_iter()
            .map(|n| tx.state.note_summary(n))
            .collect()
    }
}
