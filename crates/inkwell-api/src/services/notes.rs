//! Note use cases.
//!
//! A note and its sections are written in the same transaction. Updates
//! address existing sections by id; a note never gains or loses sections
//! after creation.

use std::time::Instant;

use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use inkwell_core::{
    NewNote, NewSection, NoteFilters, NoteRepository, NoteStatus, NoteSummary, NoteUpdate,
    NoteView, Result, SectionUpdate, Storage,
};

use super::{authorize, finish, require_owner, require_text};

/// Body of `POST /api/notes`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteInput {
    pub title: String,
    pub template_id: Uuid,
    #[serde(default)]
    pub owner_id: Option<Uuid>,
    /// Raw status; parsed so an unknown value surfaces as a check violation.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub sections: Vec<NewSection>,
}

/// Body of `PUT /api/notes/:id`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNoteInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub sections: Vec<SectionUpdate>,
}

#[derive(Clone)]
pub struct NoteService<S> {
    storage: S,
}

impl<S: Storage> NoteService<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Create a note with sections for a subset of its template's fields.
    pub async fn create(&self, input: CreateNoteInput) -> Result<NoteView> {
        let start = Instant::now();
        let owner_id = require_owner(input.owner_id)?;
        require_text("title", &input.title)?;
        let status = input
            .status
            .as_deref()
            .map(str::parse::<NoteStatus>)
            .transpose()?;

        let new_note = NewNote {
            title: input.title,
            template_id: input.template_id,
            owner_id,
            status,
        };

        let mut tx = self.storage.begin().await?;
        let result = self.create_in(&mut tx, new_note, input.sections).await;
        let view = finish(&self.storage, tx, result).await?;

        info!(
            subsystem = "api",
            component = "notes",
            op = "create",
            note_id = %view.note.id,
            template_id = %view.note.template_id,
            owner_id = %owner_id,
            section_count = view.sections.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Note created"
        );
        Ok(view)
    }

    async fn create_in(
        &self,
        tx: &mut S::Tx,
        new_note: NewNote,
        sections: Vec<NewSection>,
    ) -> Result<NoteView> {
        let notes = self.storage.notes();
        let note = notes.create(tx, new_note).await?;
        if !sections.is_empty() {
            notes.create_sections(tx, note.id, sections).await?;
        }
        notes.get(tx, note.id).await
    }

    pub async fn get(&self, id: Uuid) -> Result<NoteView> {
        let mut tx = self.storage.begin().await?;
        let result = self.storage.notes().get(&mut tx, id).await;
        finish(&self.storage, tx, result).await
    }

    pub async fn list(&self, filters: NoteFilters) -> Result<Vec<NoteSummary>> {
        let start = Instant::now();
        let mut tx = self.storage.begin().await?;
        let result = self.storage.notes().list(&mut tx, filters).await;
        let notes = finish(&self.storage, tx, result).await?;

        debug!(
            subsystem = "api",
            component = "notes",
            op = "list",
            result_count = notes.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Notes listed"
        );
        Ok(notes)
    }

    /// Change the title and/or section contents of a note the caller owns.
    ///
    /// Every section id must belong to the note; otherwise nothing changes.
    pub async fn update(
        &self,
        id: Uuid,
        owner_id: Option<Uuid>,
        input: UpdateNoteInput,
    ) -> Result<NoteView> {
        let caller = require_owner(owner_id)?;
        if let Some(title) = &input.title {
            require_text("title", title)?;
        }

        let mut tx = self.storage.begin().await?;
        let result = self.update_in(&mut tx, id, caller, input).await;
        let view = finish(&self.storage, tx, result).await?;

        info!(
            subsystem = "api",
            component = "notes",
            op = "update",
            note_id = %id,
            "Note updated"
        );
        Ok(view)
    }

    async fn update_in(
        &self,
        tx: &mut S::Tx,
        id: Uuid,
        caller: Uuid,
        input: UpdateNoteInput,
    ) -> Result<NoteView> {
        let notes = self.storage.notes();
        let current = notes.get(tx, id).await?;
        authorize("note", id, current.note.owner_id, caller)?;

        notes
            .update(
                tx,
                NoteUpdate {
                    id,
                    title: input.title,
                },
            )
            .await?;
        if !input.sections.is_empty() {
            notes.replace_sections(tx, id, input.sections).await?;
        }
        notes.get(tx, id).await
    }

    pub async fn delete(&self, id: Uuid, owner_id: Option<Uuid>) -> Result<()> {
        let caller = require_owner(owner_id)?;

        let mut tx = self.storage.begin().await?;
        let result = self.delete_in(&mut tx, id, caller).await;
        finish(&self.storage, tx, result).await?;

        info!(
            subsystem = "api",
            component = "notes",
            op = "delete",
            note_id = %id,
            "Note deleted"
        );
        Ok(())
    }

    async fn delete_in(&self, tx: &mut S::Tx, id: Uuid, caller: Uuid) -> Result<()> {
        let notes = self.storage.notes();
        let current = notes.get(tx, id).await?;
        authorize("note", id, current.note.owner_id, caller)?;
        notes.delete(tx, id).await
    }

    pub async fn publish(&self, id: Uuid, owner_id: Option<Uuid>) -> Result<NoteView> {
        self.set_status(id, owner_id, NoteStatus::Publish).await
    }

    pub async fn unpublish(&self, id: Uuid, owner_id: Option<Uuid>) -> Result<NoteView> {
        self.set_status(id, owner_id, NoteStatus::Draft).await
    }

    async fn set_status(
        &self,
        id: Uuid,
        owner_id: Option<Uuid>,
        status: NoteStatus,
    ) -> Result<NoteView> {
        let caller = require_owner(owner_id)?;

        let mut tx = self.storage.begin().await?;
        let result = self.set_status_in(&mut tx, id, caller, status).await;
        let view = finish(&self.storage, tx, result).await?;

        info!(
            subsystem = "api",
            component = "notes",
            op = "set_status",
            note_id = %id,
            status = %status,
            "Note status changed"
        );
        Ok(view)
    }

    async fn set_status_in(
        &self,
        tx: &mut S::Tx,
        id: Uuid,
        caller: Uuid,
        status: NoteStatus,
    ) -> Result<NoteView> {
        let notes = self.storage.notes();
        let current = notes.get(tx, id).await?;
        authorize("note", id, current.note.owner_id, caller)?;
        notes.update_status(tx, id, status).await?;
        notes.get(tx, id).await
    }
}
