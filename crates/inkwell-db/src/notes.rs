//! Note repository implementation.
//!
//! A note owns one section per template field it fills in. Sections are
//! inserted once, when the note is created, and afterwards only their content
//! changes, addressed by section id.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use inkwell_core::{
    new_v7, ConstraintKind, Error, NewNote, NewSection, Note, NoteFilters, NoteRepository,
    NoteStatus, NoteSummary, NoteUpdate, NoteView, Result, Section, SectionUpdate, SectionView,
};

use crate::{escape_like, PgTx};

const NOTE_COLUMNS: &str = "id, title, template_id, owner_id, status, created_at, updated_at";

const NOTE_SUMMARY_SELECT: &str = r#"
    SELECT n.id, n.title, n.template_id, n.owner_id, n.status, n.created_at, n.updated_at,
           t.name AS template_name,
           a.first_name AS owner_first_name,
           a.last_name AS owner_last_name
    FROM notes n
    JOIN templates t ON t.id = n.template_id
    JOIN accounts a ON a.id = n.owner_id
"#;

/// PostgreSQL implementation of NoteRepository.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgNoteRepository;

impl PgNoteRepository {
    pub fn new() -> Self {
        Self
    }

    async fn exists(&self, tx: &mut PgTx, id: Uuid) -> Result<bool> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM notes WHERE id = $1)")
            .bind(id)
            .fetch_one(&mut **tx)
            .await
            .map_err(Error::Database)
    }
}

fn note_from_row(r: &PgRow) -> Result<Note> {
    let status: String = r.get("status");
    Ok(Note {
        id: r.get("id"),
        title: r.get("title"),
        template_id: r.get("template_id"),
        owner_id: r.get("owner_id"),
        status: status.parse::<NoteStatus>()?,
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    })
}

fn summary_from_row(r: &PgRow) -> Result<NoteSummary> {
    Ok(NoteSummary {
        note: note_from_row(r)?,
        template_name: r.get("template_name"),
        owner_first_name: r.get("owner_first_name"),
        owner_last_name: r.get("owner_last_name"),
    })
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    type Tx = PgTx;

    async fn create(&self, tx: &mut PgTx, note: NewNote) -> Result<Note> {
        let query = format!(
            r#"
            INSERT INTO notes (id, title, template_id, owner_id, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING {}
            "#,
            NOTE_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(new_v7())
            .bind(&note.title)
            .bind(note.template_id)
            .bind(note.owner_id)
            .bind(note.status.unwrap_or_default().as_str())
            .bind(Utc::now())
            .fetch_one(&mut **tx)
            .await
            .map_err(Error::from)?;

        note_from_row(&row)
    }

    async fn create_sections(
        &self,
        tx: &mut PgTx,
        note_id: Uuid,
        sections: Vec<NewSection>,
    ) -> Result<Vec<Section>> {
        if !self.exists(tx, note_id).await? {
            return Err(Error::NotFound(format!("Note {} not found", note_id)));
        }

        let mut created = Vec::with_capacity(sections.len());
        for section in sections {
            let id = new_v7();
            // Joining through the note's template inserts nothing when the
            // field belongs to another template.
            let result = sqlx::query(
                r#"
                INSERT INTO sections (id, note_id, field_id, content)
                SELECT $1, n.id, f.id, $4
                FROM notes n
                JOIN fields f ON f.template_id = n.template_id
                WHERE n.id = $2 AND f.id = $3
                "#,
            )
            .bind(id)
            .bind(note_id)
            .bind(section.field_id)
            .bind(&section.content)
            .execute(&mut **tx)
            .await
            .map_err(Error::from)?;

            if result.rows_affected() == 0 {
                return Err(Error::constraint(
                    ConstraintKind::Membership,
                    format!(
                        "field {} is not part of the note's template",
                        section.field_id
                    ),
                ));
            }

            created.push(Section {
                id,
                note_id,
                field_id: section.field_id,
                content: section.content,
            });
        }
        Ok(created)
    }

    async fn get(&self, tx: &mut PgTx, id: Uuid) -> Result<NoteView> {
        let query = format!("{} WHERE n.id = $1", NOTE_SUMMARY_SELECT);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(Error::Database)?
            .ok_or_else(|| Error::NotFound(format!("Note {} not found", id)))?;
        let summary = summary_from_row(&row)?;

        let section_rows = sqlx::query(
            r#"
            SELECT s.id, s.note_id, s.field_id, s.content,
                   f.label AS field_label, f."order" AS field_order, f.is_required
            FROM sections s
            JOIN fields f ON f.id = s.field_id
            WHERE s.note_id = $1
            ORDER BY f."order"
            "#,
        )
        .bind(id)
        .fetch_all(&mut **tx)
        .await
        .map_err(Error::Database)?;

        let sections = section_rows
            .into_iter()
            .map(|r| SectionView {
                section: Section {
                    id: r.get("id"),
                    note_id: r.get("note_id"),
                    field_id: r.get("field_id"),
                    content: r.get("content"),
                },
                field_label: r.get("field_label"),
                field_order: r.get("field_order"),
                is_required: r.get("is_required"),
            })
            .collect();

        Ok(NoteView {
            note: summary.note,
            template_name: summary.template_name,
            owner_first_name: summary.owner_first_name,
            owner_last_name: summary.owner_last_name,
            sections,
        })
    }

    async fn update(&self, tx: &mut PgTx, update: NoteUpdate) -> Result<Note> {
        let query = format!(
            r#"
            UPDATE notes
            SET title = COALESCE($2, title), updated_at = $3
            WHERE id = $1
            RETURNING {}
            "#,
            NOTE_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(update.id)
            .bind(&update.title)
            .bind(Utc::now())
            .fetch_optional(&mut **tx)
            .await
            .map_err(Error::from)?
            .ok_or_else(|| Error::NotFound(format!("Note {} not found", update.id)))?;

        note_from_row(&row)
    }

    async fn update_status(&self, tx: &mut PgTx, id: Uuid, status: NoteStatus) -> Result<Note> {
        let query = format!(
            "UPDATE notes SET status = $2, updated_at = $3 WHERE id = $1 RETURNING {}",
            NOTE_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(id)
            .bind(status.as_str())
            .bind(Utc::now())
            .fetch_optional(&mut **tx)
            .await
            .map_err(Error::from)?
            .ok_or_else(|| Error::NotFound(format!("Note {} not found", id)))?;

        note_from_row(&row)
    }

    async fn delete(&self, tx: &mut PgTx, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(Error::from)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Note {} not found", id)));
        }
        Ok(())
    }

    async fn replace_sections(
        &self,
        tx: &mut PgTx,
        note_id: Uuid,
        sections: Vec<SectionUpdate>,
    ) -> Result<()> {
        if !self.exists(tx, note_id).await? {
            return Err(Error::NotFound(format!("Note {} not found", note_id)));
        }

        for section in sections {
            let result = sqlx::query(
                "UPDATE sections SET content = $1 WHERE id = $2 AND note_id = $3",
            )
            .bind(&section.content)
            .bind(section.id)
            .bind(note_id)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;

            if result.rows_affected() == 0 {
                return Err(Error::constraint(
                    ConstraintKind::Membership,
                    format!("section {} does not belong to note {}", section.id, note_id),
                ));
            }
        }
        Ok(())
    }

    async fn list(&self, tx: &mut PgTx, filters: NoteFilters) -> Result<Vec<NoteSummary>> {
        let mut query = format!("{} WHERE TRUE", NOTE_SUMMARY_SELECT);
        let mut param_idx = 1;

        if filters.status.is_some() {
            query.push_str(&format!(" AND n.status = ${}", param_idx));
            param_idx += 1;
        }
        if filters.owner_id.is_some() {
            query.push_str(&format!(" AND n.owner_id = ${}", param_idx));
            param_idx += 1;
        }
        if filters.template_id.is_some() {
            query.push_str(&format!(" AND n.template_id = ${}", param_idx));
            param_idx += 1;
        }
        if filters.query.is_some() {
            query.push_str(&format!(" AND n.title ILIKE ${} ESCAPE '\\'", param_idx));
        }
        query.push_str(" ORDER BY n.created_at DESC, n.id DESC");

        let mut q = sqlx::query(&query);
        if let Some(status) = filters.status {
            q = q.bind(status.as_str());
        }
        if let Some(owner_id) = filters.owner_id {
            q = q.bind(owner_id);
        }
        if let Some(template_id) = filters.template_id {
            q = q.bind(template_id);
        }
        if let Some(text) = &filters.query {
            q = q.bind(format!("%{}%", escape_like(text)));
        }

        let rows = q.fetch_all(&mut **tx).await.map_err(Error::Database)?;
        rows.iter().map(summary_from_row).collect()
    }
}
