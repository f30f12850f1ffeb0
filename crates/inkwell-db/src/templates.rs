//! Template repository implementation.
//!
//! A template and its fields form one aggregate. Fields are only ever
//! replaced wholesale, and `is_used` is derived with an `EXISTS` subquery
//! against `notes` at read time.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use inkwell_core::{
    new_v7, ConstraintKind, Error, Field, NewField, NewTemplate, OwnerSummary, Result, Template,
    TemplateFilters, TemplateRepository, TemplateUpdate, TemplateView,
};

use crate::{escape_like, PgTx};

const TEMPLATE_VIEW_SELECT: &str = r#"
    SELECT t.id, t.name, t.owner_id, t.created_at, t.updated_at,
           a.first_name AS owner_first_name,
           a.last_name AS owner_last_name,
           a.thumbnail AS owner_thumbnail,
           EXISTS (SELECT 1 FROM notes n WHERE n.template_id = t.id) AS is_used
    FROM templates t
    JOIN accounts a ON a.id = t.owner_id
"#;

/// PostgreSQL implementation of TemplateRepository.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgTemplateRepository;

impl PgTemplateRepository {
    pub fn new() -> Self {
        Self
    }

    /// Fields of every listed template, ordered by `order`, in one query.
    async fn fields_for(
        &self,
        tx: &mut PgTx,
        template_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<Field>>> {
        let rows = sqlx::query(
            r#"
            SELECT id, template_id, label, "order", is_required
            FROM fields
            WHERE template_id = ANY($1)
            ORDER BY template_id, "order"
            "#,
        )
        .bind(template_ids)
        .fetch_all(&mut **tx)
        .await
        .map_err(Error::Database)?;

        let mut by_template: HashMap<Uuid, Vec<Field>> = HashMap::new();
        for r in rows {
            let field = Field {
                id: r.get("id"),
                template_id: r.get("template_id"),
                label: r.get("label"),
                order: r.get("order"),
                is_required: r.get("is_required"),
            };
            by_template.entry(field.template_id).or_default().push(field);
        }
        Ok(by_template)
    }
}

fn view_from_row(r: &PgRow, fields: Vec<Field>) -> TemplateView {
    let owner_id: Uuid = r.get("owner_id");
    TemplateView {
        template: Template {
            id: r.get("id"),
            name: r.get("name"),
            owner_id,
            fields,
            created_at: r.get("created_at"),
            updated_at: r.get("updated_at"),
        },
        owner: OwnerSummary {
            id: owner_id,
            first_name: r.get("owner_first_name"),
            last_name: r.get("owner_last_name"),
            thumbnail: r.get("owner_thumbnail"),
        },
        is_used: r.get("is_used"),
    }
}

/// A foreign-key failure while deleting template rows means something still
/// points at them.
fn in_use(err: sqlx::Error, what: String) -> Error {
    match Error::from(err) {
        Error::ConstraintViolation {
            kind: ConstraintKind::ForeignKey,
            ..
        } => Error::constraint(ConstraintKind::InUse, what),
        other => other,
    }
}

#[async_trait]
impl TemplateRepository for PgTemplateRepository {
    type Tx = PgTx;

    async fn create(&self, tx: &mut PgTx, template: NewTemplate) -> Result<Template> {
        let id = new_v7();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO templates (id, name, owner_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            "#,
        )
        .bind(id)
        .bind(&template.name)
        .bind(template.owner_id)
        .bind(now)
        .execute(&mut **tx)
        .await
        .map_err(Error::from)?;

        Ok(Template {
            id,
            name: template.name,
            owner_id: template.owner_id,
            fields: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    async fn get(&self, tx: &mut PgTx, id: Uuid) -> Result<TemplateView> {
        let query = format!("{} WHERE t.id = $1", TEMPLATE_VIEW_SELECT);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(Error::Database)?
            .ok_or_else(|| Error::NotFound(format!("Template {} not found", id)))?;

        let mut fields = self.fields_for(tx, &[id]).await?;
        Ok(view_from_row(&row, fields.remove(&id).unwrap_or_default()))
    }

    async fn update(&self, tx: &mut PgTx, update: TemplateUpdate) -> Result<Template> {
        let row = sqlx::query(
            r#"
            UPDATE templates
            SET name = COALESCE($2, name), updated_at = $3
            WHERE id = $1
            RETURNING id, name, owner_id, created_at, updated_at
            "#,
        )
        .bind(update.id)
        .bind(&update.name)
        .bind(Utc::now())
        .fetch_optional(&mut **tx)
        .await
        .map_err(Error::from)?
        .ok_or_else(|| Error::NotFound(format!("Template {} not found", update.id)))?;

        let mut fields = self.fields_for(tx, &[update.id]).await?;
        Ok(Template {
            id: row.get("id"),
            name: row.get("name"),
            owner_id: row.get("owner_id"),
            fields: fields.remove(&update.id).unwrap_or_default(),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    async fn delete(&self, tx: &mut PgTx, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM templates WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(|e| in_use(e, format!("template {} is referenced by notes", id)))?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Template {} not found", id)));
        }
        Ok(())
    }

    async fn replace_fields(
        &self,
        tx: &mut PgTx,
        template_id: Uuid,
        fields: Vec<NewField>,
    ) -> Result<()> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM templates WHERE id = $1)")
            .bind(template_id)
            .fetch_one(&mut **tx)
            .await
            .map_err(Error::Database)?;
        if !exists {
            return Err(Error::constraint(
                ConstraintKind::ForeignKey,
                format!("template {} does not exist", template_id),
            ));
        }

        sqlx::query("DELETE FROM fields WHERE template_id = $1")
            .bind(template_id)
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                in_use(
                    e,
                    format!("fields of template {} are referenced by sections", template_id),
                )
            })?;

        for field in &fields {
            sqlx::query(
                r#"
                INSERT INTO fields (id, template_id, label, "order", is_required)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(new_v7())
            .bind(template_id)
            .bind(&field.label)
            .bind(field.order)
            .bind(field.is_required)
            .execute(&mut **tx)
            .await
            .map_err(Error::from)?;
        }

        Ok(())
    }

    async fn list(&self, tx: &mut PgTx, filters: TemplateFilters) -> Result<Vec<TemplateView>> {
        let mut query = format!("{} WHERE TRUE", TEMPLATE_VIEW_SELECT);
        let mut param_idx = 1;

        if filters.owner_id.is_some() {
            query.push_str(&format!(" AND t.owner_id = ${}", param_idx));
            param_idx += 1;
        }
        if filters.query.is_some() {
            query.push_str(&format!(" AND t.name ILIKE ${} ESCAPE '\\'", param_idx));
        }
        query.push_str(" ORDER BY t.created_at DESC, t.id DESC");

        let mut q = sqlx::query(&query);
        if let Some(owner_id) = filters.owner_id {
            q = q.bind(owner_id);
        }
        if let Some(text) = &filters.query {
            q = q.bind(format!("%{}%", escape_like(text)));
        }
        let rows = q.fetch_all(&mut **tx).await.map_err(Error::Database)?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.get("id")).collect();
        let mut fields = self.fields_for(tx, &ids).await?;

        Ok(rows
            .iter()
            .map(|r| {
                let id: Uuid = r.get("id");
                view_from_row(r, fields.remove(&id).unwrap_or_default())
            })
            .collect())
    }
}
