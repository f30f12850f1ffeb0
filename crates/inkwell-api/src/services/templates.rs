//! Template use cases.

use std::time::Instant;

use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use inkwell_core::{
    NewField, NewTemplate, Result, Storage, TemplateFilters, TemplateRepository, TemplateUpdate,
    TemplateView,
};

use super::{authorize, finish, require_owner, require_text, validate_fields};

/// Body of `POST /api/templates`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTemplateInput {
    pub name: String,
    #[serde(default)]
    pub owner_id: Option<Uuid>,
    #[serde(default)]
    pub fields: Vec<NewField>,
}

/// Body of `PUT /api/templates/:id`.
///
/// `fields`, when present, replaces the whole field set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTemplateInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub fields: Option<Vec<NewField>>,
}

#[derive(Clone)]
pub struct TemplateService<S> {
    storage: S,
}

impl<S: Storage> TemplateService<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Create a template and its fields in one transaction.
    pub async fn create(&self, input: CreateTemplateInput) -> Result<TemplateView> {
        let start = Instant::now();
        let owner_id = require_owner(input.owner_id)?;
        require_text("name", &input.name)?;
        validate_fields(&input.fields)?;

        let mut tx = self.storage.begin().await?;
        let result = self.create_in(&mut tx, owner_id, input).await;
        let view = finish(&self.storage, tx, result).await?;

        info!(
            subsystem = "api",
            component = "templates",
            op = "create",
            template_id = %view.template.id,
            owner_id = %owner_id,
            field_count = view.template.fields.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Template created"
        );
        Ok(view)
    }

    async fn create_in(
        &self,
        tx: &mut S::Tx,
        owner_id: Uuid,
        input: CreateTemplateInput,
    ) -> Result<TemplateView> {
        let templates = self.storage.templates();
        let template = templates
            .create(
                tx,
                NewTemplate {
                    name: input.name,
                    owner_id,
                },
            )
            .await?;
        if !input.fields.is_empty() {
            templates
                .replace_fields(tx, template.id, input.fields)
                .await?;
        }
        templates.get(tx, template.id).await
    }

    pub async fn get(&self, id: Uuid) -> Result<TemplateView> {
        let mut tx = self.storage.begin().await?;
        let result = self.storage.templates().get(&mut tx, id).await;
        finish(&self.storage, tx, result).await
    }

    pub async fn list(&self, filters: TemplateFilters) -> Result<Vec<TemplateView>> {
        let start = Instant::now();
        let mut tx = self.storage.begin().await?;
        let result = self.storage.templates().list(&mut tx, filters).await;
        let templates = finish(&self.storage, tx, result).await?;

        debug!(
            subsystem = "api",
            component = "templates",
            op = "list",
            result_count = templates.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Templates listed"
        );
        Ok(templates)
    }

    /// Rename a template and optionally replace its fields.
    pub async fn update(
        &self,
        id: Uuid,
        owner_id: Option<Uuid>,
        input: UpdateTemplateInput,
    ) -> Result<TemplateView> {
        let caller = require_owner(owner_id)?;
        if let Some(name) = &input.name {
            require_text("name", name)?;
        }
        if let Some(fields) = &input.fields {
            validate_fields(fields)?;
        }

        let mut tx = self.storage.begin().await?;
        let result = self.update_in(&mut tx, id, caller, input).await;
        let view = finish(&self.storage, tx, result).await?;

        info!(
            subsystem = "api",
            component = "templates",
            op = "update",
            template_id = %id,
            "Template updated"
        );
        Ok(view)
    }

    async fn update_in(
        &self,
        tx: &mut S::Tx,
        id: Uuid,
        caller: Uuid,
        input: UpdateTemplateInput,
    ) -> Result<TemplateView> {
        let templates = self.storage.templates();
        let current = templates.get(tx, id).await?;
        authorize("template", id, current.template.owner_id, caller)?;

        if input.name.is_some() {
            templates
                .update(
                    tx,
                    TemplateUpdate {
                        id,
                        name: input.name,
                    },
                )
                .await?;
        }
        if let Some(fields) = input.fields {
            templates.replace_fields(tx, id, fields).await?;
        }
        templates.get(tx, id).await
    }

    /// Delete a template the caller owns. Fails with `InUse` while notes reference it.
    pub async fn delete(&self, id: Uuid, owner_id: Option<Uuid>) -> Result<()> {
        let caller = require_owner(owner_id)?;

        let mut tx = self.storage.begin().await?;
        let result = self.delete_in(&mut tx, id, caller).await;
        finish(&self.storage, tx, result).await?;

        info!(
            subsystem = "api",
            component = "templates",
            op = "delete",
            template_id = %id,
            "Template deleted"
        );
        Ok(())
    }

    async fn delete_in(&self, tx: &mut S::Tx, id: Uuid, caller: Uuid) -> Result<()> {
        let templates = self.storage.templates();
        let current = templates.get(tx, id).await?;
        authorize("template", id, current.template.owner_id, caller)?;
        templates.delete(tx, id).await
    }
}
