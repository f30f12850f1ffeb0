//! Template HTTP handlers.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use inkwell_core::{Storage, TemplateFilters, TemplateView};

use super::{deleted, non_blank, path_id, OwnerQuery};
use crate::services::{CreateTemplateInput, UpdateTemplateInput};
use crate::{ApiError, AppState};

/// Query parameters for listing templates.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTemplatesQuery {
    pub owner_id: Option<Uuid>,
    /// Case-insensitive substring of the name
    pub q: Option<String>,
}

/// Create a template with its fields.
///
/// # Returns
/// - 200 OK with the template view
/// - 400 Bad Request if the body is malformed, `ownerId` is missing, a field
///   is invalid or the owner does not exist
/// - 409 Conflict if two fields share an order
pub async fn create_template<S: Storage + Clone + 'static>(
    State(state): State<AppState<S>>,
    body: Result<Json<CreateTemplateInput>, JsonRejection>,
) -> Result<Json<TemplateView>, ApiError> {
    let Json(input) = body?;
    let view = state.templates.create(input).await?;
    Ok(Json(view))
}

/// Get a template with fields, owner and usage flag.
///
/// # Returns
/// - 200 OK with the template view
/// - 404 Not Found if the template does not exist
pub async fn get_template<S: Storage + Clone + 'static>(
    State(state): State<AppState<S>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<TemplateView>, ApiError> {
    let id = path_id(path)?;
    let view = state.templates.get(id).await?;
    Ok(Json(view))
}

/// List templates, newest first.
///
/// # Query Parameters
/// - `ownerId`: only templates of this account (optional)
/// - `q`: name substring (optional)
pub async fn list_templates<S: Storage + Clone + 'static>(
    State(state): State<AppState<S>>,
    query: Result<Query<ListTemplatesQuery>, QueryRejection>,
) -> Result<Json<Vec<TemplateView>>, ApiError> {
    let Query(query) = query?;
    let templates = state
        .templates
        .list(TemplateFilters {
            owner_id: query.owner_id,
            query: non_blank(query.q),
        })
        .await?;
    Ok(Json(templates))
}

/// Rename a template and/or replace its fields.
///
/// # Returns
/// - 200 OK with the updated template view
/// - 400 Bad Request if `ownerId` is missing or the body is invalid
/// - 403 Forbidden if the caller does not own the template
/// - 404 Not Found if the template does not exist
/// - 409 Conflict if notes still use a replaced field
pub async fn update_template<S: Storage + Clone + 'static>(
    State(state): State<AppState<S>>,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<OwnerQuery>, QueryRejection>,
    body: Result<Json<UpdateTemplateInput>, JsonRejection>,
) -> Result<Json<TemplateView>, ApiError> {
    let id = path_id(path)?;
    let Query(query) = query?;
    let Json(input) = body?;
    let view = state.templates.update(id, query.owner_id, input).await?;
    Ok(Json(view))
}

/// Delete a template.
///
/// # Returns
/// - 200 OK with `{"id": ...}`
/// - 403 Forbidden if the caller does not own the template
/// - 404 Not Found if the template does not exist
/// - 409 Conflict if any note references the template
pub async fn delete_template<S: Storage + Clone + 'static>(
    State(state): State<AppState<S>>,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<OwnerQuery>, QueryRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = path_id(path)?;
    let Query(query) = query?;
    state.templates.delete(id, query.owner_id).await?;
    Ok(deleted(id))
}
