//! Note HTTP handlers.
//!
//! Mutations take the caller's account id as `?ownerId=`.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use inkwell_core::{NoteFilters, NoteStatus, NoteSummary, NoteView, Storage};

use super::{deleted, non_blank, path_id, OwnerQuery};
use crate::services::{CreateNoteInput, UpdateNoteInput};
use crate::{ApiError, AppState};

/// Query parameters for listing notes. All filters combine with AND.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotesQuery {
    /// `Draft` or `Publish`
    pub status: Option<String>,
    pub owner_id: Option<Uuid>,
    pub template_id: Option<Uuid>,
    /// Case-insensitive substring of the title
    pub q: Option<String>,
}

impl ListNotesQuery {
    fn into_filters(self) -> Result<NoteFilters, ApiError> {
        let status = match non_blank(self.status) {
            Some(raw) => Some(raw.parse::<NoteStatus>().map_err(|_| {
                ApiError::BadRequest(format!(
                    "invalid status filter '{}' (expected Draft or Publish)",
                    raw
                ))
            })?),
            None => None,
        };
        Ok(NoteFilters {
            status,
            owner_id: self.owner_id,
            template_id: self.template_id,
            query: non_blank(self.q),
        })
    }
}

/// Create a note with sections for some of its template's fields.
///
/// # Returns
/// - 200 OK with the note view
/// - 400 Bad Request if the body is malformed, `ownerId` is missing, the
///   status is unknown, the template or owner does not exist, or a section
///   names a field outside the template
/// - 409 Conflict if two sections name the same field
pub async fn create_note<S: Storage + Clone + 'static>(
    State(state): State<AppState<S>>,
    body: Result<Json<CreateNoteInput>, JsonRejection>,
) -> Result<Json<NoteView>, ApiError> {
    let Json(input) = body?;
    let view = state.notes.create(input).await?;
    Ok(Json(view))
}

/// Get a note with its sections in field order.
///
/// # Returns
/// - 200 OK with the note view
/// - 404 Not Found if the note does not exist
pub async fn get_note<S: Storage + Clone + 'static>(
    State(state): State<AppState<S>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<NoteView>, ApiError> {
    let id = path_id(path)?;
    let view = state.notes.get(id).await?;
    Ok(Json(view))
}

/// List notes, newest first. Section bodies are not included.
///
/// # Query Parameters
/// - `status`: `Draft` or `Publish` (optional)
/// - `ownerId`, `templateId`: exact match (optional)
/// - `q`: title substring (optional)
///
/// # Returns
/// - 200 OK with note summaries
/// - 400 Bad Request if a filter cannot be parsed
pub async fn list_notes<S: Storage + Clone + 'static>(
    State(state): State<AppState<S>>,
    query: Result<Query<ListNotesQuery>, QueryRejection>,
) -> Result<Json<Vec<NoteSummary>>, ApiError> {
    let Query(query) = query?;
    let notes = state.notes.list(query.into_filters()?).await?;
    Ok(Json(notes))
}

/// Update a note's title and section contents.
///
/// # Returns
/// - 200 OK with the updated note view
/// - 400 Bad Request if `ownerId` is missing or a section id is not part of the note
/// - 403 Forbidden if the caller does not own the note
/// - 404 Not Found if the note does not exist
pub async fn update_note<S: Storage + Clone + 'static>(
    State(state): State<AppState<S>>,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<OwnerQuery>, QueryRejection>,
    body: Result<Json<UpdateNoteInput>, JsonRejection>,
) -> Result<Json<NoteView>, ApiError> {
    let id = path_id(path)?;
    let Query(query) = query?;
    let Json(input) = body?;
    let view = state.notes.update(id, query.owner_id, input).await?;
    Ok(Json(view))
}

/// Delete a note and its sections.
///
/// # Returns
/// - 200 OK with `{"id": ...}`
/// - 403 Forbidden if the caller does not own the note
/// - 404 Not Found if the note does not exist
pub async fn delete_note<S: Storage + Clone + 'static>(
    State(state): State<AppState<S>>,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<OwnerQuery>, QueryRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = path_id(path)?;
    let Query(query) = query?;
    state.notes.delete(id, query.owner_id).await?;
    Ok(deleted(id))
}

/// Mark a note as published.
pub async fn publish_note<S: Storage + Clone + 'static>(
    State(state): State<AppState<S>>,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<OwnerQuery>, QueryRejection>,
) -> Result<Json<NoteView>, ApiError> {
    let id = path_id(path)?;
    let Query(query) = query?;
    let view = state.notes.publish(id, query.owner_id).await?;
    Ok(Json(view))
}

/// Return a note to draft.
pub async fn unpublish_note<S: Storage + Clone + 'static>(
    State(state): State<AppState<S>>,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<OwnerQuery>, QueryRejection>,
) -> Result<Json<NoteView>, ApiError> {
    let id = path_id(path)?;
    let Query(query) = query?;
    let view = state.notes.unpublish(id, query.owner_id).await?;
    Ok(Json(view))
}
