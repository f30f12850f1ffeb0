//! HTTP handlers for inkwell-api.

pub mod accounts;
pub mod notes;
pub mod templates;

use axum::extract::rejection::PathRejection;
use axum::extract::Path;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::ApiError;

/// `?ownerId=` carried by every mutating request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerQuery {
    pub owner_id: Option<Uuid>,
}

/// Unwrap a `:id` path segment, answering 400 with a JSON body when it is
/// not a UUID.
pub(crate) fn path_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, ApiError> {
    let Path(id) = path?;
    Ok(id)
}

/// Treat `?q=` and friends as absent.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Body returned by DELETE endpoints.
pub(crate) fn deleted(id: Uuid) -> Json<serde_json::Value> {
    Json(json!({ "id": id }))
}

/// Health check endpoint.
pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
