//! Account HTTP handlers.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};
use uuid::Uuid;

use inkwell_core::{Account, OAuthAccountInput, Storage};

use super::path_id;
use crate::{ApiError, AppState};

/// Record an OAuth sign-in, creating the account on first use.
///
/// # Returns
/// - 200 OK with the account
/// - 400 Bad Request if the profile is incomplete
/// - 409 Conflict if the email belongs to another provider identity
pub async fn sign_in<S: Storage + Clone + 'static>(
    State(state): State<AppState<S>>,
    body: Result<Json<OAuthAccountInput>, JsonRejection>,
) -> Result<Json<Account>, ApiError> {
    let Json(input) = body?;
    let account = state.accounts.sign_in(input).await?;
    Ok(Json(account))
}

/// Get an account by id.
pub async fn get_account<S: Storage + Clone + 'static>(
    State(state): State<AppState<S>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Account>, ApiError> {
    let id = path_id(path)?;
    let account = state.accounts.get(id).await?;
    Ok(Json(account))
}
