//! Use-case layer.
//!
//! Each service method validates its input, opens one transaction, runs
//! every store call inside it and then commits on success or rolls back on
//! failure. Storage errors are returned unchanged.

pub mod accounts;
pub mod notes;
pub mod templates;

pub use accounts::AccountService;
pub use notes::{CreateNoteInput, NoteService, UpdateNoteInput};
pub use templates::{CreateTemplateInput, TemplateService, UpdateTemplateInput};

use tracing::warn;
use uuid::Uuid;

use inkwell_core::{Error, NewField, Result, TransactionManager};

/// Commit `tx` if `result` is Ok, roll it back otherwise.
pub(crate) async fn finish<M, T>(manager: &M, tx: M::Tx, result: Result<T>) -> Result<T>
where
    M: TransactionManager + ?Sized,
{
    match result {
        Ok(value) => {
            manager.commit(tx).await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = manager.rollback(tx).await {
                warn!(
                    subsystem = "api",
                    op = "rollback",
                    error = %rollback_err,
                    cause = %err,
                    "Transaction rollback failed"
                );
            }
            Err(err)
        }
    }
}

/// Mutations carry the caller's account id; without it nothing is touched.
pub(crate) fn require_owner(owner_id: Option<Uuid>) -> Result<Uuid> {
    owner_id.ok_or_else(|| Error::InvalidInput("ownerId is required".to_string()))
}

pub(crate) fn require_text(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidInput(format!("{} must not be blank", name)));
    }
    Ok(())
}

/// Reject callers other than the stored owner.
pub(crate) fn authorize(kind: &str, id: Uuid, stored_owner: Uuid, caller: Uuid) -> Result<()> {
    if stored_owner != caller {
        return Err(Error::Forbidden(format!(
            "{} {} is owned by another account",
            kind, id
        )));
    }
    Ok(())
}

pub(crate) fn validate_fields(fields: &[NewField]) -> Result<()> {
    for field in fields {
        require_text("field label", &field.label)?;
        if field.order < 1 {
            return Err(Error::InvalidInput(format!(
                "field order must be at least 1 (got {} for '{}')",
                field.order, field.label
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_owner_missing_is_invalid_input() {
        let err = require_owner(None).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_require_text_rejects_whitespace() {
        assert!(require_text("title", "  \t").is_err());
        assert!(require_text("title", "ok").is_ok());
    }

    #[test]
    fn test_authorize_mismatch_is_forbidden() {
        let owner = Uuid::now_v7();
        let other = Uuid::now_v7();
        assert!(authorize("note", Uuid::now_v7(), owner, owner).is_ok());
        let err = authorize("note", Uuid::now_v7(), owner, other).unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));
    }

    #[test]
    fn test_validate_fields_rejects_zero_order() {
        let fields = vec![NewField {
            label: "Background".to_string(),
            order: 0,
            is_required: false,
        }];
        assert!(matches!(
            validate_fields(&fields),
            Err(Error::InvalidInput(_))
        ));
    }
}
