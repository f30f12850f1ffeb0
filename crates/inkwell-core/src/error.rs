//! Error types for inkwell.

use std::fmt;

use thiserror::Error;

/// Result type alias using inkwell's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Which storage rule a write broke.
///
/// Kept separate from generic database failures so the transport layer can
/// answer 400/409 instead of 500.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    /// A referenced row (owner, template, note) does not exist.
    ForeignKey,
    /// A unique key (email, provider identity, field order, section field) clashed.
    Unique,
    /// A check or not-null rule rejected the value (e.g. note status).
    Check,
    /// The row is still referenced by children and cannot be removed.
    InUse,
    /// A child id or field does not belong to the aggregate it was sent for.
    Membership,
}

impl ConstraintKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintKind::ForeignKey => "foreign_key",
            ConstraintKind::Unique => "unique",
            ConstraintKind::Check => "check",
            ConstraintKind::InUse => "in_use",
            ConstraintKind::Membership => "membership",
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Core error type for inkwell operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed and was not a recognised constraint violation
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// A storage constraint rejected the write
    #[error("Constraint violation ({kind}): {message}")]
    ConstraintViolation {
        kind: ConstraintKind,
        message: String,
    },

    /// Invalid input, rejected before any storage access
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Forbidden (caller is not the owner of the resource)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Shorthand for a [`Error::ConstraintViolation`].
    pub fn constraint(kind: ConstraintKind, message: impl Into<String>) -> Self {
        Error::ConstraintViolation {
            kind,
            message: message.into(),
        }
    }

    /// The constraint kind, if this is a constraint violation.
    pub fn constraint_kind(&self) -> Option<ConstraintKind> {
        match self {
            Error::ConstraintViolation { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        use sqlx::error::ErrorKind;

        if let sqlx::Error::Database(db_err) = &err {
            let kind = match db_err.kind() {
                ErrorKind::UniqueViolation => Some(ConstraintKind::Unique),
                ErrorKind::ForeignKeyViolation => Some(ConstraintKind::ForeignKey),
                ErrorKind::CheckViolation | ErrorKind::NotNullViolation => {
                    Some(ConstraintKind::Check)
                }
                _ => None,
            };
            if let Some(kind) = kind {
                let message = match db_err.constraint() {
                    Some(name) => format!("{} [{}]", db_err.message(), name),
                    None => db_err.message().to_string(),
                };
                return Error::ConstraintViolation { kind, message };
            }
        }
        Error::Database(err)
    }
}
