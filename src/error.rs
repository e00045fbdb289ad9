use thiserror::Error;

use crate::models::{DocumentType, Status};

/// Result type used by the workflow core and the stores.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The requested status cannot be reached from the current one.
    #[error(
        "status `{to}` cannot be assigned to {kind} in status `{}`",
        from.map(|s| s.as_str()).unwrap_or("none")
    )]
    InvalidTransition {
        kind: DocumentType,
        from: Option<Status>,
        to: Status,
    },

    #[error("unknown status code `{0}`")]
    UnknownStatus(String),

    #[error("unknown document kind `{0}`")]
    UnknownKind(String),

    #[error("unknown payment mode `{0}`")]
    InvalidPaymentMode(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i32 },

    #[error("document {id} is {actual}, expected {expected}")]
    WrongKind {
        id: i32,
        expected: DocumentType,
        actual: DocumentType,
    },

    #[error("{entity} {id} cannot be deleted")]
    NotDeletable { entity: &'static str, id: i32 },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("amount {0} cannot be negated")]
    AmountOverflow(i64),

    /// Persistence failures are passed through untouched.
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl Error {
    pub fn not_found(entity: &'static str, id: i32) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
