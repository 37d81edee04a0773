use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during local store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sea-orm.
    #[error("database error: {0}")]
    Database(#[from] DbErr),

    /// Row not found.
    #[error("not found: {context}")]
    NotFound { context: String },

    /// Invalid input data.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

impl StoreError {
    /// Create a NotFound error for a UUID lookup.
    pub fn not_found_by_id(entity: &str, id: Uuid) -> Self {
        Self::NotFound {
            context: format!("{entity} id={id}"),
        }
    }

    /// Create a NotFound error for a natural key lookup.
    pub fn not_found_by_key(entity: &str, key: impl std::fmt::Display) -> Self {
        Self::NotFound {
            context: format!("{entity} {key}"),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
