use thiserror::Error;

/// Storage-specific error types for the guest list store.
///
/// These errors represent failures in database operations and in the
/// roster administration checks performed before writing.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database connection or query execution failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration execution failed
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Entity not found in database
    #[error("Entity not found: {entity_type} with {field}={value}")]
    NotFound {
        entity_type: String,
        field: String,
        value: String,
    },

    /// Input rejected before reaching the database
    #[error("Validation error: {0}")]
    Validation(String),

    /// Record would duplicate an existing one (e.g. same CI in one event)
    #[error("Duplicate: {0}")]
    Duplicate(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StorageError {
    pub(crate) fn not_found(entity_type: &str, field: &str, value: impl ToString) -> Self {
        Self::NotFound {
            entity_type: entity_type.to_string(),
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

/// Errors coming back from the store are remote failures from the terminal's
/// point of view, except for the few that carry a precise meaning.
impl From<StorageError> for guestgate_core::Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { .. } => guestgate_core::Error::not_found(err.to_string()),
            StorageError::Validation(message) => guestgate_core::Error::validation(message),
            other => guestgate_core::Error::remote(other.to_string()),
        }
    }
}

impl From<guestgate_core::Error> for StorageError {
    fn from(err: guestgate_core::Error) -> Self {
        match err {
            guestgate_core::Error::Validation { message } => StorageError::Validation(message),
            other => StorageError::Internal(other.to_string()),
        }
    }
}

/// Specialized result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
