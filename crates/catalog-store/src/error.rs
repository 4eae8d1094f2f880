//! Storage errors

use catalog_model::ModelError;

/// Errors raised by a catalog store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// SQLite failure
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Attribute encoding failure
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored value could not be converted to a domain value
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// Write targeted a row that does not exist
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// Row violates the storage contract
    #[error("corrupt row in {table}: {message}")]
    Corrupt { table: &'static str, message: String },

    /// Store refused the operation
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Create not-found error for an entity key
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Create corrupt-row error
    pub fn corrupt(table: &'static str, message: impl Into<String>) -> Self {
        Self::Corrupt {
            table,
            message: message.into(),
        }
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
