//! Error types for the catalog core
//!
//! Validation failures and not-found results are not errors: the service
//! returns `false`/`None` for those. Errors are reserved for:
//! - Hierarchy integrity violations
//! - Storage faults (the transaction is rolled back)
//! - Configuration problems

use catalog_store::StoreError;

/// Program hierarchy integrity violation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HierarchyError {
    /// More than one program sits at the minimal path depth
    #[error("{count} programs at minimal path depth, expected a single root: {}", candidates.join(", "))]
    MultipleRoots {
        /// Number of root candidates
        count: usize,
        /// `name (path)` of every candidate
        candidates: Vec<String>,
    },
}

/// Main catalog error type
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Storage fault
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Hierarchy integrity violation
    #[error("hierarchy error: {0}")]
    Hierarchy(#[from] HierarchyError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Background task failed
    #[error("internal error: {0}")]
    Internal(String),
}

impl CatalogError {
    /// Check if error is an integrity violation of stored data
    #[inline]
    #[must_use]
    pub fn is_integrity(&self) -> bool {
        matches!(self, Self::Hierarchy(_))
    }
}

impl From<tokio::task::JoinError> for CatalogError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Result type alias for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;
