//! Catalog error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A required field is missing or blank.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A field is present but not of the expected type.
    #[error("invalid value: {0}")]
    Type(String),

    /// Product does not exist.
    #[error("product not found")]
    NotFound,

    /// The session lacks the required role.
    #[error("admin access required")]
    Forbidden,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
