//! Error types for the TodoMVC harness

use thiserror::Error;

/// Result type alias using the common Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the data model and persisted storage
#[derive(Error, Debug)]
pub enum Error {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Todo not found: {id}")]
    NotFound { id: String },

    #[error("Invalid title: {0}")]
    InvalidTitle(String),
}
