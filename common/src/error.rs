use thiserror::Error;
use tokio::task::JoinError;

// Core internal errors. Callers branch on the kind, the HTTP boundary maps
// each kind to a status code.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] surrealdb::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Text extraction error: {0}")]
    Extraction(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Upstream service error: {0}")]
    Upstream(String),
    #[error("Task join error: {0}")]
    Join(#[from] JoinError),
    #[error("IoError: {0}")]
    Io(#[from] std::io::Error),
    #[error("Internal service error: {0}")]
    Internal(String),
}
