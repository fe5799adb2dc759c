//! Error types for Files Manager.

use thiserror::Error;

/// Why a parent reference was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidParent {
    /// No file with the given id exists.
    NotFound,
    /// The referenced file is not a folder.
    NotAFolder,
}

impl std::fmt::Display for InvalidParent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidParent::NotFound => write!(f, "Parent not found"),
            InvalidParent::NotAFolder => write!(f, "Parent is not a folder"),
        }
    }
}

/// Common error type for Files Manager.
#[derive(Error, Debug)]
pub enum FilesError {
    /// Missing, invalid or expired credentials or session token.
    #[error("unauthorized")]
    Unauthorized,

    /// Resource not found.
    ///
    /// Also used when the caller may not see the resource, so that
    /// existence is never leaked.
    #[error("{0} not found")]
    NotFound(String),

    /// Malformed file hierarchy reference.
    #[error("{0}")]
    InvalidParent(InvalidParent),

    /// Validation error for user input.
    #[error("{0}")]
    Validation(String),

    /// A document with the same value in a unique field already exists.
    #[error("duplicate {0}")]
    Duplicate(String),

    /// A backing store could not be reached.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// Database error.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for FilesError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                FilesError::Unavailable(e.to_string())
            }
            other => FilesError::Database(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for FilesError {
    fn from(e: serde_json::Error) -> Self {
        FilesError::Database(format!("malformed document: {e}"))
    }
}

/// Result type alias for Files Manager operations.
pub type Result<T> = std::result::Result<T, FilesError>;
