/// Storage-specific errors
use thiserror::Error;

/// Result type alias using `StorageError`
pub type Result<T> = std::result::Result<T, StorageError>;

/// Storage error types
#[derive(Error, Debug)]
pub enum StorageError {
    /// Embedded database error
    #[error("Database error: {0}")]
    Database(#[from] redb::Error),

    /// Serialization/deserialization error
    #[error("Serialization error for key {key}: {message}")]
    Serialization { key: String, message: String },

    /// Backend refused the write (poisoned lock, read-only store, ...)
    #[error("Write rejected for key {key}: {reason}")]
    WriteRejected { key: String, reason: String },

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Create a serialization error for a key
    pub fn serialization(key: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Serialization {
            key: key.into(),
            message: err.to_string(),
        }
    }

    /// Create a rejected write error
    pub fn write_rejected(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::WriteRejected {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

impl From<redb::DatabaseError> for StorageError {
    fn from(err: redb::DatabaseError) -> Self {
        Self::Database(err.into())
    }
}

impl From<redb::TransactionError> for StorageError {
    fn from(err: redb::TransactionError) -> Self {
        Self::Database(err.into())
    }
}

impl From<redb::TableError> for StorageError {
    fn from(err: redb::TableError) -> Self {
        Self::Database(err.into())
    }
}

impl From<redb::StorageError> for StorageError {
    fn from(err: redb::StorageError) -> Self {
        Self::Database(err.into())
    }
}

impl From<redb::CommitError> for StorageError {
    fn from(err: redb::CommitError) -> Self {
        Self::Database(err.into())
    }
}
