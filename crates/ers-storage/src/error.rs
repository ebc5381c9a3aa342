// Allow unused assignments for diagnostic fields - they're used by the macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Storage error type
#[derive(Error, Debug, Diagnostic)]
pub enum StorageError {
    /// Key not found
    #[error("Key not found: {key}")]
    #[diagnostic(
        code(storage::key_not_found),
        help("Verify the object exists in the store")
    )]
    KeyNotFound { key: String },

    /// Key already exists
    #[error("Key already exists: {key}")]
    #[diagnostic(
        code(storage::already_exists),
        help("Update the existing object instead of creating it again")
    )]
    AlreadyExists { key: String },

    /// Stale write rejected by the version check
    #[error("Conflict writing {key}: expected version {expected}, found {actual}")]
    #[diagnostic(
        code(storage::conflict),
        help("The object was modified concurrently. Re-read it and retry with the latest resourceVersion")
    )]
    Conflict {
        key: String,
        expected: String,
        actual: String,
    },

    /// Object failed validation
    #[error("Invalid object {key}: {message}")]
    #[diagnostic(code(storage::invalid_object), help("Fix the object and submit it again"))]
    InvalidObject { key: String, message: String },

    /// Database error
    #[error("Database error: {message}")]
    #[diagnostic(
        code(storage::database_error),
        help("Check database logs and ensure the data directory is accessible and not corrupted")
    )]
    DatabaseError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Transaction error
    #[error("Transaction error: {message}")]
    #[diagnostic(
        code(storage::transaction_error),
        help("Ensure the transaction is not already committed or aborted")
    )]
    TransactionError { message: String },

    /// Serialization error
    #[error("Serialization error: {message}")]
    #[diagnostic(
        code(storage::serialization_error),
        help("Ensure the data is valid and can be serialized")
    )]
    SerializationError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Remote API server request failed
    #[error("API request failed: {message}")]
    #[diagnostic(
        code(storage::request_error),
        help("Check that the API server is reachable and the credentials are valid")
    )]
    RequestError { message: String },
}

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    /// Create a KeyNotFound error
    pub fn key_not_found(key: impl Into<String>) -> Self {
        Self::KeyNotFound { key: key.into() }
    }

    /// Create an AlreadyExists error
    pub fn already_exists(key: impl Into<String>) -> Self {
        Self::AlreadyExists { key: key.into() }
    }

    /// Create a Conflict error
    pub fn conflict(
        key: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::Conflict {
            key: key.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an InvalidObject error
    pub fn invalid_object(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidObject {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a DatabaseError
    pub fn database_error(
        message: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::DatabaseError {
            message: message.into(),
            source,
        }
    }

    /// Create a TransactionError
    pub fn transaction_error(message: impl Into<String>) -> Self {
        Self::TransactionError {
            message: message.into(),
        }
    }

    /// Create a SerializationError
    pub fn serialization_error(
        message: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::SerializationError {
            message: message.into(),
            source,
        }
    }

    /// Create a RequestError
    pub fn request_error(message: impl Into<String>) -> Self {
        Self::RequestError {
            message: message.into(),
        }
    }

    /// Whether this error is a stale-version rejection
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

impl From<redb::Error> for StorageError {
    fn from(err: redb::Error) -> Self {
        match err {
            redb::Error::TableDoesNotExist(_) => {
                StorageError::database_error("Table does not exist", Some(Box::new(err)))
            }
            _ => StorageError::database_error(format!("redb error: {}", err), Some(Box::new(err))),
        }
    }
}

impl From<redb::DatabaseError> for StorageError {
    fn from(err: redb::DatabaseError) -> Self {
        StorageError::database_error(format!("Failed to open database: {}", err), Some(Box::new(err)))
    }
}

impl From<redb::TransactionError> for StorageError {
    fn from(err: redb::TransactionError) -> Self {
        StorageError::transaction_error(format!("Transaction error: {}", err))
    }
}

impl From<redb::StorageError> for StorageError {
    fn from(err: redb::StorageError) -> Self {
        StorageError::database_error(format!("Storage error: {}", err), Some(Box::new(err)))
    }
}

impl From<redb::TableError> for StorageError {
    fn from(err: redb::TableError) -> Self {
        StorageError::database_error(format!("Table error: {}", err), Some(Box::new(err)))
    }
}

impl From<redb::CommitError> for StorageError {
    fn from(err: redb::CommitError) -> Self {
        StorageError::transaction_error(format!("Commit error: {}", err))
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::serialization_error(format!("JSON error: {}", err), Some(Box::new(err)))
    }
}

impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        StorageError::request_error(format!("HTTP request failed: {}", err))
    }
}
