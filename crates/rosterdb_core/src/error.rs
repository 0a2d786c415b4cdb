//! Error types for RosterDB core.

use crate::entity::RecordId;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in RosterDB core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] rosterdb_storage::StorageError),

    /// I/O error on a backup or snapshot file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A record with this id is already indexed.
    #[error("record with id {id} already exists")]
    DuplicateId {
        /// The conflicting id.
        id: RecordId,
    },

    /// No live record or non-empty bucket matched.
    #[error("not found: {what}")]
    NotFound {
        /// Description of what was looked up.
        what: String,
    },

    /// The store file to back up does not exist.
    #[error("store file does not exist: {}", path.display())]
    SourceMissing {
        /// Path of the missing store file.
        path: PathBuf,
    },

    /// A snapshot file could not be opened for restore.
    #[error("cannot open snapshot {}: {source}", path.display())]
    SnapshotUnreadable {
        /// Path of the snapshot.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A line or value could not be parsed.
    #[error("parse error: {message}")]
    Parse {
        /// Description of the parse failure.
        message: String,
    },

    /// A record cannot be represented in the store.
    #[error("invalid record: {message}")]
    InvalidRecord {
        /// Why the record was rejected.
        message: String,
    },

    /// The in-memory indexes disagree with each other.
    #[error("index inconsistency: {message}")]
    Inconsistent {
        /// Description of the broken invariant.
        message: String,
    },
}

impl CoreError {
    /// Creates a not found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Creates an invalid record error.
    pub fn invalid_record(message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            message: message.into(),
        }
    }

    /// Creates an index inconsistency error.
    pub fn inconsistent(message: impl Into<String>) -> Self {
        Self::Inconsistent {
            message: message.into(),
        }
    }

    /// Returns true for [`CoreError::NotFound`].
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true for [`CoreError::DuplicateId`].
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateId { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = CoreError::DuplicateId { id: 9 };
        assert_eq!(err.to_string(), "record with id 9 already exists");

        let err = CoreError::not_found("record with id 4");
        assert!(err.is_not_found());
        assert!(err.to_string().contains("id 4"));
    }

    #[test]
    fn io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err: CoreError = io_err.into();
        assert!(matches!(err, CoreError::Io(_)));
    }

    #[test]
    fn storage_error_conversion() {
        let err: CoreError = rosterdb_storage::StorageError::ReadPastEnd { offset: 5, size: 2 }.into();
        assert!(matches!(err, CoreError::Storage(_)));
        assert!(!err.is_duplicate());
    }
}
