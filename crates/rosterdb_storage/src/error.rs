//! Error types for storage operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Attempted to read a line at or beyond the end of storage.
    #[error("read beyond end of storage: offset {offset}, size {size}")]
    ReadPastEnd {
        /// The requested line offset.
        offset: u64,
        /// The current storage size.
        size: u64,
    },

    /// The backing file does not exist.
    #[error("storage file missing: {}", path.display())]
    Missing {
        /// Path of the missing file.
        path: PathBuf,
    },

    /// A line handed to `append_line` contained a line terminator.
    #[error("line contains an embedded newline at byte {position}")]
    EmbeddedNewline {
        /// Position of the first `\n` inside the rejected line.
        position: usize,
    },
}

impl StorageError {
    /// Returns true if this error means the requested line does not exist.
    #[must_use]
    pub fn is_missing_line(&self) -> bool {
        matches!(self, Self::ReadPastEnd { .. })
    }
}
