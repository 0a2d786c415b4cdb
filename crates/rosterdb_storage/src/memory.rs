//! In-memory storage backend for testing.

use crate::backend::{check_line, strip_terminator, StorageBackend};
use crate::error::{StorageError, StorageResult};
use crate::lines::LineIter;
use std::io::{Cursor, Read};

/// An in-memory line storage backend.
///
/// Holds the whole "file" in a byte buffer. Suitable for unit tests and
/// ephemeral databases that don't need persistence.
///
/// # Example
///
/// ```rust
/// use rosterdb_storage::{StorageBackend, InMemoryBackend};
///
/// let mut backend = InMemoryBackend::new();
/// let offset = backend.append_line(b"test data").unwrap();
/// assert_eq!(offset, 0);
/// assert_eq!(backend.size().unwrap(), 10);
/// ```
#[derive(Debug, Default, Clone)]
pub struct InMemoryBackend {
    data: Vec<u8>,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory backend with pre-existing data.
    ///
    /// Useful for testing load scenarios with hand-written content.
    #[must_use]
    pub fn with_data(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }

    /// Returns all data in the backend.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl StorageBackend for InMemoryBackend {
    fn append_line(&mut self, line: &[u8]) -> StorageResult<u64> {
        check_line(line)?;
        if self.data.last().is_some_and(|&b| b != b'\n') {
            self.data.push(b'\n');
        }
        let offset = self.data.len() as u64;
        self.data.extend_from_slice(line);
        self.data.push(b'\n');
        Ok(offset)
    }

    fn read_line_at(&self, offset: u64) -> StorageResult<Vec<u8>> {
        let size = self.data.len() as u64;
        if offset >= size {
            return Err(StorageError::ReadPastEnd { offset, size });
        }

        let rest = &self.data[offset as usize..];
        let end = rest
            .iter()
            .position(|&b| b == b'\n')
            .map_or(rest.len(), |p| p + 1);
        let mut line = rest[..end].to_vec();
        strip_terminator(&mut line);
        Ok(line)
    }

    fn scan(&self) -> StorageResult<LineIter> {
        Ok(LineIter::new(Box::new(Cursor::new(self.data.clone()))))
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.data.len() as u64)
    }

    fn exists(&self) -> bool {
        true
    }

    fn replace_with(&mut self, source: &mut dyn Read) -> StorageResult<u64> {
        let mut data = Vec::new();
        source.read_to_end(&mut data)?;
        self.data = data;
        Ok(self.data.len() as u64)
    }

    fn sync(&mut self) -> StorageResult<()> {
        Ok(())
    }
}
