//! Storage backend trait definition.

use crate::error::StorageResult;
use crate::lines::LineIter;
use std::io::Read;
use std::path::Path;

/// A line-oriented, append-only storage backend for RosterDB.
///
/// Backends store **opaque lines**. Each appended line is terminated with
/// `\n`; the caller never passes the terminator itself.
///
/// # Invariants
///
/// - `append_line` returns the offset where the line begins
/// - offsets of already-written lines never shift until `replace_with`
/// - `read_line_at(o)` returns exactly the bytes appended at `o`, without
///   the terminator
/// - `scan` yields every non-empty line in order; blank lines are skipped
///   but still advance the running offset by their full encoded length
///
/// # Implementors
///
/// - [`super::FileBackend`] - For persistent storage
/// - [`super::InMemoryBackend`] - For testing
pub trait StorageBackend: Send + Sync {
    /// Appends one line and returns the offset at which it begins.
    ///
    /// If the existing data does not end with `\n`, a terminator is written
    /// first so the new line always starts a line of its own.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `line` contains a `\n`
    /// - An I/O error occurs
    fn append_line(&mut self, line: &[u8]) -> StorageResult<u64>;

    /// Reads the single line starting at `offset`.
    ///
    /// Reads up to the next terminator or end of data. A trailing `\r` is
    /// stripped together with the `\n`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The offset is at or beyond the current size
    /// - The backing file is missing
    /// - An I/O error occurs
    fn read_line_at(&self, offset: u64) -> StorageResult<Vec<u8>>;

    /// Returns a lazy iterator over all non-empty lines and their offsets.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be opened.
    fn scan(&self) -> StorageResult<LineIter>;

    /// Returns the current size of the storage in bytes.
    ///
    /// This is the offset where the next `append_line` will write, unless
    /// the last line is unterminated.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;

    /// Returns true if the backing storage currently exists.
    fn exists(&self) -> bool;

    /// Replaces the whole content of the storage with the bytes of `source`.
    ///
    /// This is a full overwrite, not an append. Returns the number of bytes
    /// written.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be recreated or the copy fails.
    fn replace_with(&mut self, source: &mut dyn Read) -> StorageResult<u64>;

    /// Syncs all data and metadata to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync operation fails.
    fn sync(&mut self) -> StorageResult<()>;

    /// Returns the path of the backing file, if there is one.
    fn path(&self) -> Option<&Path> {
        None
    }
}

/// Checks that `line` can be stored as a single line.
pub(crate) fn check_line(line: &[u8]) -> StorageResult<()> {
    match line.iter().position(|&b| b == b'\n') {
        Some(position) => Err(crate::StorageError::EmbeddedNewline { position }),
        None => Ok(()),
    }
}

/// Strips one trailing `\n` and an optional `\r` before it.
pub(crate) fn strip_terminator(line: &mut Vec<u8>) {
    if line.last() == Some(&b'\n') {
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
    }
}
