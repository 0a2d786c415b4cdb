//! File-based storage backend for persistent storage.

use crate::backend::{check_line, strip_terminator, StorageBackend};
use crate::error::{StorageError, StorageResult};
use crate::lines::LineIter;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// A file-based line storage backend.
///
/// The backend holds no open handle between calls: every operation opens
/// the file, does its work and closes it again. Operations are infrequent
/// and single-threaded, and this keeps the file free for external tools
/// (and for `replace_with`) between calls.
///
/// # Durability
///
/// - Appends go through the OS page cache by default
/// - With [`FileBackend::sync_on_append`] every append calls `sync_data`
/// - `sync()` calls `File::sync_all()`
///
/// # Example
///
/// ```no_run
/// use rosterdb_storage::{StorageBackend, FileBackend};
/// use std::path::Path;
///
/// let mut backend = FileBackend::open(Path::new("input.jsonl")).unwrap();
/// let offset = backend.append_line(br#"{"id":1}"#).unwrap();
/// let line = backend.read_line_at(offset).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
    sync_on_append: bool,
}

impl FileBackend {
    /// Creates a backend for `path` without touching the file system.
    ///
    /// The file is created lazily by the first append.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sync_on_append: false,
        }
    }

    /// Opens or creates a file backend at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    pub fn open(path: &Path) -> StorageResult<Self> {
        OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)?;
        Ok(Self::new(path))
    }

    /// Opens or creates a file backend, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or file cannot be opened.
    pub fn open_with_create_dirs(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Self::open(path)
    }

    /// Sets whether every append is followed by `sync_data`.
    #[must_use]
    pub const fn sync_on_append(mut self, value: bool) -> Self {
        self.sync_on_append = value;
        self
    }

    fn open_read(&self) -> StorageResult<File> {
        File::open(&self.path).map_err(|e| self.map_open_error(e))
    }

    fn map_open_error(&self, err: io::Error) -> StorageError {
        if err.kind() == io::ErrorKind::NotFound {
            StorageError::Missing {
                path: self.path.clone(),
            }
        } else {
            StorageError::Io(err)
        }
    }
}

/// Returns true if `file` is empty or its last byte is `\n`.
fn ends_with_terminator(file: &mut File) -> StorageResult<bool> {
    let size = file.metadata()?.len();
    if size == 0 {
        return Ok(true);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(size - 1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

impl StorageBackend for FileBackend {
    fn append_line(&mut self, line: &[u8]) -> StorageResult<u64> {
        check_line(line)?;

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&self.path)?;

        let mut buf = Vec::with_capacity(line.len() + 2);
        if !ends_with_terminator(&mut file)? {
            buf.push(b'\n');
        }
        buf.extend_from_slice(line);
        buf.push(b'\n');

        file.write_all(&buf)?;
        if self.sync_on_append {
            file.sync_data()?;
        }

        let size = file.metadata()?.len();
        Ok(size - (line.len() as u64 + 1))
    }

    fn read_line_at(&self, offset: u64) -> StorageResult<Vec<u8>> {
        let mut file = self.open_read()?;
        let size = file.metadata()?.len();
        if offset >= size {
            return Err(StorageError::ReadPastEnd { offset, size });
        }

        file.seek(SeekFrom::Start(offset))?;
        let mut reader = BufReader::new(file);
        let mut line = Vec::new();
        reader.read_until(b'\n', &mut line)?;
        strip_terminator(&mut line);
        Ok(line)
    }

    fn scan(&self) -> StorageResult<LineIter> {
        let file = self.open_read()?;
        Ok(LineIter::new(Box::new(BufReader::new(file))))
    }

    fn size(&self) -> StorageResult<u64> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.len()),
            Err(e) => Err(self.map_open_error(e)),
        }
    }

    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn replace_with(&mut self, source: &mut dyn Read) -> StorageResult<u64> {
        let mut file = File::create(&self.path)?;
        let written = io::copy(source, &mut file)?;
        file.sync_all()?;
        Ok(written)
    }

    fn sync(&mut self) -> StorageResult<()> {
        let file = OpenOptions::new().append(true).open(&self.path)?;
        file.sync_all()?;
        Ok(())
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_create_new() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.jsonl");

        let backend = FileBackend::open(&path).unwrap();
        assert_eq!(backend.size().unwrap(), 0);
        assert!(path.exists());
        assert!(backend.exists());
    }

    #[test]
    fn file_append_and_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.jsonl");

        let mut backend = FileBackend::open(&path).unwrap();

        let offset1 = backend.append_line(b"hello").unwrap();
        assert_eq!(offset1, 0);

        let offset2 = backend.append_line(b"world!").unwrap();
        assert_eq!(offset2, 6);

        assert_eq!(backend.size().unwrap(), 13);
        assert_eq!(backend.read_line_at(offset1).unwrap(), b"hello");
        assert_eq!(backend.read_line_at(offset2).unwrap(), b"world!");
    }

    #[test]
    fn file_append_offset_after_existing_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.jsonl");
        fs::write(&path, b"abc\n\n").unwrap();

        let mut backend = FileBackend::open(&path).unwrap();
        let offset = backend.append_line(b"xyz").unwrap();
        assert_eq!(offset, 5);
        assert_eq!(backend.read_line_at(5).unwrap(), b"xyz");
    }

    #[test]
    fn file_append_terminates_unfinished_last_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.jsonl");
        fs::write(&path, br#"{"id":1}"#).unwrap();

        let mut backend = FileBackend::open(&path).unwrap();
        let offset = backend.append_line(br#"{"id":2}"#).unwrap();

        assert_eq!(offset, 9);
        assert_eq!(fs::read(&path).unwrap(), b"{\"id\":1}\n{\"id\":2}\n");
        assert_eq!(backend.read_line_at(0).unwrap(), br#"{"id":1}"#);
        assert_eq!(backend.read_line_at(offset).unwrap(), br#"{"id":2}"#);

        let scanned: Vec<_> = backend.scan().unwrap().map(|l| l.unwrap().offset).collect();
        assert_eq!(scanned, vec![0, 9]);
    }

    #[test]
    fn file_read_past_end_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.jsonl");

        let mut backend = FileBackend::open(&path).unwrap();
        backend.append_line(b"hello").unwrap();

        let result = backend.read_line_at(6);
        assert!(matches!(result, Err(StorageError::ReadPastEnd { .. })));
        assert!(result.unwrap_err().is_missing_line());
    }

    #[test]
    fn file_read_mid_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.jsonl");

        let mut backend = FileBackend::open(&path).unwrap();
        backend.append_line(b"hello world").unwrap();

        assert_eq!(backend.read_line_at(6).unwrap(), b"world");
    }

    #[test]
    fn file_missing_is_reported() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("absent.jsonl"));

        assert!(!backend.exists());
        assert!(matches!(backend.scan(), Err(StorageError::Missing { .. })));
        assert!(matches!(
            backend.read_line_at(0),
            Err(StorageError::Missing { .. })
        ));
    }

    #[test]
    fn file_lazy_create_on_append() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lazy.jsonl");
        let mut backend = FileBackend::new(&path);

        assert_eq!(backend.append_line(b"a").unwrap(), 0);
        assert!(path.exists());
    }

    #[test]
    fn file_rejects_embedded_newline() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.jsonl");
        let mut backend = FileBackend::open(&path).unwrap();

        let result = backend.append_line(b"a\nb");
        assert!(matches!(
            result,
            Err(StorageError::EmbeddedNewline { position: 1 })
        ));
        assert_eq!(backend.size().unwrap(), 0);
    }

    #[test]
    fn file_scan_matches_appends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.jsonl");
        let mut backend = FileBackend::open(&path).unwrap();

        let offsets: Vec<u64> = ["one", "two", "three"]
            .iter()
            .map(|l| backend.append_line(l.as_bytes()).unwrap())
            .collect();

        let scanned: Vec<_> = backend.scan().unwrap().map(|l| l.unwrap()).collect();
        assert_eq!(scanned.len(), 3);
        for (line, offset) in scanned.iter().zip(offsets) {
            assert_eq!(line.offset, offset);
            assert_eq!(backend.read_line_at(offset).unwrap(), line.bytes);
        }
    }

    #[test]
    fn file_replace_with_overwrites() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.jsonl");
        let mut backend = FileBackend::open(&path).unwrap();
        backend.append_line(b"old content that is long").unwrap();

        let written = backend.replace_with(&mut &b"new\n"[..]).unwrap();
        assert_eq!(written, 4);
        assert_eq!(fs::read(&path).unwrap(), b"new\n");
    }

    #[test]
    fn file_persistence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.jsonl");

        {
            let mut backend = FileBackend::open(&path).unwrap().sync_on_append(true);
            backend.append_line(b"persistent data").unwrap();
            backend.sync().unwrap();
        }

        {
            let backend = FileBackend::open(&path).unwrap();
            assert_eq!(backend.size().unwrap(), 16);
            assert_eq!(backend.read_line_at(0).unwrap(), b"persistent data");
        }
    }

    #[test]
    fn file_create_with_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("path").join("store.jsonl");

        let backend = FileBackend::open_with_create_dirs(&path).unwrap();
        assert_eq!(backend.size().unwrap(), 0);
        assert_eq!(backend.path(), Some(path.as_path()));
    }
}
