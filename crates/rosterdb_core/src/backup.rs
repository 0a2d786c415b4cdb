//! Backup of live lines and restore from a snapshot.
//!
//! ## Snapshot Format
//!
//! A snapshot is a store file itself: the same one-JSON-object-per-line
//! format, holding only the lines that were live when it was taken. Lines
//! are copied verbatim, never re-encoded.
//!
//! Snapshots are named `backup_YYYYMMDD_HHMMSS.jsonl` (local time). If two
//! snapshots land in the same second, the later one gets a `_N` suffix.
//!
//! ## Usage
//!
//! ```ignore
//! use rosterdb_core::backup;
//!
//! let report = backup::backup(&engine, &backend, Path::new("backups"))?;
//! let loaded = backup::restore(&mut engine, &mut backend, &report.path)?;
//! ```

use crate::entity::Record;
use crate::error::{CoreError, CoreResult};
use crate::index::IndexEngine;
use crate::loader::{self, LoadReport};
use chrono::{DateTime, Local};
use rosterdb_storage::StorageBackend;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Timestamp layout embedded in snapshot names.
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Outcome of a backup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupReport {
    /// Path of the snapshot written.
    pub path: PathBuf,
    /// Live lines copied into the snapshot.
    pub lines_written: usize,
    /// Lines left out (dead, superseded or unparsable).
    pub lines_skipped: usize,
}

/// Returns the snapshot file name for a backup taken at `at`.
#[must_use]
pub fn snapshot_file_name(at: DateTime<Local>) -> String {
    format!("backup_{}.jsonl", at.format(TIMESTAMP_FORMAT))
}

/// Writes every live line of the store into a new snapshot in `target_dir`.
///
/// A line is live when it parses and is the current line of an indexed id.
/// Lines of deleted ids, lines superseded by a later edit, and unparsable
/// lines are left out.
///
/// # Errors
///
/// - [`CoreError::SourceMissing`] if the store does not exist
/// - [`CoreError::Io`] if the snapshot cannot be created or written
/// - [`CoreError::Storage`] if the store cannot be read
pub fn backup(
    engine: &IndexEngine,
    backend: &dyn StorageBackend,
    target_dir: &Path,
) -> CoreResult<BackupReport> {
    if !backend.exists() {
        return Err(CoreError::SourceMissing {
            path: backend.path().map(Path::to_path_buf).unwrap_or_default(),
        });
    }

    fs::create_dir_all(target_dir)?;
    let (file, path) = create_snapshot_file(target_dir, Local::now())?;

    let mut writer = BufWriter::new(file);
    let counts = write_live_lines(engine, backend, &mut writer, LiveLines::Verbatim)?;
    let (lines_written, lines_skipped) = (counts.written, counts.skipped);
    let file = writer.into_inner().map_err(io::IntoInnerError::into_error)?;
    file.sync_all()?;

    info!(path = %path.display(), lines_written, lines_skipped, "backup created");
    Ok(BackupReport {
        path,
        lines_written,
        lines_skipped,
    })
}

/// Replaces the store with the content of `snapshot_path` and reloads.
///
/// The snapshot is read into memory before the store is overwritten, so
/// restoring a store from its own file leaves it intact. The store is
/// overwritten, not appended to. If the reload fails the
/// store is left in its restored state and the error is returned; the
/// caller must load again before further use.
///
/// # Errors
///
/// - [`CoreError::SnapshotUnreadable`] if the snapshot cannot be opened
/// - [`CoreError::Storage`] if the store cannot be rewritten or reloaded
pub fn restore(
    engine: &mut IndexEngine,
    backend: &mut dyn StorageBackend,
    snapshot_path: &Path,
) -> CoreResult<LoadReport> {
    // Read in full first: the snapshot may be the store file itself.
    let snapshot = fs::read(snapshot_path).map_err(|source| CoreError::SnapshotUnreadable {
        path: snapshot_path.to_path_buf(),
        source,
    })?;

    let bytes = backend.replace_with(&mut snapshot.as_slice())?;
    debug!(bytes, "store overwritten from snapshot");

    let report = loader::load(engine, backend)?;
    info!(
        snapshot = %snapshot_path.display(),
        records = engine.len(),
        "store restored"
    );
    Ok(report)
}

/// How [`write_live_lines`] emits a live line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LiveLines {
    /// Copy the stored bytes unchanged.
    Verbatim,
    /// Re-encode the line from the indexed summary when the two disagree.
    Current,
}

/// Line counts from [`write_live_lines`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct LiveLineCounts {
    /// Live lines written.
    pub written: usize,
    /// Lines left out.
    pub skipped: usize,
    /// Live lines re-encoded from their summary.
    pub rewritten: usize,
}

/// Writes every live line of `backend` into `out`, each with a terminator.
///
/// Under [`LiveLines::Current`] a live line whose record no longer matches
/// the indexed summary (an index-only edit) is written re-encoded.
pub(crate) fn write_live_lines(
    engine: &IndexEngine,
    backend: &dyn StorageBackend,
    out: &mut dyn Write,
    mode: LiveLines,
) -> CoreResult<LiveLineCounts> {
    let mut counts = LiveLineCounts::default();

    for line in backend.scan()? {
        let line = line?;
        let record = match Record::decode(&line.bytes) {
            Ok(record) if engine.is_live_line(record.id, line.offset) => record,
            _ => {
                counts.skipped += 1;
                continue;
            }
        };

        let edited = match (mode, engine.summary(record.id)) {
            (LiveLines::Current, Some(summary)) if *summary != record.summary() => {
                Some(Record::from_summary(record.id, summary))
            }
            _ => None,
        };

        match edited {
            Some(current) => {
                out.write_all(&current.encode()?)?;
                counts.rewritten += 1;
            }
            None => out.write_all(&line.bytes)?,
        }
        out.write_all(b"\n")?;
        counts.written += 1;
    }

    Ok(counts)
}

fn create_snapshot_file(dir: &Path, at: DateTime<Local>) -> io::Result<(File, PathBuf)> {
    let base = snapshot_file_name(at);
    let stem = base.trim_end_matches(".jsonl").to_string();

    let mut attempt = 0u32;
    loop {
        let name = if attempt == 0 {
            base.clone()
        } else {
            format!("{}_{}.jsonl", stem, attempt)
        };
        let path = dir.join(name);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((file, path)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(e),
        }
    }
}
