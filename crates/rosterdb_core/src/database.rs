//! Store facade.

use crate::backup::{self, BackupReport};
use crate::compaction::{self, CompactionReport};
use crate::config::Config;
use crate::entity::{Record, RecordId};
use crate::error::{CoreError, CoreResult};
use crate::import::{self, ImportReport};
use crate::index::{IndexCounts, IndexEngine, IndexSnapshot};
use crate::loader::{self, LoadReport};
use crate::stats::DatabaseStats;
use parking_lot::Mutex;
use rosterdb_storage::{FileBackend, InMemoryBackend, StorageBackend};
use std::path::{Path, PathBuf};
use tracing::info;

/// The main store handle.
///
/// `Database` owns the line store and the index engine and serializes every
/// operation on them behind one lock, so the four indexes are always
/// observed and updated as a unit.
///
/// # Opening a Store
///
/// ```rust,ignore
/// use rosterdb_core::{Database, Record};
/// use std::path::Path;
///
/// let db = Database::open(Path::new("input.jsonl"))?;
/// db.add(Record::new(1, "Ada", 3.9, true))?;
///
/// let ada = db.find_by_id(1)?;
/// ```
///
/// Opening scans the whole file once and rebuilds every index from it.
///
/// # In-Memory Stores
///
/// For testing, use `Database::open_in_memory()`. Backups of an in-memory
/// store still go to the file system.
pub struct Database {
    config: Config,
    path: Option<PathBuf>,
    inner: Mutex<Inner>,
    stats: DatabaseStats,
}

struct Inner {
    backend: Box<dyn StorageBackend>,
    engine: IndexEngine,
}

impl Database {
    /// Opens the store file at `path` with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or read.
    pub fn open(path: &Path) -> CoreResult<Self> {
        Self::open_with_config(path, Config::default())
    }

    /// Opens the store file at `path`.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use rosterdb_core::{Config, Database, EditPolicy};
    ///
    /// let config = Config::default()
    ///     .create_if_missing(false)
    ///     .edit_policy(EditPolicy::IndexOnly);
    ///
    /// let db = Database::open_with_config(Path::new("input.jsonl"), config)?;
    /// ```
    ///
    /// # Errors
    ///
    /// - [`CoreError::SourceMissing`] if the file does not exist and
    ///   `create_if_missing` is off
    /// - [`CoreError::Storage`] if the file cannot be created or read
    pub fn open_with_config(path: &Path, config: Config) -> CoreResult<Self> {
        let backend = if path.exists() {
            FileBackend::new(path)
        } else if config.create_if_missing {
            FileBackend::open_with_create_dirs(path)?
        } else {
            return Err(CoreError::SourceMissing {
                path: path.to_path_buf(),
            });
        };
        let backend = backend.sync_on_append(config.sync_on_append);

        Self::open_with_backend(config, Box::new(backend))
    }

    /// Opens a store over an arbitrary backend and loads its indexes.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be scanned.
    pub fn open_with_backend(config: Config, backend: Box<dyn StorageBackend>) -> CoreResult<Self> {
        let mut engine = IndexEngine::new(config.edit_policy);
        let stats = DatabaseStats::new();

        let report = loader::load(&mut engine, &*backend)?;
        stats.record_skipped_lines(report.skipped as u64);

        let path = backend.path().map(Path::to_path_buf);
        info!(
            path = %path.as_deref().unwrap_or_else(|| Path::new(":memory:")).display(),
            records = engine.len(),
            "store opened"
        );

        Ok(Self {
            config,
            path,
            inner: Mutex::new(Inner { backend, engine }),
            stats,
        })
    }

    /// Opens a fresh in-memory store.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the signature matches the other
    /// constructors.
    pub fn open_in_memory() -> CoreResult<Self> {
        Self::open_with_backend(Config::default(), Box::new(InMemoryBackend::new()))
    }

    /// Runs `op` under the store lock, counting failures.
    fn with_store<T>(
        &self,
        op: impl FnOnce(&mut IndexEngine, &mut dyn StorageBackend) -> CoreResult<T>,
    ) -> CoreResult<T> {
        let mut inner = self.inner.lock();
        let Inner { backend, engine } = &mut *inner;
        let result = op(engine, &mut **backend);
        if result.is_err() {
            self.stats.record_error();
        }
        result
    }

    // === Writes ===

    /// Appends `record` and indexes it. Returns the offset of its line.
    ///
    /// # Errors
    ///
    /// - [`CoreError::DuplicateId`] if the id is already live
    /// - [`CoreError::InvalidRecord`] if the score is not finite
    /// - [`CoreError::Storage`] if the append fails
    pub fn add(&self, record: Record) -> CoreResult<u64> {
        self.with_store(|engine, backend| {
            let size_before = backend.size()?;
            let offset = engine.add(&record, backend)?;
            let size_after = backend.size()?;
            self.stats.record_writes(1, size_after.saturating_sub(size_before));
            Ok(offset)
        })
    }

    /// Replaces the non-id fields of the live record with `record.id`.
    ///
    /// What reaches the file depends on the configured
    /// [`EditPolicy`](crate::EditPolicy).
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if the id is not live
    /// - [`CoreError::InvalidRecord`] if the score is not finite
    pub fn edit(&self, record: Record) -> CoreResult<()> {
        self.with_store(|engine, backend| {
            let size_before = backend.size()?;
            engine.edit(&record, backend)?;
            let size_after = backend.size()?;
            if size_after > size_before {
                self.stats.record_writes(1, size_after - size_before);
            }
            self.stats.record_edit();
            Ok(())
        })
    }

    /// Removes the record with `id` from every index.
    ///
    /// The line stays in the file; see [`Database::compact`].
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the id is not live.
    pub fn delete_by_id(&self, id: RecordId) -> CoreResult<()> {
        self.with_store(|engine, _| {
            engine.delete_by_id(id)?;
            self.stats.record_deletes(1);
            Ok(())
        })
    }

    /// Removes every record named `name`. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if no live record has that name.
    pub fn delete_by_name(&self, name: &str) -> CoreResult<usize> {
        self.with_store(|engine, _| {
            let removed = engine.delete_by_name(name)?;
            self.stats.record_deletes(removed as u64);
            Ok(removed)
        })
    }

    /// Removes every record with exactly `score`. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if no live record has that score.
    pub fn delete_by_score(&self, score: f64) -> CoreResult<usize> {
        self.with_store(|engine, _| {
            let removed = engine.delete_by_score(score)?;
            self.stats.record_deletes(removed as u64);
            Ok(removed)
        })
    }

    /// Removes every record with the given flag. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if no live record has that flag.
    pub fn delete_by_active(&self, active: bool) -> CoreResult<usize> {
        self.with_store(|engine, _| {
            let removed = engine.delete_by_active(active)?;
            self.stats.record_deletes(removed as u64);
            Ok(removed)
        })
    }

    // === Reads ===

    /// Reads the current line of `id`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if the id is not live
    /// - [`CoreError::Parse`] if its line no longer parses
    pub fn find_by_id(&self, id: RecordId) -> CoreResult<Record> {
        self.stats.record_index_lookup();
        self.with_store(|engine, backend| {
            let record = engine.find_by_id(id, backend)?;
            self.stats.record_read();
            Ok(record)
        })
    }

    /// Returns every record named `name`, sorted by id.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the name has no bucket.
    pub fn find_by_name(&self, name: &str) -> CoreResult<Vec<Record>> {
        self.stats.record_index_lookup();
        self.with_store(|engine, backend| {
            let records = engine.find_by_name(name, backend)?;
            self.stats.record_read();
            Ok(records)
        })
    }

    /// Returns every record with exactly `score`, sorted by id.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the score has no bucket.
    pub fn find_by_score(&self, score: f64) -> CoreResult<Vec<Record>> {
        self.stats.record_index_lookup();
        self.with_store(|engine, backend| {
            let records = engine.find_by_score(score, backend)?;
            self.stats.record_read();
            Ok(records)
        })
    }

    /// Returns every record with the given flag, sorted by id.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the flag has no bucket.
    pub fn find_by_active(&self, active: bool) -> CoreResult<Vec<Record>> {
        self.stats.record_index_lookup();
        self.with_store(|engine, backend| {
            let records = engine.find_by_active(active, backend)?;
            self.stats.record_read();
            Ok(records)
        })
    }

    // === Maintenance ===

    /// Writes a snapshot of the live lines into the configured backup
    /// directory.
    ///
    /// # Errors
    ///
    /// See [`backup::backup`].
    pub fn backup(&self) -> CoreResult<BackupReport> {
        self.backup_to(&self.config.backup_dir)
    }

    /// Writes a snapshot of the live lines into `dir`.
    ///
    /// # Errors
    ///
    /// See [`backup::backup`].
    pub fn backup_to(&self, dir: &Path) -> CoreResult<BackupReport> {
        self.with_store(|engine, backend| {
            let report = backup::backup(engine, backend, dir)?;
            self.stats.record_backup();
            Ok(report)
        })
    }

    /// Replaces the store with a snapshot and rebuilds the indexes.
    ///
    /// # Errors
    ///
    /// See [`backup::restore`].
    pub fn restore(&self, snapshot: &Path) -> CoreResult<LoadReport> {
        self.with_store(|engine, backend| {
            let report = backup::restore(engine, backend, snapshot)?;
            self.stats.record_restore();
            self.stats.record_skipped_lines(report.skipped as u64);
            Ok(report)
        })
    }

    /// Imports tabular rows using the configured [`ImportPolicy`](crate::ImportPolicy).
    ///
    /// # Errors
    ///
    /// See [`import::import_rows`].
    pub fn import_rows<I, R, S>(&self, rows: I, has_header: bool) -> CoreResult<ImportReport>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        let policy = self.config.import_policy;
        self.with_store(|engine, backend| {
            let records_before = engine.len();
            let size_before = backend.size()?;

            let result = import::import_rows(engine, backend, rows, has_header, policy);

            let size_after = backend.size().unwrap_or(size_before);
            self.stats.record_import();
            self.stats.record_writes(
                engine.len().saturating_sub(records_before) as u64,
                size_after.saturating_sub(size_before),
            );
            result
        })
    }

    /// Rewrites the store to hold only live lines.
    ///
    /// # Errors
    ///
    /// See [`compaction::compact`].
    pub fn compact(&self) -> CoreResult<CompactionReport> {
        self.with_store(|engine, backend| {
            let (report, load) = compaction::compact(engine, backend)?;
            self.stats.record_compaction();
            self.stats.record_skipped_lines(load.skipped as u64);
            Ok(report)
        })
    }

    /// Discards the indexes and rebuilds them from the store.
    ///
    /// Deletions that were never compacted come back.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be scanned.
    pub fn reload(&self) -> CoreResult<LoadReport> {
        self.with_store(|engine, backend| {
            let report = loader::load(engine, backend)?;
            self.stats.record_skipped_lines(report.skipped as u64);
            Ok(report)
        })
    }

    // === Introspection ===

    /// Returns the number of live records.
    pub fn len(&self) -> usize {
        self.inner.lock().engine.len()
    }

    /// Returns `true` if no record is live.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().engine.is_empty()
    }

    /// Returns `true` if `id` is live.
    pub fn contains(&self, id: RecordId) -> bool {
        self.inner.lock().engine.contains(id)
    }

    /// Returns the number of entries in each index.
    pub fn counts(&self) -> IndexCounts {
        self.inner.lock().engine.counts()
    }

    /// Returns the key sets of every index.
    pub fn index_snapshot(&self) -> IndexSnapshot {
        self.inner.lock().engine.snapshot()
    }

    /// Verifies that the four indexes agree with each other.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Inconsistent`] describing the first mismatch.
    pub fn check_invariants(&self) -> CoreResult<()> {
        self.inner.lock().engine.check_invariants()
    }

    /// Returns the current store size in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be read.
    pub fn size(&self) -> CoreResult<u64> {
        Ok(self.inner.lock().backend.size()?)
    }

    /// Returns the operation counters.
    pub fn stats(&self) -> &DatabaseStats {
        &self.stats
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the store file path, or `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path)
            .field("records", &self.len())
            .field("edit_policy", &self.config.edit_policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::ImportPolicy;
    use crate::index::EditPolicy;
    use tempfile::tempdir;

    fn create_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn open_in_memory() {
        let db = create_db();
        assert!(db.is_empty());
        assert!(db.path().is_none());
    }

    #[test]
    fn add_and_find() {
        let db = create_db();
        db.add(Record::new(1, "Ada", 3.9, true)).unwrap();
        db.add(Record::new(2, "Alan", 3.1, false)).unwrap();

        assert_eq!(db.find_by_id(2).unwrap(), Record::new(2, "Alan", 3.1, false));
        assert_eq!(db.find_by_score(3.9).unwrap().len(), 1);
        assert_eq!(db.find_by_active(false).unwrap()[0].id, 2);
        assert_eq!(db.len(), 2);
    }

    #[test]
    fn duplicate_add_counts_error() {
        let db = create_db();
        db.add(Record::new(1, "Ada", 3.9, true)).unwrap();

        let err = db.add(Record::new(1, "Other", 1.0, false)).unwrap_err();
        assert!(err.is_duplicate());
        assert_eq!(db.stats().errors(), 1);
        assert_eq!(db.stats().writes(), 1);
        assert_eq!(db.find_by_id(1).unwrap().name, "Ada");
    }

    #[test]
    fn write_stats_count_bytes() {
        let db = create_db();
        let record = Record::new(1, "Ada", 3.9, true);
        let expected = record.encode().unwrap().len() as u64 + 1;

        db.add(record).unwrap();
        assert_eq!(db.stats().bytes_written(), expected);
        assert_eq!(db.size().unwrap(), expected);
    }

    #[test]
    fn write_stats_count_reappended_edits() {
        let db = create_db();
        db.add(Record::new(1, "Ada", 3.9, true)).unwrap();
        let edited = Record::new(1, "Ada L", 3.8, false);
        let edited_len = edited.encode().unwrap().len() as u64 + 1;
        let size = db.size().unwrap();

        db.edit(edited).unwrap();

        assert_eq!(db.stats().writes(), 2);
        assert_eq!(db.stats().bytes_written(), size + edited_len);
        assert_eq!(db.size().unwrap(), size + edited_len);
    }

    #[test]
    fn index_only_edit_writes_nothing() {
        let config = Config::default().edit_policy(EditPolicy::IndexOnly);
        let db = Database::open_with_backend(config, Box::new(InMemoryBackend::new())).unwrap();
        db.add(Record::new(1, "A", 3.0, true)).unwrap();

        db.edit(Record::new(1, "B", 2.0, false)).unwrap();

        assert_eq!(db.stats().writes(), 1);
        assert_eq!(db.stats().edits(), 1);
    }

    #[test]
    fn add_after_unterminated_line_counts_every_byte() {
        let data = br#"{"id":1,"name":"A","gpa":1.0,"active":true}"#.to_vec();
        let db = Database::open_with_backend(Config::default(), Box::new(InMemoryBackend::with_data(data)))
            .unwrap();
        let size = db.size().unwrap();

        let offset = db.add(Record::new(2, "B", 2.0, false)).unwrap();

        assert_eq!(offset, size + 1);
        assert_eq!(db.stats().bytes_written(), db.size().unwrap() - size);
        assert_eq!(db.find_by_id(1).unwrap().name, "A");
        assert_eq!(db.find_by_id(2).unwrap().name, "B");
        db.reload().unwrap();
        assert!(db.contains(1) && db.contains(2));
    }

    #[test]
    fn delete_by_active_removes_bucket() {
        let db = create_db();
        db.add(Record::new(1, "A", 1.0, true)).unwrap();
        db.add(Record::new(2, "B", 2.0, true)).unwrap();
        db.add(Record::new(3, "C", 3.0, false)).unwrap();

        assert_eq!(db.delete_by_active(true).unwrap(), 2);
        assert!(db.find_by_active(true).unwrap_err().is_not_found());
        assert_eq!(db.stats().deletes(), 2);
        db.check_invariants().unwrap();
    }

    #[test]
    fn edit_reappends_by_default() {
        let db = create_db();
        db.add(Record::new(1, "A", 3.0, true)).unwrap();
        db.edit(Record::new(1, "B", 2.0, false)).unwrap();

        assert_eq!(db.find_by_id(1).unwrap(), Record::new(1, "B", 2.0, false));
        assert_eq!(db.stats().edits(), 1);

        let report = db.reload().unwrap();
        assert_eq!(report.superseded, 1);
        assert_eq!(db.find_by_id(1).unwrap().name, "B");
    }

    #[test]
    fn edit_index_only_keeps_stale_line() {
        let config = Config::default().edit_policy(EditPolicy::IndexOnly);
        let db = Database::open_with_backend(config, Box::new(InMemoryBackend::new())).unwrap();
        db.add(Record::new(1, "A", 3.0, true)).unwrap();
        db.edit(Record::new(1, "B", 2.0, false)).unwrap();

        assert_eq!(db.find_by_id(1).unwrap().name, "A");
        assert!(db.find_by_name("A").unwrap_err().is_not_found());
    }

    #[test]
    fn open_missing_without_create_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("input.jsonl");
        let config = Config::default().create_if_missing(false);

        let err = Database::open_with_config(&path, config).unwrap_err();
        assert!(matches!(err, CoreError::SourceMissing { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn file_store_persists_across_opens() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("input.jsonl");

        {
            let db = Database::open(&path).unwrap();
            db.add(Record::new(1, "A", 3.0, true)).unwrap();
            db.add(Record::new(2, "B", 2.0, false)).unwrap();
            db.delete_by_id(2).unwrap();
        }

        let db = Database::open(&path).unwrap();
        assert_eq!(db.path(), Some(path.as_path()));
        assert!(db.contains(1));
        // Deletes are index-only until compaction.
        assert!(db.contains(2));

        db.delete_by_id(2).unwrap();
        db.compact().unwrap();
        drop(db);

        let db = Database::open(&path).unwrap();
        assert!(!db.contains(2));
        assert_eq!(db.len(), 1);
    }

    #[test]
    fn backup_and_restore() {
        let dir = tempdir().unwrap();
        let backups = dir.path().join("backups");
        let db = Database::open_with_config(
            &dir.path().join("input.jsonl"),
            Config::default().backup_dir(&backups),
        )
        .unwrap();

        for id in 1..=3 {
            db.add(Record::new(id, format!("r{}", id), 1.0, true)).unwrap();
        }
        db.delete_by_id(2).unwrap();

        let report = db.backup().unwrap();
        assert!(report.path.starts_with(&backups));
        assert_eq!(report.lines_written, 2);

        db.add(Record::new(4, "r4", 1.0, true)).unwrap();
        db.restore(&report.path).unwrap();

        assert!(db.contains(1));
        assert!(!db.contains(2));
        assert!(db.contains(3));
        assert!(!db.contains(4));
        assert_eq!(db.stats().backups(), 1);
        assert_eq!(db.stats().restores(), 1);
    }

    #[test]
    fn restore_missing_snapshot_fails() {
        let dir = tempdir().unwrap();
        let db = create_db();
        db.add(Record::new(1, "A", 1.0, true)).unwrap();

        let err = db.restore(&dir.path().join("nope.jsonl")).unwrap_err();
        assert!(matches!(err, CoreError::SnapshotUnreadable { .. }));
        assert!(db.contains(1));
    }

    #[test]
    fn import_uses_configured_policy() {
        let rows = vec![
            vec!["id", "name", "gpa", "active"],
            vec!["1", "A", "3.0", "true"],
            vec!["1", "B", "2.0", "false"],
            vec!["2", "C", "2.0", "false"],
        ];

        let db = create_db();
        let report = db.import_rows(&rows, true).unwrap();
        assert_eq!(report.added(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(db.stats().imports(), 1);

        let config = Config::default().import_policy(ImportPolicy::FailFast);
        let db = Database::open_with_backend(config, Box::new(InMemoryBackend::new())).unwrap();
        assert!(db.import_rows(&rows, true).unwrap_err().is_duplicate());
        assert_eq!(db.len(), 1);
    }

    #[test]
    fn skipped_lines_are_counted_on_open() {
        let data = b"{\"id\":1,\"name\":\"A\",\"gpa\":1.0,\"active\":true}\nnot json\n".to_vec();
        let db = Database::open_with_backend(Config::default(), Box::new(InMemoryBackend::with_data(data)))
            .unwrap();

        assert_eq!(db.len(), 1);
        assert_eq!(db.stats().skipped_lines(), 1);
    }
}
