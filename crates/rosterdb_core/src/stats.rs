//! Store statistics.
//!
//! Counters are bumped by [`Database`](crate::Database) operations and can
//! be read at any time, including while other threads are working on the
//! store.
//!
//! ```rust,ignore
//! let db = Database::open_in_memory()?;
//! db.add(Record::new(1, "Ada", 3.9, true))?;
//!
//! let stats = db.stats();
//! println!("writes: {}", stats.writes());
//! ```

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Operation counters for a store.
///
/// All counters are monotonically increasing.
#[derive(Debug, Default)]
pub struct DatabaseStats {
    reads: AtomicU64,
    writes: AtomicU64,
    bytes_written: AtomicU64,
    deletes: AtomicU64,
    edits: AtomicU64,
    index_lookups: AtomicU64,
    skipped_lines: AtomicU64,
    backups: AtomicU64,
    restores: AtomicU64,
    imports: AtomicU64,
    compactions: AtomicU64,
    errors: AtomicU64,
}

impl DatabaseStats {
    /// Creates a zeroed stats instance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_read(&self) {
        self.reads.fetch_add(1, Ordering::Relaxed);
    }

    /// Records `lines` appended lines totalling `bytes`.
    pub(crate) fn record_writes(&self, lines: u64, bytes: u64) {
        self.writes.fetch_add(lines, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Records `count` removed records.
    pub(crate) fn record_deletes(&self, count: u64) {
        self.deletes.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_edit(&self) {
        self.edits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_index_lookup(&self) {
        self.index_lookups.fetch_add(1, Ordering::Relaxed);
    }

    /// Records lines the loader could not index.
    pub(crate) fn record_skipped_lines(&self, count: u64) {
        self.skipped_lines.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_backup(&self) {
        self.backups.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_restore(&self) {
        self.restores.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_import(&self) {
        self.imports.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_compaction(&self) {
        self.compactions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of point and multi-match lookups served.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Returns the number of lines appended.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Returns the number of bytes appended, terminators included.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }

    /// Returns the number of records removed from the indexes.
    pub fn deletes(&self) -> u64 {
        self.deletes.load(Ordering::Relaxed)
    }

    /// Returns the number of successful edits.
    pub fn edits(&self) -> u64 {
        self.edits.load(Ordering::Relaxed)
    }

    /// Returns the number of index lookups.
    pub fn index_lookups(&self) -> u64 {
        self.index_lookups.load(Ordering::Relaxed)
    }

    /// Returns the number of lines skipped by the loader.
    ///
    /// Counts across every load, including reloads after restore and
    /// compaction.
    pub fn skipped_lines(&self) -> u64 {
        self.skipped_lines.load(Ordering::Relaxed)
    }

    /// Returns the number of snapshots written.
    pub fn backups(&self) -> u64 {
        self.backups.load(Ordering::Relaxed)
    }

    /// Returns the number of restores performed.
    pub fn restores(&self) -> u64 {
        self.restores.load(Ordering::Relaxed)
    }

    /// Returns the number of import runs.
    pub fn imports(&self) -> u64 {
        self.imports.load(Ordering::Relaxed)
    }

    /// Returns the number of compactions.
    pub fn compactions(&self) -> u64 {
        self.compactions.load(Ordering::Relaxed)
    }

    /// Returns the number of failed operations.
    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Returns a snapshot of all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            reads: self.reads(),
            writes: self.writes(),
            bytes_written: self.bytes_written(),
            deletes: self.deletes(),
            edits: self.edits(),
            index_lookups: self.index_lookups(),
            skipped_lines: self.skipped_lines(),
            backups: self.backups(),
            restores: self.restores(),
            imports: self.imports(),
            compactions: self.compactions(),
            errors: self.errors(),
        }
    }
}

/// A point-in-time copy of [`DatabaseStats`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct StatsSnapshot {
    /// Lookups served.
    pub reads: u64,
    /// Lines appended.
    pub writes: u64,
    /// Bytes appended.
    pub bytes_written: u64,
    /// Records removed from the indexes.
    pub deletes: u64,
    /// Successful edits.
    pub edits: u64,
    /// Index lookups.
    pub index_lookups: u64,
    /// Lines skipped by the loader.
    pub skipped_lines: u64,
    /// Snapshots written.
    pub backups: u64,
    /// Restores performed.
    pub restores: u64,
    /// Import runs.
    pub imports: u64,
    /// Compactions.
    pub compactions: u64,
    /// Failed operations.
    pub errors: u64,
}
