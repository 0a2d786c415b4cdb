//! Test fixtures and store helpers.
//!
//! Provides convenience functions for setting up test stores
//! and common test scenarios.

use rosterdb_core::{Config, Database};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// File name of the store inside a fixture's temporary directory.
pub const STORE_FILE: &str = "input.jsonl";

/// A test store with automatic cleanup.
pub struct TestStore {
    /// The store instance.
    pub db: Database,
    /// The temporary directory (kept alive to prevent cleanup).
    temp_dir: Option<TempDir>,
}

impl TestStore {
    /// Creates a new in-memory test store.
    pub fn memory() -> Self {
        Self {
            db: Database::open_in_memory().expect("Failed to open in-memory store"),
            temp_dir: None,
        }
    }

    /// Creates a new file-based test store.
    pub fn file() -> Self {
        Self::file_with_config(Config::default())
    }

    /// Creates a new file-based test store with `config`.
    ///
    /// A relative `backup_dir` is placed inside the temporary directory.
    pub fn file_with_config(config: Config) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = if config.backup_dir.is_relative() {
            let dir = temp_dir.path().join(&config.backup_dir);
            config.backup_dir(dir)
        } else {
            config
        };

        let db = Database::open_with_config(&temp_dir.path().join(STORE_FILE), config)
            .expect("Failed to open file store");

        Self {
            db,
            temp_dir: Some(temp_dir),
        }
    }

    /// Returns the store file path if file-based, None if in-memory.
    pub fn path(&self) -> Option<PathBuf> {
        self.temp_dir.as_ref().map(|d| d.path().join(STORE_FILE))
    }

    /// Returns the temporary directory if file-based.
    pub fn dir(&self) -> Option<&Path> {
        self.temp_dir.as_ref().map(TempDir::path)
    }

    /// Drops the open store and opens the file again, rebuilding every
    /// index from disk.
    ///
    /// # Panics
    ///
    /// Panics for in-memory stores.
    pub fn reopen(&mut self) {
        let path = self.path().expect("Only file stores can be reopened");
        let config = self.db.config().clone();
        self.db = Database::open_with_config(&path, config).expect("Failed to reopen store");
    }

    /// Returns the raw bytes of the store file.
    pub fn file_contents(&self) -> Vec<u8> {
        let path = self.path().expect("Only file stores have contents on disk");
        std::fs::read(path).expect("Failed to read store file")
    }
}

impl std::ops::Deref for TestStore {
    type Target = Database;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

/// Runs a test with a temporary in-memory store.
///
/// # Example
///
/// ```rust,ignore
/// use rosterdb_testkit::with_temp_store;
///
/// #[test]
/// fn my_test() {
///     with_temp_store(|db| {
///         db.add(Record::new(1, "Ada", 3.9, true)).unwrap();
///     });
/// }
/// ```
pub fn with_temp_store<F, R>(f: F) -> R
where
    F: FnOnce(&Database) -> R,
{
    let store = TestStore::memory();
    f(&store.db)
}

/// Runs a test with a temporary file-based store.
pub fn with_file_store<F, R>(f: F) -> R
where
    F: FnOnce(&Database, &Path) -> R,
{
    let store = TestStore::file();
    let path = store.path().expect("File store should have a path");
    f(&store.db, &path)
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;
    use rosterdb_core::Record;

    /// A small roster with shared names, scores and flags.
    pub fn roster() -> Vec<Record> {
        vec![
            Record::new(1, "Ada", 3.9, true),
            Record::new(2, "Alan", 3.1, false),
            Record::new(3, "Grace", 3.9, true),
            Record::new(4, "Ada", 2.5, false),
            Record::new(5, "Edsger", 3.1, true),
        ]
    }

    /// Creates a file store holding [`roster`].
    pub fn roster_store() -> TestStore {
        let store = TestStore::file();
        for record in roster() {
            store.add(record).expect("Failed to add record");
        }
        store
    }

    /// Creates an in-memory store with `count` records, ids `1..=count`.
    pub fn populated_store(count: usize) -> TestStore {
        let store = TestStore::memory();
        for i in 1..=count {
            let record = Record::new(
                i as i64,
                format!("name_{}", i % 7),
                (i % 5) as f64,
                i % 2 == 0,
            );
            store.add(record).expect("Failed to add record");
        }
        store
    }
}
