//! # RosterDB Core
//!
//! Core engine for RosterDB, a single-file record store with in-memory
//! secondary indexes.
//!
//! This crate provides:
//! - The record model and its one-JSON-object-per-line encoding
//! - The index engine: id to offset, plus name, score and active buckets
//! - The bulk loader that rebuilds every index from one scan of the store
//! - Backup of live lines, restore, and offline compaction
//! - The tabular import adapter
//! - [`Database`], the facade that serializes all of the above
//!
//! ## Example
//!
//! ```rust
//! use rosterdb_core::{Database, Record};
//!
//! let db = Database::open_in_memory().unwrap();
//! db.add(Record::new(1, "Ada", 3.9, true)).unwrap();
//!
//! let found = db.find_by_name("Ada").unwrap();
//! assert_eq!(found[0].id, 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod backup;
pub mod compaction;
mod config;
mod database;
pub mod entity;
mod error;
pub mod import;
pub mod index;
pub mod loader;
mod stats;

pub use backup::BackupReport;
pub use compaction::CompactionReport;
pub use config::Config;
pub use database::Database;
pub use entity::{Record, RecordId, Score, Summary};
pub use error::{CoreError, CoreResult};
pub use import::{ImportPolicy, ImportReport, RowError, RowOutcome};
pub use index::{EditPolicy, IndexCounts, IndexEngine, IndexSnapshot};
pub use loader::LoadReport;
pub use stats::{DatabaseStats, StatsSnapshot};

/// Version of the core crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
