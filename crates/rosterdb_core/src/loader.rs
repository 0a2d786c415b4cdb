//! Bulk loader: rebuilds every index from one scan of the store.
//!
//! Used at startup and after a restore or compaction. Malformed lines
//! still consume their bytes (so later offsets stay correct) but are
//! invisible to every index.

use crate::entity::Record;
use crate::error::CoreResult;
use crate::index::IndexEngine;
use rosterdb_storage::StorageBackend;
use tracing::{info, warn};

/// Outcome of a load pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadReport {
    /// Non-empty lines seen.
    pub lines: usize,
    /// Lines that parsed and were indexed.
    pub indexed: usize,
    /// Lines skipped because they did not parse.
    pub skipped: usize,
    /// Indexed lines that replaced an earlier line for the same id.
    pub superseded: usize,
    /// Bytes scanned, blank lines included.
    pub bytes: u64,
}

/// Clears `engine` and repopulates it from `backend`.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or read. On error the
/// engine holds whatever was indexed so far and must be loaded again
/// before further use.
pub fn load(engine: &mut IndexEngine, backend: &dyn StorageBackend) -> CoreResult<LoadReport> {
    engine.clear();

    let mut report = LoadReport::default();
    let mut lines = backend.scan()?;

    for line in lines.by_ref() {
        let line = line?;
        report.lines += 1;

        match Record::decode(&line.bytes) {
            Ok(record) => {
                if engine.index_existing(&record, line.offset) {
                    report.superseded += 1;
                }
                report.indexed += 1;
            }
            Err(e) => {
                warn!(offset = line.offset, error = %e, "skipping malformed line");
                report.skipped += 1;
            }
        }
    }
    report.bytes = lines.position();

    info!(
        records = engine.len(),
        lines = report.lines,
        skipped = report.skipped,
        superseded = report.superseded,
        "indexes loaded"
    );
    Ok(report)
}
