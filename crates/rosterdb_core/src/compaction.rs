//! Offline compaction of the store.
//!
//! Deletes and edits leave dead lines behind. Compaction rewrites the store
//! with only the live lines (the same filter a backup uses) and reloads the
//! indexes, which also makes deletions survive the next startup.
//!
//! Unlike a backup, compaction writes index-only edits out: a live line
//! whose record differs from its indexed summary is re-encoded.
//!
//! ## Invariants
//!
//! - Compaction **MUST NOT** change the live view: every live id resolves
//!   to the same record before and after
//! - Dead, superseded and unparsable lines are dropped

use crate::backup::{write_live_lines, LiveLines};
use crate::error::CoreResult;
use crate::index::IndexEngine;
use crate::loader::{self, LoadReport};
use rosterdb_storage::StorageBackend;
use tracing::info;

/// Result of a compaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactionReport {
    /// Store size before compaction.
    pub bytes_before: u64,
    /// Store size after compaction.
    pub bytes_after: u64,
    /// Live records kept.
    pub live_records: usize,
    /// Lines dropped.
    pub dropped_lines: usize,
    /// Live lines re-encoded to carry an index-only edit.
    pub rewritten_lines: usize,
}

impl CompactionReport {
    /// Space saved in bytes.
    #[must_use]
    pub fn bytes_saved(&self) -> u64 {
        self.bytes_before.saturating_sub(self.bytes_after)
    }
}

/// Rewrites the store to hold only live lines, then reloads `engine`.
///
/// Returns the compaction report and the report of the reload.
///
/// # Errors
///
/// Returns an error if the store cannot be read, rewritten or reloaded.
pub fn compact(
    engine: &mut IndexEngine,
    backend: &mut dyn StorageBackend,
) -> CoreResult<(CompactionReport, LoadReport)> {
    let bytes_before = backend.size()?;

    let mut live = Vec::new();
    let counts = write_live_lines(engine, &*backend, &mut live, LiveLines::Current)?;

    let bytes_after = backend.replace_with(&mut live.as_slice())?;
    let load = loader::load(engine, &*backend)?;

    let report = CompactionReport {
        bytes_before,
        bytes_after,
        live_records: counts.written,
        dropped_lines: counts.skipped,
        rewritten_lines: counts.rewritten,
    };
    info!(
        bytes_before,
        bytes_after,
        live_records = counts.written,
        dropped_lines = counts.skipped,
        rewritten_lines = counts.rewritten,
        "store compacted"
    );
    Ok((report, load))
}
