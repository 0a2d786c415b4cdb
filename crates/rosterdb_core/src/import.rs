//! Bulk import of tabular rows.
//!
//! Rows come from an external tabular source: a header row followed by
//! rows of four text cells, `id`, `name`, `score`, `active`. Each row is
//! coerced into a [`Record`] and sent through the same path as a single
//! add. Rows that fail coercion are skipped and reported; what happens
//! when an add fails is decided by the [`ImportPolicy`].

use crate::entity::{Record, RecordId};
use crate::error::{CoreError, CoreResult};
use crate::index::IndexEngine;
use rosterdb_storage::StorageBackend;
use std::io::BufRead;
use thiserror::Error;
use tracing::{debug, info};

/// What to do when adding a coerced row fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportPolicy {
    /// Record the failure in the report and go on with the next row.
    #[default]
    Continue,
    /// Stop at the first failed add and return its error.
    ///
    /// Rows added before the failure stay in the store.
    FailFast,
}

/// Why a row could not be coerced into a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    /// The row has fewer than four cells.
    #[error("expected 4 fields, found {found}")]
    TooFewFields {
        /// Number of cells present.
        found: usize,
    },
    /// The id cell is not an integer.
    #[error("invalid id {0:?}")]
    BadId(String),
    /// The score cell is not a finite decimal.
    #[error("invalid score {0:?}")]
    BadScore(String),
    /// The active cell is not a boolean.
    #[error("invalid active flag {0:?}")]
    BadActive(String),
}

/// What happened to one row.
#[derive(Debug)]
pub enum RowOutcome {
    /// The row was added.
    Added {
        /// Id of the new record.
        id: RecordId,
    },
    /// The row could not be coerced and was skipped.
    Skipped {
        /// Why coercion failed.
        reason: RowError,
    },
    /// The row was coerced but the add failed.
    Failed {
        /// Id of the rejected record.
        id: RecordId,
        /// The add error.
        error: CoreError,
    },
}

/// Outcome of one row, with its position in the source.
#[derive(Debug)]
pub struct RowReport {
    /// 1-based row number in the source, header and empty rows included.
    pub row: usize,
    /// What happened.
    pub outcome: RowOutcome,
}

/// Per-row results of an import.
#[derive(Debug, Default)]
pub struct ImportReport {
    /// One entry per data row, in source order.
    pub rows: Vec<RowReport>,
}

impl ImportReport {
    /// Number of rows added.
    #[must_use]
    pub fn added(&self) -> usize {
        self.count(|o| matches!(o, RowOutcome::Added { .. }))
    }

    /// Number of rows skipped during coercion.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, RowOutcome::Skipped { .. }))
    }

    /// Number of rows whose add failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, RowOutcome::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&RowOutcome) -> bool) -> usize {
        self.rows.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Parses a boolean cell.
///
/// Accepts `1`, `t`, `T`, `TRUE`, `true`, `True` and the matching false
/// spellings `0`, `f`, `F`, `FALSE`, `false`, `False`.
#[must_use]
pub fn parse_bool(cell: &str) -> Option<bool> {
    match cell {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Coerces one row of cells into a record.
///
/// Cells past the fourth are ignored. Cells are taken verbatim, so a
/// numeric or boolean cell with surrounding whitespace is rejected;
/// [`read_delimited`] trims cells before they get here.
///
/// # Errors
///
/// Returns the first [`RowError`] encountered.
pub fn parse_row<S: AsRef<str>>(cells: &[S]) -> Result<Record, RowError> {
    if cells.len() < 4 {
        return Err(RowError::TooFewFields { found: cells.len() });
    }

    let id_cell = cells[0].as_ref();
    let id: RecordId = id_cell
        .parse()
        .map_err(|_| RowError::BadId(id_cell.to_string()))?;

    let name = cells[1].as_ref().to_string();

    let score_cell = cells[2].as_ref();
    let score: f64 = score_cell
        .parse()
        .ok()
        .filter(|s: &f64| s.is_finite())
        .ok_or_else(|| RowError::BadScore(score_cell.to_string()))?;

    let active_cell = cells[3].as_ref();
    let active = parse_bool(active_cell).ok_or_else(|| RowError::BadActive(active_cell.to_string()))?;

    Ok(Record::new(id, name, score, active))
}

/// Imports `rows` through [`IndexEngine::add`].
///
/// When `has_header` is set, the first non-empty row is skipped. Rows with
/// no cells at all are passed over without a report entry but still count
/// toward row numbers.
///
/// # Errors
///
/// Under [`ImportPolicy::FailFast`], the first add error is returned.
/// Under [`ImportPolicy::Continue`], add errors are recorded in the report
/// and only I/O failures abort the import.
pub fn import_rows<I, R, S>(
    engine: &mut IndexEngine,
    backend: &mut dyn StorageBackend,
    rows: I,
    has_header: bool,
    policy: ImportPolicy,
) -> CoreResult<ImportReport>
where
    I: IntoIterator<Item = R>,
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    let mut report = ImportReport::default();
    let mut header_pending = has_header;

    for (index, row) in rows.into_iter().enumerate() {
        let row_number = index + 1;
        let cells = row.as_ref();
        if cells.is_empty() {
            continue;
        }
        if header_pending {
            header_pending = false;
            continue;
        }

        let record = match parse_row(cells) {
            Ok(record) => record,
            Err(reason) => {
                debug!(row = row_number, %reason, "skipping import row");
                report.rows.push(RowReport {
                    row: row_number,
                    outcome: RowOutcome::Skipped { reason },
                });
                continue;
            }
        };

        let outcome = match engine.add(&record, backend) {
            Ok(_) => RowOutcome::Added { id: record.id },
            Err(error @ (CoreError::Storage(_) | CoreError::Io(_))) => return Err(error),
            Err(error) if policy == ImportPolicy::FailFast => return Err(error),
            Err(error) => {
                debug!(row = row_number, %error, "import row rejected");
                RowOutcome::Failed {
                    id: record.id,
                    error,
                }
            }
        };
        report.rows.push(RowReport {
            row: row_number,
            outcome,
        });
    }

    info!(
        added = report.added(),
        skipped = report.skipped(),
        failed = report.failed(),
        "import finished"
    );
    Ok(report)
}

/// Splits simple delimited text into rows of trimmed cells.
///
/// There is no quoting: every occurrence of `delimiter` separates cells.
/// A blank line becomes a row with no cells, so row positions match line
/// numbers.
///
/// # Errors
///
/// Returns an error if reading fails.
pub fn read_delimited<B: BufRead>(reader: B, delimiter: char) -> CoreResult<Vec<Vec<String>>> {
    let mut rows = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            rows.push(Vec::new());
            continue;
        }
        rows.push(
            line.split(delimiter)
                .map(|cell| cell.trim().to_string())
                .collect(),
        );
    }
    Ok(rows)
}
