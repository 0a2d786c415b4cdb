//! Import command implementation.

use rosterdb_core::import::read_delimited;
use rosterdb_core::{Config, Database, RowOutcome};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Imports rows from a delimited text file into the store at `path`.
pub fn run(
    path: &Path,
    config: Config,
    input: &Path,
    delimiter: char,
    has_header: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let rows = read_delimited(BufReader::new(File::open(input)?), delimiter)?;

    let db = Database::open_with_config(path, config)?;
    let report = db.import_rows(&rows, has_header)?;

    for row in &report.rows {
        match &row.outcome {
            RowOutcome::Added { .. } => {}
            RowOutcome::Skipped { reason } => println!("  row {}: skipped ({})", row.row, reason),
            RowOutcome::Failed { id, error } => {
                println!("  row {}: id {} not added ({})", row.row, id, error);
            }
        }
    }

    println!(
        "✓ Imported {} record(s), {} skipped, {} failed",
        report.added(),
        report.skipped(),
        report.failed()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn import_csv_file() {
        let dir = tempdir().unwrap();
        let store = dir.path().join("input.jsonl");
        let csv = dir.path().join("rows.csv");
        fs::write(&csv, "id,name,gpa,active\n1,Ada,3.9,true\nx,Bad,1.0,true\n2,Alan,3.1,0\n").unwrap();

        run(&store, Config::default(), &csv, ',', true).unwrap();

        let db = Database::open(&store).unwrap();
        assert_eq!(db.len(), 2);
        assert!(!db.find_by_id(2).unwrap().active);
    }
}
