//! Backup and restore commands.

use rosterdb_core::Database;
use std::path::Path;

/// Writes a snapshot of the live records of `db_path` into `dir`.
pub fn create(db_path: &Path, dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open(db_path)?;
    let report = db.backup_to(dir)?;

    println!("✓ Backup created successfully");
    println!("  Path:    {}", report.path.display());
    println!("  Records: {}", report.lines_written);
    println!("  Skipped: {} line(s)", report.lines_skipped);
    Ok(())
}

/// Replaces the store at `db_path` with `snapshot`.
pub fn restore(db_path: &Path, snapshot: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open(db_path)?;
    let report = db.restore(snapshot)?;

    println!("✓ Restored from {}", snapshot.display());
    println!("  Records: {}", db.len());
    if report.skipped > 0 {
        println!("  Malformed lines skipped: {}", report.skipped);
    }
    Ok(())
}
