//! Compact command implementation.

use rosterdb_core::Database;
use std::path::Path;

/// Rewrites the store at `path` with only its live lines.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("Store file not found: {}", path.display()).into());
    }

    println!("Compacting {}", path.display());
    let db = Database::open(path)?;
    let report = db.compact()?;

    println!();
    println!("Compaction Results:");
    println!("  Live records:  {}", report.live_records);
    println!("  Dropped lines: {}", report.dropped_lines);
    println!("  Size before:   {} bytes", report.bytes_before);
    println!("  Size after:    {} bytes", report.bytes_after);
    println!(
        "  Space saved:   {} bytes ({:.1}%)",
        report.bytes_saved(),
        if report.bytes_before > 0 {
            (report.bytes_saved() as f64 / report.bytes_before as f64) * 100.0
        } else {
            0.0
        }
    );
    Ok(())
}
