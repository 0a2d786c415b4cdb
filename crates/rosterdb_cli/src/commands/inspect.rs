//! Inspect command implementation.

use rosterdb_core::{Database, StatsSnapshot};
use serde::Serialize;
use std::path::Path;

/// Store inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Store path.
    pub path: String,
    /// File size in bytes.
    pub size: u64,
    /// Live records.
    pub records: usize,
    /// Distinct names.
    pub names: usize,
    /// Distinct scores.
    pub scores: usize,
    /// Active records.
    pub active: usize,
    /// Inactive records.
    pub inactive: usize,
    /// Lines the loader could not parse.
    pub malformed_lines: u64,
    /// Counters collected while opening the store.
    pub stats: StatsSnapshot,
}

/// Runs the inspect command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("No store found at {}", path.display()).into());
    }

    let db = Database::open(path)?;
    let counts = db.counts();
    let result = InspectResult {
        path: path.display().to_string(),
        size: db.size()?,
        records: counts.records,
        names: counts.names,
        scores: counts.scores,
        active: counts.active,
        inactive: counts.inactive,
        malformed_lines: db.stats().skipped_lines(),
        stats: db.stats().snapshot(),
    };

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => print_text_output(&result),
    }
    Ok(())
}

fn print_text_output(result: &InspectResult) {
    println!("RosterDB Store Inspection");
    println!("=========================");
    println!();
    println!("Path: {}", result.path);
    println!("Size: {}", format_size(result.size));
    println!();
    println!("Records:");
    println!("  Live:      {}", result.records);
    println!("  Active:    {}", result.active);
    println!("  Inactive:  {}", result.inactive);
    println!("  Malformed: {}", result.malformed_lines);
    println!();
    println!("Indexes:");
    println!("  Distinct names:  {}", result.names);
    println!("  Distinct scores: {}", result.scores);
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} bytes", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
