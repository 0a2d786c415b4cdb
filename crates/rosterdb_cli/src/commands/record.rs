//! Record commands: add, edit, find and delete.

use rosterdb_core::{Database, Record};
use std::path::Path;

/// Attribute a `find` or `delete` selects by.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// Primary key.
    Id(i64),
    /// Exact name.
    Name(String),
    /// Exact score.
    Score(f64),
    /// Active flag.
    Active(bool),
}

/// Adds a record.
pub fn add(path: &Path, record: Record) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open(path)?;
    let id = record.id;
    let offset = db.add(record)?;
    println!("✓ Added record {} at offset {}", id, offset);
    Ok(())
}

/// Replaces the fields of an existing record.
pub fn edit(path: &Path, record: Record) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open(path)?;
    let id = record.id;
    db.edit(record)?;
    println!("✓ Updated record {}", id);
    Ok(())
}

/// Prints the records matching `selector`.
pub fn find(path: &Path, selector: &Selector, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open(path)?;
    let records = match selector {
        Selector::Id(id) => vec![db.find_by_id(*id)?],
        Selector::Name(name) => db.find_by_name(name)?,
        Selector::Score(score) => db.find_by_score(*score)?,
        Selector::Active(active) => db.find_by_active(*active)?,
    };

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&records)?),
        _ => print_table(&records),
    }
    Ok(())
}

/// Deletes the records matching `selector`.
///
/// With `compact` set the store is rewritten afterwards, so the deletion
/// survives the next open.
pub fn delete(path: &Path, selector: &Selector, compact: bool) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open(path)?;
    let removed = match selector {
        Selector::Id(id) => db.delete_by_id(*id).map(|()| 1)?,
        Selector::Name(name) => db.delete_by_name(name)?,
        Selector::Score(score) => db.delete_by_score(*score)?,
        Selector::Active(active) => db.delete_by_active(*active)?,
    };
    println!("✓ Deleted {} record(s)", removed);

    if compact {
        let report = db.compact()?;
        println!("  Reclaimed {} bytes", report.bytes_saved());
    } else {
        println!("  Store not compacted; the deletion is undone on next open");
    }
    Ok(())
}

fn print_table(records: &[Record]) {
    println!("{:>8}  {:<24}  {:>8}  {}", "ID", "NAME", "GPA", "ACTIVE");
    for record in records {
        println!(
            "{:>8}  {:<24}  {:>8}  {}",
            record.id, record.name, record.score, record.active
        );
    }
}
