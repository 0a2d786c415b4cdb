//! RosterDB CLI
//!
//! Command-line access to a RosterDB store file.
//!
//! # Commands
//!
//! - `add` / `edit` - Write a record
//! - `find` / `delete` - Select records by id, name, score or active flag
//! - `import` - Load rows from a delimited text export
//! - `backup` / `restore` - Snapshot live records and bring them back
//! - `compact` - Drop dead lines from the store
//! - `inspect` - Display store statistics

mod commands;

use clap::{ArgAction, Args, Parser, Subcommand};
use commands::record::Selector;
use rosterdb_core::{Config, ImportPolicy, Record};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// RosterDB command-line store tools.
#[derive(Parser)]
#[command(name = "rosterdb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the store file
    #[arg(global = true, short, long, default_value = "input.jsonl")]
    path: PathBuf,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Full record given on the command line.
#[derive(Args)]
struct RecordArgs {
    /// Record id
    #[arg(long, allow_negative_numbers = true)]
    id: i64,

    /// Name
    #[arg(long)]
    name: String,

    /// Score (stored as `gpa`)
    #[arg(long, alias = "gpa", allow_negative_numbers = true)]
    score: f64,

    /// Active flag
    #[arg(long, action = ArgAction::Set)]
    active: bool,
}

impl From<RecordArgs> for Record {
    fn from(args: RecordArgs) -> Self {
        Record::new(args.id, args.name, args.score, args.active)
    }
}

/// Exactly one attribute to select records by.
#[derive(Args)]
#[group(required = true, multiple = false)]
struct SelectorArgs {
    /// Select by id
    #[arg(long, allow_negative_numbers = true)]
    id: Option<i64>,

    /// Select by exact name
    #[arg(long)]
    name: Option<String>,

    /// Select by exact score
    #[arg(long, alias = "gpa", allow_negative_numbers = true)]
    score: Option<f64>,

    /// Select by active flag
    #[arg(long)]
    active: Option<bool>,
}

impl SelectorArgs {
    fn into_selector(self) -> Option<Selector> {
        match (self.id, self.name, self.score, self.active) {
            (Some(id), _, _, _) => Some(Selector::Id(id)),
            (_, Some(name), _, _) => Some(Selector::Name(name)),
            (_, _, Some(score), _) => Some(Selector::Score(score)),
            (_, _, _, Some(active)) => Some(Selector::Active(active)),
            _ => None,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new record
    Add(RecordArgs),

    /// Replace the fields of an existing record
    Edit(RecordArgs),

    /// Find records
    Find {
        #[command(flatten)]
        selector: SelectorArgs,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Delete records and compact the store
    Delete {
        #[command(flatten)]
        selector: SelectorArgs,

        /// Leave dead lines in the file (the deletion is lost on next open)
        #[arg(long)]
        no_compact: bool,
    },

    /// Import rows from a delimited text file
    Import {
        /// Input file
        file: PathBuf,

        /// Cell delimiter
        #[arg(short, long, default_value = ",")]
        delimiter: char,

        /// The first row is data, not a header
        #[arg(long)]
        no_header: bool,

        /// Stop at the first row that cannot be added
        #[arg(long)]
        fail_fast: bool,
    },

    /// Write a snapshot of the live records
    Backup {
        /// Snapshot directory
        #[arg(short, long, default_value = "backups")]
        dir: PathBuf,
    },

    /// Replace the store with a snapshot
    Restore {
        /// Snapshot file
        snapshot: PathBuf,
    },

    /// Rewrite the store with only live lines
    Compact,

    /// Display store statistics
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let path = cli.path;
    match cli.command {
        Commands::Add(args) => commands::record::add(&path, args.into())?,
        Commands::Edit(args) => commands::record::edit(&path, args.into())?,
        Commands::Find { selector, format } => {
            let selector = selector.into_selector().ok_or("a selector is required")?;
            commands::record::find(&path, &selector, &format)?;
        }
        Commands::Delete {
            selector,
            no_compact,
        } => {
            let selector = selector.into_selector().ok_or("a selector is required")?;
            commands::record::delete(&path, &selector, !no_compact)?;
        }
        Commands::Import {
            file,
            delimiter,
            no_header,
            fail_fast,
        } => {
            let policy = if fail_fast {
                ImportPolicy::FailFast
            } else {
                ImportPolicy::Continue
            };
            let config = Config::default().import_policy(policy);
            commands::import::run(&path, config, &file, delimiter, !no_header)?;
        }
        Commands::Backup { dir } => commands::backup::create(&path, &dir)?,
        Commands::Restore { snapshot } => commands::backup::restore(&path, &snapshot)?,
        Commands::Compact => commands::compact::run(&path)?,
        Commands::Inspect { format } => commands::inspect::run(&path, &format)?,
        Commands::Version => {
            println!("RosterDB CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("RosterDB Core v{}", rosterdb_core::VERSION);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn find_takes_exactly_one_selector() {
        assert!(Cli::try_parse_from(["rosterdb", "find"]).is_err());
        assert!(Cli::try_parse_from(["rosterdb", "find", "--id", "1", "--name", "A"]).is_err());

        let cli = Cli::try_parse_from(["rosterdb", "find", "--score", "-1.5"]).unwrap();
        let Commands::Find { selector, .. } = cli.command else {
            panic!("expected find");
        };
        assert!(matches!(selector.into_selector(), Some(Selector::Score(s)) if s == -1.5));
    }

    #[test]
    fn add_requires_explicit_active_value() {
        let cli = Cli::try_parse_from([
            "rosterdb", "add", "--id", "1", "--name", "Ada", "--gpa", "3.5", "--active", "false",
        ])
        .unwrap();
        assert_eq!(cli.path, PathBuf::from("input.jsonl"));

        let Commands::Add(args) = cli.command else {
            panic!("expected add");
        };
        assert_eq!(Record::from(args), Record::new(1, "Ada", 3.5, false));
    }
}
