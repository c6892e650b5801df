//! shelfctl: Command-line interface for sqlshelf shelves.
//!
//! Reads and writes JSON values in a shelf file from the terminal. Every
//! invocation opens the shelf, runs one command, and commits on exit.

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use sqlshelf::observability::tracing::init_tracing;
use sqlshelf::{JsonCodec, JsonShelf, ShelfConfig};

/// Command-line interface for sqlshelf shelves.
#[derive(Parser)]
#[command(name = "shelfctl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    shelf: ShelfConfig,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("unknown output format: {}", s)),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the value stored under a key
    Get {
        key: String,
    },
    /// Store a JSON value under a key
    Set {
        key: String,
        /// JSON value text (or use --file)
        value: Option<String>,
        /// Read the JSON value from a file
        #[arg(short, long)]
        file: Option<String>,
    },
    /// Remove a key if present
    Delete {
        key: String,
    },
    /// Report whether a key is present
    Contains {
        key: String,
    },
    /// List all keys
    Keys,
    /// List all keys with their values
    Items,
    /// List entries whose key matches a regular expression
    Grep {
        pattern: String,
    },
    /// Count stored entries
    Count,
}

fn main() -> Result<()> {
    init_tracing("shelfctl", "warn");

    let cli = Cli::parse();

    let mut shelf: JsonShelf<Value> =
        JsonShelf::with_config(&cli.shelf, JsonCodec).context("invalid shelf configuration")?;
    let mut session = shelf
        .session()
        .with_context(|| format!("failed to open shelf at {}", cli.shelf.location))?;

    match cli.command {
        Commands::Get { key } => commands::read::get(&session, &key, cli.output)?,
        Commands::Set { key, value, file } => {
            commands::write::set(&mut session, &key, value, file, cli.output)?;
        }
        Commands::Delete { key } => commands::write::delete(&mut session, &key, cli.output)?,
        Commands::Contains { key } => commands::read::contains(&session, &key, cli.output)?,
        Commands::Keys => commands::read::keys(&session, cli.output)?,
        Commands::Items => commands::read::items(&session, cli.output)?,
        Commands::Grep { pattern } => commands::read::grep(&session, &pattern, cli.output)?,
        Commands::Count => commands::read::count(&session, cli.output)?,
    }

    session.finish().context("failed to close shelf")?;
    Ok(())
}
