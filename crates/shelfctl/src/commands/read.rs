//! Read-only commands: get, contains, keys, items, grep, count.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use sqlshelf::{JsonShelf, Result as ShelfResult};

use crate::OutputFormat;

#[derive(Serialize)]
struct Entry {
    key: String,
    value: Value,
}

#[derive(Serialize)]
struct KeysOutput {
    keys: Vec<String>,
    total: usize,
}

#[derive(Serialize)]
struct EntriesOutput {
    entries: Vec<Entry>,
    total: usize,
}

pub fn get(shelf: &JsonShelf<Value>, key: &str, format: OutputFormat) -> Result<()> {
    let value = shelf.get(key)?;
    match format {
        OutputFormat::Text => println!("{value}"),
        OutputFormat::Json => {
            let entry = Entry {
                key: key.to_string(),
                value,
            };
            println!("{}", serde_json::to_string_pretty(&entry)?);
        }
    }
    Ok(())
}

pub fn contains(shelf: &JsonShelf<Value>, key: &str, format: OutputFormat) -> Result<()> {
    let present = shelf.contains(key)?;
    match format {
        OutputFormat::Text => println!("{present}"),
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "key": key, "present": present }));
        }
    }
    Ok(())
}

pub fn keys(shelf: &JsonShelf<Value>, format: OutputFormat) -> Result<()> {
    let keys = shelf
        .keys()?
        .collect::<ShelfResult<Vec<_>>>()
        .context("failed to list keys")?;

    match format {
        OutputFormat::Text => {
            for key in &keys {
                println!("{key}");
            }
        }
        OutputFormat::Json => {
            let output = KeysOutput {
                total: keys.len(),
                keys,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

pub fn items(shelf: &JsonShelf<Value>, format: OutputFormat) -> Result<()> {
    let entries = shelf
        .items()?
        .collect::<ShelfResult<Vec<_>>>()
        .context("failed to list items")?;
    print_entries(entries, format)
}

pub fn grep(shelf: &JsonShelf<Value>, pattern: &str, format: OutputFormat) -> Result<()> {
    let entries = shelf
        .regex(pattern)?
        .collect::<ShelfResult<Vec<_>>>()
        .with_context(|| format!("failed to scan for {pattern}"))?;
    print_entries(entries, format)
}

pub fn count(shelf: &JsonShelf<Value>, format: OutputFormat) -> Result<()> {
    let total = shelf.len()?;
    match format {
        OutputFormat::Text => println!("{total}"),
        OutputFormat::Json => println!("{}", serde_json::json!({ "total": total })),
    }
    Ok(())
}

fn print_entries(entries: Vec<(String, Value)>, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for (key, value) in &entries {
                println!("{key}\t{value}");
            }
        }
        OutputFormat::Json => {
            let output = EntriesOutput {
                total: entries.len(),
                entries: entries
                    .into_iter()
                    .map(|(key, value)| Entry { key, value })
                    .collect(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}
