//! Mutating commands: set, delete.

use anyhow::{bail, Context, Result};
use serde_json::Value;
use sqlshelf::JsonShelf;

use crate::OutputFormat;

pub fn set(
    shelf: &mut JsonShelf<Value>,
    key: &str,
    value: Option<String>,
    file: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let text = match (value, file) {
        (Some(v), None) => v,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read file: {}", path))?,
        (Some(_), Some(_)) => bail!("cannot specify both value and --file"),
        (None, None) => bail!("must specify either value or --file"),
    };
    let value: Value = serde_json::from_str(&text).context("value is not valid JSON")?;

    shelf.set(key, &value)?;
    tracing::debug!(key, "Stored value");

    if format == OutputFormat::Json {
        println!("{}", serde_json::json!({ "key": key, "stored": true }));
    }
    Ok(())
}

pub fn delete(shelf: &mut JsonShelf<Value>, key: &str, format: OutputFormat) -> Result<()> {
    shelf.delete(key)?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::json!({ "key": key, "deleted": true }));
    }
    Ok(())
}
