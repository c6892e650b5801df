//! Configuration for opening a shelf.
//!
//! Supports:
//! - CLI arguments via clap (flatten [`ShelfConfig`] into a parser)
//! - Environment variable overrides
//! - Defaults matching the library constructors

use clap::Args;
use std::fmt;
use std::path::PathBuf;

use crate::storage::sync::SyncStrategy;

/// Marker understood as "ephemeral database" rather than a file path.
pub const MEMORY_MARKER: &str = ":memory:";

/// Shelf location and flush settings.
#[derive(Args, Debug, Clone)]
pub struct ShelfConfig {
    /// Shelf database file, or :memory: for an ephemeral shelf
    #[arg(short, long, env = "SHELF_LOCATION", default_value = MEMORY_MARKER)]
    pub location: String,

    /// Table holding this shelf's rows
    #[arg(short, long, env = "SHELF_TABLE", default_value = "shelf")]
    pub table: String,

    /// Writes buffered before an automatic commit
    #[arg(long, env = "SHELF_SYNC_THRESHOLD", default_value_t = SyncStrategy::DEFAULT_THRESHOLD)]
    pub sync_threshold: i64,
}

impl ShelfConfig {
    pub fn new(location: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            table: table.into(),
            sync_threshold: SyncStrategy::DEFAULT_THRESHOLD,
        }
    }

    #[must_use]
    pub fn with_sync_threshold(mut self, sync_threshold: i64) -> Self {
        self.sync_threshold = sync_threshold;
        self
    }
}

impl Default for ShelfConfig {
    fn default() -> Self {
        Self::new(MEMORY_MARKER, "shelf")
    }
}

/// Where the backing database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Private in-memory database; contents vanish when the connection closes.
    Memory,
    File(PathBuf),
}

impl Location {
    pub fn is_memory(&self) -> bool {
        matches!(self, Self::Memory)
    }
}

impl From<&str> for Location {
    fn from(s: &str) -> Self {
        if s == MEMORY_MARKER {
            Self::Memory
        } else {
            Self::File(PathBuf::from(s))
        }
    }
}

impl From<String> for Location {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<PathBuf> for Location {
    fn from(path: PathBuf) -> Self {
        Self::File(path)
    }
}

impl From<&std::path::Path> for Location {
    fn from(path: &std::path::Path) -> Self {
        Self::File(path.to_path_buf())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str(MEMORY_MARKER),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ShelfConfig::default();
        assert_eq!(config.location, ":memory:");
        assert_eq!(config.table, "shelf");
        assert_eq!(config.sync_threshold, 10_000);
    }

    #[test]
    fn test_location_parsing() {
        assert_eq!(Location::from(":memory:"), Location::Memory);
        assert_eq!(
            Location::from("data/shelf.db"),
            Location::File(PathBuf::from("data/shelf.db"))
        );
        assert_eq!(Location::Memory.to_string(), ":memory:");
    }
}
