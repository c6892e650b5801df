//! SQLite storage layer for shelves.
//!
//! Provides:
//! - Table schema and statement text
//! - `REGEXP` function registration
//! - Write-count flush policy
//! - Keyset-paged cursors for iteration and pattern scans

pub mod cursor;
pub mod regexp;
pub mod schema;
pub mod sync;
