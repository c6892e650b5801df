//! Table schema and the SQL text for every row operation.
//!
//! Schema (one table per shelf):
//! - `key TEXT PRIMARY KEY NOT NULL`
//! - `val BLOB` holding codec output
//!
//! The table name is interpolated into statement text, so it is restricted
//! to `[A-Za-z_][A-Za-z0-9_]*` and double-quoted.

use rusqlite::Connection;

use crate::error::{Result, ShelfError};

/// Check that `name` is usable as an unescaped SQL identifier.
pub fn validate_table_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ShelfError::Configuration(format!(
            "Table name '{name}' must match [A-Za-z_][A-Za-z0-9_]*"
        )))
    }
}

/// Statement text for one shelf table, built once at construction.
#[derive(Debug, Clone)]
pub struct Statements {
    pub create_table: String,
    pub select_val: String,
    pub upsert: String,
    pub delete: String,
    pub count_key: String,
    pub count_all: String,
    pub page_keys: String,
    pub page_items: String,
    pub page_matches: String,
}

impl Statements {
    /// Build the statements for `table`. The name must already be validated.
    pub fn for_table(table: &str) -> Self {
        let t = format!("\"{table}\"");
        Self {
            create_table: format!(
                "CREATE TABLE IF NOT EXISTS {t} (key TEXT PRIMARY KEY NOT NULL, val BLOB)"
            ),
            select_val: format!("SELECT val FROM {t} WHERE key = ?1"),
            upsert: format!(
                "INSERT INTO {t} (key, val) VALUES (?1, ?2) ON CONFLICT(key) DO UPDATE SET val = ?3"
            ),
            delete: format!("DELETE FROM {t} WHERE key = ?1"),
            count_key: format!("SELECT COUNT(*) FROM {t} WHERE key = ?1"),
            count_all: format!("SELECT COUNT(*) FROM {t}"),
            // Cursors page through storage order by rowid
            page_keys: format!(
                "SELECT rowid, key FROM {t} WHERE rowid > ?1 ORDER BY rowid LIMIT ?2"
            ),
            page_items: format!(
                "SELECT rowid, key, val FROM {t} WHERE rowid > ?1 ORDER BY rowid LIMIT ?2"
            ),
            page_matches: format!(
                "SELECT rowid, key, val FROM {t} WHERE rowid > ?1 AND key REGEXP ?3 ORDER BY rowid LIMIT ?2"
            ),
        }
    }
}

/// Create the shelf table if needed.
///
/// Must run in autocommit mode so the DDL is durable before any row write.
pub fn initialize_schema(conn: &Connection, statements: &Statements) -> Result<()> {
    debug_assert!(conn.is_autocommit());
    conn.execute(&statements.create_table, [])?;
    Ok(())
}
