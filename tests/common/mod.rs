//! Shared fixtures for shelf integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use tempfile::TempDir;

/// Test fixture that manages a temporary directory for shelf files.
///
/// The directory is removed when the fixture is dropped.
pub struct TestFixture {
    pub temp_dir: TempDir,
    pub db_path: PathBuf,
}

impl TestFixture {
    pub fn new() -> Self {
        sqlshelf::observability::tracing::init_test_tracing();
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let db_path = temp_dir.path().join("shelf.db");
        Self { temp_dir, db_path }
    }

    /// Count committed rows in `table` through an independent connection.
    pub fn committed_rows(&self, table: &str) -> i64 {
        let conn = rusqlite::Connection::open(&self.db_path).expect("failed to open db");
        conn.query_row(&format!("SELECT COUNT(*) FROM \"{table}\""), [], |row| {
            row.get(0)
        })
        .expect("failed to count rows")
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_creates_temp_dir() {
        let fixture = TestFixture::new();
        assert!(fixture.temp_dir.path().exists());
        assert!(fixture.db_path.ends_with("shelf.db"));
    }
}
