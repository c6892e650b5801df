//! `REGEXP` SQL function.
//!
//! SQLite parses `X REGEXP Y` but ships no implementation; it rewrites the
//! operator to a call `regexp(Y, X)`, i.e. pattern first. Function
//! registrations live on the connection, so this runs on every open.

use regex::Regex;
use rusqlite::functions::FunctionFlags;
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use std::sync::{Arc, Mutex, PoisonError};

/// Most recently compiled pattern, shared between a shelf and the `regexp`
/// function registered on its connection.
///
/// A scan compiles its pattern once through [`PatternCache::compile`]; every
/// page query of that scan then finds it here.
#[derive(Debug, Clone, Default)]
pub struct PatternCache {
    last: Arc<Mutex<Option<Arc<Regex>>>>,
}

impl PatternCache {
    /// Return the compiled `pattern`, compiling only if it differs from the
    /// cached one.
    pub fn compile(&self, pattern: &str) -> Result<Arc<Regex>, regex::Error> {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(regex) = last.as_ref().filter(|r| r.as_str() == pattern) {
            return Ok(Arc::clone(regex));
        }
        let regex = Arc::new(Regex::new(pattern)?);
        *last = Some(Arc::clone(&regex));
        Ok(regex)
    }
}

/// Register `regexp(pattern, text)` on `conn`.
///
/// Matching is unanchored search: the pattern may occur anywhere in the
/// text. NULL text never matches.
pub fn register_regexp(conn: &Connection, cache: PatternCache) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "regexp",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        move |ctx| {
            let pattern = ctx
                .get_raw(0)
                .as_str()
                .map_err(|e| rusqlite::Error::UserFunctionError(e.into()))?;
            let regex = cache
                .compile(pattern)
                .map_err(|e| rusqlite::Error::UserFunctionError(e.into()))?;

            let text = ctx.get_raw(1);
            if matches!(text, ValueRef::Null) {
                return Ok(false);
            }
            let text = text
                .as_str()
                .map_err(|e| rusqlite::Error::UserFunctionError(e.into()))?;
            Ok(regex.is_match(text))
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(conn: &Connection, text: &str, pattern: &str) -> bool {
        conn.query_row("SELECT ?1 REGEXP ?2", (text, pattern), |row| row.get(0))
            .unwrap()
    }

    fn registered() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        register_regexp(&conn, PatternCache::default()).unwrap();
        conn
    }

    #[test]
    fn test_regexp_is_unanchored_search() {
        let conn = registered();

        assert!(matches(&conn, "15", "5$"));
        assert!(matches(&conn, "hello world", "o w"));
        assert!(!matches(&conn, "51", "5$"));
        assert!(!matches(&conn, "abc", "^b"));
    }

    #[test]
    fn test_regexp_function_call_order() {
        let conn = registered();

        let hit: bool = conn
            .query_row("SELECT regexp('^a+$', 'aaa')", [], |row| row.get(0))
            .unwrap();
        assert!(hit);
    }

    #[test]
    fn test_bad_pattern_errors_in_sql() {
        let conn = registered();

        let result: rusqlite::Result<bool> =
            conn.query_row("SELECT 'x' REGEXP '('", [], |row| row.get(0));
        assert!(result.is_err());
    }

    #[test]
    fn test_unregistered_connection_lacks_regexp() {
        let conn = Connection::open_in_memory().unwrap();
        let result: rusqlite::Result<bool> =
            conn.query_row("SELECT 'x' REGEXP 'x'", [], |row| row.get(0));
        assert!(result.is_err());
    }

    #[test]
    fn test_cache_reuses_compiled_pattern() {
        let cache = PatternCache::default();

        let first = cache.compile("5$").unwrap();
        let again = cache.compile("5$").unwrap();
        assert!(Arc::ptr_eq(&first, &again));

        let other = cache.compile("^1").unwrap();
        assert!(!Arc::ptr_eq(&first, &other));
        assert!(cache.compile("(").is_err());
        // A failed compile leaves the last good pattern cached
        assert!(Arc::ptr_eq(&other, &cache.compile("^1").unwrap()));
    }

    #[test]
    fn test_sql_calls_share_the_cache() {
        let cache = PatternCache::default();
        let conn = Connection::open_in_memory().unwrap();
        register_regexp(&conn, cache.clone()).unwrap();

        let compiled = cache.compile("^a").unwrap();
        assert!(matches(&conn, "abc", "^a"));
        assert!(matches(&conn, "axe", "^a"));
        assert!(Arc::ptr_eq(&compiled, &cache.compile("^a").unwrap()));
    }
}
