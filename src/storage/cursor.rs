//! Lazy, single-pass cursors over a shelf table.
//!
//! Each cursor walks the table in rowid (storage) order, fetching
//! [`PAGE_SIZE`] rows per query and resuming after the last rowid seen. The
//! cursor holds only a shared borrow of the connection, so the shelf cannot
//! be mutated while one is alive.

use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, Row};
use serde::de::DeserializeOwned;
use std::collections::VecDeque;
use std::marker::PhantomData;

use crate::codec::{Codec, CodecError};
use crate::error::{Result, ShelfError};

/// Rows fetched per page query.
pub const PAGE_SIZE: i64 = 256;

/// Bytes of a `val` cell.
///
/// Blob and text cells are both accepted, so values written as JSON text by
/// other tools still decode. NULL and numeric cells are codec errors.
pub(crate) fn stored_bytes(value: ValueRef<'_>) -> std::result::Result<Vec<u8>, CodecError> {
    match value {
        ValueRef::Blob(bytes) | ValueRef::Text(bytes) => Ok(bytes.to_vec()),
        other => Err(CodecError::NotBytes(other.data_type())),
    }
}

/// Keyset pager shared by all cursor kinds.
struct Pager<'a> {
    conn: &'a Connection,
    sql: &'a str,
    pattern: Option<String>,
    last_rowid: i64,
    exhausted: bool,
}

impl<'a> Pager<'a> {
    fn new(conn: &'a Connection, sql: &'a str, pattern: Option<String>) -> Self {
        Self {
            conn,
            sql,
            pattern,
            last_rowid: 0,
            exhausted: false,
        }
    }

    /// Fetch the next page. Column 0 of `sql` must be the rowid.
    fn next_page<T, F>(&mut self, mut map: F) -> Result<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        if self.exhausted {
            return Ok(Vec::new());
        }

        let mut stmt = self.conn.prepare_cached(self.sql)?;
        let mut last_rowid = self.last_rowid;
        let mut mapper = |row: &Row<'_>| {
            last_rowid = row.get(0)?;
            map(row)
        };
        let page = match &self.pattern {
            Some(pattern) => stmt
                .query_map(params![self.last_rowid, PAGE_SIZE, pattern], &mut mapper)?
                .collect::<rusqlite::Result<Vec<_>>>()?,
            None => stmt
                .query_map(params![self.last_rowid, PAGE_SIZE], &mut mapper)?
                .collect::<rusqlite::Result<Vec<_>>>()?,
        };

        tracing::trace!(rows = page.len(), after = self.last_rowid, "Fetched page");
        self.last_rowid = last_rowid;
        if (page.len() as i64) < PAGE_SIZE {
            self.exhausted = true;
        }
        Ok(page)
    }
}

/// Cursor over every key, returned by [`Shelf::keys`](crate::Shelf::keys).
pub struct Keys<'a> {
    pager: Pager<'a>,
    buffer: VecDeque<String>,
}

impl<'a> Keys<'a> {
    pub(crate) fn new(conn: &'a Connection, sql: &'a str) -> Self {
        Self {
            pager: Pager::new(conn, sql, None),
            buffer: VecDeque::new(),
        }
    }
}

impl Iterator for Keys<'_> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() {
            match self.pager.next_page(|row| row.get::<_, String>(1)) {
                Ok(page) => self.buffer.extend(page),
                Err(e) => {
                    self.pager.exhausted = true;
                    return Some(Err(e));
                }
            }
        }
        self.buffer.pop_front().map(Ok)
    }
}

/// Cursor over `(key, value)` pairs, returned by
/// [`Shelf::items`](crate::Shelf::items) and [`Shelf::regex`](crate::Shelf::regex).
///
/// Values are decoded as each pair is yielded. A row that fails to decode
/// yields [`ShelfError::Decode`] and the cursor moves on to the next row;
/// collecting into `Result<Vec<_>>` turns that into a failure of the whole
/// scan. A database error ends the cursor.
pub struct Items<'a, V, C> {
    pager: Pager<'a>,
    codec: &'a C,
    buffer: VecDeque<(String, std::result::Result<Vec<u8>, CodecError>)>,
    _value: PhantomData<fn() -> V>,
}

impl<'a, V, C> Items<'a, V, C> {
    pub(crate) fn new(
        conn: &'a Connection,
        sql: &'a str,
        codec: &'a C,
        pattern: Option<String>,
    ) -> Self {
        Self {
            pager: Pager::new(conn, sql, pattern),
            codec,
            buffer: VecDeque::new(),
            _value: PhantomData,
        }
    }
}

impl<V, C> Iterator for Items<'_, V, C>
where
    V: DeserializeOwned,
    C: Codec,
{
    type Item = Result<(String, V)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() {
            let fetched = self.pager.next_page(|row| {
                Ok((row.get::<_, String>(1)?, stored_bytes(row.get_ref(2)?)))
            });
            match fetched {
                Ok(page) => self.buffer.extend(page),
                Err(e) => {
                    self.pager.exhausted = true;
                    return Some(Err(e));
                }
            }
        }

        let (key, stored) = self.buffer.pop_front()?;
        Some(match stored.and_then(|bytes| self.codec.decode(&bytes)) {
            Ok(value) => Ok((key, value)),
            Err(source) => Err(ShelfError::Decode { key, source }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::JsonCodec;
    use crate::storage::regexp::{register_regexp, PatternCache};
    use crate::storage::schema::{initialize_schema, Statements};

    fn seeded(rows: usize) -> (Connection, Statements) {
        let conn = Connection::open_in_memory().unwrap();
        register_regexp(&conn, PatternCache::default()).unwrap();
        let statements = Statements::for_table("t");
        initialize_schema(&conn, &statements).unwrap();
        for i in 0..rows {
            let val = serde_json::to_vec(&i).unwrap();
            conn.execute(&statements.upsert, (i.to_string(), &val, &val))
                .unwrap();
        }
        (conn, statements)
    }

    #[test]
    fn test_keys_span_multiple_pages() {
        let rows = PAGE_SIZE as usize * 2 + 7;
        let (conn, statements) = seeded(rows);

        let keys: Vec<String> = Keys::new(&conn, &statements.page_keys)
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(keys.len(), rows);
        // Storage order is insertion order for a fresh table
        assert_eq!(keys[0], "0");
        assert_eq!(keys[rows - 1], (rows - 1).to_string());
    }

    #[test]
    fn test_exact_page_boundary() {
        let (conn, statements) = seeded(PAGE_SIZE as usize);
        let count = Keys::new(&conn, &statements.page_keys).count();
        assert_eq!(count, PAGE_SIZE as usize);
    }

    #[test]
    fn test_empty_table() {
        let (conn, statements) = seeded(0);
        assert_eq!(Keys::new(&conn, &statements.page_keys).count(), 0);
    }

    #[test]
    fn test_items_decode_and_match() {
        let (conn, statements) = seeded(300);
        let codec = JsonCodec;

        let matched: Vec<(String, usize)> = Items::new(
            &conn,
            &statements.page_matches,
            &codec,
            Some("^2.5$".to_string()),
        )
        .collect::<Result<_>>()
        .unwrap();
        let keys: Vec<&str> = matched.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["205", "215", "225", "235", "245", "255", "265", "275", "285", "295"]);
        assert!(matched.iter().all(|(k, v)| k == &v.to_string()));
    }

    #[test]
    fn test_undecodable_row_is_reported_per_row() {
        let (conn, statements) = seeded(3);
        conn.execute(&statements.upsert, ("1", b"\xff".as_slice(), b"\xff".as_slice()))
            .unwrap();
        let codec = JsonCodec;

        let results: Vec<Result<(String, usize)>> =
            Items::new(&conn, &statements.page_items, &codec, None).collect();
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(&results[1], Err(ShelfError::Decode { key, .. }) if key == "1"));
        assert!(results[2].is_ok());
    }

    #[test]
    fn test_text_and_null_cells_are_reported_per_row() {
        let (conn, statements) = seeded(0);
        conn.execute_batch(
            "INSERT INTO t (key, val) VALUES ('a', '\"x\"');
             INSERT INTO t (key, val) VALUES ('n', NULL);
             INSERT INTO t (key, val) VALUES ('i', 42);
             INSERT INTO t (key, val) VALUES ('z', CAST('\"y\"' AS BLOB));",
        )
        .unwrap();
        let codec = JsonCodec;

        let results: Vec<Result<(String, String)>> =
            Items::new(&conn, &statements.page_items, &codec, None).collect();
        assert_eq!(results.len(), 4);
        assert_eq!(results[0].as_ref().unwrap(), &("a".to_string(), "x".to_string()));
        assert!(matches!(
            &results[1],
            Err(ShelfError::Decode { key, source: CodecError::NotBytes(_) }) if key == "n"
        ));
        assert!(matches!(
            &results[2],
            Err(ShelfError::Decode { key, source: CodecError::NotBytes(_) }) if key == "i"
        ));
        assert_eq!(results[3].as_ref().unwrap(), &("z".to_string(), "y".to_string()));
    }
}
