//! The shelf: a dictionary-like view over one SQLite table.
//!
//! A [`Shelf`] is constructed closed. [`Shelf::open`] connects, registers the
//! `REGEXP` function and creates the table on first use. Writes run inside a
//! deferred transaction that stays open until the [`SyncStrategy`] asks for a
//! commit, [`Shelf::sync`] is called, or the shelf is closed. Reads never
//! commit.
//!
//! A shelf owns exactly one connection and is not meant to be shared across
//! threads; callers serialize access. The borrow rules already prevent
//! mutating a shelf while one of its cursors is alive.

use rusqlite::{Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use tracing::{debug, info, trace, warn};

use crate::codec::{BincodeCodec, Codec, JsonCodec};
use crate::config::{Location, ShelfConfig};
use crate::error::{Result, ShelfError};
use crate::storage::cursor::{stored_bytes, Items, Keys};
use crate::storage::regexp::{register_regexp, PatternCache};
use crate::storage::schema::{initialize_schema, validate_table_name, Statements};
use crate::storage::sync::SyncStrategy;

/// Connection lifecycle.
enum State {
    Closed,
    Open(Connection),
}

/// Persistent key-value mapping from `String` keys to values of type `V`,
/// encoded with codec `C`.
pub struct Shelf<V, C = BincodeCodec> {
    location: Location,
    table: String,
    statements: Statements,
    codec: C,
    state: State,
    schema_ready: bool,
    sync_strategy: SyncStrategy,
    patterns: PatternCache,
    _value: PhantomData<fn() -> V>,
}

/// Shelf storing values with the binary codec.
pub type BinaryShelf<V> = Shelf<V, BincodeCodec>;

/// Shelf storing values as JSON text.
pub type JsonShelf<V> = Shelf<V, JsonCodec>;

impl<V> Shelf<V, BincodeCodec> {
    /// Closed binary shelf with the default flush threshold.
    pub fn binary(location: impl Into<Location>, table: &str) -> Result<Self> {
        Self::new(location, table, BincodeCodec)
    }
}

impl<V> Shelf<V, JsonCodec> {
    /// Closed JSON shelf with the default flush threshold.
    pub fn json(location: impl Into<Location>, table: &str) -> Result<Self> {
        Self::new(location, table, JsonCodec)
    }
}

impl<V, C> Shelf<V, C> {
    /// Create a closed shelf with the default flush threshold.
    ///
    /// # Errors
    ///
    /// Returns [`ShelfError::Configuration`] if `table` is not a plain
    /// identifier.
    pub fn new(location: impl Into<Location>, table: &str, codec: C) -> Result<Self> {
        Self::with_sync_strategy(location, table, codec, SyncStrategy::default())
    }

    /// Create a closed shelf from a [`ShelfConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ShelfError::Configuration`] for a bad table name or a
    /// non-positive `sync_threshold`.
    pub fn with_config(config: &ShelfConfig, codec: C) -> Result<Self> {
        let sync = SyncStrategy::new(config.sync_threshold)?;
        Self::with_sync_strategy(config.location.as_str(), &config.table, codec, sync)
    }

    pub fn with_sync_strategy(
        location: impl Into<Location>,
        table: &str,
        codec: C,
        sync: SyncStrategy,
    ) -> Result<Self> {
        validate_table_name(table)?;
        Ok(Self {
            location: location.into(),
            table: table.to_string(),
            statements: Statements::for_table(table),
            codec,
            state: State::Closed,
            schema_ready: false,
            sync_strategy: sync,
            patterns: PatternCache::default(),
            _value: PhantomData,
        })
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, State::Open(_))
    }

    /// Writes executed since the last commit.
    pub fn pending_writes(&self) -> u64 {
        self.sync_strategy.pending()
    }

    /// Connect to the backing database.
    ///
    /// Registers `REGEXP` on the new connection and, the first time only,
    /// creates the table. Opening an already open shelf does nothing.
    pub fn open(&mut self) -> Result<()> {
        if self.is_open() {
            debug!(location = %self.location, table = %self.table, "Shelf already open");
            return Ok(());
        }

        let conn = match &self.location {
            Location::Memory => Connection::open_in_memory()?,
            Location::File(path) => Connection::open(path)?,
        };
        register_regexp(&conn, self.patterns.clone())?;

        if !self.schema_ready {
            initialize_schema(&conn, &self.statements)?;
            self.schema_ready = true;
            debug!(table = %self.table, "Schema initialized");
        }

        self.state = State::Open(conn);
        info!(location = %self.location, table = %self.table, "Shelf opened");
        Ok(())
    }

    /// Commit pending writes and release the connection.
    ///
    /// The shelf can be opened again afterwards.
    pub fn close(&mut self) -> Result<()> {
        self.sync()?;

        let State::Open(conn) = std::mem::replace(&mut self.state, State::Closed) else {
            return Err(ShelfError::NotOpen);
        };
        if let Err((conn, e)) = conn.close() {
            self.state = State::Open(conn);
            return Err(e.into());
        }

        // An in-memory database dies with its connection, table included
        if self.location.is_memory() {
            self.schema_ready = false;
        }
        info!(location = %self.location, table = %self.table, "Shelf closed");
        Ok(())
    }

    /// Commit the current transaction, if any.
    pub fn sync(&mut self) -> Result<()> {
        let conn = self.connection()?;
        if !conn.is_autocommit() {
            conn.execute_batch("COMMIT")?;
            debug!(table = %self.table, writes = self.sync_strategy.pending(), "Committed");
        }
        self.sync_strategy.reset();
        Ok(())
    }

    /// Open the shelf and return a guard that closes it when dropped.
    pub fn session(&mut self) -> Result<ShelfSession<'_, V, C>> {
        self.open()?;
        Ok(ShelfSession { shelf: self })
    }

    fn connection(&self) -> Result<&Connection> {
        match &self.state {
            State::Open(conn) => Ok(conn),
            State::Closed => Err(ShelfError::NotOpen),
        }
    }

    /// Run one write statement inside the deferred transaction.
    fn execute_write(
        &mut self,
        statement: fn(&Statements) -> &str,
        params: impl rusqlite::Params,
    ) -> Result<()> {
        let conn = self.connection()?;
        if conn.is_autocommit() {
            conn.execute_batch("BEGIN DEFERRED")?;
        }
        conn.prepare_cached(statement(&self.statements))?
            .execute(params)?;

        if self.sync_strategy.on_write() {
            debug!(table = %self.table, threshold = self.sync_strategy.threshold(), "Flush threshold crossed");
            // The counter resets only once the commit succeeds
            self.sync()?;
        }
        Ok(())
    }
}

impl<V, C: Codec> Shelf<V, C> {
    /// Look up `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ShelfError::KeyNotFound`] when there is no row for `key`
    /// and also when its stored bytes do not decode.
    pub fn get(&self, key: &str) -> Result<V>
    where
        V: DeserializeOwned,
    {
        let conn = self.connection()?;
        let stored = conn
            .prepare_cached(&self.statements.select_val)?
            .query_row([key], |row| Ok(stored_bytes(row.get_ref(0)?)))
            .optional()?;

        let not_found = || ShelfError::KeyNotFound {
            key: key.to_string(),
        };
        let stored = stored.ok_or_else(not_found)?;
        stored.and_then(|bytes| self.codec.decode(&bytes)).map_err(|e| {
            warn!(key, codec = self.codec.name(), error = %e, "Stored value does not decode");
            not_found()
        })
    }

    /// Insert or overwrite `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ShelfError::Encode`] if the codec cannot represent `value`;
    /// nothing is written in that case.
    pub fn set(&mut self, key: &str, value: &V) -> Result<()>
    where
        V: Serialize,
    {
        self.connection()?;
        let encoded = self.codec.encode(value).map_err(ShelfError::Encode)?;
        trace!(key, bytes = encoded.len(), "Upsert");

        self.execute_write(|s| s.upsert.as_str(), (key, &encoded, &encoded))
    }

    /// Remove `key` if present. Removing a missing key is not an error.
    pub fn delete(&mut self, key: &str) -> Result<()> {
        trace!(key, "Delete");
        self.execute_write(|s| s.delete.as_str(), [key])
    }

    pub fn contains(&self, key: &str) -> Result<bool> {
        let count: i64 = self
            .connection()?
            .prepare_cached(&self.statements.count_key)?
            .query_row([key], |row| row.get(0))?;
        Ok(count > 0)
    }

    /// Number of rows, including uncommitted writes.
    pub fn len(&self) -> Result<u64> {
        let count: i64 = self
            .connection()?
            .prepare_cached(&self.statements.count_all)?
            .query_row([], |row| row.get(0))?;
        Ok(count.unsigned_abs())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Lazily iterate all keys in storage order.
    pub fn keys(&self) -> Result<Keys<'_>> {
        Ok(Keys::new(self.connection()?, &self.statements.page_keys))
    }

    /// Lazily iterate all `(key, value)` pairs in storage order.
    pub fn items(&self) -> Result<Items<'_, V, C>> {
        Ok(Items::new(
            self.connection()?,
            &self.statements.page_items,
            &self.codec,
            None,
        ))
    }

    /// Full table scan yielding the pairs whose key matches `pattern`.
    ///
    /// The match is an unanchored regular expression search, so `"5$"`
    /// selects keys ending in `5`. The pattern is compiled once here and
    /// reused by every page query of the scan. There is no index; every row
    /// is visited.
    ///
    /// # Errors
    ///
    /// Returns [`ShelfError::Pattern`] for a malformed pattern before any
    /// row is read.
    pub fn regex(&self, pattern: &str) -> Result<Items<'_, V, C>> {
        let conn = self.connection()?;
        self.patterns.compile(pattern)?;
        debug!(table = %self.table, pattern, "Full table scan");
        Ok(Items::new(
            conn,
            &self.statements.page_matches,
            &self.codec,
            Some(pattern.to_string()),
        ))
    }
}

impl<V, C> Drop for Shelf<V, C> {
    fn drop(&mut self) {
        if self.is_open() {
            if let Err(e) = self.close() {
                warn!(location = %self.location, table = %self.table, error = %e, "Failed to close shelf on drop");
            }
        }
    }
}

/// Scoped use of an open shelf.
///
/// Created by [`Shelf::session`]. Dereferences to the shelf; dropping it
/// commits and closes on every exit path. Use [`finish`](Self::finish) to
/// observe the close result.
pub struct ShelfSession<'a, V, C> {
    shelf: &'a mut Shelf<V, C>,
}

impl<V, C> ShelfSession<'_, V, C> {
    /// Commit, close, and report the outcome.
    pub fn finish(self) -> Result<()> {
        self.shelf.close()
    }
}

impl<V, C> Deref for ShelfSession<'_, V, C> {
    type Target = Shelf<V, C>;

    fn deref(&self) -> &Self::Target {
        &*self.shelf
    }
}

impl<V, C> DerefMut for ShelfSession<'_, V, C> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.shelf
    }
}

impl<V, C> Drop for ShelfSession<'_, V, C> {
    fn drop(&mut self) {
        if self.shelf.is_open() {
            if let Err(e) = self.shelf.close() {
                warn!(table = %self.shelf.table, error = %e, "Failed to close shelf session");
            }
        }
    }
}
