//! Sqlshelf: a persistent, dictionary-like key-value shelf on SQLite.
//!
//! String keys map to values of any serde-serializable type. Values are
//! encoded by a pluggable [`Codec`] and stored as blobs in a single table.
//! Writes are batched into one deferred transaction and committed every
//! `sync_threshold` writes, on [`Shelf::sync`], or on close.
//!
//! # Modules
//!
//! - [`codec`]: Value encoders (bincode, JSON)
//! - [`config`]: CLI and environment configuration
//! - [`error`]: Error types
//! - [`observability`]: Tracing setup
//! - [`shelf`]: The shelf itself and its scoped session guard
//! - [`storage`]: Schema, SQL text, regexp predicate, flush policy, cursors
//!
//! # Example
//!
//! ```
//! use sqlshelf::JsonShelf;
//! use std::collections::BTreeMap;
//!
//! let mut shelf: JsonShelf<BTreeMap<String, String>> = JsonShelf::json(":memory:", "demo")?;
//! let mut session = shelf.session()?;
//! let mut value = BTreeMap::new();
//! value.insert("a".to_string(), "Hello".to_string());
//! session.set("greeting", &value)?;
//! assert_eq!(session.get("greeting")?, value);
//! session.finish()?;
//! # Ok::<(), sqlshelf::ShelfError>(())
//! ```

// Lint configuration
#![warn(clippy::all)]
#![allow(
    clippy::module_name_repetitions,    // shelf::ShelfSession is fine
    clippy::must_use_candidate,         // Not all functions need #[must_use]
    clippy::missing_errors_doc          // Error docs can be verbose
)]

pub mod codec;
pub mod config;
pub mod error;
pub mod observability;
pub mod shelf;
pub mod storage;

pub use codec::{BincodeCodec, Codec, CodecError, JsonCodec};
pub use config::{Location, ShelfConfig};
pub use error::{Result, ShelfError};
pub use shelf::{BinaryShelf, JsonShelf, Shelf, ShelfSession};
pub use storage::cursor::{Items, Keys};
pub use storage::sync::SyncStrategy;
