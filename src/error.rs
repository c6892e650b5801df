//! Error types for shelf operations.

use thiserror::Error;

use crate::codec::CodecError;

/// Result type alias using [`ShelfError`].
pub type Result<T> = std::result::Result<T, ShelfError>;

/// Unified error type for shelf operations.
#[derive(Debug, Error)]
pub enum ShelfError {
    /// A row operation, `sync()` or `close()` ran without a live connection.
    #[error("No connection established. Open shelf first")]
    NotOpen,

    /// Invalid construction parameters (flush threshold, table name).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No row for the key, or its stored value could not be decoded.
    #[error("Key {key} not found.")]
    KeyNotFound { key: String },

    /// The value has no representation under the active codec.
    #[error("Failed to encode value: {0}")]
    Encode(#[source] CodecError),

    /// A streamed row held bytes the active codec could not decode.
    #[error("Failed to decode value for key {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: CodecError,
    },

    /// Malformed search pattern passed to `regex()`.
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl ShelfError {
    /// True for the "missing or undecodable" outcome of `get()`.
    pub fn is_key_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ShelfError::NotOpen.to_string(),
            "No connection established. Open shelf first"
        );
        let err = ShelfError::KeyNotFound { key: "a".into() };
        assert_eq!(err.to_string(), "Key a not found.");
        assert!(err.is_key_not_found());
        assert!(!ShelfError::NotOpen.is_key_not_found());
    }
}
