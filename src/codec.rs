//! Value codecs.
//!
//! A shelf stores opaque blobs; the codec is the only thing that gives them
//! meaning. Two bindings ship with the crate:
//! - [`BincodeCodec`]: compact binary, accepts any serde data model shape
//! - [`JsonCodec`]: JSON text, rejects shapes JSON cannot express
//!   (for example maps keyed by sequences)

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Error raised at the codec boundary.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("bincode: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    /// The `val` cell held neither a blob nor text.
    #[error("stored value has type {0}, expected blob or text")]
    NotBytes(rusqlite::types::Type),
}

/// Converts values to and from the bytes stored in the `val` column.
///
/// Implementations must be pure: the same value always encodes to bytes
/// that decode back to an equal value.
pub trait Codec {
    /// Short name used in log output.
    fn name(&self) -> &'static str;

    fn encode<V: Serialize + ?Sized>(&self, value: &V) -> Result<Vec<u8>, CodecError>;

    fn decode<V: DeserializeOwned>(&self, bytes: &[u8]) -> Result<V, CodecError>;
}

/// Binary codec backed by bincode.
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl Codec for BincodeCodec {
    fn name(&self) -> &'static str {
        "bincode"
    }

    fn encode<V: Serialize + ?Sized>(&self, value: &V) -> Result<Vec<u8>, CodecError> {
        Ok(bincode::serialize(value)?)
    }

    fn decode<V: DeserializeOwned>(&self, bytes: &[u8]) -> Result<V, CodecError> {
        Ok(bincode::deserialize(bytes)?)
    }
}

/// JSON codec backed by serde_json. Values are stored as UTF-8 JSON text.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode<V: Serialize + ?Sized>(&self, value: &V) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(value)?)
    }

    fn decode<V: DeserializeOwned>(&self, bytes: &[u8]) -> Result<V, CodecError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
