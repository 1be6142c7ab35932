//! JSON codec using `serde_json`.
//!
//! Byte payloads marked `serde_bytes` go out as arrays of numbers, so a
//! client in any language with a JSON library and a socket can speak the
//! wire protocol.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// JSON codec for frame bodies.
pub struct JsonCodec;

impl JsonCodec {
    /// Encode a value as compact JSON.
    #[inline]
    pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }

    /// Decode a value from JSON.
    #[inline]
    pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
