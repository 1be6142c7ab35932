//! Codec module - serialization for frame bodies and typed payloads.
//!
//! - [`MsgPackCodec`] - MessagePack using `rmp-serde` (`to_vec_named`)
//! - [`JsonCodec`] - JSON using `serde_json`
//! - [`WireCodec`] - which of the two encodes frame bodies on a connection
//!
//! Typed payloads (`call_typed`, `handle_typed`) are always MsgPack; the
//! wire codec only changes how call and reply frames are written.

mod json;
mod msgpack;

pub use json::JsonCodec;
pub use msgpack::MsgPackCodec;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// Frame body encoding used on a connection. Both peers must agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WireCodec {
    /// Named-field MessagePack, payloads as `bin`.
    #[default]
    MsgPack,
    /// JSON, payloads as arrays of byte values.
    Json,
}

impl WireCodec {
    /// Encode a frame body.
    pub fn encode<T: Serialize + ?Sized>(self, value: &T) -> Result<Vec<u8>> {
        match self {
            WireCodec::MsgPack => MsgPackCodec::encode(value),
            WireCodec::Json => JsonCodec::encode(value),
        }
    }

    /// Decode a frame body.
    pub fn decode<T: DeserializeOwned>(self, bytes: &[u8]) -> Result<T> {
        match self {
            WireCodec::MsgPack => MsgPackCodec::decode(bytes),
            WireCodec::Json => JsonCodec::decode(bytes),
        }
    }
}
