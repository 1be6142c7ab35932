//! MsgPack codec using `rmp-serde`.
//!
//! Frame bodies and typed payloads are encoded with `to_vec_named`, so
//! structs travel as maps keyed by field name. A peer that knows fewer
//! fields than the sender still decodes the ones it knows.
//!
//! # Example
//!
//! ```
//! use namedrpc::codec::MsgPackCodec;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Greeting {
//!     name: String,
//! }
//!
//! let msg = Greeting { name: "world".to_string() };
//! let encoded = MsgPackCodec::encode(&msg).unwrap();
//! let decoded: Greeting = MsgPackCodec::decode(&encoded).unwrap();
//! assert_eq!(decoded, msg);
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// MessagePack codec for frame bodies and typed payloads.
pub struct MsgPackCodec;

impl MsgPackCodec {
    /// Encode a value, structs as maps.
    #[inline]
    pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec_named(value)?)
    }

    /// Decode a value.
    ///
    /// # Errors
    ///
    /// [`RpcError::MsgPackDecode`](crate::RpcError::MsgPackDecode) if the
    /// bytes are not valid MsgPack for `T`.
    #[inline]
    pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}
