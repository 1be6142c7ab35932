//! Wire format encoding and decoding.
//!
//! Every frame is a 4-byte length prefix followed by the frame body:
//! ```text
//! ┌──────────────┬──────────────────────────────┐
//! │ Body length  │ Body (MsgPack, named fields) │
//! │ 4 bytes      │ N bytes                      │
//! │ uint32 BE    │                              │
//! └──────────────┴──────────────────────────────┘
//! ```
//!
//! The prefix counts body bytes only.

use crate::error::{Result, RpcError};

/// Length prefix size in bytes (fixed, exactly 4).
pub const PREFIX_SIZE: usize = 4;

/// Default maximum frame body size (16 MiB).
pub const DEFAULT_MAX_FRAME_SIZE: u32 = 16 * 1024 * 1024;

/// Encode a body length as a big-endian prefix.
///
/// # Errors
///
/// Returns a protocol error if `len` does not fit in a `u32`.
///
/// # Example
///
/// ```
/// use namedrpc::protocol::encode_prefix;
///
/// assert_eq!(encode_prefix(258).unwrap(), [0, 0, 1, 2]);
/// ```
pub fn encode_prefix(len: usize) -> Result<[u8; PREFIX_SIZE]> {
    let len = u32::try_from(len)
        .map_err(|_| RpcError::Protocol(format!("Frame body of {} bytes is too large", len)))?;
    Ok(len.to_be_bytes())
}

/// Decode a big-endian length prefix.
///
/// Returns `None` if the buffer is too short.
#[inline]
pub fn decode_prefix(buf: &[u8]) -> Option<u32> {
    if buf.len() < PREFIX_SIZE {
        return None;
    }
    Some(u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]))
}

/// Check a decoded body length against the frame size limit.
pub fn validate_length(len: u32, max_frame_size: u32) -> Result<()> {
    if len > max_frame_size {
        return Err(RpcError::Protocol(format!(
            "Frame size {} exceeds maximum {}",
            len, max_frame_size
        )));
    }
    Ok(())
}
