//! Protocol module - wire format, framing, and frame types.
//!
//! - 4-byte big-endian length prefix
//! - Frame buffer for accumulating partial reads
//! - Call/reply frame bodies and `Service.Method` parsing

mod frame;
mod frame_buffer;
mod method;
mod wire_format;

pub use frame::{build_frame, CallFrame, RemoteError, RemoteErrorKind, ReplyFrame};
pub use frame_buffer::FrameBuffer;
pub use method::MethodPath;
pub use wire_format::{
    decode_prefix, encode_prefix, validate_length, DEFAULT_MAX_FRAME_SIZE, PREFIX_SIZE,
};
