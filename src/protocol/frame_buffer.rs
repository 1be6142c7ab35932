//! Frame buffer for accumulating partial reads.
//!
//! Uses `bytes::BytesMut` for zero-copy buffer management.
//! Implements a state machine for handling fragmented frames:
//! - `WaitingForPrefix`: Need at least 4 bytes
//! - `WaitingForBody`: Prefix parsed, need N more body bytes
//!
//! # Example
//!
//! ```
//! use namedrpc::protocol::{build_frame, FrameBuffer};
//!
//! let mut buffer = FrameBuffer::new();
//! let bytes = build_frame(b"body").unwrap();
//!
//! buffer.extend(&bytes[..2]);
//! assert!(buffer.try_extract_one().unwrap().is_none());
//!
//! buffer.extend(&bytes[2..]);
//! let body = buffer.try_extract_one().unwrap().unwrap();
//! assert_eq!(&body[..], b"body");
//! ```

use bytes::{Bytes, BytesMut};

use super::wire_format::{decode_prefix, validate_length, DEFAULT_MAX_FRAME_SIZE, PREFIX_SIZE};
use crate::error::Result;

/// State machine for frame parsing.
#[derive(Debug, Clone, Copy)]
enum State {
    /// Waiting for a complete length prefix.
    WaitingForPrefix,
    /// Prefix parsed, waiting for body bytes.
    WaitingForBody { remaining: u32 },
}

/// Buffer for accumulating incoming bytes and extracting complete frame bodies.
pub struct FrameBuffer {
    /// Accumulated bytes from socket reads.
    buffer: BytesMut,
    /// Current parsing state.
    state: State,
    /// Maximum allowed body size.
    max_frame_size: u32,
}

impl FrameBuffer {
    /// Create a new frame buffer with default settings.
    ///
    /// Default capacity: 8 KiB, max frame: 16 MiB.
    pub fn new() -> Self {
        Self::with_max_frame_size(DEFAULT_MAX_FRAME_SIZE)
    }

    /// Create a new frame buffer with a custom max frame size.
    pub fn with_max_frame_size(max_frame_size: u32) -> Self {
        Self {
            buffer: BytesMut::with_capacity(8 * 1024),
            state: State::WaitingForPrefix,
            max_frame_size,
        }
    }

    /// Try to extract a single frame body from the buffer.
    ///
    /// Returns:
    /// - `Ok(Some(body))` if a complete frame was extracted
    /// - `Ok(None)` if more data is needed
    /// - `Err(...)` on a protocol violation
    pub fn try_extract_one(&mut self) -> Result<Option<Bytes>> {
        loop {
            match self.state {
                State::WaitingForPrefix => {
                    let len = match decode_prefix(&self.buffer) {
                        Some(len) => len,
                        None => return Ok(None),
                    };
                    validate_length(len, self.max_frame_size)?;

                    let _ = self.buffer.split_to(PREFIX_SIZE);
                    if len == 0 {
                        return Ok(Some(Bytes::new()));
                    }
                    self.state = State::WaitingForBody { remaining: len };
                }

                State::WaitingForBody { remaining } => {
                    let remaining = remaining as usize;
                    if self.buffer.len() < remaining {
                        return Ok(None);
                    }

                    let body = self.buffer.split_to(remaining).freeze();
                    self.state = State::WaitingForPrefix;
                    return Ok(Some(body));
                }
            }
        }
    }

    /// Append data to the buffer without extracting frames.
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Whether a frame has been started but not completed.
    ///
    /// EOF in this state means the peer truncated a frame.
    pub fn is_mid_frame(&self) -> bool {
        matches!(self.state, State::WaitingForBody { .. }) || !self.buffer.is_empty()
    }

    /// Get the number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    #[cfg(test)]
    fn state_name(&self) -> &'static str {
        match self.state {
            State::WaitingForPrefix => "WaitingForPrefix",
            State::WaitingForBody { .. } => "WaitingForBody",
        }
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RpcError;
    use crate::protocol::build_frame;

    /// Append `data` and drain every complete frame body.
    fn feed(buffer: &mut FrameBuffer, data: &[u8]) -> Result<Vec<Bytes>> {
        buffer.extend(data);
        let mut bodies = Vec::new();
        while let Some(body) = buffer.try_extract_one()? {
            bodies.push(body);
        }
        Ok(bodies)
    }

    #[test]
    fn test_single_complete_frame() {
        let mut buffer = FrameBuffer::new();
        let bodies = feed(&mut buffer, &build_frame(b"hello").unwrap()).unwrap();

        assert_eq!(bodies.len(), 1);
        assert_eq!(&bodies[0][..], b"hello");
        assert!(buffer.is_empty());
        assert!(!buffer.is_mid_frame());
    }

    #[test]
    fn test_multiple_frames_in_one_push() {
        let mut buffer = FrameBuffer::new();
        let mut combined = Vec::new();
        combined.extend(build_frame(b"first").unwrap());
        combined.extend(build_frame(b"second").unwrap());
        combined.extend(build_frame(b"third").unwrap());

        let bodies = feed(&mut buffer, &combined).unwrap();

        assert_eq!(bodies.len(), 3);
        assert_eq!(&bodies[0][..], b"first");
        assert_eq!(&bodies[1][..], b"second");
        assert_eq!(&bodies[2][..], b"third");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_fragmented_prefix() {
        let mut buffer = FrameBuffer::new();
        let bytes = build_frame(b"test").unwrap();

        assert!(feed(&mut buffer, &bytes[..2]).unwrap().is_empty());
        assert_eq!(buffer.state_name(), "WaitingForPrefix");
        assert!(buffer.is_mid_frame());

        let bodies = feed(&mut buffer, &bytes[2..]).unwrap();
        assert_eq!(bodies.len(), 1);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_fragmented_body() {
        let mut buffer = FrameBuffer::new();
        let body = b"this is a longer body that will be fragmented";
        let bytes = build_frame(body).unwrap();

        let partial = PREFIX_SIZE + 10;
        assert!(feed(&mut buffer, &bytes[..partial]).unwrap().is_empty());
        assert_eq!(buffer.state_name(), "WaitingForBody");

        let bodies = feed(&mut buffer, &bytes[partial..]).unwrap();
        assert_eq!(&bodies[0][..], body);
        assert_eq!(buffer.state_name(), "WaitingForPrefix");
    }

    #[test]
    fn test_byte_by_byte() {
        let mut buffer = FrameBuffer::new();
        let bytes = build_frame(b"drip").unwrap();

        let mut bodies = Vec::new();
        for b in &bytes {
            bodies.extend(feed(&mut buffer, std::slice::from_ref(b)).unwrap());
        }
        assert_eq!(bodies.len(), 1);
        assert_eq!(&bodies[0][..], b"drip");
    }

    #[test]
    fn test_empty_body() {
        let mut buffer = FrameBuffer::new();
        let bodies = feed(&mut buffer, &[0, 0, 0, 0]).unwrap();

        assert_eq!(bodies.len(), 1);
        assert!(bodies[0].is_empty());
    }

    #[test]
    fn test_oversized_frame_rejected() {
        let mut buffer = FrameBuffer::with_max_frame_size(8);
        let err = feed(&mut buffer, &build_frame(&[0u8; 9]).unwrap()).unwrap_err();
        assert!(matches!(err, RpcError::Protocol(_)));
    }
}
