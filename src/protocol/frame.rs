//! Call and reply frames.
//!
//! Frame bodies are MsgPack maps with named fields; payloads are carried
//! as MsgPack `bin` values.
//!
//! # Example
//!
//! ```
//! use namedrpc::protocol::{CallFrame, ReplyFrame};
//!
//! let call = CallFrame::new("Echo.Say", b"world".to_vec());
//! let decoded = CallFrame::decode(&call.encode().unwrap()).unwrap();
//! assert_eq!(decoded.method, "Echo.Say");
//!
//! let reply = ReplyFrame::ok(b"hello, world".to_vec());
//! assert!(reply.error.is_none());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use super::wire_format::{encode_prefix, PREFIX_SIZE};
use crate::codec::WireCodec;
use crate::error::{Result, RpcError};

/// A request: fully qualified `Service.Method` plus the request payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallFrame {
    /// Target in `Service.Method` form.
    pub method: String,
    /// Opaque request payload.
    #[serde(with = "serde_bytes")]
    pub body: Vec<u8>,
}

impl CallFrame {
    /// Create a new call frame.
    pub fn new(method: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            method: method.into(),
            body: body.into(),
        }
    }

    /// Encode the frame body (without length prefix) as MsgPack.
    pub fn encode(&self) -> Result<Vec<u8>> {
        self.encode_with(WireCodec::MsgPack)
    }

    /// Encode the frame body with `codec`.
    pub fn encode_with(&self, codec: WireCodec) -> Result<Vec<u8>> {
        codec.encode(self)
    }

    /// Decode a MsgPack frame body.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Self::decode_with(WireCodec::MsgPack, bytes)
    }

    /// Decode a frame body written with `codec`.
    ///
    /// Any decode failure is reported as a protocol error.
    pub fn decode_with(codec: WireCodec, bytes: &[u8]) -> Result<Self> {
        codec
            .decode(bytes)
            .map_err(|e| RpcError::Protocol(format!("Invalid call frame: {}", e)))
    }
}

/// Category of an error carried in a reply frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteErrorKind {
    /// The method string was not of the form `Service.Method`.
    MalformedMethod,
    /// No service registered under the requested name.
    ServiceNotFound,
    /// The service exists but has no such method.
    MethodNotFound,
    /// The handler returned an error.
    Handler,
}

/// An error reported by the remote side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteError {
    /// Error category.
    pub kind: RemoteErrorKind,
    /// Human-readable message.
    pub message: String,
}

impl RemoteError {
    /// Create a remote error.
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// `malformed method: <method>`
    pub fn malformed_method(method: &str) -> Self {
        Self::new(
            RemoteErrorKind::MalformedMethod,
            format!("malformed method: {}", method),
        )
    }

    /// `service not found: <service>`
    pub fn service_not_found(service: &str) -> Self {
        Self::new(
            RemoteErrorKind::ServiceNotFound,
            format!("service not found: {}", service),
        )
    }

    /// `method not found: <Service.Method>`
    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            RemoteErrorKind::MethodNotFound,
            format!("method not found: {}", method),
        )
    }

    /// An error produced by a handler, message passed through unchanged.
    pub fn handler(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Handler, message)
    }

    /// Whether the target service or method does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.kind,
            RemoteErrorKind::ServiceNotFound | RemoteErrorKind::MethodNotFound
        )
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for RemoteError {}

/// A response: either a payload or an error, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyFrame {
    /// Response payload (empty when `error` is set).
    #[serde(with = "serde_bytes")]
    pub body: Vec<u8>,
    /// Error reported by the dispatcher or the handler.
    pub error: Option<RemoteError>,
}

impl ReplyFrame {
    /// Successful reply.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            error: None,
        }
    }

    /// Error reply with an empty body.
    pub fn err(error: RemoteError) -> Self {
        Self {
            body: Vec::new(),
            error: Some(error),
        }
    }

    /// Encode the frame body (without length prefix) as MsgPack.
    pub fn encode(&self) -> Result<Vec<u8>> {
        self.encode_with(WireCodec::MsgPack)
    }

    /// Encode the frame body with `codec`.
    pub fn encode_with(&self, codec: WireCodec) -> Result<Vec<u8>> {
        codec.encode(self)
    }

    /// Decode a MsgPack frame body.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Self::decode_with(WireCodec::MsgPack, bytes)
    }

    /// Decode a frame body written with `codec`.
    pub fn decode_with(codec: WireCodec, bytes: &[u8]) -> Result<Self> {
        codec
            .decode(bytes)
            .map_err(|e| RpcError::Protocol(format!("Invalid reply frame: {}", e)))
    }

    /// Turn the reply into the caller-facing result.
    pub fn into_result(self) -> Result<Vec<u8>> {
        match self.error {
            Some(err) => Err(RpcError::Remote(err)),
            None => Ok(self.body),
        }
    }
}

/// Build a complete frame (prefix + body) as a single byte vector.
///
/// # Example
///
/// ```
/// use namedrpc::protocol::{build_frame, PREFIX_SIZE};
///
/// let bytes = build_frame(b"abc").unwrap();
/// assert_eq!(bytes.len(), PREFIX_SIZE + 3);
/// assert_eq!(&bytes[..PREFIX_SIZE], &[0, 0, 0, 3]);
/// ```
pub fn build_frame(body: &[u8]) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(PREFIX_SIZE + body.len());
    buf.extend_from_slice(&encode_prefix(body.len())?);
    buf.extend_from_slice(body);
    Ok(buf)
}
