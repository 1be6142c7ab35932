//! Error types for namedrpc.

use std::time::Duration;

use thiserror::Error;

use crate::protocol::RemoteError;

/// Main error type for all namedrpc operations.
#[derive(Debug, Error)]
pub enum RpcError {
    /// I/O error on the underlying connection or listener.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Peer closed the connection while a reply was expected.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Protocol error (bad length prefix, oversized frame, undecodable body).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// No service registered under the given name.
    #[error("Service not found: {0}")]
    NotFound(String),

    /// A service with this name is already registered.
    #[error("Service already registered: {0}")]
    DuplicateName(String),

    /// Service definition rejected at registration time.
    #[error("Invalid service: {0}")]
    InvalidService(String),

    /// Error reported by the remote side in a reply frame.
    #[error("Remote error: {0}")]
    Remote(RemoteError),

    /// MsgPack serialization error.
    #[error("MsgPack encode error: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),

    /// MsgPack deserialization error.
    #[error("MsgPack decode error: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Operation did not finish within the configured bound.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

impl RpcError {
    /// Whether this error leaves the connection in an unusable state.
    ///
    /// Remote errors are carried inside a well-formed reply, so the
    /// connection that produced them can still be used.
    pub fn is_connection_fatal(&self) -> bool {
        matches!(
            self,
            RpcError::Io(_)
                | RpcError::ConnectionClosed
                | RpcError::Protocol(_)
                | RpcError::Timeout(_)
        )
    }

    /// Whether the remote side reported an unknown service or method.
    pub fn is_not_found(&self) -> bool {
        match self {
            RpcError::NotFound(_) => true,
            RpcError::Remote(remote) => remote.is_not_found(),
            _ => false,
        }
    }
}

/// Result type alias using RpcError.
pub type Result<T> = std::result::Result<T, RpcError>;

/// Business-logic failure returned by a handler.
///
/// The message is sent back to the caller in the reply frame and the
/// connection stays open.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    /// Create a handler error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<RpcError> for HandlerError {
    fn from(err: RpcError) -> Self {
        Self::new(err.to_string())
    }
}
