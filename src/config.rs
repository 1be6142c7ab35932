//! Server and client configuration.
//!
//! All timeouts are off by default: a stalled peer holds its connection
//! until it closes. Set them explicitly where that is not acceptable.

use std::time::Duration;

use crate::codec::WireCodec;
use crate::protocol::DEFAULT_MAX_FRAME_SIZE;

/// Server-side connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Largest accepted call frame body, in bytes.
    pub max_frame_size: u32,
    /// Close a connection that sends no call for this long.
    pub idle_timeout: Option<Duration>,
    /// Frame body encoding expected from clients.
    pub codec: WireCodec,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            idle_timeout: None,
            codec: WireCodec::MsgPack,
        }
    }
}

/// Client-side connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Largest accepted reply frame body, in bytes.
    pub max_frame_size: u32,
    /// Bound on establishing the TCP connection.
    pub connect_timeout: Option<Duration>,
    /// Bound on one full round trip (write call, read reply).
    pub call_timeout: Option<Duration>,
    /// Frame body encoding; must match the server's.
    pub codec: WireCodec,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            connect_timeout: None,
            call_timeout: None,
            codec: WireCodec::MsgPack,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_have_no_timeouts() {
        let server = ServerConfig::default();
        assert_eq!(server.max_frame_size, DEFAULT_MAX_FRAME_SIZE);
        assert!(server.idle_timeout.is_none());

        let client = ClientConfig::default();
        assert_eq!(client.max_frame_size, DEFAULT_MAX_FRAME_SIZE);
        assert!(client.connect_timeout.is_none());
        assert!(client.call_timeout.is_none());
        assert_eq!(client.codec, server.codec);
    }
}
