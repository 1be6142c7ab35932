//! Client stub.
//!
//! A [`Client`] hides connection management and framing behind a
//! direct-call-shaped API. It keeps at most one TCP connection, opened on
//! first use and reused afterwards. Each call holds the connection for its
//! full round trip, so concurrent callers sharing one client never
//! interleave frames.
//!
//! # Example
//!
//! ```ignore
//! use namedrpc::Client;
//!
//! #[tokio::main]
//! async fn main() -> namedrpc::Result<()> {
//!     let client = Client::connect("127.0.0.1:1234").await?;
//!     let reply = client.call("Echo.Say", b"world".to_vec()).await?;
//!     assert_eq!(&reply[..], b"hello, world");
//!
//!     let doubled: i64 = client.call_typed("Arith.Double", &21i64).await?;
//!     assert_eq!(doubled, 42);
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use crate::codec::{MsgPackCodec, WireCodec};
use crate::config::ClientConfig;
use crate::connection::Connection;
use crate::error::{Result, RpcError};
use crate::protocol::{CallFrame, ReplyFrame};
use crate::transport::connect;

/// Builder for configuring and creating a [`Client`].
pub struct ClientBuilder {
    addr: String,
    config: ClientConfig,
}

impl ClientBuilder {
    /// Create a new client builder for `addr` (`host:port`).
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            config: ClientConfig::default(),
        }
    }

    /// Bound connection establishment.
    ///
    /// Default: no timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = Some(timeout);
        self
    }

    /// Bound each round trip.
    ///
    /// Default: no timeout
    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.config.call_timeout = Some(timeout);
        self
    }

    /// Set the maximum accepted reply frame size.
    ///
    /// Default: 16 MiB
    pub fn max_frame_size(mut self, limit: u32) -> Self {
        self.config.max_frame_size = limit;
        self
    }

    /// Set the frame body encoding; must match the server.
    ///
    /// Default: MsgPack
    pub fn codec(mut self, codec: WireCodec) -> Self {
        self.config.codec = codec;
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Build a client that connects on first call.
    pub fn build(self) -> Client {
        Client {
            addr: self.addr,
            config: self.config,
            conn: Mutex::new(None),
        }
    }

    /// Build a client and connect immediately.
    pub async fn connect(self) -> Result<Client> {
        let client = self.build();
        let conn = client.open().await?;
        *client.conn.lock().await = Some(conn);
        Ok(client)
    }
}

/// Client stub for one remote address.
pub struct Client {
    addr: String,
    config: ClientConfig,
    conn: Mutex<Option<Connection<TcpStream>>>,
}

impl Client {
    /// Create a new client builder.
    pub fn builder(addr: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(addr)
    }

    /// Connect to `addr` with default configuration.
    pub async fn connect(addr: impl Into<String>) -> Result<Self> {
        ClientBuilder::new(addr).connect().await
    }

    /// The remote address.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// The client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Call `Service.Method` with a raw payload.
    ///
    /// # Errors
    ///
    /// - [`RpcError::Remote`] when the server replied with an error; the
    ///   connection stays open
    /// - [`RpcError::Io`], [`RpcError::Protocol`], [`RpcError::ConnectionClosed`]
    ///   or [`RpcError::Timeout`] on transport failure; the connection is
    ///   dropped and the next call reconnects
    pub async fn call(&self, method: &str, request: impl Into<Vec<u8>>) -> Result<Bytes> {
        let frame = CallFrame::new(method, request);
        let mut slot = self.conn.lock().await;

        tracing::debug!(method, addr = %self.addr, "Calling");

        // Out of the slot until the reply is read; a cancelled call drops it.
        let exchange = self.round_trip(slot.take(), &frame);
        let result = match self.config.call_timeout {
            Some(limit) => tokio::time::timeout(limit, exchange)
                .await
                .unwrap_or(Err(RpcError::Timeout(limit))),
            None => exchange.await,
        };

        match result {
            Ok((conn, reply)) => {
                *slot = Some(conn);
                reply.into_result().map(Bytes::from)
            }
            Err(e) => {
                tracing::debug!(method, "Dropping connection after error: {}", e);
                Err(e)
            }
        }
    }

    /// Call `Service.Method` with MsgPack-encoded request and response.
    pub async fn call_typed<Req, Resp>(&self, method: &str, request: &Req) -> Result<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let payload = MsgPackCodec::encode(request)?;
        let reply = self.call(method, payload).await?;
        MsgPackCodec::decode(&reply)
    }

    /// Whether a connection is currently open.
    pub async fn is_connected(&self) -> bool {
        self.conn.lock().await.is_some()
    }

    /// Close the connection, if any. A later call reconnects.
    pub async fn close(&self) -> Result<()> {
        let conn = self.conn.lock().await.take();
        if let Some(mut conn) = conn {
            conn.shutdown().await?;
        }
        Ok(())
    }

    async fn open(&self) -> Result<Connection<TcpStream>> {
        let stream = connect(self.addr.as_str(), self.config.connect_timeout).await?;
        tracing::debug!(addr = %self.addr, "Connected");
        Ok(Connection::new(stream, self.config.max_frame_size).with_codec(self.config.codec))
    }

    /// Write one call and read its reply, opening a connection if needed.
    ///
    /// The connection is handed back only after a complete reply.
    async fn round_trip(
        &self,
        conn: Option<Connection<TcpStream>>,
        frame: &CallFrame,
    ) -> Result<(Connection<TcpStream>, ReplyFrame)> {
        let mut conn = match conn {
            Some(conn) => conn,
            None => self.open().await?,
        };

        conn.write_call(frame).await?;
        let reply = conn.read_reply().await?;
        Ok((conn, reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_configuration() {
        let client = Client::builder("127.0.0.1:1234")
            .connect_timeout(Duration::from_secs(1))
            .call_timeout(Duration::from_secs(10))
            .max_frame_size(4096)
            .codec(WireCodec::Json)
            .build();

        assert_eq!(client.addr(), "127.0.0.1:1234");
        assert_eq!(client.config().connect_timeout, Some(Duration::from_secs(1)));
        assert_eq!(client.config().call_timeout, Some(Duration::from_secs(10)));
        assert_eq!(client.config().max_frame_size, 4096);
        assert_eq!(client.config().codec, WireCodec::Json);
    }

    #[tokio::test]
    async fn test_build_is_lazy() {
        let client = Client::builder("127.0.0.1:1").build();
        assert!(!client.is_connected().await);
        assert!(client.close().await.is_ok());
    }

    #[tokio::test]
    async fn test_call_connection_refused() {
        let addr = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };

        let client = Client::builder(addr.to_string()).build();
        let err = client.call("Echo.Say", b"x".to_vec()).await.unwrap_err();
        assert!(matches!(err, RpcError::Io(_)));
        assert!(!client.is_connected().await);
    }
}
