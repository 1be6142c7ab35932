//! Server builder and accept loop.
//!
//! The [`ServerBuilder`] collects services into a [`Registry`]; the
//! [`Server`] accepts TCP connections and runs one dispatch task per
//! connection. Tasks share only the registry.
//!
//! # Example
//!
//! ```ignore
//! use bytes::Bytes;
//! use namedrpc::{Server, Service};
//! use namedrpc::transport::TcpTransport;
//!
//! #[tokio::main]
//! async fn main() -> namedrpc::Result<()> {
//!     let server = Server::builder()
//!         .service(
//!             Service::builder("Echo")
//!                 .handle("Say", |p: Bytes| async move { Ok(p) })
//!                 .build()?,
//!         )?
//!         .build();
//!
//!     let listener = TcpTransport::bind("127.0.0.1:1234").await?;
//!     server.serve(listener).await
//! }
//! ```

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;

use crate::codec::WireCodec;
use crate::config::ServerConfig;
use crate::dispatcher::serve_connection;
use crate::error::{Result, RpcError};
use crate::handler::{Registry, Service};
use crate::transport::TcpTransport;

/// Pause after a failed accept before trying again.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Builder for configuring and creating a [`Server`].
pub struct ServerBuilder {
    registry: Registry,
    config: ServerConfig,
}

impl ServerBuilder {
    /// Create a new server builder.
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            config: ServerConfig::default(),
        }
    }

    /// Register a service.
    ///
    /// # Errors
    ///
    /// [`RpcError::DuplicateName`] if a service with the same name exists.
    pub fn service(self, service: Service) -> Result<Self> {
        self.registry.register(service)?;
        Ok(self)
    }

    /// Set the maximum accepted call frame size.
    ///
    /// Default: 16 MiB
    pub fn max_frame_size(mut self, limit: u32) -> Self {
        self.config.max_frame_size = limit;
        self
    }

    /// Close connections that send no call for `timeout`.
    ///
    /// Default: no timeout
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = Some(timeout);
        self
    }

    /// Set the frame body encoding.
    ///
    /// Default: MsgPack
    pub fn codec(mut self, codec: WireCodec) -> Self {
        self.config.codec = codec;
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the server.
    pub fn build(self) -> Server {
        Server::new(Arc::new(self.registry), self.config)
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A server dispatching calls against a shared registry.
#[derive(Clone)]
pub struct Server {
    registry: Arc<Registry>,
    config: ServerConfig,
}

impl Server {
    /// Create a new server builder.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Create a server from an existing registry.
    pub fn new(registry: Arc<Registry>, config: ServerConfig) -> Self {
        Self { registry, config }
    }

    /// The shared registry.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// The server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Accept connections forever.
    pub async fn serve(&self, listener: TcpTransport) -> Result<()> {
        self.serve_with_shutdown(listener, std::future::pending())
            .await
    }

    /// Accept connections until `signal` resolves.
    ///
    /// Connections already accepted keep running until their peers close
    /// them.
    pub async fn serve_with_shutdown<F>(&self, listener: TcpTransport, signal: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(signal);

        loop {
            tokio::select! {
                _ = &mut signal => {
                    tracing::info!("Shutdown signal received, no longer accepting");
                    return Ok(());
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => self.spawn_connection(stream, peer),
                    Err(e) => back_off_after_accept_error(&e).await,
                },
            }
        }
    }

    /// Run one connection on its own task.
    fn spawn_connection(&self, stream: TcpStream, peer: SocketAddr) {
        let registry = self.registry.clone();
        let config = self.config.clone();

        tracing::info!(%peer, "Accepted connection");

        tokio::spawn(async move {
            match serve_connection(stream, registry, config).await {
                Ok(()) => tracing::debug!(%peer, "Connection closed"),
                Err(e @ (RpcError::Protocol(_) | RpcError::Timeout(_))) => {
                    tracing::warn!(%peer, "Dropping connection: {}", e);
                }
                Err(e) => tracing::error!(%peer, "Connection error: {}", e),
            }
        });
    }
}

/// Log an accept failure and wait before the next accept.
///
/// Errors such as EMFILE persist across retries.
async fn back_off_after_accept_error(err: &RpcError) {
    tracing::warn!("Accept error: {}, retrying in {:?}", err, ACCEPT_ERROR_BACKOFF);
    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
}
