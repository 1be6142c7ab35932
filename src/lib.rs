//! # namedrpc
//!
//! Name-registered request/response RPC over TCP.
//!
//! Servers register named services; clients call `Service.Method` by name
//! and get back a payload or an error.
//!
//! ## Architecture
//!
//! - **Registry**: service name → [`Service`] (a set of method handlers)
//! - **Transport**: TCP listener, one task per accepted connection
//! - **Dispatcher**: reads call frames, routes them, writes one reply each
//! - **Client**: one reused connection, exclusive per round trip
//!
//! Frames are a 4-byte big-endian length prefix followed by a MsgPack body.
//!
//! ## Example
//!
//! ```ignore
//! use bytes::Bytes;
//! use namedrpc::{Client, Server, Service};
//! use namedrpc::transport::TcpTransport;
//!
//! #[tokio::main]
//! async fn main() -> namedrpc::Result<()> {
//!     let server = Server::builder()
//!         .service(
//!             Service::builder("Echo")
//!                 .handle("Say", |p: Bytes| async move {
//!                     Ok(Bytes::from([b"hello, ".as_slice(), &p].concat()))
//!                 })
//!                 .build()?,
//!         )?
//!         .build();
//!
//!     let listener = TcpTransport::bind("127.0.0.1:0").await?;
//!     let addr = listener.local_addr()?;
//!     tokio::spawn(async move { server.serve(listener).await });
//!
//!     let client = Client::connect(addr.to_string()).await?;
//!     let reply = client.call("Echo.Say", b"world".to_vec()).await?;
//!     assert_eq!(&reply[..], b"hello, world");
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod config;
pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod hello;
pub mod protocol;
pub mod transport;

mod client;
mod server;

pub use client::{Client, ClientBuilder};
pub use codec::WireCodec;
pub use config::{ClientConfig, ServerConfig};
pub use error::{HandlerError, Result, RpcError};
pub use handler::{Handler, Registry, Service};
pub use protocol::{RemoteError, RemoteErrorKind};
pub use server::{Server, ServerBuilder};
