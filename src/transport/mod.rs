//! Transport module - TCP listener and connector.

mod tcp;

pub use tcp::{connect, TcpTransport};
