//! Per-connection call dispatch.
//!
//! Reads call frames one at a time, routes each to its service method, and
//! writes exactly one reply before reading the next call. Routing failures
//! and handler errors become error replies; framing failures end the
//! connection.

use std::sync::Arc;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::config::ServerConfig;
use crate::connection::Connection;
use crate::error::Result;
use crate::handler::Registry;
use crate::protocol::{CallFrame, MethodPath, RemoteError, ReplyFrame};

/// Route one call to its handler and build the reply.
pub async fn dispatch(registry: &Registry, call: CallFrame) -> ReplyFrame {
    let path = match MethodPath::parse(&call.method) {
        Some(path) => path,
        None => {
            tracing::debug!(method = %call.method, "Malformed method");
            return ReplyFrame::err(RemoteError::malformed_method(&call.method));
        }
    };

    let service = match registry.lookup(path.service) {
        Ok(service) => service,
        Err(_) => {
            tracing::debug!(service = path.service, "Service not found");
            return ReplyFrame::err(RemoteError::service_not_found(path.service));
        }
    };

    let handler = match service.method(path.method) {
        Some(handler) => handler,
        None => {
            tracing::debug!(method = %call.method, "Method not found");
            return ReplyFrame::err(RemoteError::method_not_found(&call.method));
        }
    };

    match handler.call(Bytes::from(call.body)).await {
        Ok(body) => ReplyFrame::ok(body.to_vec()),
        Err(e) => {
            tracing::debug!(method = %call.method, error = %e, "Handler returned error");
            ReplyFrame::err(RemoteError::handler(e.message()))
        }
    }
}

/// Serve calls on one connection until the peer closes it.
///
/// Returns `Ok(())` on a clean close between frames. Protocol, I/O and idle
/// timeout errors are returned after the connection is dropped; they never
/// affect other connections.
pub async fn serve_connection<S>(
    stream: S,
    registry: Arc<Registry>,
    config: ServerConfig,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut conn = Connection::new(stream, config.max_frame_size).with_codec(config.codec);

    loop {
        let call = match conn.read_call(config.idle_timeout).await? {
            Some(call) => call,
            None => return Ok(()),
        };

        let reply = dispatch(&registry, call).await;
        conn.write_reply(&reply).await?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::MsgPackCodec;
    use crate::error::{HandlerError, RpcError};
    use crate::handler::Service;
    use crate::protocol::{RemoteErrorKind, DEFAULT_MAX_FRAME_SIZE};
    use std::time::Duration;
    use tokio::io::{duplex, AsyncWriteExt};

    fn test_registry() -> Arc<Registry> {
        let registry = Registry::new();
        registry
            .register(
                Service::builder("Echo")
                    .handle("Say", |payload: Bytes| async move {
                        let mut out = b"hello, ".to_vec();
                        out.extend_from_slice(&payload);
                        Ok(Bytes::from(out))
                    })
                    .handle("Fail", |_: Bytes| async move {
                        Err::<Bytes, _>(HandlerError::new("always fails"))
                    })
                    .build()
                    .unwrap(),
            )
            .unwrap();
        registry
            .register(
                Service::builder("math.Arith")
                    .handle_typed("Double", |n: i64| async move { Ok(n * 2) })
                    .build()
                    .unwrap(),
            )
            .unwrap();
        Arc::new(registry)
    }

    #[tokio::test]
    async fn test_dispatch_success() {
        let registry = test_registry();
        let reply = dispatch(&registry, CallFrame::new("Echo.Say", b"world".to_vec())).await;
        assert!(reply.error.is_none());
        assert_eq!(reply.body, b"hello, world");
    }

    #[tokio::test]
    async fn test_dispatch_service_with_dots() {
        let registry = test_registry();
        let body = MsgPackCodec::encode(&21i64).unwrap();
        let reply = dispatch(&registry, CallFrame::new("math.Arith.Double", body)).await;
        let value: i64 = MsgPackCodec::decode(&reply.body).unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_dispatch_malformed_method() {
        let registry = test_registry();
        let reply = dispatch(&registry, CallFrame::new("EchoSay", Vec::<u8>::new())).await;
        let err = reply.error.unwrap();
        assert_eq!(err.kind, RemoteErrorKind::MalformedMethod);
        assert!(err.message.starts_with("malformed method"));
    }

    #[tokio::test]
    async fn test_dispatch_service_not_found() {
        let registry = test_registry();
        let reply = dispatch(&registry, CallFrame::new("Nope.Say", Vec::<u8>::new())).await;
        let err = reply.error.unwrap();
        assert_eq!(err.kind, RemoteErrorKind::ServiceNotFound);
        assert!(err.message.starts_with("service not found"));
        assert!(reply.body.is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_method_not_found() {
        let registry = test_registry();
        let reply = dispatch(&registry, CallFrame::new("Echo.Shout", Vec::<u8>::new())).await;
        assert_eq!(reply.error.unwrap().kind, RemoteErrorKind::MethodNotFound);
    }

    #[tokio::test]
    async fn test_dispatch_handler_error() {
        let registry = test_registry();
        let reply = dispatch(&registry, CallFrame::new("Echo.Fail", b"x".to_vec())).await;
        let err = reply.error.unwrap();
        assert_eq!(err.kind, RemoteErrorKind::Handler);
        assert_eq!(err.message, "always fails");
        assert!(reply.body.is_empty());
    }

    #[tokio::test]
    async fn test_serve_connection_strict_alternation() {
        let registry = test_registry();
        let (client, server) = duplex(4096);
        let task = tokio::spawn(serve_connection(server, registry, ServerConfig::default()));

        let mut conn = Connection::new(client, DEFAULT_MAX_FRAME_SIZE);
        for name in ["a", "b", "c"] {
            conn.write_call(&CallFrame::new("Echo.Say", name.as_bytes().to_vec()))
                .await
                .unwrap();
            let reply = conn.read_reply().await.unwrap();
            assert_eq!(reply.body, format!("hello, {}", name).into_bytes());
        }

        // Errors keep the connection usable
        conn.write_call(&CallFrame::new("Nope.Say", Vec::<u8>::new()))
            .await
            .unwrap();
        assert!(conn.read_reply().await.unwrap().error.is_some());
        conn.write_call(&CallFrame::new("Echo.Say", b"again".to_vec()))
            .await
            .unwrap();
        assert_eq!(conn.read_reply().await.unwrap().body, b"hello, again");

        drop(conn);
        assert!(task.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_serve_connection_protocol_error_closes() {
        let registry = test_registry();
        let (mut client, server) = duplex(4096);
        let task = tokio::spawn(serve_connection(server, registry, ServerConfig::default()));

        // Valid prefix, garbage body
        client.write_all(&[0, 0, 0, 2, 0xC1, 0xC1]).await.unwrap();

        let result = task.await.unwrap();
        assert!(matches!(result, Err(RpcError::Protocol(_))));
    }

    #[tokio::test]
    async fn test_serve_connection_oversized_frame() {
        let registry = test_registry();
        let (mut client, server) = duplex(4096);
        let config = ServerConfig {
            max_frame_size: 16,
            ..ServerConfig::default()
        };
        let task = tokio::spawn(serve_connection(server, registry, config));

        client.write_all(&[0, 0, 1, 0]).await.unwrap();

        let result = task.await.unwrap();
        assert!(matches!(result, Err(RpcError::Protocol(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_serve_connection_idle_timeout() {
        let registry = test_registry();
        let (_client, server) = duplex(4096);
        let config = ServerConfig {
            idle_timeout: Some(Duration::from_millis(20)),
            ..ServerConfig::default()
        };

        let result = serve_connection(server, registry, config).await;
        assert!(matches!(result, Err(RpcError::Timeout(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_timeout_restarts_after_each_call() {
        let (client, server) = duplex(4096);
        let config = ServerConfig {
            idle_timeout: Some(Duration::from_millis(50)),
            ..ServerConfig::default()
        };
        let task = tokio::spawn(serve_connection(server, test_registry(), config));

        let mut conn = Connection::new(client, DEFAULT_MAX_FRAME_SIZE);
        for _ in 0..3 {
            tokio::time::sleep(Duration::from_millis(30)).await;
            conn.write_call(&CallFrame::new("Echo.Say", b"x".to_vec()))
                .await
                .unwrap();
            assert!(conn.read_reply().await.unwrap().error.is_none());
        }

        assert!(matches!(task.await.unwrap(), Err(RpcError::Timeout(_))));
    }
}
