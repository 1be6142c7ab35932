//! The hello service: a typed service definition, its registration
//! function, and a client stub.
//!
//! Requests and replies are MsgPack strings.
//!
//! # Example
//!
//! ```ignore
//! use namedrpc::hello::{register_hello_service, HelloServer, HelloServiceStub};
//! use namedrpc::handler::Registry;
//!
//! let registry = Registry::new();
//! register_hello_service(&registry, HelloServer)?;
//!
//! // ...serve the registry, then on the client side:
//! let stub = HelloServiceStub::connect("127.0.0.1:1234").await?;
//! assert_eq!(stub.hello("cc").await?, "hello, cc");
//! ```

use std::sync::Arc;

use crate::client::Client;
use crate::error::{HandlerError, Result};
use crate::handler::{Registry, Service};

/// Service name shared by the server registration and the client stub.
pub const HELLO_SERVICE_NAME: &str = "handler/HelloService";

/// Method name of the single hello method.
pub const HELLO_METHOD: &str = "Hello";

/// Behaviour a hello service implementation must provide.
pub trait HelloServicer: Send + Sync + 'static {
    /// Produce the greeting for `request`.
    fn hello(&self, request: String) -> std::result::Result<String, HandlerError>;
}

/// Default implementation: `"hello, " + request`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HelloServer;

impl HelloServicer for HelloServer {
    fn hello(&self, request: String) -> std::result::Result<String, HandlerError> {
        Ok(format!("hello, {}", request))
    }
}

/// Build the hello service around `servicer`.
pub fn hello_service<S: HelloServicer>(servicer: S) -> Result<Service> {
    let servicer = Arc::new(servicer);
    Service::builder(HELLO_SERVICE_NAME)
        .handle_typed(HELLO_METHOD, move |request: String| {
            let servicer = servicer.clone();
            async move { servicer.hello(request) }
        })
        .build()
}

/// Register the hello service under [`HELLO_SERVICE_NAME`].
pub fn register_hello_service<S: HelloServicer>(registry: &Registry, servicer: S) -> Result<()> {
    registry.register(hello_service(servicer)?)
}

/// Client stub exposing the hello service as a plain method.
pub struct HelloServiceStub {
    client: Client,
}

impl HelloServiceStub {
    /// Wrap an existing client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connect to a hello server at `addr`.
    pub async fn connect(addr: impl Into<String>) -> Result<Self> {
        Ok(Self::new(Client::connect(addr).await?))
    }

    /// Call `handler/HelloService.Hello`.
    pub async fn hello(&self, request: &str) -> Result<String> {
        let method = format!("{}.{}", HELLO_SERVICE_NAME, HELLO_METHOD);
        self.client.call_typed(&method, request).await
    }

    /// The underlying client.
    pub fn client(&self) -> &Client {
        &self.client
    }
}
