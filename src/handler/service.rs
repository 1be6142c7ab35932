//! Handlers and named services.
//!
//! A [`Service`] is a named set of methods, each backed by a [`Handler`].
//! Closures are adapted with [`FnHandler`] (raw bytes in, raw bytes out) or
//! [`TypedHandler`] (MsgPack-decoded request, MsgPack-encoded response).
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use namedrpc::handler::Service;
//!
//! let echo = Service::builder("Echo")
//!     .handle("Say", |payload: Bytes| async move {
//!         let mut out = b"hello, ".to_vec();
//!         out.extend_from_slice(&payload);
//!         Ok(Bytes::from(out))
//!     })
//!     .handle_typed("Len", |s: String| async move { Ok(s.len() as u64) })
//!     .build()
//!     .unwrap();
//!
//! assert!(echo.method("Say").is_some());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::MsgPackCodec;
use crate::error::{HandlerError, Result, RpcError};

/// Result type for handler functions.
pub type HandlerResult = std::result::Result<Bytes, HandlerError>;

/// Boxed future for handler results.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Single-call capability invoked by the dispatcher.
pub trait Handler: Send + Sync + 'static {
    /// Handle a request payload, producing a response payload or an error.
    fn call(&self, payload: Bytes) -> BoxFuture<'static, HandlerResult>;
}

/// Adapts a `Fn(Bytes) -> Future<Output = HandlerResult>` closure.
pub struct FnHandler<F> {
    handler: F,
}

impl<F> FnHandler<F> {
    /// Create a new raw handler.
    pub fn new(handler: F) -> Self {
        Self { handler }
    }
}

impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(Bytes) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, payload: Bytes) -> BoxFuture<'static, HandlerResult> {
        Box::pin((self.handler)(payload))
    }
}

/// Wrapper that decodes the request and encodes the response with MsgPack.
pub struct TypedHandler<F, T, R, Fut>
where
    F: Fn(T) -> Fut + Send + Sync + 'static,
    T: DeserializeOwned + Send + 'static,
    R: Serialize + Send + 'static,
    Fut: Future<Output = std::result::Result<R, HandlerError>> + Send + 'static,
{
    handler: F,
    _phantom: PhantomData<fn(T) -> Fut>,
}

impl<F, T, R, Fut> TypedHandler<F, T, R, Fut>
where
    F: Fn(T) -> Fut + Send + Sync + 'static,
    T: DeserializeOwned + Send + 'static,
    R: Serialize + Send + 'static,
    Fut: Future<Output = std::result::Result<R, HandlerError>> + Send + 'static,
{
    /// Create a new typed handler.
    pub fn new(handler: F) -> Self {
        Self {
            handler,
            _phantom: PhantomData,
        }
    }
}

impl<F, T, R, Fut> Handler for TypedHandler<F, T, R, Fut>
where
    F: Fn(T) -> Fut + Send + Sync + 'static,
    T: DeserializeOwned + Send + 'static,
    R: Serialize + Send + 'static,
    Fut: Future<Output = std::result::Result<R, HandlerError>> + Send + 'static,
{
    fn call(&self, payload: Bytes) -> BoxFuture<'static, HandlerResult> {
        let request: T = match MsgPackCodec::decode(&payload) {
            Ok(v) => v,
            Err(e) => {
                let err = HandlerError::new(format!("invalid request payload: {}", e));
                return Box::pin(async move { Err(err) });
            }
        };

        let fut = (self.handler)(request);
        Box::pin(async move {
            let response = fut.await?;
            MsgPackCodec::encode(&response)
                .map(Bytes::from)
                .map_err(|e| HandlerError::new(format!("invalid response payload: {}", e)))
        })
    }
}

/// A named set of method handlers.
pub struct Service {
    name: String,
    methods: HashMap<String, Box<dyn Handler>>,
}

impl Service {
    /// Start building a service with the given name.
    pub fn builder(name: impl Into<String>) -> ServiceBuilder {
        ServiceBuilder::new(name)
    }

    /// The service name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get a method handler by name.
    pub fn method(&self, name: &str) -> Option<&dyn Handler> {
        self.methods.get(name).map(|h| h.as_ref())
    }

    /// Method names, sorted.
    pub fn method_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("name", &self.name)
            .field("methods", &self.method_names())
            .finish()
    }
}

/// Fluent builder for [`Service`].
///
/// Structural problems (bad names, duplicate methods, no methods) are
/// reported by [`ServiceBuilder::build`].
pub struct ServiceBuilder {
    name: String,
    methods: HashMap<String, Box<dyn Handler>>,
    error: Option<RpcError>,
}

impl ServiceBuilder {
    /// Create a new builder.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: HashMap::new(),
            error: None,
        }
    }

    /// Register a method backed by any [`Handler`].
    pub fn method<H: Handler>(mut self, name: &str, handler: H) -> Self {
        if self.error.is_some() {
            return self;
        }
        if let Err(e) = validate_method_name(&self.name, name) {
            self.error = Some(e);
            return self;
        }
        if self.methods.contains_key(name) {
            self.error = Some(RpcError::InvalidService(format!(
                "method {}.{} registered twice",
                self.name, name
            )));
            return self;
        }
        self.methods.insert(name.to_string(), Box::new(handler));
        self
    }

    /// Register a raw-bytes method.
    pub fn handle<F, Fut>(self, name: &str, handler: F) -> Self
    where
        F: Fn(Bytes) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.method(name, FnHandler::new(handler))
    }

    /// Register a method with MsgPack-typed request and response.
    pub fn handle_typed<F, T, R, Fut>(self, name: &str, handler: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        T: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        Fut: Future<Output = std::result::Result<R, HandlerError>> + Send + 'static,
    {
        self.method(name, TypedHandler::new(handler))
    }

    /// Validate and build the service.
    pub fn build(self) -> Result<Service> {
        if let Some(e) = self.error {
            return Err(e);
        }
        if self.name.is_empty() {
            return Err(RpcError::InvalidService("service name is empty".into()));
        }
        if self.methods.is_empty() {
            return Err(RpcError::InvalidService(format!(
                "service {} has no methods",
                self.name
            )));
        }
        Ok(Service {
            name: self.name,
            methods: self.methods,
        })
    }
}

fn validate_method_name(service: &str, method: &str) -> Result<()> {
    if method.is_empty() {
        return Err(RpcError::InvalidService(format!(
            "service {} has a method with an empty name",
            service
        )));
    }
    if method.contains('.') {
        return Err(RpcError::InvalidService(format!(
            "method name {:?} of service {} contains '.'",
            method, service
        )));
    }
    Ok(())
}
