//! Handler module - services, method handlers, and the registry.
//!
//! Provides:
//! - [`Handler`] - single-call capability: payload in, payload or error out
//! - [`Service`] - a named set of method handlers
//! - [`Registry`] - maps service names to services

mod registry;
mod service;

pub use registry::Registry;
pub use service::{
    BoxFuture, FnHandler, Handler, HandlerResult, Service, ServiceBuilder, TypedHandler,
};
