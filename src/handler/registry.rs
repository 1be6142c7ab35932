//! Service registry for dispatching calls by service name.
//!
//! The registry is built once at startup and shared by reference with the
//! server. Lookups take a read lock and clone an `Arc`, so no lock is held
//! while a handler runs.
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use namedrpc::handler::{Registry, Service};
//!
//! let registry = Registry::new();
//! registry
//!     .register(
//!         Service::builder("Echo")
//!             .handle("Say", |p: Bytes| async move { Ok(p) })
//!             .build()
//!             .unwrap(),
//!     )
//!     .unwrap();
//!
//! assert!(registry.lookup("Echo").is_ok());
//! assert!(registry.lookup("Nope").is_err());
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::Service;
use crate::error::{Result, RpcError};

/// Registry mapping service names to services.
#[derive(Default)]
pub struct Registry {
    services: RwLock<HashMap<String, Arc<Service>>>,
}

impl Registry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service under its name.
    ///
    /// # Errors
    ///
    /// [`RpcError::DuplicateName`] if the name is taken; the existing
    /// service stays registered.
    pub fn register(&self, service: Service) -> Result<()> {
        let mut services = self.services.write();
        if services.contains_key(service.name()) {
            return Err(RpcError::DuplicateName(service.name().to_string()));
        }

        tracing::debug!(
            service = service.name(),
            methods = ?service.method_names(),
            "Registered service"
        );
        services.insert(service.name().to_string(), Arc::new(service));
        Ok(())
    }

    /// Look up a service by name.
    ///
    /// # Errors
    ///
    /// [`RpcError::NotFound`] if no service has this name.
    pub fn lookup(&self, name: &str) -> Result<Arc<Service>> {
        self.services
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| RpcError::NotFound(name.to_string()))
    }

    /// Check whether a service is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.services.read().contains_key(name)
    }

    /// Registered service names, sorted.
    pub fn service_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.services.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Number of registered services.
    pub fn len(&self) -> usize {
        self.services.read().len()
    }

    /// Check if no services are registered.
    pub fn is_empty(&self) -> bool {
        self.services.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::thread;

    fn constant_service(name: &str, reply: &'static [u8]) -> Service {
        Service::builder(name)
            .handle("Get", move |_: Bytes| async move { Ok(Bytes::from_static(reply)) })
            .build()
            .unwrap()
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = Registry::new();
        registry.register(constant_service("Echo", b"a")).unwrap();

        let service = registry.lookup("Echo").unwrap();
        assert_eq!(service.name(), "Echo");
        assert!(registry.contains("Echo"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_lookup_missing() {
        let registry = Registry::new();
        assert!(registry.is_empty());
        assert!(matches!(
            registry.lookup("nonexistent"),
            Err(RpcError::NotFound(name)) if name == "nonexistent"
        ));
    }

    #[tokio::test]
    async fn test_duplicate_name_keeps_first() {
        let registry = Registry::new();
        registry.register(constant_service("Echo", b"first")).unwrap();

        let err = registry
            .register(constant_service("Echo", b"second"))
            .unwrap_err();
        assert!(matches!(err, RpcError::DuplicateName(ref name) if name == "Echo"));

        let service = registry.lookup("Echo").unwrap();
        let out = service.method("Get").unwrap().call(Bytes::new()).await.unwrap();
        assert_eq!(&out[..], b"first");
    }

    #[test]
    fn test_service_names_sorted() {
        let registry = Registry::new();
        registry.register(constant_service("b/Svc", b"")).unwrap();
        registry.register(constant_service("a.Svc", b"")).unwrap();

        assert_eq!(registry.service_names(), vec!["a.Svc", "b/Svc"]);
    }

    #[test]
    fn test_concurrent_lookups() {
        let registry = Arc::new(Registry::new());
        registry.register(constant_service("Echo", b"")).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = registry.clone();
                thread::spawn(move || {
                    if i == 0 {
                        registry.register(constant_service("Late", b"")).unwrap();
                    }
                    for _ in 0..1000 {
                        assert!(registry.lookup("Echo").is_ok());
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }
        assert!(registry.contains("Late"));
    }
}
