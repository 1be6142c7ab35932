//! `Service.Method` parsing.

/// A method string split into service and method names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodPath<'a> {
    /// Service name (everything before the last `.`).
    pub service: &'a str,
    /// Method name (everything after the last `.`).
    pub method: &'a str,
}

impl<'a> MethodPath<'a> {
    /// Split on the last `.`.
    ///
    /// Returns `None` when there is no dot or either side is empty.
    ///
    /// # Example
    ///
    /// ```
    /// use namedrpc::protocol::MethodPath;
    ///
    /// let path = MethodPath::parse("handler/HelloService.Hello").unwrap();
    /// assert_eq!(path.service, "handler/HelloService");
    /// assert_eq!(path.method, "Hello");
    ///
    /// assert!(MethodPath::parse("Hello").is_none());
    /// ```
    pub fn parse(full: &'a str) -> Option<Self> {
        let (service, method) = full.rsplit_once('.')?;
        if service.is_empty() || method.is_empty() {
            return None;
        }
        Some(Self { service, method })
    }
}
