// src/router.rs

use std::fmt;

use crate::service::{Mapping, RegistryError, RouteEntry, Servable};
use crate::{RpcError, RpcStream};

/// Errors that can occur while routing a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// No route is registered under this path
    UnknownRoute(String),

    /// The path was already registered by another service
    RouteAlreadyRegistered(String),

    /// A service failed to produce its mapping
    Registry(RegistryError),

    /// The adapter failed while serving the call
    Rpc(RpcError),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::UnknownRoute(path) => write!(f, "unknown route: {}", path),
            DispatchError::RouteAlreadyRegistered(path) => {
                write!(f, "route {} is already registered", path)
            }
            DispatchError::Registry(err) => write!(f, "registry error: {}", err),
            DispatchError::Rpc(err) => write!(f, "rpc failed: {}", err),
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DispatchError::Registry(err) => Some(err),
            DispatchError::Rpc(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RegistryError> for DispatchError {
    fn from(err: RegistryError) -> Self {
        DispatchError::Registry(err)
    }
}

impl From<RpcError> for DispatchError {
    fn from(err: RpcError) -> Self {
        DispatchError::Rpc(err)
    }
}

/// Routing table merged from the mappings of several services.
///
/// Routes are looked up by their full path, `/{service}/{method}`.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use protoflux_core::{Handler, Message, RpcError, Router, rpc_service};
///
/// #[derive(Debug)]
/// struct Ping;
/// impl Message for Ping {}
///
/// struct Echo;
///
/// impl Echo {
///     async fn echo(self: Arc<Self>, ping: Ping) -> Result<Ping, RpcError> {
///         Ok(ping)
///     }
/// }
///
/// let service = rpc_service("demo.Echo", Echo)
///     .handler(Handler::new("echo", Echo::echo))
///     .unwrap();
///
/// let mut router = Router::new();
/// router.add_service(&service).unwrap();
/// assert!(router.has_route("/demo.Echo/Echo"));
/// ```
#[derive(Debug, Default)]
pub struct Router {
    routes: Mapping,
}

impl Router {
    /// Create an empty router.
    pub fn new() -> Self {
        Router {
            routes: Mapping::new(),
        }
    }

    /// Merge every route of `service`.
    ///
    /// Nothing is added if any of its paths is already registered.
    pub fn add_service(&mut self, service: &dyn Servable) -> Result<(), DispatchError> {
        let mapping = service.mapping()?;

        if let Some(path) = mapping.keys().find(|path| self.routes.contains_key(*path)) {
            return Err(DispatchError::RouteAlreadyRegistered(path.clone()));
        }

        tracing::debug!(
            service = service.service_name(),
            routes = mapping.len(),
            "registered service"
        );
        self.routes.extend(mapping);
        Ok(())
    }

    /// Register a single route entry under `path`.
    pub fn register(
        &mut self,
        path: impl Into<String>,
        entry: RouteEntry,
    ) -> Result<(), DispatchError> {
        let path = path.into();
        if self.routes.contains_key(&path) {
            return Err(DispatchError::RouteAlreadyRegistered(path));
        }
        self.routes.insert(path, entry);
        Ok(())
    }

    /// Look up the entry for a route path.
    pub fn lookup(&self, path: &str) -> Option<&RouteEntry> {
        self.routes.get(path)
    }

    pub fn has_route(&self, path: &str) -> bool {
        self.routes.contains_key(path)
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// All registered paths, in order.
    pub fn paths(&self) -> impl Iterator<Item = &str> + '_ {
        self.routes.keys().map(String::as_str)
    }

    pub fn routes(&self) -> &Mapping {
        &self.routes
    }

    /// Serve one call on `stream` with the adapter registered under `path`.
    pub async fn dispatch(&self, path: &str, stream: RpcStream) -> Result<(), DispatchError> {
        let entry = self
            .lookup(path)
            .ok_or_else(|| DispatchError::UnknownRoute(path.to_owned()))?;

        tracing::debug!(route = path, cardinality = %entry.cardinality, "dispatching call");
        (entry.adapter)(stream).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use futures_util::{StreamExt, sink, stream};
    use parking_lot::Mutex;

    use crate::{Handler, Message, Servable, downcast_message, rpc_service};

    #[derive(Debug, PartialEq)]
    struct Num(u32);
    impl Message for Num {}

    struct Adder(u32);

    impl Adder {
        async fn add(self: Arc<Self>, n: Num) -> Result<Num, RpcError> {
            Ok(Num(n.0 + self.0))
        }
    }

    fn adder(name: &str, offset: u32) -> crate::Service<Adder> {
        rpc_service(name, Adder(offset))
            .handler(Handler::new("add", Adder::add))
            .unwrap()
    }

    fn one_shot(n: u32, sent: Arc<Mutex<Vec<u32>>>) -> RpcStream {
        let inbound = stream::iter(vec![Ok(Box::new(Num(n)) as Box<dyn Message>)]);
        let outbound = sink::unfold(sent, |sent, msg: Box<dyn Message>| async move {
            sent.lock().push(downcast_message::<Num>(msg)?.0);
            Ok::<_, RpcError>(sent)
        });
        RpcStream::new(inbound.boxed(), outbound)
    }

    #[test]
    fn merges_services() {
        let mut router = Router::new();
        router.add_service(&adder("test.A", 1)).unwrap();
        router.add_service(&adder("test.B", 2)).unwrap();

        assert_eq!(router.route_count(), 2);
        assert_eq!(router.paths().collect::<Vec<_>>(), vec!["/test.A/Add", "/test.B/Add"]);
        assert!(router.lookup("/test.C/Add").is_none());
    }

    #[test]
    fn conflicting_service_is_rejected_whole() {
        let mut router = Router::new();
        router.add_service(&adder("test.A", 1)).unwrap();

        let err = router.add_service(&adder("test.A", 5)).unwrap_err();
        assert_eq!(err, DispatchError::RouteAlreadyRegistered("/test.A/Add".into()));
        assert_eq!(router.route_count(), 1);
    }

    #[test]
    fn register_single_route() {
        let mapping = adder("test.A", 1).mapping().unwrap();
        let entry = mapping["/test.A/Add"].clone();

        let mut router = Router::new();
        router.register("/custom/Add", entry.clone()).unwrap();
        assert!(router.has_route("/custom/Add"));
        assert_eq!(
            router.register("/custom/Add", entry).unwrap_err(),
            DispatchError::RouteAlreadyRegistered("/custom/Add".into())
        );
    }

    #[test]
    fn registry_errors_surface() {
        let mut router = Router::new();
        let err = router.add_service(&adder("", 1)).unwrap_err();
        assert_eq!(err, DispatchError::Registry(RegistryError::EmptyServiceName));
    }

    #[tokio_test_lite::test]
    async fn dispatch_runs_bound_adapter() {
        let mut router = Router::new();
        router.add_service(&adder("test.A", 1)).unwrap();
        router.add_service(&adder("test.B", 100)).unwrap();

        let sent = Arc::new(Mutex::new(Vec::new()));
        router
            .dispatch("/test.B/Add", one_shot(5, sent.clone()))
            .await
            .unwrap();
        assert_eq!(*sent.lock(), vec![105]);
    }

    #[tokio_test_lite::test]
    async fn dispatch_unknown_route() {
        let router = Router::new();
        let sent = Arc::new(Mutex::new(Vec::new()));
        let err = router
            .dispatch("/nope/Nope", one_shot(1, sent))
            .await
            .unwrap_err();
        assert_eq!(err, DispatchError::UnknownRoute("/nope/Nope".into()));
    }
}
