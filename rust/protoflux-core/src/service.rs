//! Service registry: from a service instance to the routing mapping a
//! transport server consumes.
//!
//! There are two ways to make a type servable:
//!
//! - implement [`Servicer`] and list the methods in [`Servicer::rpc_methods`];
//! - wrap a plain value with [`rpc_service`] and register methods on the
//!   returned [`Service`].
//!
//! Either way, [`Servable::mapping`] yields one [`RouteEntry`] per method,
//! keyed by `/{service}/{method}`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::adapter::{BoundAdapter, bind};
use crate::{
    Cardinality, Handler, MessageType, RpcMethod, RpcNamed, TypeResolutionError, rpc_method,
};

/// Maximum service name length in bytes
pub const MAX_SERVICE_NAME_LEN: usize = 256;

/// Maximum method name length in bytes
pub const MAX_METHOD_NAME_LEN: usize = 128;

/// Everything a transport needs to serve one route.
#[derive(Clone)]
pub struct RouteEntry {
    /// Adapter with the service instance already fixed
    pub adapter: BoundAdapter,
    pub cardinality: Cardinality,
    pub request_type: MessageType,
    pub response_type: MessageType,
}

impl fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEntry")
            .field("cardinality", &self.cardinality)
            .field("request_type", &self.request_type)
            .field("response_type", &self.response_type)
            .finish_non_exhaustive()
    }
}

/// Route path to route entry. Iterates in path order.
pub type Mapping = BTreeMap<String, RouteEntry>;

/// Build the route path `/{service}/{method}`.
pub fn route_path(service_name: &str, method_name: &str) -> String {
    format!("/{}/{}", service_name, method_name)
}

/// Errors raised while building a service's mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Service name is empty
    EmptyServiceName,
    /// Service name exceeds MAX_SERVICE_NAME_LEN
    ServiceNameTooLong,
    /// Method name is empty
    EmptyMethodName,
    /// Method name exceeds MAX_METHOD_NAME_LEN
    MethodNameTooLong,
    /// Two methods of one service resolve to this route
    DuplicateMethod(String),
    /// A method could not be decorated
    Definition(TypeResolutionError),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::EmptyServiceName => write!(f, "service name cannot be empty"),
            RegistryError::ServiceNameTooLong => {
                write!(f, "service name exceeds {} bytes", MAX_SERVICE_NAME_LEN)
            }
            RegistryError::EmptyMethodName => write!(f, "method name cannot be empty"),
            RegistryError::MethodNameTooLong => {
                write!(f, "method name exceeds {} bytes", MAX_METHOD_NAME_LEN)
            }
            RegistryError::DuplicateMethod(path) => {
                write!(f, "duplicate method in service: {}", path)
            }
            RegistryError::Definition(err) => write!(f, "invalid rpc method: {}", err),
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistryError::Definition(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TypeResolutionError> for RegistryError {
    fn from(err: TypeResolutionError) -> Self {
        RegistryError::Definition(err)
    }
}

/// Anything that can produce a routing mapping.
pub trait Servable {
    /// Service-wide public name, used as the first route path segment.
    fn service_name(&self) -> &str;

    /// Compute the routing mapping. Not cached: every call rebuilds it from
    /// the current method descriptors.
    fn mapping(&self) -> Result<Mapping, RegistryError>;
}

/// A service type that lists its own RPC methods.
///
/// ```
/// use std::sync::Arc;
/// use protoflux_core::{Handler, Message, RpcError, RpcMethod, Servable, Servicer};
/// use protoflux_core::{TypeResolutionError, rpc_method};
///
/// #[derive(Debug)]
/// struct Ping;
/// impl Message for Ping {}
///
/// struct Health;
///
/// impl Health {
///     async fn check(self: Arc<Self>, ping: Ping) -> Result<Ping, RpcError> {
///         Ok(ping)
///     }
/// }
///
/// impl Servicer for Health {
///     fn service_name(&self) -> &str {
///         "grpc.health.v1.Health"
///     }
///
///     fn rpc_methods(&self) -> Result<Vec<RpcMethod<Self>>, TypeResolutionError> {
///         Ok(vec![rpc_method(Handler::new("check", Health::check))?])
///     }
/// }
///
/// let mapping = Arc::new(Health).mapping().unwrap();
/// assert!(mapping.contains_key("/grpc.health.v1.Health/Check"));
/// ```
pub trait Servicer: Send + Sync + Sized + 'static {
    fn service_name(&self) -> &str;

    fn rpc_methods(&self) -> Result<Vec<RpcMethod<Self>>, TypeResolutionError>;
}

impl<S: Servicer> Servable for Arc<S> {
    fn service_name(&self) -> &str {
        S::service_name(self)
    }

    fn mapping(&self) -> Result<Mapping, RegistryError> {
        let methods = self.rpc_methods()?;
        build_mapping(S::service_name(self), self, &methods)
    }
}

/// A plain value retrofitted with a service name and registered methods.
pub struct Service<S> {
    name: String,
    instance: Arc<S>,
    methods: Vec<RpcMethod<S>>,
}

/// Turn `instance` into a service named `name`.
pub fn rpc_service<S>(name: impl Into<String>, instance: S) -> Service<S>
where
    S: Send + Sync + 'static,
{
    Service::from_arc(name, Arc::new(instance))
}

impl<S> Service<S>
where
    S: Send + Sync + 'static,
{
    /// Like [`rpc_service`], for an instance that is already shared.
    pub fn from_arc(name: impl Into<String>, instance: Arc<S>) -> Self {
        Service {
            name: name.into(),
            instance,
            methods: Vec::new(),
        }
    }

    /// Register an already-decorated method.
    pub fn method(mut self, method: RpcMethod<S>) -> Self {
        self.methods.push(method);
        self
    }

    /// Decorate `handler` and register it.
    pub fn handler(self, handler: Handler<S>) -> Result<Self, TypeResolutionError> {
        let method = rpc_method(handler)?;
        Ok(self.method(method))
    }

    /// Public service name, the first segment of every route.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The instance every adapter gets bound to.
    pub fn instance(&self) -> &Arc<S> {
        &self.instance
    }

    /// Decorated methods, in the order they were added.
    pub fn methods(&self) -> &[RpcMethod<S>] {
        &self.methods
    }
}

impl<S> RpcNamed for Service<S> {
    fn set_rpc_name(&mut self, name: String) {
        self.name = name;
    }

    fn rpc_name_override(&self) -> Option<&str> {
        Some(&self.name)
    }
}

impl<S> Servable for Service<S>
where
    S: Send + Sync + 'static,
{
    fn service_name(&self) -> &str {
        &self.name
    }

    fn mapping(&self) -> Result<Mapping, RegistryError> {
        build_mapping(&self.name, &self.instance, &self.methods)
    }
}

impl<S> fmt::Debug for Service<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("name", &self.name)
            .field("methods", &self.methods)
            .finish_non_exhaustive()
    }
}

fn validate_service_name(name: &str) -> Result<(), RegistryError> {
    if name.is_empty() {
        return Err(RegistryError::EmptyServiceName);
    }
    if name.len() > MAX_SERVICE_NAME_LEN {
        return Err(RegistryError::ServiceNameTooLong);
    }
    Ok(())
}

fn validate_method_name(name: &str) -> Result<(), RegistryError> {
    if name.is_empty() {
        return Err(RegistryError::EmptyMethodName);
    }
    if name.len() > MAX_METHOD_NAME_LEN {
        return Err(RegistryError::MethodNameTooLong);
    }
    Ok(())
}

fn build_mapping<S>(
    service_name: &str,
    instance: &Arc<S>,
    methods: &[RpcMethod<S>],
) -> Result<Mapping, RegistryError>
where
    S: Send + Sync + 'static,
{
    validate_service_name(service_name)?;

    let mut mapping = Mapping::new();
    for method in methods {
        validate_method_name(method.public_name())?;

        let path = route_path(service_name, method.public_name());
        if mapping.contains_key(&path) {
            return Err(RegistryError::DuplicateMethod(path));
        }

        let entry = RouteEntry {
            adapter: bind(method.adapter().clone(), instance.clone()),
            cardinality: method.cardinality(),
            request_type: method.request_type(),
            response_type: method.response_type(),
        };
        mapping.insert(path, entry);
    }

    tracing::debug!(service = service_name, routes = mapping.len(), "built service mapping");
    Ok(mapping)
}
