#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]

// Re-export protoflux_core for macro-generated code
#[doc(hidden)]
pub extern crate protoflux_core;

pub use protoflux_core::{
    // Adapters
    Adapter,
    BoundAdapter,
    // Classification
    Cardinality,
    Classification,
    Close,
    // Errors
    DispatchError,
    ErasedCall,
    ErrorCode,
    // Descriptors
    Handler,
    // Bodies (for generated glue)
    Inbound,
    MAX_METHOD_NAME_LEN,
    MAX_SERVICE_NAME_LEN,
    Mapping,
    Message,
    MessageType,
    Outbound,
    RegistryError,
    RequestArg,
    ResponseStream,
    ResponseValue,
    RouteEntry,
    Router,
    RpcError,
    RpcMethod,
    RpcNamed,
    RpcStream,
    Servable,
    Service,
    Servicer,
    Side,
    Streaming,
    TransportError,
    TypeResolutionError,
    TypeShape,
    UnknownCardinality,
    adapter_for,
    bind,
    classify,
    derive_rpc_name,
    downcast_message,
    route_path,
    rpc_method,
    rpc_name,
    rpc_service,
    try_stream,
};

#[cfg(feature = "mem")]
pub use protoflux_core::mem;

/// Wrap a handler method, capturing its identifier for name derivation.
///
/// `handler!(RouteGuide::list_features)` expands to
/// `Handler::new("list_features", RouteGuide::list_features)`.
#[macro_export]
macro_rules! handler {
    ($ty:ident :: $method:ident) => {
        $crate::protoflux_core::Handler::new(::core::stringify!($method), $ty::$method)
    };
    ($func:ident) => {
        $crate::protoflux_core::Handler::new(::core::stringify!($func), $func)
    };
}

/// Decorate a handler method in one step: `rpc!(RouteGuide::get_feature)`.
///
/// Evaluates to `Result<RpcMethod<_>, TypeResolutionError>`.
#[macro_export]
macro_rules! rpc {
    ($($handler:tt)+) => {
        $crate::protoflux_core::rpc_method($crate::handler!($($handler)+))
    };
}

/// Prelude module for convenient imports.
///
/// ```
/// use protoflux::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Cardinality, ErrorCode, Handler, Message, ResponseStream, RpcError, RpcMethod, RpcNamed,
        Servable, Servicer, Streaming, TypeResolutionError, handler, rpc, rpc_method, rpc_name,
        rpc_service,
    };

    pub use protoflux_core::StreamExt;
}
