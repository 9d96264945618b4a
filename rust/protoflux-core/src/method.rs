//! Turning handler functions into RPC method descriptors.
//!
//! ```
//! use std::sync::Arc;
//! use protoflux_core::{Cardinality, Handler, Message, RpcError, RpcNamed, rpc_method};
//!
//! #[derive(Debug)]
//! struct Req;
//! impl Message for Req {}
//!
//! #[derive(Debug)]
//! struct Res;
//! impl Message for Res {}
//!
//! struct Stubbed;
//!
//! impl Stubbed {
//!     async fn two_for_one(self: Arc<Self>, _request: Req) -> Result<Res, RpcError> {
//!         Ok(Res)
//!     }
//! }
//!
//! let method = rpc_method(Handler::new("two_for_one", Stubbed::two_for_one)).unwrap();
//! assert_eq!(method.public_name(), "TwoForOne");
//! assert_eq!(method.cardinality(), Cardinality::UnaryUnary);
//!
//! let renamed = method.with_rpc_name("Two");
//! assert_eq!(renamed.public_name(), "Two");
//! ```

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use heck::ToUpperCamelCase;

use crate::adapter::{Adapter, ErasedCall, adapter_for};
use crate::{
    Cardinality, MessageType, RequestArg, ResponseValue, TypeResolutionError, TypeShape, classify,
};

/// Something that carries an overridable public RPC name.
///
/// Implemented by [`Handler`], [`RpcMethod`] and [`Service`](crate::Service).
pub trait RpcNamed {
    /// Store `name` as the override, replacing any previous one.
    fn set_rpc_name(&mut self, name: String);

    fn rpc_name_override(&self) -> Option<&str>;

    fn with_rpc_name(mut self, name: impl Into<String>) -> Self
    where
        Self: Sized,
    {
        self.set_rpc_name(name.into());
        self
    }
}

/// Set or override the public RPC name of `target`.
pub fn rpc_name<T: RpcNamed>(name: impl Into<String>, mut target: T) -> T {
    target.set_rpc_name(name.into());
    target
}

/// A handler function for service `S`, before classification.
pub struct Handler<S> {
    ident: Cow<'static, str>,
    name_override: Option<String>,
    request: TypeShape,
    response: TypeShape,
    call: ErasedCall<S>,
}

impl<S: Send + Sync + 'static> Handler<S> {
    /// Wrap a typed handler declared under identifier `ident`.
    ///
    /// The request and response shapes come from `Req` and `Resp`.
    pub fn new<F, Req, Resp, Fut>(ident: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: Fn(Arc<S>, Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Resp, crate::RpcError>> + Send + 'static,
        Req: RequestArg,
        Resp: ResponseValue,
    {
        let call: ErasedCall<S> = Arc::new(move |instance, inbound| {
            let invocation = Req::from_inbound(inbound).map(|request| f(instance, request));
            Box::pin(async move {
                let response = invocation?.await?;
                Ok(response.into_outbound())
            })
        });

        Handler::from_parts(ident, Req::shape(), Resp::shape(), call)
    }
}

impl<S> Handler<S> {
    /// Assemble a handler from an erased call and explicitly declared shapes.
    ///
    /// Meant for generated glue. The shapes are trusted: they decide which
    /// adapter the call is wrapped in.
    pub fn from_parts(
        ident: impl Into<Cow<'static, str>>,
        request: TypeShape,
        response: TypeShape,
        call: ErasedCall<S>,
    ) -> Self {
        Handler {
            ident: ident.into(),
            name_override: None,
            request,
            response,
            call,
        }
    }

    /// Identifier the handler was declared under, e.g. `list_features`.
    pub fn ident(&self) -> &str {
        &self.ident
    }

    pub fn request_shape(&self) -> &TypeShape {
        &self.request
    }

    pub fn response_shape(&self) -> &TypeShape {
        &self.response
    }
}

impl<S> Clone for Handler<S> {
    fn clone(&self) -> Self {
        Handler {
            ident: self.ident.clone(),
            name_override: self.name_override.clone(),
            request: self.request.clone(),
            response: self.response.clone(),
            call: self.call.clone(),
        }
    }
}

impl<S> RpcNamed for Handler<S> {
    fn set_rpc_name(&mut self, name: String) {
        self.name_override = Some(name);
    }

    fn rpc_name_override(&self) -> Option<&str> {
        self.name_override.as_deref()
    }
}

impl<S> fmt::Debug for Handler<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("ident", &self.ident)
            .field("name_override", &self.name_override)
            .field("request", &self.request)
            .field("response", &self.response)
            .finish_non_exhaustive()
    }
}

/// Descriptor of one RPC method: the handler plus everything derived from it.
///
/// Immutable apart from renaming; renaming only touches the public name.
pub struct RpcMethod<S> {
    handler: Handler<S>,
    cardinality: Cardinality,
    request_type: MessageType,
    response_type: MessageType,
    public_name: String,
    adapter: Adapter<S>,
}

impl<S> RpcMethod<S> {
    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    /// Concrete request message type (the element type when client-streaming).
    pub fn request_type(&self) -> MessageType {
        self.request_type
    }

    /// Concrete response message type (the element type when server-streaming).
    pub fn response_type(&self) -> MessageType {
        self.response_type
    }

    pub fn public_name(&self) -> &str {
        &self.public_name
    }

    pub fn adapter(&self) -> &Adapter<S> {
        &self.adapter
    }

    pub fn handler(&self) -> &Handler<S> {
        &self.handler
    }

    pub fn into_handler(self) -> Handler<S> {
        self.handler
    }
}

impl<S> Clone for RpcMethod<S> {
    fn clone(&self) -> Self {
        RpcMethod {
            handler: self.handler.clone(),
            cardinality: self.cardinality,
            request_type: self.request_type,
            response_type: self.response_type,
            public_name: self.public_name.clone(),
            adapter: self.adapter.clone(),
        }
    }
}

impl<S> RpcNamed for RpcMethod<S> {
    fn set_rpc_name(&mut self, name: String) {
        self.handler.set_rpc_name(name.clone());
        self.public_name = name;
    }

    fn rpc_name_override(&self) -> Option<&str> {
        self.handler.rpc_name_override()
    }
}

impl<S> fmt::Debug for RpcMethod<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcMethod")
            .field("public_name", &self.public_name)
            .field("cardinality", &self.cardinality)
            .field("request_type", &self.request_type)
            .field("response_type", &self.response_type)
            .field("handler", &self.handler.ident)
            .finish_non_exhaustive()
    }
}

impl<S> From<RpcMethod<S>> for Handler<S> {
    fn from(method: RpcMethod<S>) -> Self {
        method.handler
    }
}

/// Classify a handler, build its adapter and resolve its public name.
///
/// Accepts an already-built [`RpcMethod`] too, in which case the descriptor
/// is recomputed from the handler it retains.
pub fn rpc_method<S, H>(handler: H) -> Result<RpcMethod<S>, TypeResolutionError>
where
    S: Send + Sync + 'static,
    H: Into<Handler<S>>,
{
    let handler = handler.into();
    let classification = classify(&handler.request, &handler.response)?;
    let adapter = adapter_for(classification.cardinality, handler.call.clone());
    let public_name = match handler.rpc_name_override() {
        Some(name) => name.to_owned(),
        None => derive_rpc_name(handler.ident()),
    };

    tracing::debug!(
        rpc = %public_name,
        handler = handler.ident(),
        cardinality = %classification.cardinality,
        request = %classification.request_type,
        response = %classification.response_type,
        "decorated rpc method"
    );

    Ok(RpcMethod {
        handler,
        cardinality: classification.cardinality,
        request_type: classification.request_type,
        response_type: classification.response_type,
        public_name,
        adapter,
    })
}

/// Derive a public RPC name from a handler identifier: `two_for_one` → `TwoForOne`.
pub fn derive_rpc_name(ident: &str) -> String {
    let ident = ident.strip_prefix("r#").unwrap_or(ident);
    ident.to_upper_camel_case()
}
