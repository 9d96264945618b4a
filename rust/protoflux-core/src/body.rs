//! Type-erased request and response bodies, and the traits that connect them
//! to typed handler signatures.

use futures_util::StreamExt;
use futures_util::stream::BoxStream;

use crate::stream::{Close, MessageStream, Producer};
use crate::{Message, ResponseStream, RpcError, Streaming, TypeShape, downcast_message};

/// Request side of an erased handler call.
pub enum Inbound {
    /// The single request of a unary-request call
    Single(Box<dyn Message>),
    /// The remaining inbound messages of a client-streaming call
    Stream(MessageStream),
}

impl Inbound {
    pub fn kind(&self) -> &'static str {
        match self {
            Inbound::Single(_) => "single",
            Inbound::Stream(_) => "stream",
        }
    }
}

/// Response side of an erased handler call.
pub enum Outbound {
    /// The single response of a unary-response call
    Single(Box<dyn Message>),
    /// Responses in the order the handler produces them
    Stream(BoxStream<'static, Result<Box<dyn Message>, RpcError>>),
    /// A streaming-typed result that produces nothing; the resource must be
    /// closed by whoever receives it
    Inert(Box<dyn Close>),
}

impl Outbound {
    pub fn kind(&self) -> &'static str {
        match self {
            Outbound::Single(_) => "single",
            Outbound::Stream(_) => "stream",
            Outbound::Inert(_) => "inert",
        }
    }
}

/// A type usable as a handler's request parameter.
pub trait RequestArg: Send + Sized + 'static {
    /// Declared shape used to classify the handler.
    fn shape() -> TypeShape;

    fn from_inbound(inbound: Inbound) -> Result<Self, RpcError>;
}

/// A type usable as a handler's response.
pub trait ResponseValue: Send + 'static {
    /// Declared shape used to classify the handler.
    fn shape() -> TypeShape;

    fn into_outbound(self) -> Outbound;
}

impl<T: Message> RequestArg for T {
    fn shape() -> TypeShape {
        TypeShape::message::<T>()
    }

    fn from_inbound(inbound: Inbound) -> Result<Self, RpcError> {
        match inbound {
            Inbound::Single(msg) => downcast_message(msg),
            other => Err(RpcError::ShapeMismatch {
                expected: "single",
                found: other.kind(),
            }),
        }
    }
}

impl<T: Message> RequestArg for Streaming<T> {
    fn shape() -> TypeShape {
        TypeShape::iterable(TypeShape::message::<T>())
    }

    fn from_inbound(inbound: Inbound) -> Result<Self, RpcError> {
        match inbound {
            Inbound::Stream(messages) => Ok(Streaming::new(messages)),
            other => Err(RpcError::ShapeMismatch {
                expected: "stream",
                found: other.kind(),
            }),
        }
    }
}

impl<T: Message> ResponseValue for T {
    fn shape() -> TypeShape {
        TypeShape::message::<T>()
    }

    fn into_outbound(self) -> Outbound {
        Outbound::Single(Box::new(self))
    }
}

impl<T: Message> ResponseValue for ResponseStream<T> {
    fn shape() -> TypeShape {
        TypeShape::iterator(TypeShape::message::<T>())
    }

    fn into_outbound(self) -> Outbound {
        match self.producer {
            Producer::Stream(responses) => Outbound::Stream(
                responses
                    .map(|res| res.map(|msg| Box::new(msg) as Box<dyn Message>))
                    .boxed(),
            ),
            Producer::Inert(resource) => Outbound::Inert(resource),
        }
    }
}
