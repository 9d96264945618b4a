//! Message streams seen by adapters and handlers.
//!
//! - [`RpcStream`] is the transport-facing duplex stream an adapter is called with.
//! - [`Streaming`] is the typed request iterable handed to client-streaming handlers.
//! - [`ResponseStream`] is the typed response producer returned by
//!   server-streaming handlers.

use std::fmt;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use futures_util::sink::Sink;
use futures_util::stream::{self, BoxStream};
use futures_util::{SinkExt, StreamExt};

use crate::{Message, RpcError, downcast_message};

/// Type-erased inbound half of a call.
pub type MessageStream = BoxStream<'static, Result<Box<dyn Message>, RpcError>>;

/// Type-erased outbound half of a call.
pub type MessageSink = Pin<Box<dyn Sink<Box<dyn Message>, Error = RpcError> + Send>>;

/// Bidirectional, already-decoded message stream for one call.
///
/// The transport builds one per incoming call. Every read and every write is
/// a suspension point; cancellation reaches the adapter as a failing or
/// ending read/write here.
pub struct RpcStream {
    inbound: MessageStream,
    outbound: MessageSink,
}

impl RpcStream {
    pub fn new<I, O>(inbound: I, outbound: O) -> Self
    where
        I: Stream<Item = Result<Box<dyn Message>, RpcError>> + Send + 'static,
        O: Sink<Box<dyn Message>, Error = RpcError> + Send + 'static,
    {
        RpcStream {
            inbound: inbound.boxed(),
            outbound: Box::pin(outbound),
        }
    }

    /// Receive the next inbound message, or `None` at end of stream.
    pub async fn recv_message(&mut self) -> Result<Option<Box<dyn Message>>, RpcError> {
        self.inbound.next().await.transpose()
    }

    /// Send one outbound message and flush it.
    pub async fn send_message(&mut self, message: Box<dyn Message>) -> Result<(), RpcError> {
        self.outbound.send(message).await
    }

    /// Split into independently usable inbound and outbound halves.
    pub fn into_parts(self) -> (MessageStream, MessageSink) {
        (self.inbound, self.outbound)
    }
}

impl Stream for RpcStream {
    type Item = Result<Box<dyn Message>, RpcError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().inbound.poll_next_unpin(cx)
    }
}

impl fmt::Debug for RpcStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcStream").finish_non_exhaustive()
    }
}

/// Lazy iterable of inbound requests for client-streaming handlers.
///
/// Yields messages in exactly the order the transport received them. Each
/// value is checked against `T` as it is pulled.
pub struct Streaming<T> {
    inbound: MessageStream,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Message> Streaming<T> {
    pub fn new(inbound: MessageStream) -> Self {
        Streaming {
            inbound,
            _marker: PhantomData,
        }
    }

    /// Build a request stream from already-available messages.
    pub fn from_messages<I>(messages: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        let inbound = stream::iter(
            messages
                .into_iter()
                .map(|msg| Ok(Box::new(msg) as Box<dyn Message>)),
        );
        Streaming::new(inbound.boxed())
    }

    /// Next request, or `None` once the client has finished sending.
    pub async fn message(&mut self) -> Result<Option<T>, RpcError> {
        self.next().await.transpose()
    }
}

impl<T: Message> Stream for Streaming<T> {
    type Item = Result<T, RpcError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut()
            .inbound
            .poll_next_unpin(cx)
            .map(|item| item.map(|res| res.and_then(downcast_message::<T>)))
    }
}

impl<T> fmt::Debug for Streaming<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Streaming").finish_non_exhaustive()
    }
}

/// A resource that must be released explicitly.
pub trait Close: Send {
    fn close(self: Box<Self>);
}

pub(crate) enum Producer<T> {
    Stream(BoxStream<'static, Result<T, RpcError>>),
    Inert(Box<dyn Close>),
}

/// Lazy, finite, non-restartable sequence of responses.
///
/// A server-streaming handler normally returns one built from a stream or an
/// iterator. It may instead hand back an *inert* value: the adapter then
/// sends nothing and closes the held resource.
pub struct ResponseStream<T> {
    pub(crate) producer: Producer<T>,
}

impl<T: Message> ResponseStream<T> {
    /// Responses produced by `responses`, sent in the order it yields them.
    pub fn new<St>(responses: St) -> Self
    where
        St: Stream<Item = Result<T, RpcError>> + Send + 'static,
    {
        ResponseStream {
            producer: Producer::Stream(responses.boxed()),
        }
    }

    /// Responses taken from an already-built iterator.
    pub fn iter<I>(responses: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        ResponseStream::new(stream::iter(responses.into_iter().map(Ok)))
    }

    /// A result that produces no messages but holds `resource` until the
    /// adapter releases it.
    pub fn inert(resource: impl Close + 'static) -> Self {
        ResponseStream {
            producer: Producer::Inert(Box::new(resource)),
        }
    }

    /// Whether this value actually produces responses.
    pub fn is_producer(&self) -> bool {
        matches!(self.producer, Producer::Stream(_))
    }
}

impl<T> fmt::Debug for ResponseStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.producer {
            Producer::Stream(_) => "stream",
            Producer::Inert(_) => "inert",
        };
        f.debug_struct("ResponseStream").field("producer", &kind).finish()
    }
}
