//! Transport-facing adapters, one protocol per [`Cardinality`].
//!
//! | Cardinality  | Receive                 | Send                          |
//! |--------------|-------------------------|-------------------------------|
//! | UnaryUnary   | exactly one message     | exactly one message           |
//! | UnaryStream  | exactly one message     | each produced message, in order |
//! | StreamUnary  | lazy iterable of inbound | exactly one message          |
//! | StreamStream | lazy iterable of inbound | each produced message, in order |
//!
//! Nothing raised while reading, invoking or writing is caught here.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::{SinkExt, StreamExt};

use crate::stream::MessageSink;
use crate::{Cardinality, Inbound, Outbound, RpcError, RpcStream};

/// Erased handler: takes the service instance and a request body, produces a
/// response body.
pub type ErasedCall<S> =
    Arc<dyn Fn(Arc<S>, Inbound) -> BoxFuture<'static, Result<Outbound, RpcError>> + Send + Sync>;

/// Adapter with the service instance still unbound.
pub type Adapter<S> =
    Arc<dyn Fn(Arc<S>, RpcStream) -> BoxFuture<'static, Result<(), RpcError>> + Send + Sync>;

/// Adapter bound to one service instance; what a route entry stores.
pub type BoundAdapter =
    Arc<dyn Fn(RpcStream) -> BoxFuture<'static, Result<(), RpcError>> + Send + Sync>;

/// Select and build the adapter for `cardinality` around `call`.
pub fn adapter_for<S>(cardinality: Cardinality, call: ErasedCall<S>) -> Adapter<S>
where
    S: Send + Sync + 'static,
{
    match cardinality {
        Cardinality::UnaryUnary => unary_unary(call),
        Cardinality::UnaryStream => unary_stream(call),
        Cardinality::StreamUnary => stream_unary(call),
        Cardinality::StreamStream => stream_stream(call),
    }
}

/// Fix the adapter's service instance.
pub fn bind<S>(adapter: Adapter<S>, instance: Arc<S>) -> BoundAdapter
where
    S: Send + Sync + 'static,
{
    Arc::new(move |stream| adapter(instance.clone(), stream))
}

fn unary_unary<S>(call: ErasedCall<S>) -> Adapter<S>
where
    S: Send + Sync + 'static,
{
    Arc::new(move |instance, mut stream| {
        let call = call.clone();
        Box::pin(async move {
            let request = recv_single(&mut stream).await?;
            let response = call(instance, Inbound::Single(request)).await?;
            let (_, mut outbound) = stream.into_parts();
            send_single(&mut outbound, response).await
        })
    })
}

fn unary_stream<S>(call: ErasedCall<S>) -> Adapter<S>
where
    S: Send + Sync + 'static,
{
    Arc::new(move |instance, mut stream| {
        let call = call.clone();
        Box::pin(async move {
            let request = recv_single(&mut stream).await?;
            let responses = call(instance, Inbound::Single(request)).await?;
            let (_, mut outbound) = stream.into_parts();
            send_each(&mut outbound, responses).await
        })
    })
}

fn stream_unary<S>(call: ErasedCall<S>) -> Adapter<S>
where
    S: Send + Sync + 'static,
{
    Arc::new(move |instance, stream| {
        let call = call.clone();
        Box::pin(async move {
            let (inbound, mut outbound) = stream.into_parts();
            let response = call(instance, Inbound::Stream(inbound)).await?;
            send_single(&mut outbound, response).await
        })
    })
}

fn stream_stream<S>(call: ErasedCall<S>) -> Adapter<S>
where
    S: Send + Sync + 'static,
{
    Arc::new(move |instance, stream| {
        let call = call.clone();
        Box::pin(async move {
            let (inbound, mut outbound) = stream.into_parts();
            let responses = call(instance, Inbound::Stream(inbound)).await?;
            send_each(&mut outbound, responses).await
        })
    })
}

async fn recv_single(
    stream: &mut RpcStream,
) -> Result<Box<dyn crate::Message>, RpcError> {
    let request = stream.recv_message().await?.ok_or(RpcError::MissingRequest)?;
    tracing::trace!(message = request.message_name(), "received request");
    Ok(request)
}

async fn send_single(outbound: &mut MessageSink, response: Outbound) -> Result<(), RpcError> {
    match response {
        Outbound::Single(msg) => {
            tracing::trace!(message = msg.message_name(), "sending response");
            outbound.send(msg).await
        }
        other => Err(RpcError::ShapeMismatch {
            expected: "single",
            found: other.kind(),
        }),
    }
}

async fn send_each(outbound: &mut MessageSink, responses: Outbound) -> Result<(), RpcError> {
    match responses {
        Outbound::Stream(mut responses) => {
            let mut sent = 0usize;
            while let Some(msg) = responses.next().await {
                outbound.send(msg?).await?;
                sent += 1;
            }
            tracing::trace!(sent, "response stream finished");
            Ok(())
        }
        Outbound::Inert(resource) => {
            // Streaming-typed handler handed back a non-producing value.
            tracing::debug!("streaming handler produced no responses, releasing result");
            resource.close();
            Ok(())
        }
        other => Err(RpcError::ShapeMismatch {
            expected: "stream",
            found: other.kind(),
        }),
    }
}
