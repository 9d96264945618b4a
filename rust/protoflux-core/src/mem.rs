//! In-process stream pair for driving adapters without a transport.
//!
//! ```
//! use std::sync::Arc;
//! use protoflux_core::{Handler, Message, RpcError, rpc_method};
//! use protoflux_core::mem;
//!
//! #[derive(Debug)]
//! struct Num(u32);
//! impl Message for Num {}
//!
//! struct Doubler;
//!
//! impl Doubler {
//!     async fn double(self: Arc<Self>, n: Num) -> Result<Num, RpcError> {
//!         Ok(Num(n.0 * 2))
//!     }
//! }
//!
//! # let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! # rt.block_on(async {
//! let method = rpc_method(Handler::new("double", Doubler::double)).unwrap();
//! let (mut client, stream) = mem::pair();
//!
//! client.send(Num(21)).await.unwrap();
//! client.finish();
//! (method.adapter())(Arc::new(Doubler), stream).await.unwrap();
//!
//! assert_eq!(client.recv::<Num>().await.unwrap().map(|n| n.0), Some(42));
//! # });
//! ```

use futures_util::{StreamExt, sink};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::{Message, RpcError, RpcStream, TransportError, downcast_message};

/// Messages buffered per direction before a send waits.
pub const CHANNEL_CAPACITY: usize = 64;

/// Create a connected client end and server-side [`RpcStream`].
pub fn pair() -> (ClientEnd, RpcStream) {
    let (request_tx, request_rx) = mpsc::channel::<Box<dyn Message>>(CHANNEL_CAPACITY);
    let (response_tx, response_rx) = mpsc::channel::<Box<dyn Message>>(CHANNEL_CAPACITY);

    let inbound = ReceiverStream::new(request_rx).map(Ok);
    let outbound = sink::unfold(response_tx, |tx, msg: Box<dyn Message>| async move {
        tx.send(msg).await.map_err(|_| TransportError::Closed)?;
        Ok::<_, RpcError>(tx)
    });

    let client = ClientEnd {
        requests: Some(request_tx),
        responses: response_rx,
    };
    (client, RpcStream::new(inbound, outbound))
}

/// The calling side of an in-memory stream pair.
#[derive(Debug)]
pub struct ClientEnd {
    requests: Option<mpsc::Sender<Box<dyn Message>>>,
    responses: mpsc::Receiver<Box<dyn Message>>,
}

impl ClientEnd {
    /// Send one request.
    pub async fn send<T: Message>(&mut self, request: T) -> Result<(), RpcError> {
        let tx = self.requests.as_ref().ok_or(TransportError::Closed)?;
        tx.send(Box::new(request))
            .await
            .map_err(|_| TransportError::Closed)?;
        Ok(())
    }

    /// Half-close: the server sees end of stream once buffered requests are read.
    pub fn finish(&mut self) {
        self.requests = None;
    }

    pub fn is_finished(&self) -> bool {
        self.requests.is_none()
    }

    /// Receive the next response, or `None` once the server side is dropped.
    pub async fn recv<T: Message>(&mut self) -> Result<Option<T>, RpcError> {
        match self.responses.recv().await {
            Some(msg) => downcast_message(msg).map(Some),
            None => Ok(None),
        }
    }

    /// Receive responses until the server side is dropped.
    pub async fn collect<T: Message>(&mut self) -> Result<Vec<T>, RpcError> {
        let mut out = Vec::new();
        while let Some(msg) = self.recv::<T>().await? {
            out.push(msg);
        }
        Ok(out)
    }
}
