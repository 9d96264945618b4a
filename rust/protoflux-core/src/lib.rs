#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]

mod adapter;
mod body;
mod cardinality;
mod error;
mod message;
mod method;
mod router;
mod service;
mod shape;
mod stream;

#[cfg(feature = "mem")]
pub mod mem;

pub use adapter::*;
pub use body::*;
pub use cardinality::*;
pub use error::*;
pub use message::*;
pub use method::*;
pub use router::*;
pub use service::*;
pub use shape::*;
pub use stream::*;

// Re-export StreamExt for handlers consuming request streams
pub use futures_util::StreamExt;

// Re-export try_stream for handlers producing response streams
pub use async_stream::try_stream;
