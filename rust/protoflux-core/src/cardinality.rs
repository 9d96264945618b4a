// src/cardinality.rs

use std::fmt;

/// Streaming shape of an RPC method.
///
/// Determined once, when a handler is turned into an [`RpcMethod`](crate::RpcMethod).
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    /// Single request, single response
    UnaryUnary = 0,
    /// Single request, stream of responses
    UnaryStream = 1,
    /// Stream of requests, single response
    StreamUnary = 2,
    /// Stream of requests, stream of responses
    StreamStream = 3,
}

impl Cardinality {
    /// Every variant, in discriminant order.
    pub const ALL: [Cardinality; 4] = [
        Cardinality::UnaryUnary,
        Cardinality::UnaryStream,
        Cardinality::StreamUnary,
        Cardinality::StreamStream,
    ];

    /// Fixed lookup from (client-streaming, server-streaming) to a variant.
    pub const fn from_streaming(client_streaming: bool, server_streaming: bool) -> Self {
        match (client_streaming, server_streaming) {
            (false, false) => Cardinality::UnaryUnary,
            (false, true) => Cardinality::UnaryStream,
            (true, false) => Cardinality::StreamUnary,
            (true, true) => Cardinality::StreamStream,
        }
    }

    /// Whether the client sends a stream of requests.
    pub const fn client_streaming(self) -> bool {
        matches!(self, Cardinality::StreamUnary | Cardinality::StreamStream)
    }

    /// Whether the server sends a stream of responses.
    pub const fn server_streaming(self) -> bool {
        matches!(self, Cardinality::UnaryStream | Cardinality::StreamStream)
    }

    /// Short lowercase name, as used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Cardinality::UnaryUnary => "unary-unary",
            Cardinality::UnaryStream => "unary-stream",
            Cardinality::StreamUnary => "stream-unary",
            Cardinality::StreamStream => "stream-stream",
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cardinality tag with no adapter behind it.
///
/// Classification always lands on one of the four variants and
/// [`adapter_for`](crate::adapter_for) matches them exhaustively, so this only
/// comes from converting a raw tag that a transport or a stored routing table
/// carries alongside a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownCardinality(pub u32);

impl fmt::Display for UnknownCardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown cardinality: {}", self.0)
    }
}

impl std::error::Error for UnknownCardinality {}

impl TryFrom<u32> for Cardinality {
    type Error = UnknownCardinality;

    fn try_from(val: u32) -> Result<Self, Self::Error> {
        match val {
            0 => Ok(Cardinality::UnaryUnary),
            1 => Ok(Cardinality::UnaryStream),
            2 => Ok(Cardinality::StreamUnary),
            3 => Ok(Cardinality::StreamStream),
            _ => Err(UnknownCardinality(val)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streaming_lookup_table() {
        assert_eq!(Cardinality::from_streaming(false, false), Cardinality::UnaryUnary);
        assert_eq!(Cardinality::from_streaming(false, true), Cardinality::UnaryStream);
        assert_eq!(Cardinality::from_streaming(true, false), Cardinality::StreamUnary);
        assert_eq!(Cardinality::from_streaming(true, true), Cardinality::StreamStream);
    }

    #[test]
    fn streaming_flags_invert_lookup() {
        for cardinality in Cardinality::ALL {
            let rebuilt = Cardinality::from_streaming(
                cardinality.client_streaming(),
                cardinality.server_streaming(),
            );
            assert_eq!(rebuilt, cardinality);
        }
    }

    #[test]
    fn unknown_value_rejected() {
        for cardinality in Cardinality::ALL {
            assert_eq!(Cardinality::try_from(cardinality as u32), Ok(cardinality));
        }
        assert_eq!(Cardinality::try_from(4), Err(UnknownCardinality(4)));
        assert!(UnknownCardinality(4).to_string().contains('4'));
    }

    #[test]
    fn display() {
        assert_eq!(Cardinality::UnaryStream.to_string(), "unary-stream");
        assert_eq!(Cardinality::StreamStream.to_string(), "stream-stream");
    }
}
