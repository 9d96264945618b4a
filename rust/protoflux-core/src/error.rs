use std::fmt;

use crate::MessageType;

/// Status codes a handler can fail a call with.
///
/// Values match the gRPC status codes so a transport can forward them as-is.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Cancelled = 1,
    Unknown = 2,
    InvalidArgument = 3,
    DeadlineExceeded = 4,
    NotFound = 5,
    AlreadyExists = 6,
    PermissionDenied = 7,
    ResourceExhausted = 8,
    FailedPrecondition = 9,
    Aborted = 10,
    OutOfRange = 11,
    Unimplemented = 12,
    Internal = 13,
    Unavailable = 14,
    DataLoss = 15,
    Unauthenticated = 16,
}

impl ErrorCode {
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Cancelled => "cancelled",
            ErrorCode::Unknown => "unknown",
            ErrorCode::InvalidArgument => "invalid argument",
            ErrorCode::DeadlineExceeded => "deadline exceeded",
            ErrorCode::NotFound => "not found",
            ErrorCode::AlreadyExists => "already exists",
            ErrorCode::PermissionDenied => "permission denied",
            ErrorCode::ResourceExhausted => "resource exhausted",
            ErrorCode::FailedPrecondition => "failed precondition",
            ErrorCode::Aborted => "aborted",
            ErrorCode::OutOfRange => "out of range",
            ErrorCode::Unimplemented => "unimplemented",
            ErrorCode::Internal => "internal",
            ErrorCode::Unavailable => "unavailable",
            ErrorCode::DataLoss => "data loss",
            ErrorCode::Unauthenticated => "unauthenticated",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of the underlying message stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The peer or the local side closed the stream
    Closed,
    /// Any other I/O failure reported by the transport
    Io(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Closed => write!(f, "stream closed"),
            TransportError::Io(msg) => write!(f, "stream I/O error: {}", msg),
        }
    }
}

impl std::error::Error for TransportError {}

/// Errors raised while an adapter serves a call.
///
/// None of these are handled inside the crate; they surface from the adapter
/// and the transport turns them into a protocol-level failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcError {
    /// Raised by a handler body
    Status { code: ErrorCode, message: String },
    /// The inbound stream ended before the single request of a unary call
    MissingRequest,
    /// An inbound value is not the message type the handler declared
    UnexpectedMessage {
        expected: MessageType,
        found: &'static str,
    },
    /// An erased handler consumed or produced a body of the wrong shape
    ShapeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    /// Reading from or writing to the stream failed
    Transport(TransportError),
}

impl RpcError {
    pub fn status(code: ErrorCode, message: impl Into<String>) -> Self {
        RpcError::Status {
            code,
            message: message.into(),
        }
    }

    /// Status code a transport should report for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            RpcError::Status { code, .. } => *code,
            RpcError::MissingRequest | RpcError::UnexpectedMessage { .. } => {
                ErrorCode::InvalidArgument
            }
            RpcError::ShapeMismatch { .. } => ErrorCode::Internal,
            RpcError::Transport(TransportError::Closed) => ErrorCode::Cancelled,
            RpcError::Transport(TransportError::Io(_)) => ErrorCode::Unavailable,
        }
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RpcError::Status { code, message } => write!(f, "{}: {}", code, message),
            RpcError::MissingRequest => write!(f, "stream ended before the request message"),
            RpcError::UnexpectedMessage { expected, found } => {
                write!(f, "expected message {}, got {}", expected.name(), found)
            }
            RpcError::ShapeMismatch { expected, found } => {
                write!(f, "expected {} body, got {} body", expected, found)
            }
            RpcError::Transport(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for RpcError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RpcError::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TransportError> for RpcError {
    fn from(err: TransportError) -> Self {
        RpcError::Transport(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display_includes_code_and_message() {
        let err = RpcError::status(ErrorCode::NotFound, "no feature at 1,2");
        assert_eq!(err.to_string(), "not found: no feature at 1,2");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[test]
    fn transport_errors_map_to_codes() {
        let closed: RpcError = TransportError::Closed.into();
        assert_eq!(closed.code(), ErrorCode::Cancelled);
        assert!(std::error::Error::source(&closed).is_some());

        let io = RpcError::Transport(TransportError::Io("reset".into()));
        assert_eq!(io.code(), ErrorCode::Unavailable);
        assert!(io.to_string().contains("reset"));
    }

    #[test]
    fn codes_match_grpc_values() {
        assert_eq!(ErrorCode::Cancelled.as_u32(), 1);
        assert_eq!(ErrorCode::Unimplemented.as_u32(), 12);
        assert_eq!(ErrorCode::Unauthenticated.as_u32(), 16);
    }
}
