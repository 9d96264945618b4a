//! Cardinality classification from declared handler types.
//!
//! A handler declares one type for its request parameter and one for its
//! response. Each side is either a plain message or one of two stream
//! markers, and the markers are deliberately different: a consumer accepts
//! an *iterable* of requests ([`Streaming`](crate::Streaming)) while a
//! producer returns an *iterator* of responses
//! ([`ResponseStream`](crate::ResponseStream)).
//!
//! [`classify`] turns the two declared shapes into a [`Cardinality`] plus the
//! concrete message types with the stream marker stripped.

use std::fmt;

use crate::{Cardinality, Message, MessageType};

/// Declared shape of one side of a handler signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeShape {
    /// A concrete message type
    Message(MessageType),
    /// "Asynchronously iterable of": the request side of a client-streaming call
    Iterable(Box<TypeShape>),
    /// "Asynchronous iterator of": the response side of a server-streaming call
    Iterator(Box<TypeShape>),
}

impl TypeShape {
    /// A plain message type.
    pub fn message<T: Message>() -> Self {
        TypeShape::Message(MessageType::of::<T>())
    }

    /// Lazy request iterable of `inner`, i.e. `Streaming<T>`.
    pub fn iterable(inner: TypeShape) -> Self {
        TypeShape::Iterable(Box::new(inner))
    }

    /// Response producer of `inner`, i.e. `ResponseStream<T>`.
    pub fn iterator(inner: TypeShape) -> Self {
        TypeShape::Iterator(Box::new(inner))
    }

    fn marker(&self) -> &'static str {
        match self {
            TypeShape::Message(_) => "message",
            TypeShape::Iterable(_) => "iterable",
            TypeShape::Iterator(_) => "iterator",
        }
    }
}

impl fmt::Display for TypeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeShape::Message(ty) => write!(f, "{}", ty),
            TypeShape::Iterable(inner) => write!(f, "Streaming<{}>", inner),
            TypeShape::Iterator(inner) => write!(f, "ResponseStream<{}>", inner),
        }
    }
}

/// Which half of a handler signature a shape belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Request,
    Response,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Request => f.write_str("request"),
            Side::Response => f.write_str("response"),
        }
    }
}

/// A declared shape that maps onto no cardinality.
///
/// Raised when a method is decorated; that method is not registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeResolutionError {
    /// A stream marker used on the wrong side (an iterator as the request,
    /// an iterable as the response)
    MisplacedStream { side: Side, shape: TypeShape },
    /// A stream marker wrapping something other than a message
    NestedStream { side: Side, shape: TypeShape },
}

impl fmt::Display for TypeResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeResolutionError::MisplacedStream { side, shape } => write!(
                f,
                "{} type {} is an {}, which is not a valid {} shape",
                side,
                shape,
                shape.marker(),
                side
            ),
            TypeResolutionError::NestedStream { side, shape } => write!(
                f,
                "{} type {} must wrap exactly one message type",
                side, shape
            ),
        }
    }
}

impl std::error::Error for TypeResolutionError {}

/// Result of classifying a handler signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub cardinality: Cardinality,
    /// Request element type (never the stream marker)
    pub request_type: MessageType,
    /// Response element type (never the stream marker)
    pub response_type: MessageType,
}

/// Classify a handler from its declared request and response shapes.
pub fn classify(
    request: &TypeShape,
    response: &TypeShape,
) -> Result<Classification, TypeResolutionError> {
    let (client_streaming, request_type) = unwrap_side(Side::Request, request)?;
    let (server_streaming, response_type) = unwrap_side(Side::Response, response)?;

    Ok(Classification {
        cardinality: Cardinality::from_streaming(client_streaming, server_streaming),
        request_type,
        response_type,
    })
}

/// Returns whether the side streams, and its element type with one layer of
/// stream marker removed.
fn unwrap_side(side: Side, shape: &TypeShape) -> Result<(bool, MessageType), TypeResolutionError> {
    let inner = match (side, shape) {
        (_, TypeShape::Message(ty)) => return Ok((false, *ty)),
        (Side::Request, TypeShape::Iterable(inner)) => inner,
        (Side::Response, TypeShape::Iterator(inner)) => inner,
        _ => {
            return Err(TypeResolutionError::MisplacedStream {
                side,
                shape: shape.clone(),
            });
        }
    };

    match inner.as_ref() {
        TypeShape::Message(ty) => Ok((true, *ty)),
        _ => Err(TypeResolutionError::NestedStream {
            side,
            shape: shape.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Req;
    impl Message for Req {}

    #[derive(Debug)]
    struct Res;
    impl Message for Res {}

    fn req() -> TypeShape {
        TypeShape::message::<Req>()
    }

    fn res() -> TypeShape {
        TypeShape::message::<Res>()
    }

    #[test]
    fn four_shapes_map_to_four_cardinalities() {
        let cases = [
            (req(), res(), Cardinality::UnaryUnary),
            (req(), TypeShape::iterator(res()), Cardinality::UnaryStream),
            (TypeShape::iterable(req()), res(), Cardinality::StreamUnary),
            (
                TypeShape::iterable(req()),
                TypeShape::iterator(res()),
                Cardinality::StreamStream,
            ),
        ];

        for (request, response, expected) in cases {
            let classification = classify(&request, &response).unwrap();
            assert_eq!(classification.cardinality, expected);
            // the stream marker is stripped on both sides
            assert!(classification.request_type.is::<Req>());
            assert!(classification.response_type.is::<Res>());
        }
    }

    #[test]
    fn iterator_request_is_rejected() {
        let err = classify(&TypeShape::iterator(req()), &res()).unwrap_err();
        assert!(matches!(
            err,
            TypeResolutionError::MisplacedStream {
                side: Side::Request,
                ..
            }
        ));
    }

    #[test]
    fn iterable_response_is_rejected() {
        let err = classify(&req(), &TypeShape::iterable(res())).unwrap_err();
        assert!(matches!(
            err,
            TypeResolutionError::MisplacedStream {
                side: Side::Response,
                ..
            }
        ));
    }

    #[test]
    fn nested_stream_is_rejected() {
        let nested = TypeShape::iterable(TypeShape::iterable(req()));
        let err = classify(&nested, &res()).unwrap_err();
        assert_eq!(
            err,
            TypeResolutionError::NestedStream {
                side: Side::Request,
                shape: nested,
            }
        );
        assert!(err.to_string().contains("Streaming<Streaming<Req>>"));
    }

    #[test]
    fn shape_display() {
        assert_eq!(TypeShape::iterable(req()).to_string(), "Streaming<Req>");
        assert_eq!(TypeShape::iterator(res()).to_string(), "ResponseStream<Res>");
    }
}
