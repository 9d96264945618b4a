// src/message.rs

use std::any::{Any, TypeId};
use std::fmt;

use crate::RpcError;

/// Capability marker for decoded protocol messages.
///
/// The message layer (encoding, schemas) lives outside this crate. All the
/// binding core needs is to move decoded values around type-erased and to
/// check, before a handler runs, that a value is the message type the handler
/// declared.
///
/// ```
/// use protoflux_core::Message;
///
/// #[derive(Debug)]
/// struct Point {
///     latitude: i32,
///     longitude: i32,
/// }
///
/// impl Message for Point {}
/// ```
pub trait Message: Any + Send + fmt::Debug {
    /// Fully qualified Rust type name of this message.
    fn message_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Identity of a concrete message type.
///
/// This is what a route entry carries as its request and response type, so
/// the transport knows which decoder and encoder to use.
#[derive(Clone, Copy)]
pub struct MessageType {
    id: TypeId,
    name: &'static str,
}

impl MessageType {
    /// Identity of `T`.
    pub fn of<T: Message>() -> Self {
        MessageType {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The [`TypeId`] this identity compares by.
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name, e.g. `routeguide::Point`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Last path segment of the type name, e.g. `Point`.
    pub fn short_name(&self) -> &'static str {
        self.name.rsplit("::").next().unwrap_or(self.name)
    }

    /// Whether this is the identity of `T`.
    pub fn is<T: Message>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for MessageType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for MessageType {}

impl std::hash::Hash for MessageType {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageType({})", self.name)
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Recover the concrete message from a type-erased inbound value.
pub fn downcast_message<T: Message>(msg: Box<dyn Message>) -> Result<T, RpcError> {
    let found = msg.message_name();
    let any: Box<dyn Any> = msg;
    match any.downcast::<T>() {
        Ok(msg) => Ok(*msg),
        Err(_) => Err(RpcError::UnexpectedMessage {
            expected: MessageType::of::<T>(),
            found,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Ping(u32);
    impl Message for Ping {}

    #[derive(Debug)]
    struct Pong;
    impl Message for Pong {}

    #[test]
    fn message_type_identity() {
        assert_eq!(MessageType::of::<Ping>(), MessageType::of::<Ping>());
        assert_ne!(MessageType::of::<Ping>(), MessageType::of::<Pong>());
        assert!(MessageType::of::<Ping>().is::<Ping>());
        assert!(!MessageType::of::<Ping>().is::<Pong>());
    }

    #[test]
    fn message_type_names() {
        let ty = MessageType::of::<Ping>();
        assert!(ty.name().ends_with("::Ping"));
        assert_eq!(ty.short_name(), "Ping");
        assert_eq!(ty.to_string(), "Ping");
    }

    #[test]
    fn downcast_matching_type() {
        let boxed: Box<dyn Message> = Box::new(Ping(7));
        assert_eq!(downcast_message::<Ping>(boxed).unwrap(), Ping(7));
    }

    #[test]
    fn downcast_wrong_type_reports_both_sides() {
        let boxed: Box<dyn Message> = Box::new(Pong);
        match downcast_message::<Ping>(boxed) {
            Err(RpcError::UnexpectedMessage { expected, found }) => {
                assert!(expected.is::<Ping>());
                assert!(found.ends_with("::Pong"));
            }
            other => panic!("expected UnexpectedMessage, got {other:?}"),
        }
    }
}
