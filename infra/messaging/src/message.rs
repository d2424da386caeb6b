use crate::reply::ReplyChannel;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Transport-unique message identity; replies correlate by it, never by order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg#{}", self.0)
    }
}

/// Identity of a connected execution context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(pub u32);

/// A tagged request travelling between contexts. The payload is opaque to the transport.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: MessageId,
    pub action: String,
    pub payload: Value,
    /// Name of the sending context, for logs.
    pub origin: Arc<str>,
}

impl Message {
    /// Payload field as a string, if present.
    #[must_use]
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.payload.get(name).and_then(Value::as_str)
    }
}

/// A message as seen by one listening context, with the shared reply slot.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub message: Arc<Message>,
    pub reply: ReplyChannel,
}
