//! # Messaging
//!
//! Coordination primitives between the execution contexts of the extension.
//!
//! * [`EventBus`]: typed in-process broadcast pub/sub for tab, menu and configuration
//!   events.
//! * [`Transport`]: fans a tagged [`Message`] out to every other listening context and
//!   plumbs a single reply back.
//! * [`Router`]: per-context dispatch by action tag with an exactly-one-reply guarantee.
//!
//! Replies correlate by message identity; the order in which replies arrive across
//! concurrent exchanges is unspecified.

mod bus;
mod error;
mod message;
mod receiver;
mod reply;
mod router;
mod transport;

pub use bus::{Event, EventBus};
pub use error::{MessagingError, MessagingErrorExt};
pub use message::{ContextId, Delivery, Message, MessageId};
pub use receiver::EventReceiverExt;
pub use reply::{
    CODE_NO_REPLY, CODE_PANICKED, HandlerError, ReplyChannel, Responder, failure, is_failure,
    success,
};
pub use router::{Dispatched, Disposition, Router};
pub use transport::{Inbox, Outbox, PendingReply, Transport, TransportConfig};
