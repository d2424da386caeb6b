//! In-process cross-context transport.
//!
//! Each connected context owns an [`Inbox`]; any context may send through an
//! [`Outbox`]. A message fans out to every listening context except its sender, all
//! of which share one reply slot: the first reply wins, and if every listener ignores
//! the message the requester gets [`MessagingError::NoResponse`].

use crate::error::MessagingError;
use crate::message::{ContextId, Delivery, Message, MessageId};
use crate::reply::{self, ReplyChannel};
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace};

#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Per-inbox buffer; senders wait when a listener falls behind.
    pub inbox_capacity: usize,
    /// `None` waits for a reply indefinitely.
    pub reply_timeout: Option<Duration>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self { inbox_capacity: 64, reply_timeout: Some(Duration::from_secs(30)) }
    }
}

#[derive(Debug)]
struct Listener {
    context: ContextId,
    name: Arc<str>,
    sender: mpsc::Sender<Delivery>,
}

#[derive(Debug)]
struct TransportInner {
    config: TransportConfig,
    listeners: RwLock<Vec<Listener>>,
    next_message: AtomicU64,
    next_context: AtomicU32,
}

/// Shared message fabric; clones connect to the same contexts.
#[derive(Debug, Clone)]
pub struct Transport {
    inner: Arc<TransportInner>,
}

impl Transport {
    #[must_use]
    pub fn new(config: TransportConfig) -> Self {
        let config = TransportConfig { inbox_capacity: config.inbox_capacity.max(1), ..config };
        Self {
            inner: Arc::new(TransportInner {
                config,
                listeners: RwLock::default(),
                next_message: AtomicU64::new(1),
                next_context: AtomicU32::new(1),
            }),
        }
    }

    /// Connects a listening context; its own messages are never delivered to itself.
    #[must_use]
    pub fn connect(&self, name: impl Into<Arc<str>>) -> (Inbox, Outbox) {
        let name = name.into();
        let context = self.next_context();
        let (sender, receiver) = mpsc::channel(self.inner.config.inbox_capacity);
        self.inner.listeners.write().push(Listener {
            context,
            name: Arc::clone(&name),
            sender,
        });
        debug!(context = %name, "Context connected");

        let outbox = Outbox { context, name: Arc::clone(&name), transport: self.clone() };
        (Inbox { name, receiver }, outbox)
    }

    /// A send-only context.
    #[must_use]
    pub fn outbox(&self, name: impl Into<Arc<str>>) -> Outbox {
        Outbox { context: self.next_context(), name: name.into(), transport: self.clone() }
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.read().iter().filter(|l| !l.sender.is_closed()).count()
    }

    fn next_context(&self) -> ContextId {
        ContextId(self.inner.next_context.fetch_add(1, Ordering::Relaxed))
    }

    async fn deliver(
        &self,
        from: ContextId,
        origin: &Arc<str>,
        action: String,
        payload: Value,
    ) -> PendingReply {
        let id = MessageId(self.inner.next_message.fetch_add(1, Ordering::Relaxed));
        let (reply, receiver) = ReplyChannel::new(id);
        let message =
            Arc::new(Message { id, action: action.clone(), payload, origin: Arc::clone(origin) });

        let targets: Vec<_> = self
            .inner
            .listeners
            .read()
            .iter()
            .filter(|l| l.context != from)
            .map(|l| (l.context, Arc::clone(&l.name), l.sender.clone()))
            .collect();

        let mut closed = Vec::new();
        for (context, name, sender) in targets {
            let delivery = Delivery { message: Arc::clone(&message), reply: reply.clone() };
            if sender.send(delivery).await.is_err() {
                trace!(context = %name, "Inbox gone; pruning listener");
                closed.push(context);
            }
        }
        if !closed.is_empty() {
            self.inner.listeners.write().retain(|l| !closed.contains(&l.context));
        }

        trace!(%id, %action, %origin, "Message sent");
        PendingReply { id, action, receiver, timeout: self.inner.config.reply_timeout }
    }
}

/// Receiving end of one listening context.
#[derive(Debug)]
pub struct Inbox {
    name: Arc<str>,
    receiver: mpsc::Receiver<Delivery>,
}

impl Inbox {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn recv(&mut self) -> Option<Delivery> {
        self.receiver.recv().await
    }
}

/// Sending end of a context.
#[derive(Debug, Clone)]
pub struct Outbox {
    context: ContextId,
    name: Arc<str>,
    transport: Transport,
}

impl Outbox {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sends a message and returns the pending reply; dropping it discards the reply.
    pub async fn send(&self, action: impl Into<String>, payload: Value) -> PendingReply {
        self.transport.deliver(self.context, &self.name, action.into(), payload).await
    }

    /// Sends and waits for the raw reply value.
    ///
    /// # Errors
    /// Returns [`MessagingError::NoResponse`] if no context answered and
    /// [`MessagingError::Timeout`] if the configured reply timeout elapsed.
    pub async fn request(
        &self,
        action: impl Into<String>,
        payload: Value,
    ) -> Result<Value, MessagingError> {
        self.send(action, payload).await.wait().await
    }

    /// Sends, waits, and unwraps the `{ok, data}` envelope.
    ///
    /// # Errors
    /// As [`Outbox::request`], plus [`MessagingError::HandlerFailure`] for a failure reply,
    /// with the reply's `code` as context.
    pub async fn call(
        &self,
        action: impl Into<String>,
        payload: Value,
    ) -> Result<Value, MessagingError> {
        let reply = self.request(action, payload).await?;
        if reply::is_failure(&reply) {
            let error = reply.get("error").and_then(Value::as_str).unwrap_or("unknown error");
            let code = reply.get("code").and_then(Value::as_str).map(|c| c.to_owned().into());
            return Err(MessagingError::HandlerFailure { message: error.to_owned().into(), context: code });
        }
        match reply {
            Value::Object(mut map) if map.contains_key("ok") => {
                Ok(map.remove("data").unwrap_or(Value::Null))
            },
            other => Ok(other),
        }
    }
}

/// A reply not yet received.
#[derive(Debug)]
pub struct PendingReply {
    id: MessageId,
    action: String,
    receiver: oneshot::Receiver<Value>,
    timeout: Option<Duration>,
}

impl PendingReply {
    #[must_use]
    pub const fn id(&self) -> MessageId {
        self.id
    }

    /// Waits for the reply.
    ///
    /// # Errors
    /// Returns [`MessagingError::NoResponse`] or [`MessagingError::Timeout`].
    pub async fn wait(self) -> Result<Value, MessagingError> {
        let outcome = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.receiver).await.map_err(|_| {
                MessagingError::Timeout {
                    message: format!("no reply to `{}` within {limit:?}", self.action).into(),
                    context: Some(self.id.to_string().into()),
                }
            })?,
            None => self.receiver.await,
        };

        outcome.map_err(|_| MessagingError::NoResponse {
            message: format!("no context answered `{}`", self.action).into(),
            context: Some(self.id.to_string().into()),
        })
    }
}
