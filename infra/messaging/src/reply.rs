//! Single-use reply plumbing.
//!
//! A [`ReplyChannel`] is shared by every context a message was delivered to; the first
//! reply wins and later ones are rejected with [`MessagingError::DuplicateReply`]. When
//! every clone is dropped without replying, the requester observes `NoResponse`.
//!
//! A [`Responder`] is the handler-facing end of one exchange. It is consumed by a reply,
//! so a handler cannot answer twice, and a responder dropped unanswered sends a
//! structured failure instead of leaving the caller hanging.

use crate::error::MessagingError;
use crate::message::MessageId;
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

pub const CODE_NO_REPLY: &str = "no_reply";
pub const CODE_PANICKED: &str = "handler_panicked";

/// `{ "ok": true, "data": ... }`
#[must_use]
pub fn success(data: Value) -> Value {
    json!({ "ok": true, "data": data })
}

/// `{ "ok": false, "error": ..., "code": ... }`
#[must_use]
pub fn failure(code: &str, error: &str) -> Value {
    json!({ "ok": false, "error": error, "code": code })
}

/// Whether `reply` is shaped like a failure envelope.
#[must_use]
pub fn is_failure(reply: &Value) -> bool {
    reply.get("ok").and_then(Value::as_bool) == Some(false)
}

/// Error raised by a message handler, turned into a failure reply by the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerError {
    code: Cow<'static, str>,
    message: String,
}

impl HandlerError {
    pub fn new(code: impl Into<Cow<'static, str>>, message: impl fmt::Display) -> Self {
        let message = message.to_string();
        let message = if message.trim().is_empty() { "unspecified error".to_owned() } else { message };
        Self { code: code.into(), message }
    }

    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn to_reply(&self) -> Value {
        failure(&self.code, &self.message)
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

impl std::error::Error for HandlerError {}

#[derive(Debug)]
struct ReplyInner {
    message_id: MessageId,
    sender: Mutex<Option<oneshot::Sender<Value>>>,
}

/// Shared, first-reply-wins reply slot of one message.
#[derive(Debug, Clone)]
pub struct ReplyChannel {
    inner: Arc<ReplyInner>,
}

impl ReplyChannel {
    #[must_use]
    pub fn new(message_id: MessageId) -> (Self, oneshot::Receiver<Value>) {
        let (tx, rx) = oneshot::channel();
        let inner = ReplyInner { message_id, sender: Mutex::new(Some(tx)) };
        (Self { inner: Arc::new(inner) }, rx)
    }

    #[must_use]
    pub fn message_id(&self) -> MessageId {
        self.inner.message_id
    }

    #[must_use]
    pub fn is_sent(&self) -> bool {
        self.inner.sender.lock().is_none()
    }

    /// Delivers `value` unless the exchange was already answered.
    ///
    /// A requester that stopped waiting is not an error; the reply is discarded.
    ///
    /// # Errors
    /// Returns [`MessagingError::DuplicateReply`] on every call after the first.
    pub fn send(&self, value: Value) -> Result<(), MessagingError> {
        let Some(sender) = self.inner.sender.lock().take() else {
            return Err(MessagingError::DuplicateReply {
                message: format!("message {} was already answered", self.inner.message_id).into(),
                context: None,
            });
        };

        if sender.send(value).is_err() {
            trace!(message = %self.inner.message_id, "Reply has no observer");
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct ExchangeState {
    handler_running: bool,
    responder_dropped: bool,
}

/// Router-side view of one handler invocation.
#[derive(Debug)]
pub(crate) struct Exchange {
    action: Arc<str>,
    reply: ReplyChannel,
    state: Mutex<ExchangeState>,
}

impl Exchange {
    pub(crate) fn start(action: Arc<str>, reply: ReplyChannel) -> Arc<Self> {
        let state = ExchangeState { handler_running: true, responder_dropped: false };
        Arc::new(Self { action, reply, state: Mutex::new(state) })
    }

    /// Marks the synchronous part of the handler as returned. Returns whether the
    /// responder was dropped unanswered while it ran.
    pub(crate) fn finish(&self) -> bool {
        let mut state = self.state.lock();
        state.handler_running = false;
        state.responder_dropped
    }

    /// Sends a failure unless the exchange is already answered.
    pub(crate) fn fail(&self, code: &str, error: &str) {
        if self.reply.is_sent() {
            debug!(action = %self.action, code, error, "Handler failed after replying");
            return;
        }
        warn!(action = %self.action, code, error, "Handler failed; sending failure reply");
        let _ = self.reply.send(failure(code, error));
    }

    pub(crate) fn reply(&self) -> &ReplyChannel {
        &self.reply
    }
}

/// Handler-facing, single-use end of an exchange.
#[derive(Debug)]
pub struct Responder {
    exchange: Arc<Exchange>,
    answered: bool,
}

impl Responder {
    pub(crate) const fn new(exchange: Arc<Exchange>) -> Self {
        Self { exchange, answered: false }
    }

    #[must_use]
    pub fn action(&self) -> &str {
        &self.exchange.action
    }

    /// Sends a raw reply.
    ///
    /// # Errors
    /// Returns [`MessagingError::DuplicateReply`] if another context already answered.
    pub fn send(mut self, value: Value) -> Result<(), MessagingError> {
        self.answered = true;
        self.exchange.reply.send(value)
    }

    /// Sends `{ok: true, data}`.
    ///
    /// # Errors
    /// Returns [`MessagingError::DuplicateReply`] if another context already answered.
    pub fn ok(self, data: Value) -> Result<(), MessagingError> {
        self.send(success(data))
    }

    /// Sends the failure envelope of `error`.
    ///
    /// # Errors
    /// Returns [`MessagingError::DuplicateReply`] if another context already answered.
    pub fn fail(self, error: &HandlerError) -> Result<(), MessagingError> {
        self.send(error.to_reply())
    }
}

impl Drop for Responder {
    fn drop(&mut self) {
        if self.answered || self.exchange.reply.is_sent() {
            return;
        }

        // While the router still runs the handler it owns the failure reply, panics included.
        {
            let mut state = self.exchange.state.lock();
            if state.handler_running {
                state.responder_dropped = true;
                return;
            }
        }

        if std::thread::panicking() {
            self.exchange.fail(CODE_PANICKED, "handler panicked before replying");
        } else {
            self.exchange.fail(CODE_NO_REPLY, "handler finished without replying");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchange() -> (Arc<Exchange>, oneshot::Receiver<Value>) {
        let (reply, rx) = ReplyChannel::new(MessageId(1));
        (Exchange::start(Arc::from("ping"), reply), rx)
    }

    #[test]
    fn second_send_is_rejected() {
        let (reply, mut rx) = ReplyChannel::new(MessageId(9));
        reply.send(json!(1)).expect("first reply");
        let err = reply.clone().send(json!(2)).expect_err("duplicate");
        assert_eq!(err.code(), "duplicate_reply");
        assert_eq!(rx.try_recv().expect("value"), json!(1));
    }

    #[test]
    fn dropped_responder_after_handler_returned_sends_failure() {
        let (exchange, mut rx) = exchange();
        let responder = Responder::new(Arc::clone(&exchange));
        assert!(!exchange.finish());

        drop(responder);
        let reply = rx.try_recv().expect("failure reply");
        assert!(is_failure(&reply));
        assert_eq!(reply["code"], CODE_NO_REPLY);
    }

    #[test]
    fn dropped_responder_during_handler_defers_to_router() {
        let (exchange, mut rx) = exchange();
        drop(Responder::new(Arc::clone(&exchange)));

        assert!(rx.try_recv().is_err(), "router decides the failure");
        assert!(exchange.finish());
    }

    #[test]
    fn responder_unwound_in_deferred_task_reports_panic() {
        let (exchange, mut rx) = exchange();
        let responder = Responder::new(Arc::clone(&exchange));
        assert!(!exchange.finish());

        let unwound = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _held = responder;
            panic!("provider went away");
        }));
        assert!(unwound.is_err());

        let reply = rx.try_recv().expect("failure reply");
        assert_eq!(reply["code"], CODE_PANICKED);
    }

    #[test]
    fn blank_handler_error_gets_a_message() {
        let err = HandlerError::new("invalid_url", "  ");
        assert_eq!(err.message(), "unspecified error");
        assert_eq!(err.to_reply()["ok"], json!(false));
    }
}
