use crate::message::{Delivery, Message};
use crate::reply::{self, CODE_NO_REPLY, CODE_PANICKED, Exchange, HandlerError, Responder};
use crate::transport::Inbox;
use futures::FutureExt;
use futures::future::BoxFuture;
use fxhash::FxHashMap;
use parking_lot::RwLock;
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// What a synchronous handler did with its [`Responder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The reply was sent before returning.
    Replied,
    /// The responder was moved elsewhere and will answer later.
    Deferred,
}

/// Outcome of routing one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    /// No handler for the action; the message belongs to another context.
    Ignored,
    Replied,
    Deferred,
    /// An async handler was spawned and will reply when it completes.
    Spawned,
    /// The handler failed or panicked and a failure reply was sent.
    Failed,
}

type ImmediateHandler =
    dyn Fn(Arc<Message>, Responder) -> Result<Disposition, HandlerError> + Send + Sync;
type AsyncHandler =
    dyn Fn(Arc<Message>) -> BoxFuture<'static, Result<Value, HandlerError>> + Send + Sync;

#[derive(Clone)]
enum Route {
    Immediate(Arc<ImmediateHandler>),
    Async(Arc<AsyncHandler>),
}

/// Dispatches tagged messages to the handler registered for their action.
///
/// Every handled message gets exactly one reply: handler errors and panics become
/// `{ok: false, error, code}` and a responder dropped unanswered sends `no_reply`.
/// Unknown actions are ignored so that contexts can share one transport.
///
/// ```rust
/// use gpilot_messaging::{Disposition, Router, Transport, TransportConfig};
/// use serde_json::json;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), gpilot_messaging::MessagingError> {
/// let transport = Transport::new(TransportConfig::default());
/// let (inbox, _) = transport.connect("background");
/// let router = Router::new("background");
/// router.on("ping", |_msg, responder| {
///     responder.ok(json!("pong")).ok();
///     Ok(Disposition::Replied)
/// });
/// tokio::spawn({
///     let router = router.clone();
///     async move { router.serve(inbox).await }
/// });
///
/// let page = transport.outbox("page");
/// assert_eq!(page.call("ping", json!({})).await?, json!("pong"));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Router {
    context: Arc<str>,
    routes: Arc<RwLock<FxHashMap<String, Route>>>,
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router").field("context", &self.context).field("actions", &self.actions()).finish()
    }
}

impl Router {
    #[must_use]
    pub fn new(context: impl Into<Arc<str>>) -> Self {
        Self { context: context.into(), routes: Arc::default() }
    }

    /// Registers a handler that runs to completion synchronously and either replies
    /// through the responder or moves it away and returns [`Disposition::Deferred`].
    pub fn on<F>(&self, action: impl Into<String>, handler: F) -> &Self
    where
        F: Fn(Arc<Message>, Responder) -> Result<Disposition, HandlerError> + Send + Sync + 'static,
    {
        self.insert(action.into(), Route::Immediate(Arc::new(handler)))
    }

    /// Registers an async handler; its output is wrapped as `{ok: true, data}`.
    pub fn on_async<F, Fut>(&self, action: impl Into<String>, handler: F) -> &Self
    where
        F: Fn(Arc<Message>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
    {
        let handler: Arc<AsyncHandler> = Arc::new(move |message| handler(message).boxed());
        self.insert(action.into(), Route::Async(handler))
    }

    /// Registered actions, sorted.
    #[must_use]
    pub fn actions(&self) -> Vec<String> {
        let mut actions: Vec<_> = self.routes.read().keys().cloned().collect();
        actions.sort_unstable();
        actions
    }

    /// Routes one delivery. Synchronous handlers run inline, so handlers observe
    /// messages in delivery order; async handlers are spawned on the current runtime.
    pub fn dispatch(&self, delivery: Delivery) -> Dispatched {
        let Delivery { message, reply } = delivery;
        let route = self.routes.read().get(&message.action).cloned();
        let Some(route) = route else {
            trace!(context = %self.context, action = %message.action, "No handler; ignoring");
            return Dispatched::Ignored;
        };

        debug!(context = %self.context, id = %message.id, action = %message.action, origin = %message.origin, "Dispatching");

        match route {
            Route::Immediate(handler) => {
                let exchange = Exchange::start(Arc::from(message.action.as_str()), reply);
                let responder = Responder::new(Arc::clone(&exchange));
                let outcome = catch_unwind(AssertUnwindSafe(|| handler(message, responder)));
                let responder_dropped = exchange.finish();

                match outcome {
                    Ok(Ok(_)) if responder_dropped && !exchange.reply().is_sent() => {
                        exchange.fail(CODE_NO_REPLY, "handler finished without replying");
                        Dispatched::Failed
                    },
                    Ok(Ok(Disposition::Replied)) => Dispatched::Replied,
                    Ok(Ok(Disposition::Deferred)) => Dispatched::Deferred,
                    Ok(Err(err)) => {
                        exchange.fail(err.code(), err.message());
                        Dispatched::Failed
                    },
                    Err(panic) => {
                        exchange.fail(CODE_PANICKED, &panic_message(panic.as_ref()));
                        Dispatched::Failed
                    },
                }
            },
            Route::Async(handler) => {
                let action = message.action.clone();
                tokio::spawn(async move {
                    let outcome = AssertUnwindSafe(async move { handler(message).await })
                        .catch_unwind()
                        .await;
                    let value = match outcome {
                        Ok(Ok(data)) => reply::success(data),
                        Ok(Err(err)) => {
                            warn!(%action, code = err.code(), error = err.message(), "Handler failed");
                            err.to_reply()
                        },
                        Err(panic) => {
                            let error = panic_message(panic.as_ref());
                            warn!(%action, %error, "Handler panicked");
                            reply::failure(CODE_PANICKED, &error)
                        },
                    };
                    if let Err(err) = reply.send(value) {
                        debug!(%action, error = %err, "Reply discarded");
                    }
                });
                Dispatched::Spawned
            },
        }
    }

    /// Dispatches every delivery of `inbox` until the transport closes it.
    pub async fn serve(&self, mut inbox: Inbox) {
        debug!(context = %self.context, actions = ?self.actions(), "Router serving");
        while let Some(delivery) = inbox.recv().await {
            let _ = self.dispatch(delivery);
        }
        debug!(context = %self.context, "Inbox closed; router stopped");
    }

    fn insert(&self, action: String, route: Route) -> &Self {
        if self.routes.write().insert(action.clone(), route).is_some() {
            warn!(context = %self.context, %action, "Handler replaced");
        }
        self
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "handler panicked".to_owned())
}
