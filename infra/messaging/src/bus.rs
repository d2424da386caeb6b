use crate::error::MessagingError;
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::any::{Any, TypeId, type_name};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{trace, warn};

/// Tab and config events arrive in bursts of a few; 64 leaves room for slow subscribers.
const DEFAULT_CAPACITY: usize = 64;

/// Marker trait for types that can be sent across the [`EventBus`].
pub trait Event: Any + Send + Sync + 'static {}
impl<T: Any + Send + Sync + 'static> Event for T {}

#[derive(Debug)]
struct ChannelState {
    capacity: usize,
    sender: Box<dyn Any + Send + Sync>,
}

impl ChannelState {
    fn broadcast<T: Event>(&self) -> Result<broadcast::Sender<Arc<T>>, MessagingError> {
        self.sender
            .downcast_ref::<broadcast::Sender<Arc<T>>>()
            .cloned()
            .ok_or_else(|| type_mismatch::<T>())
    }
}

/// In-process event bus of one context, keyed by event type. Every subscriber sees every
/// event published after it subscribed.
///
/// Clones share the same channels.
///
/// ```rust
/// use gpilot_messaging::{EventBus, EventReceiverExt};
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct TabClosed(u32);
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), gpilot_messaging::MessagingError> {
/// let bus = EventBus::new();
/// let mut rx = bus.subscribe::<TabClosed>()?;
/// bus.publish(TabClosed(7))?;
/// assert_eq!(EventReceiverExt::recv(&mut rx).await.map(|e| e.0), Some(7));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    channels: Arc<RwLock<FxHashMap<TypeId, ChannelState>>>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to broadcasts of `T` with the default buffer.
    ///
    /// # Errors
    /// Returns [`MessagingError::TypeMismatch`] if the channel registry is inconsistent.
    pub fn subscribe<T: Event>(&self) -> Result<broadcast::Receiver<Arc<T>>, MessagingError> {
        self.subscribe_with_capacity::<T>(DEFAULT_CAPACITY)
    }

    /// Subscribes to broadcasts of `T`; the capacity only applies when the channel is new.
    ///
    /// # Errors
    /// Returns [`MessagingError::InvalidCapacity`] for a zero capacity.
    pub fn subscribe_with_capacity<T: Event>(
        &self,
        capacity: usize,
    ) -> Result<broadcast::Receiver<Arc<T>>, MessagingError> {
        if capacity == 0 {
            return Err(MessagingError::InvalidCapacity {
                message: "capacity must be >= 1".into(),
                context: Some(type_name::<T>().into()),
            });
        }
        Ok(self.broadcast_sender::<T>(capacity)?.subscribe())
    }

    /// Publishes `event` to every current subscriber, returning how many received it.
    ///
    /// # Errors
    /// Returns [`MessagingError::TypeMismatch`] if the channel registry is inconsistent.
    pub fn publish<T: Event>(&self, event: T) -> Result<usize, MessagingError> {
        let sender = self.broadcast_sender::<T>(DEFAULT_CAPACITY)?;
        let count = sender.send(Arc::new(event)).unwrap_or(0);
        trace!(event = type_name::<T>(), count, "Event dispatched");
        Ok(count)
    }

    /// Drops every channel; subscribers observe closure once drained.
    #[must_use]
    pub fn shutdown(&self) -> usize {
        let mut channels = self.channels.write();
        let count = channels.len();
        channels.clear();
        count
    }

    fn broadcast_sender<T: Event>(
        &self,
        capacity: usize,
    ) -> Result<broadcast::Sender<Arc<T>>, MessagingError> {
        let id = TypeId::of::<T>();
        if let Some(state) = self.channels.read().get(&id) {
            if state.capacity != capacity && capacity != DEFAULT_CAPACITY {
                warn!(
                    event = type_name::<T>(),
                    existing = state.capacity,
                    requested = capacity,
                    "Broadcast channel already initialized with a different capacity"
                );
            }
            return state.broadcast::<T>();
        }

        let mut channels = self.channels.write();
        channels
            .entry(id)
            .or_insert_with(|| {
                trace!(event = type_name::<T>(), capacity, "Initializing broadcast channel");
                let (tx, _) = broadcast::channel::<Arc<T>>(capacity);
                ChannelState { capacity, sender: Box::new(tx) }
            })
            .broadcast::<T>()
    }
}

fn type_mismatch<T>() -> MessagingError {
    MessagingError::TypeMismatch {
        message: type_name::<T>().into(),
        context: Some("Unexpected event type".into()),
    }
}
