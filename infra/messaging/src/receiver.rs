use crate::bus::Event;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Ergonomic receive for bus channels: `None` once the channel is closed.
///
/// A lagging receiver skips to the oldest retained event instead of failing.
pub trait EventReceiverExt<T> {
    fn recv(&mut self) -> impl Future<Output = Option<Arc<T>>> + Send;
}

impl<T: Event> EventReceiverExt<T> for broadcast::Receiver<Arc<T>> {
    async fn recv(&mut self) -> Option<Arc<T>> {
        let mut skipped = 0u64;

        loop {
            match Self::recv(self).await {
                Ok(event) => {
                    if skipped > 0 {
                        warn!(
                            event = std::any::type_name::<T>(),
                            skipped, "Receiver lagged; continuing from the oldest retained event"
                        );
                    }
                    return Some(event);
                },
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    skipped = skipped.saturating_add(n);
                    debug!(event = std::any::type_name::<T>(), skipped = n, "Receiver lagged");
                },
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
