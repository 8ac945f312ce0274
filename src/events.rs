//! Typed publish/subscribe channel.
//!
//! # Responsibilities
//! - Hand out one unbounded receiver per subscriber
//! - Deliver every published event to every live subscriber, in publish order
//! - Drop subscribers whose receiver has gone away
//!
//! # Design Decisions
//! - Unbounded `mpsc` per subscriber instead of `broadcast`: a slow observer
//!   must never lose an intermediate event to lagging
//! - Publishing never blocks, so it is safe to call while holding a lock

use std::sync::{Mutex, PoisonError};
use tokio::sync::mpsc;

/// Fan-out of events of type `T` to any number of subscribers.
pub struct EventBus<T> {
    subscribers: Mutex<Vec<mpsc::UnboundedSender<T>>>,
}

impl<T: Clone> EventBus<T> {
    /// Create a bus with no subscribers.
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Register a new subscriber.
    ///
    /// The receiver sees every event published after this call.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    /// Deliver `event` to every live subscriber.
    pub fn publish(&self, event: T) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Drop all subscribers. Their receivers observe end-of-stream.
    pub fn close(&self) {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    #[cfg(test)]
    fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl<T: Clone> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_all_subscribers_in_order() {
        let bus = EventBus::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        bus.publish(1u32);
        bus.publish(2u32);

        assert_eq!(a.recv().await, Some(1));
        assert_eq!(a.recv().await, Some(2));
        assert_eq!(b.recv().await, Some(1));
        assert_eq!(b.recv().await, Some(2));
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let bus = EventBus::new();
        let rx = bus.subscribe();
        let _kept = bus.subscribe();
        drop(rx);

        bus.publish("hello");
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_close_ends_streams() {
        let bus: EventBus<u8> = EventBus::new();
        let mut rx = bus.subscribe();
        bus.close();
        assert_eq!(rx.recv().await, None);
    }
}
