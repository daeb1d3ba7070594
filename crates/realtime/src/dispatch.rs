//! Multi-subscriber delivery registry
//!
//! Fans inbound deliveries out to every mounted view. Each subscriber gets
//! its own channel and is individually removable; dropping a subscription
//! closes its channel and the registry prunes it on the next broadcast.

use std::collections::HashMap;

use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

/// Registry of live subscribers for one kind of delivery
pub struct Dispatcher<T> {
    subscribers: RwLock<HashMap<Uuid, mpsc::UnboundedSender<T>>>,
}

/// One subscriber's receiving end.
///
/// Dropping the subscription unsubscribes implicitly.
pub struct Subscription<T> {
    id: Uuid,
    rx: mpsc::UnboundedReceiver<T>,
}

impl<T> Subscription<T> {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Wait for the next delivery; `None` once unsubscribed and drained
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }
}

impl<T: Clone> Dispatcher<T> {
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new subscriber
    pub async fn subscribe(&self) -> Subscription<T> {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();

        let mut subscribers = self.subscribers.write().await;
        subscribers.insert(id, tx);
        tracing::debug!(
            subscription_id = %id,
            subscriber_count = subscribers.len(),
            "Subscriber registered"
        );

        Subscription { id, rx }
    }

    /// Remove a subscriber explicitly
    pub async fn unsubscribe(&self, id: Uuid) {
        let mut subscribers = self.subscribers.write().await;
        if subscribers.remove(&id).is_some() {
            tracing::debug!(
                subscription_id = %id,
                subscriber_count = subscribers.len(),
                "Subscriber removed"
            );
        }
    }

    /// Deliver an item to every live subscriber.
    ///
    /// Subscribers whose receiving end is gone are pruned here.
    pub async fn broadcast(&self, item: T) {
        let mut subscribers = self.subscribers.write().await;
        let before = subscribers.len();

        subscribers.retain(|id, tx| {
            if tx.send(item.clone()).is_ok() {
                true
            } else {
                tracing::debug!(subscription_id = %id, "Pruned closed subscriber");
                false
            }
        });

        tracing::trace!(
            recipients = subscribers.len(),
            pruned = before - subscribers.len(),
            "Broadcast delivery"
        );
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }
}

impl<T: Clone> Default for Dispatcher<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_every_subscriber_receives_broadcast() {
        let dispatcher = Dispatcher::new();
        let mut first = dispatcher.subscribe().await;
        let mut second = dispatcher.subscribe().await;

        dispatcher.broadcast("hello".to_string()).await;

        assert_eq!(first.try_recv().as_deref(), Some("hello"));
        assert_eq!(second.try_recv().as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_only_that_subscriber() {
        let dispatcher = Dispatcher::new();
        let mut first = dispatcher.subscribe().await;
        let mut second = dispatcher.subscribe().await;

        dispatcher.unsubscribe(first.id()).await;
        dispatcher.broadcast(42u32).await;

        assert!(first.try_recv().is_none());
        assert_eq!(second.try_recv(), Some(42));
    }

    #[tokio::test]
    async fn test_dropped_subscription_is_pruned() {
        let dispatcher = Dispatcher::new();
        let first = dispatcher.subscribe().await;
        let mut second = dispatcher.subscribe().await;
        assert_eq!(dispatcher.subscriber_count().await, 2);

        drop(first);
        dispatcher.broadcast(1u32).await;

        assert_eq!(dispatcher.subscriber_count().await, 1);
        assert_eq!(second.try_recv(), Some(1));
    }

    #[tokio::test]
    async fn test_broadcast_without_subscribers_is_noop() {
        let dispatcher: Dispatcher<u32> = Dispatcher::new();
        dispatcher.broadcast(7).await;
        assert_eq!(dispatcher.subscriber_count().await, 0);
    }
}
