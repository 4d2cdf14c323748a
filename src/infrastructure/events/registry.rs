//! Subscription registry
//!
//! Tracks live streaming connections. The subscriber set is copy-on-write:
//! subscribe and unsubscribe replace the whole map under a short write lock,
//! while broadcast iterates an `Arc` snapshot without holding any lock.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use std::task::{Context, Poll};

use futures::Stream;
use metrics::{counter, gauge};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info};

use crate::domain::change_event::{Locale, StreamMessage};

/// Identifier of one streaming connection
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionId(String);

impl SubscriptionId {
    fn generate() -> Self {
        Self(format!("sub-{}", uuid::Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a subscription left the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    /// The client went away or the stream ended normally
    Disconnected,
    /// The outbound channel was closed or full when delivering
    DeliveryFailed,
}

impl RemovalReason {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::DeliveryFailed => "delivery_failed",
        }
    }
}

/// Outbound side of one subscription
#[derive(Debug, Clone)]
struct Subscriber {
    sender: mpsc::Sender<StreamMessage>,
    /// Last publish sequence issued before this subscriber joined
    joined_at: u64,
}

type SubscriberMap = HashMap<SubscriptionId, Subscriber>;

#[derive(Debug)]
struct RegistryInner {
    subscribers: RwLock<Arc<SubscriberMap>>,
    /// Last sequence handed out by [`SubscriptionRegistry::next_sequence`]
    published: AtomicU64,
    buffer: usize,
    locale: Locale,
}

impl RegistryInner {
    fn read(&self) -> RwLockReadGuard<'_, Arc<SubscriberMap>> {
        self.subscribers.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Arc<SubscriberMap>> {
        self.subscribers.write().unwrap_or_else(|e| e.into_inner())
    }

    fn insert(&self, id: SubscriptionId, sender: mpsc::Sender<StreamMessage>) -> usize {
        let mut guard = self.write();
        let joined_at = self.published.load(Ordering::SeqCst);
        let mut next = SubscriberMap::clone(&guard);
        next.insert(id, Subscriber { sender, joined_at });
        *guard = Arc::new(next);

        let count = guard.len();
        gauge!("event_subscribers").set(count as f64);
        count
    }

    fn remove(&self, id: &SubscriptionId, reason: RemovalReason) -> bool {
        let remaining = {
            let mut guard = self.write();
            if !guard.contains_key(id) {
                return false;
            }

            let mut next = SubscriberMap::clone(&guard);
            next.remove(id);
            *guard = Arc::new(next);

            let remaining = guard.len();
            gauge!("event_subscribers").set(remaining as f64);
            remaining
        };

        counter!("event_subscribers_removed_total", "reason" => reason.as_str()).increment(1);
        info!(
            subscription_id = %id,
            reason = reason.as_str(),
            remaining,
            "Subscriber removed"
        );

        true
    }
}

/// Registry of live change-stream subscriptions
#[derive(Debug, Clone)]
pub struct SubscriptionRegistry {
    inner: Arc<RegistryInner>,
}

impl SubscriptionRegistry {
    /// Create a registry whose subscriptions buffer up to `buffer` messages each
    pub fn new(buffer: usize, locale: Locale) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                subscribers: RwLock::new(Arc::new(HashMap::new())),
                published: AtomicU64::new(0),
                buffer: buffer.max(1),
                locale,
            }),
        }
    }

    /// Open a subscription
    ///
    /// The returned handle already holds a `connected` acknowledgment and
    /// receives every message broadcast from now on.
    pub fn subscribe(&self) -> Subscription {
        let (sender, receiver) = mpsc::channel(self.inner.buffer);

        // Queued before registration, so it always precedes any change.
        let _ = sender.try_send(StreamMessage::connected(self.inner.locale));

        let id = self.attach(sender);

        Subscription {
            id,
            receiver,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Register an outbound channel and return its id
    pub(crate) fn attach(&self, sender: mpsc::Sender<StreamMessage>) -> SubscriptionId {
        let id = SubscriptionId::generate();
        let count = self.inner.insert(id.clone(), sender);

        info!(subscription_id = %id, connected_clients = count, "Subscriber connected");

        id
    }

    /// Remove a subscription; returns whether it was still registered
    pub fn unsubscribe(&self, id: &SubscriptionId) -> bool {
        self.inner.remove(id, RemovalReason::Disconnected)
    }

    /// Issue the sequence number for a newly published event
    ///
    /// Subscribers registered after this call never receive the event.
    pub fn next_sequence(&self) -> u64 {
        self.inner.published.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Deliver a message to every live subscription
    ///
    /// Subscriptions whose channel is closed or full are pruned. Returns the
    /// number of successful deliveries.
    pub fn broadcast(&self, message: &StreamMessage) -> usize {
        self.broadcast_sequenced(u64::MAX, message)
    }

    /// Deliver a message published under `sequence`
    ///
    /// Only subscriptions that joined before the sequence was issued receive it.
    pub fn broadcast_sequenced(&self, sequence: u64, message: &StreamMessage) -> usize {
        let snapshot = self.snapshot();
        let mut delivered = 0;
        let mut dead = Vec::new();

        for (id, subscriber) in snapshot.iter() {
            if subscriber.joined_at >= sequence {
                continue;
            }

            match subscriber.sender.try_send(message.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    debug!(subscription_id = %id, "Subscriber buffer full");
                    dead.push(id.clone());
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(subscription_id = %id, "Subscriber channel closed");
                    dead.push(id.clone());
                }
            }
        }

        for id in &dead {
            self.inner.remove(id, RemovalReason::DeliveryFailed);
        }

        delivered
    }

    /// Number of live subscriptions
    pub fn count(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn locale(&self) -> Locale {
        self.inner.locale
    }

    fn snapshot(&self) -> Arc<SubscriberMap> {
        Arc::clone(&self.inner.read())
    }
}

/// Handle to one open subscription
///
/// Dropping the handle unregisters it.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    receiver: mpsc::Receiver<StreamMessage>,
    registry: Weak<RegistryInner>,
}

impl Subscription {
    pub fn id(&self) -> &SubscriptionId {
        &self.id
    }

    /// Wait for the next message; `None` once the registry dropped this subscription
    pub async fn recv(&mut self) -> Option<StreamMessage> {
        self.receiver.recv().await
    }

    /// Take a message if one is ready
    pub fn try_recv(&mut self) -> Option<StreamMessage> {
        self.receiver.try_recv().ok()
    }
}

impl Stream for Subscription {
    type Item = StreamMessage;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.registry.upgrade() {
            inner.remove(&self.id, RemovalReason::Disconnected);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::change_event::{ChangeEvent, ChangeKind, ChangeNotification};

    fn change(code: &str) -> StreamMessage {
        let event = ChangeEvent::new("LAND_USE", "Land use", ChangeKind::Insert, "alice")
            .with_entity("e-1", code, "Residential");
        StreamMessage::Change(ChangeNotification::render(event, Locale::En))
    }

    fn registry() -> SubscriptionRegistry {
        SubscriptionRegistry::new(16, Locale::En)
    }

    #[tokio::test]
    async fn test_connected_ack_precedes_changes() {
        let registry = registry();
        let mut sub = registry.subscribe();

        registry.broadcast(&change("7"));

        let first = sub.recv().await.unwrap();
        assert!(matches!(first, StreamMessage::Connected { .. }));

        let second = sub.recv().await.unwrap();
        match second {
            StreamMessage::Change(n) => assert_eq!(n.event.entity_code, "7"),
            other => panic!("expected change, got {:?}", other),
        }
    }

    #[test]
    fn test_broadcast_without_subscribers() {
        let registry = registry();
        assert_eq!(registry.broadcast(&change("1")), 0);
        assert_eq!(registry.count(), 0);
    }

    #[tokio::test]
    async fn test_broadcast_reaches_all_subscribers() {
        let registry = registry();
        let mut subs: Vec<_> = (0..3).map(|_| registry.subscribe()).collect();

        assert_eq!(registry.broadcast(&change("7")), 3);

        for sub in subs.iter_mut() {
            assert!(matches!(sub.recv().await, Some(StreamMessage::Connected { .. })));
            assert!(matches!(sub.recv().await, Some(StreamMessage::Change(_))));
        }
    }

    #[tokio::test]
    async fn test_failed_delivery_prunes_only_that_subscriber() {
        let registry = registry();
        let mut healthy_a = registry.subscribe();
        let mut healthy_b = registry.subscribe();

        // A subscriber whose receiving side vanished without unsubscribing
        let (sender, receiver) = mpsc::channel(4);
        registry.attach(sender);
        drop(receiver);
        assert_eq!(registry.count(), 3);

        assert_eq!(registry.broadcast(&change("7")), 2);
        assert_eq!(registry.count(), 2);

        for sub in [&mut healthy_a, &mut healthy_b] {
            sub.recv().await.unwrap();
            assert!(matches!(sub.recv().await, Some(StreamMessage::Change(_))));
        }
    }

    #[tokio::test]
    async fn test_full_buffer_prunes_subscriber() {
        let registry = SubscriptionRegistry::new(1, Locale::En);
        let mut sub = registry.subscribe();

        // Buffer already holds the connected ack
        assert_eq!(registry.broadcast(&change("1")), 0);
        assert_eq!(registry.count(), 0);

        assert!(matches!(sub.recv().await, Some(StreamMessage::Connected { .. })));
        assert!(sub.recv().await.is_none());
    }

    #[test]
    fn test_drop_unsubscribes() {
        let registry = registry();
        let sub = registry.subscribe();
        let other = registry.subscribe();
        assert_eq!(registry.count(), 2);

        drop(sub);
        assert_eq!(registry.count(), 1);

        assert!(registry.unsubscribe(other.id()));
        assert!(!registry.unsubscribe(other.id()));
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn test_no_replay_for_late_subscribers() {
        let registry = registry();
        let _early = registry.subscribe();
        registry.broadcast(&change("1"));

        let mut late = registry.subscribe();
        assert!(matches!(late.try_recv(), Some(StreamMessage::Connected { .. })));
        assert!(late.try_recv().is_none());
    }

    #[test]
    fn test_sequenced_broadcast_skips_later_subscribers() {
        let registry = registry();
        let mut early = registry.subscribe();
        let sequence = registry.next_sequence();
        let mut late = registry.subscribe();

        assert_eq!(registry.broadcast_sequenced(sequence, &change("1")), 1);

        assert!(matches!(early.try_recv(), Some(StreamMessage::Connected { .. })));
        assert!(matches!(early.try_recv(), Some(StreamMessage::Change(_))));
        assert!(matches!(late.try_recv(), Some(StreamMessage::Connected { .. })));
        assert!(late.try_recv().is_none());

        let next = registry.next_sequence();
        assert_eq!(registry.broadcast_sequenced(next, &change("2")), 2);
        assert!(matches!(late.try_recv(), Some(StreamMessage::Change(_))));
    }

    #[test]
    fn test_subscriber_gauge_tracks_registry() {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            let registry = registry();
            let a = registry.subscribe();
            let _b = registry.subscribe();
            assert!(handle.render().contains("event_subscribers 2"));

            drop(a);
            assert!(handle.render().contains("event_subscribers 1"));
        });
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_subscribe_and_broadcast() {
        let registry = registry();
        let mut handles = Vec::new();

        for i in 0..20 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                let sub = registry.subscribe();
                registry.broadcast(&change(&i.to_string()));
                drop(sub);
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(registry.count(), 0);
    }
}
