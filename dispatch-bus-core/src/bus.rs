//! Replay-one event bus
//!
//! [`EventBus`] is a process-wide multicast channel. Publishing is synchronous:
//! every attached subscriber is notified before [`EventBus::publish`] returns,
//! in one global order. While at least one subscriber is attached the bus is
//! *hot* and remembers the most recent event, which is replayed to anyone who
//! attaches later. When the last subscriber detaches the bus goes *cold* and
//! the replay value is forgotten.
//!
//! ```text
//! publish(e) ──► [listener 0] ──► mpsc ──► Subscription (Stream)
//!            ├─► [listener 1] ──► projection callback
//!            └─► last = e   (only while hot)
//! ```
//!
//! The bus is a handle: clone it and pass it to everything that needs it
//! instead of reaching for a global.

use std::collections::BTreeMap;
use std::fmt;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::task::{Context, Poll};

use tokio::sync::mpsc;
use tokio_stream::Stream;
use tracing::trace;

type Listener<E> = Box<dyn Fn(&E) + Send + Sync>;

struct BusState<E> {
    /// Attached subscribers keyed by subscription id, in attach order.
    subscribers: BTreeMap<u64, Listener<E>>,
    /// Replay value; `Some` only while hot.
    last: Option<E>,
}

struct BusInner<E> {
    next_id: AtomicU64,
    state: Mutex<BusState<E>>,
}

/// Lock a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Multicast, replay-one, reference-counted event channel.
///
/// # Example
///
/// ```
/// use dispatch_bus_core::EventBus;
///
/// let bus = EventBus::<u32>::new();
///
/// // Nobody listening: the event is dropped.
/// bus.publish(1);
///
/// let mut first = bus.subscribe();
/// bus.publish(2);
/// assert_eq!(first.try_next(), Some(2));
///
/// // A late subscriber still sees the last event while the bus is hot.
/// let mut late = bus.subscribe();
/// assert_eq!(late.try_next(), Some(2));
/// ```
pub struct EventBus<E> {
    inner: Arc<BusInner<E>>,
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.inner.state);
        f.debug_struct("EventBus")
            .field("subscribers", &state.subscribers.len())
            .field("hot", &!state.subscribers.is_empty())
            .finish()
    }
}

impl<E: Clone + Send + 'static> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone + Send + 'static> EventBus<E> {
    /// Create a cold bus with no subscribers.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                next_id: AtomicU64::new(0),
                state: Mutex::new(BusState {
                    subscribers: BTreeMap::new(),
                    last: None,
                }),
            }),
        }
    }

    /// Deliver an event to every attached subscriber.
    ///
    /// Never blocks and never fails. On a cold bus the event is dropped and
    /// not remembered.
    pub fn publish(&self, event: E) {
        let mut state = lock(&self.inner.state);
        if state.subscribers.is_empty() {
            trace!("publish on cold bus dropped");
            return;
        }
        for listener in state.subscribers.values() {
            listener(&event);
        }
        state.last = Some(event);
    }

    /// Attach a synchronous callback.
    ///
    /// The callback runs inside [`publish`](Self::publish) while the bus is
    /// locked, so it must not attach to or detach from this same bus. If the
    /// bus is hot the callback is first invoked with the replay value.
    pub fn listen<F>(&self, listener: F) -> ListenerGuard<E>
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let mut state = lock(&self.inner.state);
        if let Some(last) = state.last.as_ref() {
            listener(last);
        }
        if state.subscribers.is_empty() {
            trace!(subscriber = id, "bus hot");
        }
        state.subscribers.insert(id, Box::new(listener));
        ListenerGuard {
            id,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Attach a stream subscriber.
    ///
    /// Each call yields an independent stream observing every event published
    /// from now on, preceded by the replay value if the bus is hot.
    pub fn subscribe(&self) -> Subscription<E> {
        let (tx, rx) = mpsc::unbounded_channel();
        let guard = self.listen(move |event: &E| {
            let _ = tx.send(event.clone());
        });
        Subscription { rx, guard }
    }

    /// Number of attached subscribers (streams and callbacks).
    pub fn subscriber_count(&self) -> usize {
        lock(&self.inner.state).subscribers.len()
    }

    /// Whether at least one subscriber is attached.
    pub fn is_hot(&self) -> bool {
        self.subscriber_count() > 0
    }

    /// The value a new subscriber would be replayed, if any.
    pub fn last(&self) -> Option<E> {
        lock(&self.inner.state).last.clone()
    }
}

/// Keeps a subscriber attached; detaches it when dropped.
///
/// Dropping the last guard of a bus turns it cold.
pub struct ListenerGuard<E> {
    id: u64,
    bus: Weak<BusInner<E>>,
}

impl<E> ListenerGuard<E> {
    /// The subscription id.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl<E> fmt::Debug for ListenerGuard<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerGuard").field("id", &self.id).finish()
    }
}

impl<E> Drop for ListenerGuard<E> {
    fn drop(&mut self) {
        let Some(inner) = self.bus.upgrade() else {
            return;
        };
        let removed = {
            let mut state = lock(&inner.state);
            let removed = state.subscribers.remove(&self.id);
            if removed.is_some() && state.subscribers.is_empty() {
                state.last = None;
                trace!(subscriber = self.id, "bus cold");
            }
            removed
        };
        // Listener captures are released outside the lock.
        drop(removed);
    }
}

/// Stream of events from an [`EventBus`].
pub struct Subscription<E> {
    rx: mpsc::UnboundedReceiver<E>,
    guard: ListenerGuard<E>,
}

impl<E> Subscription<E> {
    /// Wait for the next event.
    ///
    /// Returns `None` once the bus itself has been dropped.
    pub async fn recv(&mut self) -> Option<E> {
        self.rx.recv().await
    }

    /// Take an already delivered event without waiting.
    pub fn try_next(&mut self) -> Option<E> {
        self.rx.try_recv().ok()
    }

    /// The subscription id.
    pub fn id(&self) -> u64 {
        self.guard.id()
    }
}

impl<E> fmt::Debug for Subscription<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.guard.id)
            .finish()
    }
}

impl<E> Stream for Subscription<E> {
    type Item = E;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<E>> {
        self.rx.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio_stream::StreamExt;

    #[test]
    fn test_publish_reaches_every_subscriber() {
        let bus = EventBus::<u32>::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        bus.publish(7);

        assert_eq!(a.try_next(), Some(7));
        assert_eq!(b.try_next(), Some(7));
        assert_eq!(a.try_next(), None);
    }

    #[test]
    fn test_cold_publish_is_dropped() {
        let bus = EventBus::<u32>::new();
        bus.publish(1);
        assert_eq!(bus.last(), None);

        let mut sub = bus.subscribe();
        assert_eq!(sub.try_next(), None);
    }

    #[test]
    fn test_late_subscriber_gets_replay_once() {
        let bus = EventBus::<u32>::new();
        let _keep_hot = bus.subscribe();

        bus.publish(1);
        bus.publish(2);

        let mut late = bus.subscribe();
        assert_eq!(late.try_next(), Some(2));
        assert_eq!(late.try_next(), None);

        bus.publish(3);
        assert_eq!(late.try_next(), Some(3));
    }

    #[test]
    fn test_last_detach_forgets_replay() {
        let bus = EventBus::<u32>::new();
        let sub = bus.subscribe();
        bus.publish(1);
        assert_eq!(bus.last(), Some(1));

        drop(sub);
        assert!(!bus.is_hot());
        assert_eq!(bus.last(), None);

        let mut fresh = bus.subscribe();
        assert_eq!(fresh.try_next(), None);
    }

    #[test]
    fn test_publish_order_is_preserved() {
        let bus = EventBus::<u32>::new();
        let mut sub = bus.subscribe();
        for i in 0..10 {
            bus.publish(i);
        }
        let seen: Vec<u32> = std::iter::from_fn(|| sub.try_next()).collect();
        assert_eq!(seen, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_listen_runs_synchronously() {
        let bus = EventBus::<u32>::new();
        let seen = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&seen);
        let guard = bus.listen(move |v| {
            counter.fetch_add(*v as usize, Ordering::SeqCst);
        });

        bus.publish(5);
        assert_eq!(seen.load(Ordering::SeqCst), 5);
        assert_eq!(bus.subscriber_count(), 1);

        drop(guard);
        bus.publish(5);
        assert_eq!(seen.load(Ordering::SeqCst), 5);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_subscription_is_a_stream() {
        let bus = EventBus::<&'static str>::new();
        let mut sub = bus.subscribe();

        let publisher = bus.clone();
        tokio::spawn(async move {
            publisher.publish("hello");
        });

        assert_eq!(sub.next().await, Some("hello"));
    }

    #[tokio::test]
    async fn test_subscription_ends_when_bus_dropped() {
        let bus = EventBus::<u32>::new();
        let mut sub = bus.subscribe();
        drop(bus);
        assert_eq!(sub.recv().await, None);
    }
}
