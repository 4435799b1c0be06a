//! In-memory event bus for tests/dev.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, mpsc};

use thiserror::Error;

use crate::bus::{EventBus, Subscription};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InMemoryBusError {
    #[error("event bus lock poisoned")]
    Poisoned,
    /// The bus was shut down; nothing is delivered any more.
    #[error("event bus is closed")]
    Closed,
}

type Filter<M> = Box<dyn Fn(&M) -> bool + Send>;

struct Subscriber<M> {
    sender: mpsc::Sender<M>,
    filter: Option<Filter<M>>,
}

impl<M: Clone> Subscriber<M> {
    /// Deliver `message` if it passes the filter. `false` once the receiver is gone.
    fn offer(&self, message: &M) -> bool {
        if self.filter.as_ref().is_some_and(|keep| !keep(message)) {
            return true;
        }
        self.sender.send(message.clone()).is_ok()
    }
}

/// In-memory fan-out bus.
///
/// Subscribers may register a filter (e.g. terminal approval events only).
/// Receivers that were dropped are pruned on the next publish. After
/// [`InMemoryEventBus::close`] every publish fails with
/// [`InMemoryBusError::Closed`].
pub struct InMemoryEventBus<M> {
    subscribers: Mutex<Vec<Subscriber<M>>>,
    published: AtomicU64,
    closed: AtomicBool,
}

impl<M> InMemoryEventBus<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages accepted by `publish` so far.
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Acquire)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().map(|subs| subs.len()).unwrap_or(0)
    }

    /// Stop accepting messages and disconnect every subscriber.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.clear();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Subscribe to the messages for which `keep` returns true.
    pub fn subscribe_where<F>(&self, keep: F) -> Subscription<M>
    where
        F: Fn(&M) -> bool + Send + 'static,
    {
        self.register(Some(Box::new(keep)))
    }

    fn register(&self, filter: Option<Filter<M>>) -> Subscription<M> {
        let (sender, receiver) = mpsc::channel();
        // A closed bus hands out a subscription that is already disconnected.
        if !self.is_closed() {
            if let Ok(mut subs) = self.subscribers.lock() {
                subs.push(Subscriber { sender, filter });
            }
        }
        Subscription::new(receiver)
    }
}

impl<M> Default for InMemoryEventBus<M> {
    fn default() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            published: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }
}

impl<M> core::fmt::Debug for InMemoryEventBus<M> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InMemoryEventBus")
            .field("subscribers", &self.subscriber_count())
            .field("published", &self.published())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl<M> EventBus<M> for InMemoryEventBus<M>
where
    M: Clone + Send + 'static,
{
    type Error = InMemoryBusError;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        if self.is_closed() {
            return Err(InMemoryBusError::Closed);
        }
        let mut subs = self.subscribers.lock().map_err(|_| InMemoryBusError::Poisoned)?;
        subs.retain(|sub| sub.offer(&message));
        self.published.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn subscribe(&self) -> Subscription<M> {
        self.register(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_subscriber_receives_published_messages() {
        let bus: InMemoryEventBus<u32> = InMemoryEventBus::new();
        let a = bus.subscribe();
        let b = bus.subscribe();

        bus.publish(1).unwrap();
        bus.publish(2).unwrap();

        assert_eq!(a.drain(), vec![1, 2]);
        assert_eq!(b.drain(), vec![1, 2]);
        assert_eq!(bus.published(), 2);
    }

    #[test]
    fn dropped_subscribers_are_pruned_on_publish() {
        let bus: InMemoryEventBus<&'static str> = InMemoryEventBus::new();
        drop(bus.subscribe());
        let live = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish("approved").unwrap();
        assert_eq!(live.try_recv().unwrap(), "approved");
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn filtered_subscription_sees_only_matching_messages() {
        let bus: InMemoryEventBus<u32> = InMemoryEventBus::new();
        let even = bus.subscribe_where(|n| n % 2 == 0);
        let all = bus.subscribe();

        for n in 1..=5 {
            bus.publish(n).unwrap();
        }

        assert_eq!(even.drain(), vec![2, 4]);
        assert_eq!(all.drain(), vec![1, 2, 3, 4, 5]);
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[test]
    fn closed_bus_refuses_publish_and_disconnects_subscribers() {
        let bus: InMemoryEventBus<u32> = InMemoryEventBus::new();
        let sub = bus.subscribe();
        bus.publish(7).unwrap();

        bus.close();
        assert_eq!(bus.publish(8), Err(InMemoryBusError::Closed));
        assert_eq!(bus.published(), 1);
        assert_eq!(bus.subscriber_count(), 0);

        assert_eq!(sub.try_recv().unwrap(), 7);
        assert!(sub.recv().is_err());
        assert!(bus.subscribe().recv().is_err());
    }
}
