//! Per-session event fan-out.
//!
//! Each subscriber owns a bounded FIFO queue. Emission snapshots the current
//! subscribers under the registry lock and then delivers to each queue
//! without holding it, so a slow consumer never blocks registration or the
//! other subscribers. Delivery is best-effort and at-most-once: when a queue
//! is full its oldest item is dropped to make room.

use crewtalk_domain::{EventEnvelope, SessionEvent};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;
use tracing::{debug, trace};

/// Default capacity of each subscriber queue
pub const SUBSCRIBER_CAPACITY: usize = 200;

type Registry = HashMap<String, HashMap<u64, Arc<SubscriberQueue>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A subscriber's bounded queue
struct SubscriberQueue {
    items: Mutex<VecDeque<EventEnvelope>>,
    capacity: usize,
    closed: AtomicBool,
    notify: Notify,
}

impl SubscriberQueue {
    fn new(capacity: usize) -> Self {
        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            closed: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    fn try_push(&self, envelope: EventEnvelope) -> Result<(), EventEnvelope> {
        let mut items = lock(&self.items);
        if items.len() >= self.capacity {
            return Err(envelope);
        }
        items.push_back(envelope);
        Ok(())
    }

    /// Push, dropping exactly one oldest item and retrying once when full.
    /// Returns false when the envelope was dropped for this subscriber.
    fn offer(&self, envelope: EventEnvelope) -> bool {
        let delivered = match self.try_push(envelope) {
            Ok(()) => true,
            Err(envelope) => {
                lock(&self.items).pop_front();
                self.try_push(envelope).is_ok()
            }
        };
        if delivered {
            self.notify.notify_one();
        }
        delivered
    }

    fn pop(&self) -> Option<EventEnvelope> {
        lock(&self.items).pop_front()
    }

    fn len(&self) -> usize {
        lock(&self.items).len()
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }
}

/// Fan-out hub shared by every engine in the process
pub struct Broadcaster {
    listeners: Arc<Mutex<Registry>>,
    next_id: AtomicU64,
    capacity: usize,
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::with_capacity(SUBSCRIBER_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            listeners: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
            capacity: capacity.max(1),
        }
    }

    /// Register a new subscriber for a session.
    ///
    /// The subscription unregisters itself when dropped.
    pub fn subscribe(&self, session_id: &str) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let queue = Arc::new(SubscriberQueue::new(self.capacity));
        lock(&self.listeners)
            .entry(session_id.to_string())
            .or_default()
            .insert(id, Arc::clone(&queue));
        debug!(session_id, subscriber = id, "Subscriber registered");

        Subscription {
            session_id: session_id.to_string(),
            id,
            queue,
            listeners: Arc::clone(&self.listeners),
        }
    }

    /// Number of live subscribers for a session
    pub fn subscriber_count(&self, session_id: &str) -> usize {
        lock(&self.listeners)
            .get(session_id)
            .map(|subs| subs.len())
            .unwrap_or(0)
    }

    /// Deliver an event to every current subscriber of a session.
    ///
    /// Never fails and never blocks on a consumer.
    pub fn emit(&self, session_id: &str, event: SessionEvent) {
        let targets: Vec<Arc<SubscriberQueue>> = match lock(&self.listeners).get(session_id) {
            Some(subs) => subs.values().cloned().collect(),
            None => return,
        };
        if targets.is_empty() {
            return;
        }

        let envelope = EventEnvelope::new(session_id, event);
        for queue in targets {
            if !queue.offer(envelope.clone()) {
                trace!(session_id, event = envelope.name(), "Dropped event for full subscriber");
            }
        }
    }

    /// Remove every subscriber of a session, sending each a final
    /// `session.closed` event.
    pub fn close_session(&self, session_id: &str) {
        let removed = lock(&self.listeners).remove(session_id).unwrap_or_default();
        debug!(session_id, subscribers = removed.len(), "Closing session stream");

        let envelope = EventEnvelope::new(session_id, SessionEvent::SessionClosed {});
        for queue in removed.into_values() {
            queue.offer(envelope.clone());
            queue.close();
        }
    }
}

/// Receiving end of one subscriber's queue
pub struct Subscription {
    session_id: String,
    id: u64,
    queue: Arc<SubscriberQueue>,
    listeners: Arc<Mutex<Registry>>,
}

impl Subscription {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Wait for the next event. Returns `None` once the session stream has
    /// been closed and every queued event has been consumed.
    pub async fn recv(&mut self) -> Option<EventEnvelope> {
        loop {
            if let Some(envelope) = self.queue.pop() {
                return Some(envelope);
            }
            if self.queue.closed.load(Ordering::SeqCst) {
                return None;
            }
            self.queue.notify.notified().await;
        }
    }

    /// Take the next queued event without waiting
    pub fn try_recv(&mut self) -> Option<EventEnvelope> {
        self.queue.pop()
    }

    /// Number of events waiting in the queue
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.queue.closed.load(Ordering::SeqCst)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let mut listeners = lock(&self.listeners);
        if let Some(subs) = listeners.get_mut(&self.session_id) {
            subs.remove(&self.id);
            if subs.is_empty() {
                listeners.remove(&self.session_id);
            }
        }
    }
}
