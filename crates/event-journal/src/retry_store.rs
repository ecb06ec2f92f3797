//! Persisted, bounded queue of events whose delivery failed.
//!
//! The queue lives under one storage key as a JSON array, oldest first.
//! Storage trouble never reaches enqueue or flush callers: an unreadable
//! queue reads as empty and a failed write is logged and dropped.
//!
//! Storage calls block. The async paths ([`RetryStore::enqueue_async`],
//! [`RetryStore::flush_all`]) run them on the blocking pool.

use crate::{DeliverySink, Event, JournalError, JournalResult};
use beacon_storage::{KeySpace, KeyValueStore, KeyValueStoreExt};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// What happens to events whose retried delivery fails again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushPolicy {
    /// Every attempted event leaves the queue, delivered or not.
    #[default]
    DropAll,
    /// Events that fail again go back to the queue in their original order.
    RequeueFailed,
}

/// Outcome of one [`RetryStore::flush_all`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FlushReport {
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
    /// Failed events kept in the queue. Always zero under [`FlushPolicy::DropAll`].
    pub requeued: usize,
}

/// The persisted queue itself, shared with blocking-pool tasks.
struct PersistedQueue {
    store: Arc<dyn KeyValueStore>,
    key: String,
    capacity: usize,
    /// Serializes every read-modify-write of the persisted queue.
    lock: Mutex<()>,
}

impl PersistedQueue {
    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn enqueue(&self, event: Event) {
        let _guard = self.guard();
        let mut queue = self.load();
        queue.push(event);
        let evicted = self.trim(&mut queue);
        if evicted > 0 {
            debug!(evicted, capacity = self.capacity, "Retry queue full, dropped oldest events");
        }
        self.save(&queue);
    }

    fn pending(&self) -> Vec<Event> {
        let _guard = self.guard();
        self.load()
    }

    fn clear(&self) -> JournalResult<()> {
        let _guard = self.guard();
        self.store.delete(&self.key)?;
        Ok(())
    }

    /// Current queue, persisted back so legacy entries stored without an id
    /// keep the id they were just given.
    fn snapshot(&self) -> Vec<Event> {
        let _guard = self.guard();
        let queue = self.load();
        if !queue.is_empty() {
            self.save(&queue);
        }
        queue
    }

    /// Drop attempted entries, putting `failed` back first when requeueing.
    /// Returns how many failed events stayed queued.
    fn settle(&self, attempted: HashSet<String>, failed: Vec<Event>, policy: FlushPolicy) -> usize {
        let _guard = self.guard();
        let remaining: Vec<Event> = self
            .load()
            .into_iter()
            .filter(|e| !attempted.contains(&e.event_id))
            .collect();

        let (queue, requeued) = match policy {
            FlushPolicy::DropAll => (remaining, 0),
            FlushPolicy::RequeueFailed => {
                let failed_count = failed.len();
                let mut queue = failed;
                queue.extend(remaining);
                let evicted = self.trim(&mut queue);
                (queue, failed_count.saturating_sub(evicted))
            }
        };
        self.save(&queue);
        requeued
    }

    /// Drop the oldest entries beyond capacity, returning how many went.
    fn trim(&self, queue: &mut Vec<Event>) -> usize {
        let excess = queue.len().saturating_sub(self.capacity);
        queue.drain(..excess);
        excess
    }

    fn load(&self) -> Vec<Event> {
        let raw: serde_json::Value = match self.store.get_json(&self.key) {
            Ok(Some(value)) => value,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(key = %self.key, error = %e, "Retry queue unreadable, treating as empty");
                return Vec::new();
            }
        };

        let serde_json::Value::Array(entries) = raw else {
            warn!(key = %self.key, "Retry queue is not a JSON array, treating as empty");
            return Vec::new();
        };

        entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<Event>(entry) {
                Ok(event) => Some(event),
                Err(e) => {
                    warn!(key = %self.key, error = %e, "Skipping malformed retry entry");
                    None
                }
            })
            .collect()
    }

    fn save(&self, queue: &[Event]) {
        let result = if queue.is_empty() {
            self.store.delete(&self.key).map(|_| ())
        } else {
            self.store.set_json(&self.key, queue)
        };
        if let Err(e) = result {
            warn!(key = %self.key, error = %e, "Failed to persist retry queue");
        }
    }
}

/// Bounded, persisted retry queue.
pub struct RetryStore {
    queue: Arc<PersistedQueue>,
    policy: FlushPolicy,
    /// One flush at a time. Held across deliveries.
    flush_lock: tokio::sync::Mutex<()>,
}

impl RetryStore {
    /// Create a retry store keeping at most `capacity` events.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        keys: &KeySpace,
        capacity: usize,
        policy: FlushPolicy,
    ) -> JournalResult<Self> {
        if capacity == 0 {
            return Err(JournalError::InvalidCapacity {
                component: "retry store",
            });
        }
        Ok(Self {
            queue: Arc::new(PersistedQueue {
                store,
                key: keys.failed_events(),
                capacity,
                lock: Mutex::new(()),
            }),
            policy,
            flush_lock: tokio::sync::Mutex::new(()),
        })
    }

    pub fn capacity(&self) -> usize {
        self.queue.capacity
    }

    pub fn policy(&self) -> FlushPolicy {
        self.policy
    }

    /// Append `event`, evicting the oldest entries beyond capacity.
    pub fn enqueue(&self, event: Event) {
        self.queue.enqueue(event);
    }

    /// [`enqueue`](Self::enqueue) with the storage write on the blocking pool.
    pub async fn enqueue_async(&self, event: Event) {
        self.blocking(move |queue| queue.enqueue(event)).await;
    }

    /// Queued events, oldest first.
    pub fn pending(&self) -> Vec<Event> {
        self.queue.pending()
    }

    pub fn len(&self) -> usize {
        self.pending().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every queued event. Unlike enqueue, a storage failure is returned.
    pub fn clear(&self) -> JournalResult<()> {
        self.queue.clear()
    }

    /// Deliver every queued event through `sink`, oldest first.
    ///
    /// Attempted events are removed by id once all attempts have resolved,
    /// so events enqueued while the flush is running stay queued. Under
    /// [`FlushPolicy::RequeueFailed`] failed events are put back ahead of
    /// those newer entries.
    pub async fn flush_all(&self, sink: &dyn DeliverySink) -> FlushReport {
        let _flush = self.flush_lock.lock().await;

        let snapshot = self.blocking(|queue| queue.snapshot()).await;
        if snapshot.is_empty() {
            debug!("Retry queue empty, nothing to flush");
            return FlushReport::default();
        }

        info!(count = snapshot.len(), "Retrying failed events");

        let mut report = FlushReport {
            attempted: snapshot.len(),
            ..FlushReport::default()
        };
        let mut failed = Vec::new();
        for event in &snapshot {
            let outcome = sink.deliver(event).await;
            if outcome.is_delivered() {
                report.delivered += 1;
            } else {
                debug!(event = %event.name, event_id = %event.event_id, ?outcome, "Retry failed");
                report.failed += 1;
                failed.push(event.clone());
            }
        }

        let attempted: HashSet<String> = snapshot.into_iter().map(|e| e.event_id).collect();
        let policy = self.policy;
        report.requeued = self
            .blocking(move |queue| queue.settle(attempted, failed, policy))
            .await;

        if report.failed > 0 {
            warn!(
                attempted = report.attempted,
                failed = report.failed,
                requeued = report.requeued,
                "Some retried events were not delivered"
            );
        } else {
            info!(delivered = report.delivered, "Retry queue flushed");
        }
        report
    }

    /// Run `f` against the queue on the blocking pool.
    async fn blocking<T, F>(&self, f: F) -> T
    where
        T: Default + Send + 'static,
        F: FnOnce(&PersistedQueue) -> T + Send + 'static,
    {
        let queue = Arc::clone(&self.queue);
        match tokio::task::spawn_blocking(move || f(&queue)).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key = %self.queue.key, error = %e, "Retry queue storage task failed");
                T::default()
            }
        }
    }
}
