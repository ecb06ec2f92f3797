//! Behavioural tests for the event journal.
//!
//! - `capacity.rs` - journal and retry queue bounds, history reads
//! - `delivery.rs` - delivery attempts, routing failures to the retry store
//! - `retry.rs`    - flushing, persistence, storage failures
//! - `identity.rs` - user and session ids
//! - `trigger.rs`  - connectivity and timer driven flushing

mod capacity;
mod trigger;

use crate::{
    EventJournal, FlushPolicy, IdentityProvider, JournalConfig, RecordingSink, RetryStore,
};
use beacon_storage::{KeySpace, KeyValueStore, MemoryStore, StorageError, StorageResult};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

/// A journal wired to a recording sink over an in-memory store.
pub(crate) struct Harness {
    pub store: Arc<dyn KeyValueStore>,
    pub sink: Arc<RecordingSink>,
    pub journal: Arc<EventJournal>,
}

impl Harness {
    pub fn new(journal_capacity: usize, retry_capacity: usize) -> Self {
        Self::build(
            Arc::new(MemoryStore::new()),
            Arc::new(RecordingSink::new()),
            journal_capacity,
            retry_capacity,
            FlushPolicy::DropAll,
        )
    }

    pub fn build(
        store: Arc<dyn KeyValueStore>,
        sink: Arc<RecordingSink>,
        journal_capacity: usize,
        retry_capacity: usize,
        policy: FlushPolicy,
    ) -> Self {
        let keys = KeySpace::default();
        let identity = Arc::new(IdentityProvider::new(store.clone(), &keys));
        let retry = Arc::new(
            RetryStore::new(store.clone(), &keys, retry_capacity, policy).unwrap(),
        );
        let journal = EventJournal::new(
            JournalConfig {
                capacity: journal_capacity,
                page_url: Some("https://myron.shop/".to_string()),
            },
            identity,
            retry,
            sink.clone(),
            Handle::current(),
        )
        .unwrap();

        Self {
            store,
            sink,
            journal: Arc::new(journal),
        }
    }

    pub fn retry(&self) -> &RetryStore {
        self.journal.retry_store()
    }

    /// Record an event with an empty payload and wait for its delivery.
    pub async fn record_and_wait(&self, name: &str) {
        let recorded = self.journal.record(name, crate::Payload::new()).unwrap();
        recorded.delivery.wait().await;
    }
}

pub(crate) fn names<'a, I>(events: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a crate::Event>,
{
    events.into_iter().map(|e| e.name.clone()).collect()
}

/// Poll `check` until it holds or two seconds pass.
pub(crate) async fn wait_until<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while tokio::time::Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

/// A store whose reads and writes can be switched to fail.
#[derive(Default)]
pub(crate) struct FailingStore {
    inner: MemoryStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl FailingStore {
    /// A store that fails every operation.
    pub fn broken() -> Self {
        let store = Self::default();
        store.set_fail_reads(true);
        store.set_fail_writes(true);
        store
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn unavailable() -> StorageError {
        StorageError::Unavailable("injected failure".to_string())
    }
}

impl KeyValueStore for FailingStore {
    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        self.inner.set(key, value)
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        self.inner.get(key)
    }

    fn delete(&self, key: &str) -> StorageResult<bool> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        self.inner.delete(key)
    }
}

/// A store whose writes can be made to stall, like a slow disk.
pub(crate) struct SlowStore {
    inner: MemoryStore,
    write_delay: Duration,
    slow: AtomicBool,
}

impl SlowStore {
    pub fn new(write_delay: Duration) -> Self {
        Self {
            inner: MemoryStore::new(),
            write_delay,
            slow: AtomicBool::new(false),
        }
    }

    pub fn set_slow(&self, slow: bool) {
        self.slow.store(slow, Ordering::SeqCst);
    }

    fn stall(&self) {
        if self.slow.load(Ordering::SeqCst) {
            std::thread::sleep(self.write_delay);
        }
    }
}

impl KeyValueStore for SlowStore {
    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.stall();
        self.inner.set(key, value)
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.inner.get(key)
    }

    fn delete(&self, key: &str) -> StorageResult<bool> {
        self.stall();
        self.inner.delete(key)
    }
}
