//! Journal and retry queue bounds.

use super::{names, Harness};
use crate::{payload_from, JournalError, Payload};
use std::collections::HashSet;

#[tokio::test]
async fn journal_evicts_oldest_beyond_capacity() {
    let h = Harness::new(3, 50);
    for name in ["A", "B", "C", "D"] {
        h.record_and_wait(name).await;
    }

    assert_eq!(names(&h.journal.history()), vec!["B", "C", "D"]);
    assert_eq!(h.journal.len(), 3);
}

#[tokio::test]
async fn history_length_is_min_of_records_and_capacity() {
    let h = Harness::new(100, 50);
    for k in 1..=250usize {
        h.journal.record("scroll_depth", Payload::new()).unwrap();
        assert_eq!(h.journal.history().len(), k.min(100));
    }
}

#[tokio::test]
async fn retry_queue_evicts_oldest_beyond_capacity() {
    let h = Harness::new(100, 2);
    h.sink.set_failing(true);
    for name in ["X", "Y", "Z"] {
        h.record_and_wait(name).await;
    }

    assert_eq!(names(&h.retry().pending()), vec!["Y", "Z"]);
}

#[tokio::test]
async fn retry_queue_holds_most_recent_failures() {
    let h = Harness::new(100, 50);
    h.sink.set_failing(true);
    for i in 0..80 {
        h.record_and_wait(&format!("e{}", i)).await;
    }

    let pending = h.retry().pending();
    assert_eq!(pending.len(), 50);
    assert_eq!(pending[0].name, "e30");
    assert_eq!(pending[49].name, "e79");
}

#[tokio::test]
async fn bounds_are_independent() {
    let h = Harness::new(2, 5);
    h.sink.set_failing(true);
    for name in ["a", "b", "c", "d"] {
        h.record_and_wait(name).await;
    }

    assert_eq!(h.journal.len(), 2);
    assert_eq!(h.retry().len(), 4);
}

#[tokio::test]
async fn history_is_restartable_and_read_only() {
    let h = Harness::new(10, 10);
    h.record_and_wait("page_visible").await;
    h.record_and_wait("page_hidden").await;

    let history = h.journal.history();
    let first: Vec<_> = history.iter().map(|e| e.event_id.clone()).collect();
    let second: Vec<_> = history.iter().map(|e| e.event_id.clone()).collect();
    assert_eq!(first, second);
    assert_eq!(h.journal.history(), history);
    assert_eq!(h.journal.len(), 2);
}

#[tokio::test]
async fn timestamps_never_decrease() {
    let h = Harness::new(500, 10);
    for _ in 0..300 {
        h.journal.record("time_on_page", Payload::new()).unwrap();
    }

    let history = h.journal.history().into_vec();
    assert!(history.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
}

#[tokio::test]
async fn event_ids_are_unique() {
    let h = Harness::new(200, 10);
    for _ in 0..200 {
        h.journal.record("product_click", Payload::new()).unwrap();
    }

    let ids: HashSet<_> = h.journal.history().into_iter().map(|e| e.event_id).collect();
    assert_eq!(ids.len(), 200);
}

#[tokio::test]
async fn blank_names_are_rejected_without_side_effects() {
    let h = Harness::new(10, 10);
    h.sink.set_failing(true);

    for name in ["", "   "] {
        let result = h.journal.record(name, payload_from([("k", "v")]));
        assert!(matches!(result, Err(JournalError::EmptyEventName)));
    }
    tokio::task::yield_now().await;

    assert!(h.journal.is_empty());
    assert_eq!(h.sink.attempts(), 0);
    assert!(h.retry().is_empty());
}

#[tokio::test]
async fn zero_journal_capacity_is_rejected() {
    use crate::{EventJournal, IdentityProvider, JournalConfig, NullSink, RetryStore};
    use beacon_storage::{KeySpace, KeyValueStore, MemoryStore};
    use std::sync::Arc;

    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let keys = KeySpace::default();
    let result = EventJournal::new(
        JournalConfig {
            capacity: 0,
            page_url: None,
        },
        Arc::new(IdentityProvider::new(store.clone(), &keys)),
        Arc::new(RetryStore::new(store, &keys, 5, Default::default()).unwrap()),
        Arc::new(NullSink),
        tokio::runtime::Handle::current(),
    );

    assert!(matches!(
        result,
        Err(JournalError::InvalidCapacity { component: "journal" })
    ));
}
