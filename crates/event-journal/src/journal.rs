//! The bounded event journal.

use crate::summary::summarize_at;
use crate::{
    names, DeliveryOutcome, DeliverySink, Event, EventSummary, FlushReport, IdentityProvider,
    JournalError, JournalOverview, JournalResult, Payload, RetryStore, SinceFilter,
    DEFAULT_JOURNAL_CAPACITY,
};
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Journal configuration.
#[derive(Debug, Clone)]
pub struct JournalConfig {
    /// Maximum number of events kept in memory.
    pub capacity: usize,
    /// Location stamped on every event, if any.
    pub page_url: Option<String>,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_JOURNAL_CAPACITY,
            page_url: None,
        }
    }
}

/// Handle to the delivery attempt spawned by [`EventJournal::record`].
///
/// Dropping it detaches the attempt; it still runs to completion.
#[derive(Debug)]
pub struct DeliveryTask {
    handle: JoinHandle<DeliveryOutcome>,
}

impl DeliveryTask {
    /// Wait for the attempt to resolve. A failed outcome has already been
    /// queued for retry by the time this returns.
    pub async fn wait(self) -> DeliveryOutcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) => DeliveryOutcome::failed(format!("delivery task aborted: {}", e)),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// An event accepted by the journal, plus its pending delivery.
#[derive(Debug)]
pub struct RecordedEvent {
    pub event: Event,
    pub delivery: DeliveryTask,
}

/// Snapshot of the journal's buffered events, oldest first.
///
/// Iterating does not touch the journal and can be repeated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    events: Vec<Event>,
}

impl History {
    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn last(&self) -> Option<&Event> {
        self.events.last()
    }

    pub fn into_vec(self) -> Vec<Event> {
        self.events
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

impl IntoIterator for History {
    type Item = Event;
    type IntoIter = std::vec::IntoIter<Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

struct JournalState {
    events: VecDeque<Event>,
    last_timestamp: Option<DateTime<Utc>>,
}

/// Bounded in-memory journal that forwards every event to a sink.
///
/// `record` never waits on delivery. Each event gets exactly one attempt on
/// the runtime; a failed attempt lands in the [`RetryStore`] once.
pub struct EventJournal {
    config: JournalConfig,
    identity: Arc<IdentityProvider>,
    retry_store: Arc<RetryStore>,
    sink: Arc<dyn DeliverySink>,
    runtime: Handle,
    state: Mutex<JournalState>,
}

impl EventJournal {
    /// Create a journal. Delivery attempts are spawned on `runtime`.
    pub fn new(
        config: JournalConfig,
        identity: Arc<IdentityProvider>,
        retry_store: Arc<RetryStore>,
        sink: Arc<dyn DeliverySink>,
        runtime: Handle,
    ) -> JournalResult<Self> {
        if config.capacity == 0 {
            return Err(JournalError::InvalidCapacity { component: "journal" });
        }
        let state = JournalState {
            events: VecDeque::with_capacity(config.capacity),
            last_timestamp: None,
        };
        Ok(Self {
            config,
            identity,
            retry_store,
            sink,
            runtime,
            state: Mutex::new(state),
        })
    }

    fn state(&self) -> MutexGuard<'_, JournalState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record an event and start its delivery.
    pub fn record(&self, name: &str, payload: Payload) -> JournalResult<RecordedEvent> {
        if name.trim().is_empty() {
            return Err(JournalError::EmptyEventName);
        }

        let user_id = self.identity.user_id();

        let event = {
            let mut state = self.state();
            let now = Utc::now();
            let timestamp = match state.last_timestamp {
                Some(last) if last > now => last,
                _ => now,
            };
            state.last_timestamp = Some(timestamp);

            let event = Event {
                event_id: crate::event::new_event_id(),
                name: name.to_string(),
                payload,
                timestamp,
                session_id: self.identity.session_id().to_string(),
                user_id,
                page_url: self.config.page_url.clone(),
            };

            state.events.push_back(event.clone());
            while state.events.len() > self.config.capacity {
                state.events.pop_front();
            }
            event
        };

        debug!(event = %event.name, event_id = %event.event_id, "Event recorded");

        let delivery = self.spawn_delivery(event.clone());
        Ok(RecordedEvent { event, delivery })
    }

    fn spawn_delivery(&self, event: Event) -> DeliveryTask {
        let sink = Arc::clone(&self.sink);
        let retry_store = Arc::clone(&self.retry_store);

        let handle = self.runtime.spawn(async move {
            // Run the attempt as its own task so a panicking sink still
            // counts as a failed attempt.
            let attempt = {
                let event = event.clone();
                tokio::spawn(async move { sink.deliver(&event).await })
            };
            let outcome = match attempt.await {
                Ok(outcome) => outcome,
                Err(e) => DeliveryOutcome::failed(format!("delivery attempt aborted: {}", e)),
            };

            if let DeliveryOutcome::Failed { reason } = &outcome {
                warn!(
                    event = %event.name,
                    event_id = %event.event_id,
                    reason = %reason,
                    "Failed to send event, queued for retry"
                );
                retry_store.enqueue_async(event).await;
            }
            outcome
        });

        DeliveryTask { handle }
    }

    /// Record the `session_start` event carrying `payload`.
    pub fn start_session(&self, mut payload: Payload) -> JournalResult<RecordedEvent> {
        payload
            .entry("session_id".to_string())
            .or_insert_with(|| self.identity.session_id().into());
        payload
            .entry("start_time".to_string())
            .or_insert_with(|| Utc::now().to_rfc3339().into());
        self.record(names::SESSION_START, payload)
    }

    /// Buffered events, oldest first.
    pub fn history(&self) -> History {
        History {
            events: self.state().events.iter().cloned().collect(),
        }
    }

    /// Counts by event name over buffered events matching `since`.
    pub fn summarize(&self, since: SinceFilter) -> EventSummary {
        let state = self.state();
        summarize_at(&state.events, since, Utc::now())
    }

    /// Totals, identifiers and today's headline counts.
    pub fn overview(&self) -> JournalOverview {
        let (total, today) = {
            let state = self.state();
            (
                state.events.len(),
                summarize_at(&state.events, SinceFilter::Today, Utc::now()),
            )
        };
        JournalOverview::build(
            total,
            &today,
            self.identity.session_id().to_string(),
            self.identity.user_id(),
        )
    }

    /// Flush the retry store through this journal's sink.
    pub async fn flush_retries(&self) -> FlushReport {
        self.retry_store.flush_all(self.sink.as_ref()).await
    }

    pub fn len(&self) -> usize {
        self.state().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().events.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    pub fn session_id(&self) -> &str {
        self.identity.session_id()
    }

    pub fn user_id(&self) -> String {
        self.identity.user_id()
    }

    pub fn identity(&self) -> &Arc<IdentityProvider> {
        &self.identity
    }

    pub fn retry_store(&self) -> &Arc<RetryStore> {
        &self.retry_store
    }

    pub fn sink(&self) -> &Arc<dyn DeliverySink> {
        &self.sink
    }

    pub(crate) fn runtime(&self) -> &Handle {
        &self.runtime
    }
}
