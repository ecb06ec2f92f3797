//! # Event Journal
//!
//! Bounded in-memory event journal with a durable, bounded retry queue.
//!
//! ```text
//! record(name, payload)
//!   -> journal buffer (capacity N, drop-oldest)
//!   -> DeliverySink::deliver (spawned, one attempt)
//!        -> on failure: RetryStore::enqueue (capacity M, drop-oldest, persisted)
//!
//! FlushTrigger (connectivity / timer) -> RetryStore::flush_all(sink)
//! ```
//!
//! Delivery and storage failures are absorbed and logged; the only errors a
//! caller sees are its own mistakes (blank event names, zero capacities).

mod error;
mod event;
mod http_sink;
mod identity;
mod journal;
pub mod names;
mod retry_store;
mod sink;
mod summary;
mod trigger;

#[cfg(test)]
mod tests;

pub use error::{JournalError, JournalResult};
pub use event::{payload_from, Event, Payload, PayloadValue};
pub use http_sink::{HttpSink, HttpSinkConfig, SinkError};
pub use identity::{
    generate_session_id, generate_user_id, is_generated_user_id, IdentityProvider, ID_SUFFIX_LEN,
};
pub use journal::{DeliveryTask, EventJournal, History, JournalConfig, RecordedEvent};
pub use retry_store::{FlushPolicy, FlushReport, RetryStore};
pub use sink::{
    DeliveryFuture, DeliveryOutcome, DeliverySink, LoggingSink, NullSink, RecordingSink,
};
pub use summary::{EventSummary, JournalOverview, SinceFilter};
pub use trigger::{Connectivity, FlushTrigger, TriggerConfig};

/// Default number of events kept in memory.
pub const DEFAULT_JOURNAL_CAPACITY: usize = 100;
