//! Delivery sinks.
//!
//! A sink forwards one event to wherever events go. The journal and the retry
//! store only see the [`DeliverySink`] trait, so a log-only sink and a network
//! sink are interchangeable.

use crate::Event;
use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info};

/// Future returned by [`DeliverySink::deliver`].
pub type DeliveryFuture<'a> = Pin<Box<dyn Future<Output = DeliveryOutcome> + Send + 'a>>;

/// Result of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    Failed { reason: String },
}

impl DeliveryOutcome {
    pub fn failed(reason: impl Into<String>) -> Self {
        DeliveryOutcome::Failed {
            reason: reason.into(),
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered)
    }
}

/// Something that can attempt to deliver an event.
///
/// Implementations report failure through [`DeliveryOutcome::Failed`]. A
/// panic inside `deliver` is treated by the journal as a failed attempt.
pub trait DeliverySink: Send + Sync {
    /// Attempt to deliver `event` once.
    fn deliver<'a>(&'a self, event: &'a Event) -> DeliveryFuture<'a>;
}

/// A sink that accepts and discards every event.
#[derive(Debug, Default)]
pub struct NullSink;

impl DeliverySink for NullSink {
    fn deliver<'a>(&'a self, _event: &'a Event) -> DeliveryFuture<'a> {
        Box::pin(async { DeliveryOutcome::Delivered })
    }
}

/// Development sink: logs each event and reports it delivered.
#[derive(Debug, Default)]
pub struct LoggingSink;

impl DeliverySink for LoggingSink {
    fn deliver<'a>(&'a self, event: &'a Event) -> DeliveryFuture<'a> {
        Box::pin(async move {
            info!(
                event = %event.name,
                event_id = %event.event_id,
                session_id = %event.session_id,
                fields = event.payload.len(),
                "Event sent (log only)"
            );
            DeliveryOutcome::Delivered
        })
    }
}

#[derive(Debug, Default)]
struct RecordingState {
    delivered: Vec<Event>,
    attempts: usize,
    failing: bool,
    fail_next: usize,
    fail_names: HashSet<String>,
}

/// A sink that records deliveries and can be told to fail.
///
/// Useful in tests and for dry runs where nothing should leave the process.
#[derive(Debug, Default)]
pub struct RecordingSink {
    state: Mutex<RecordingState>,
    delay: Option<Duration>,
}

impl RecordingSink {
    /// Creates a new recording sink that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sink that waits `delay` before resolving each attempt.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, RecordingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fail every attempt while `failing` is true.
    pub fn set_failing(&self, failing: bool) {
        self.state().failing = failing;
    }

    /// Fail the next `count` attempts, then recover.
    pub fn fail_next(&self, count: usize) {
        self.state().fail_next = count;
    }

    /// Always fail events with this name.
    pub fn fail_event(&self, name: &str) {
        self.state().fail_names.insert(name.to_string());
    }

    /// Events delivered successfully, in completion order.
    pub fn delivered(&self) -> Vec<Event> {
        self.state().delivered.clone()
    }

    /// Names of delivered events, in completion order.
    pub fn delivered_names(&self) -> Vec<String> {
        self.state().delivered.iter().map(|e| e.name.clone()).collect()
    }

    /// Number of delivery attempts, successful or not.
    pub fn attempts(&self) -> usize {
        self.state().attempts
    }

    fn attempt(&self, event: &Event) -> DeliveryOutcome {
        let mut state = self.state();
        state.attempts += 1;

        let fail = if state.fail_next > 0 {
            state.fail_next -= 1;
            true
        } else {
            state.failing || state.fail_names.contains(&event.name)
        };

        if fail {
            debug!(event = %event.name, event_id = %event.event_id, "Recording sink rejected event");
            DeliveryOutcome::failed("recording sink set to fail")
        } else {
            state.delivered.push(event.clone());
            DeliveryOutcome::Delivered
        }
    }
}

impl DeliverySink for RecordingSink {
    fn deliver<'a>(&'a self, event: &'a Event) -> DeliveryFuture<'a> {
        Box::pin(async move {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.attempt(event)
        })
    }
}
