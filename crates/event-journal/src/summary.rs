//! Summaries over journal history.

use crate::names;
use crate::Event;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Which events a summary covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SinceFilter {
    /// Every buffered event.
    #[default]
    All,
    /// Events on the current UTC calendar date.
    Today,
    /// Events at or after the given instant.
    Since(DateTime<Utc>),
}

impl SinceFilter {
    /// Whether an event stamped `timestamp` matches, evaluated at `now`.
    pub fn matches(&self, timestamp: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            SinceFilter::All => true,
            SinceFilter::Today => timestamp.date_naive() == now.date_naive(),
            SinceFilter::Since(start) => timestamp >= *start,
        }
    }
}

/// Event counts grouped by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventSummary {
    pub total: usize,
    pub counts: BTreeMap<String, usize>,
}

impl EventSummary {
    /// Count for one event name, zero if never seen.
    pub fn count(&self, name: &str) -> usize {
        self.counts.get(name).copied().unwrap_or(0)
    }
}

pub(crate) fn summarize_at<'a, I>(events: I, since: SinceFilter, now: DateTime<Utc>) -> EventSummary
where
    I: IntoIterator<Item = &'a Event>,
{
    let mut summary = EventSummary::default();
    for event in events {
        if !since.matches(event.timestamp, now) {
            continue;
        }
        summary.total += 1;
        *summary.counts.entry(event.name.clone()).or_insert(0) += 1;
    }
    summary
}

/// Snapshot of the journal for dashboards and the CLI.
///
/// Click and submission counts cover today only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalOverview {
    pub total_events: usize,
    pub today_events: usize,
    pub session_id: String,
    pub user_id: String,
    pub whatsapp_clicks: usize,
    pub product_clicks: usize,
    pub form_submissions: usize,
}

impl JournalOverview {
    pub(crate) fn build(
        total_events: usize,
        today: &EventSummary,
        session_id: String,
        user_id: String,
    ) -> Self {
        Self {
            total_events,
            today_events: today.total,
            session_id,
            user_id,
            whatsapp_clicks: today.count(names::WHATSAPP_CLICK),
            product_clicks: today.count(names::PRODUCT_CLICK),
            form_submissions: today.count(names::FORM_SUBMIT),
        }
    }
}
