//! Connectivity and timer driven flushing.

use super::{names, wait_until, Harness};
use crate::{names as event_names, Connectivity, FlushTrigger, TriggerConfig};
use std::time::Duration;

fn config(interval: Duration, initial: Connectivity) -> TriggerConfig {
    TriggerConfig { interval, initial }
}

#[tokio::test]
async fn going_online_records_event_and_flushes() {
    let h = Harness::new(20, 10);
    h.sink.set_failing(true);
    h.record_and_wait("form_submit").await;
    assert_eq!(h.retry().len(), 1);

    let trigger = FlushTrigger::spawn(
        h.journal.clone(),
        config(Duration::from_secs(3600), Connectivity::Offline),
    );
    h.sink.set_failing(false);
    trigger.set_connectivity(Connectivity::Online);

    let journal = h.journal.clone();
    assert!(wait_until(|| {
        let journal = journal.clone();
        async move { journal.retry_store().is_empty() }
    })
    .await);
    assert!(h.sink.delivered_names().contains(&"form_submit".to_string()));
    assert!(names(&h.journal.history()).contains(&event_names::NETWORK_ONLINE.to_string()));

    trigger.shutdown().await;
}

#[tokio::test]
async fn going_offline_records_event_without_flushing() {
    let h = Harness::new(20, 10);
    h.sink.set_failing(true);
    h.record_and_wait("product_click").await;

    let trigger = FlushTrigger::spawn(
        h.journal.clone(),
        config(Duration::from_secs(3600), Connectivity::Online),
    );
    trigger.set_connectivity(Connectivity::Offline);
    assert_eq!(trigger.connectivity(), Connectivity::Offline);

    let journal = h.journal.clone();
    assert!(wait_until(|| {
        let journal = journal.clone();
        async move {
            names(&journal.history()).contains(&event_names::NETWORK_OFFLINE.to_string())
        }
    })
    .await);

    let sink = h.sink.clone();
    assert!(wait_until(|| {
        let sink = sink.clone();
        async move { sink.attempts() == 2 }
    })
    .await);
    trigger.shutdown().await;

    assert_eq!(names(&h.retry().pending()), vec!["product_click", "network_offline"]);
}

#[tokio::test]
async fn repeated_state_is_ignored() {
    let h = Harness::new(20, 10);
    let trigger = FlushTrigger::spawn(
        h.journal.clone(),
        config(Duration::from_secs(3600), Connectivity::Online),
    );

    trigger.set_connectivity(Connectivity::Online);
    tokio::time::sleep(Duration::from_millis(50)).await;
    trigger.shutdown().await;

    assert!(h.journal.is_empty());
}

#[tokio::test]
async fn timer_flushes_while_online() {
    let h = Harness::new(20, 10);
    h.sink.fail_next(1);
    h.record_and_wait("whatsapp_click").await;
    assert_eq!(h.retry().len(), 1);

    let trigger = FlushTrigger::spawn(
        h.journal.clone(),
        config(Duration::from_millis(30), Connectivity::Online),
    );

    let retry_empty = {
        let journal = h.journal.clone();
        wait_until(move || {
            let journal = journal.clone();
            async move { journal.retry_store().is_empty() }
        })
        .await
    };
    assert!(retry_empty);
    assert_eq!(h.sink.delivered_names(), vec!["whatsapp_click"]);

    trigger.shutdown().await;
}

#[tokio::test]
async fn timer_does_not_flush_while_offline() {
    let h = Harness::new(20, 10);
    h.sink.fail_next(1);
    h.record_and_wait("whatsapp_click").await;

    let trigger = FlushTrigger::spawn(
        h.journal.clone(),
        config(Duration::from_millis(20), Connectivity::Offline),
    );
    tokio::time::sleep(Duration::from_millis(120)).await;
    trigger.shutdown().await;

    assert_eq!(h.retry().len(), 1);
    assert_eq!(h.sink.attempts(), 1);
}

#[tokio::test]
async fn shutdown_stops_the_worker() {
    let h = Harness::new(20, 10);
    let trigger = FlushTrigger::spawn(h.journal.clone(), TriggerConfig::default());
    trigger.shutdown().await;

    h.sink.fail_next(1);
    h.record_and_wait("page_hidden").await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(h.retry().len(), 1);
}
