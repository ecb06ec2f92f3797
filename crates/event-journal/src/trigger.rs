//! Background flushing of the retry store.
//!
//! The worker waits on connectivity changes and a periodic timer:
//! - going online records `network_online` and flushes
//! - going offline records `network_offline`
//! - a tick while online flushes whatever is queued

use crate::{names, EventJournal, Payload};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Network reachability as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Online,
    Offline,
}

/// Flush trigger configuration.
#[derive(Debug, Clone)]
pub struct TriggerConfig {
    /// Period of the retry timer.
    pub interval: Duration,
    /// Connectivity assumed at start.
    pub initial: Connectivity,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            initial: Connectivity::Online,
        }
    }
}

/// Handle to the background flush worker.
pub struct FlushTrigger {
    connectivity: watch::Sender<Connectivity>,
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl FlushTrigger {
    /// Spawn the worker on the journal's runtime.
    pub fn spawn(journal: Arc<EventJournal>, config: TriggerConfig) -> Self {
        let (connectivity, rx) = watch::channel(config.initial);
        let (stop, stop_rx) = oneshot::channel();
        let runtime = journal.runtime().clone();

        let task = runtime.spawn(run(journal, rx, stop_rx, config.clone()));

        info!(interval_secs = config.interval.as_secs(), "Flush trigger started");
        Self {
            connectivity,
            stop: Some(stop),
            task,
        }
    }

    /// Report a connectivity change. Repeating the current state is a no-op.
    pub fn set_connectivity(&self, state: Connectivity) {
        self.connectivity.send_replace(state);
    }

    pub fn connectivity(&self) -> Connectivity {
        *self.connectivity.borrow()
    }

    /// Stop the worker and wait for it to exit.
    pub async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Err(e) = (&mut self.task).await {
            warn!(error = %e, "Flush trigger task ended abnormally");
        }
        info!("Flush trigger stopped");
    }
}

async fn run(
    journal: Arc<EventJournal>,
    mut connectivity: watch::Receiver<Connectivity>,
    mut stop: oneshot::Receiver<()>,
    config: TriggerConfig,
) {
    let mut ticker = tokio::time::interval(config.interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    // Reports sent before the worker first runs still count as transitions.
    let mut current = config.initial;

    loop {
        tokio::select! {
            _ = &mut stop => break,

            changed = connectivity.changed() => {
                if changed.is_err() {
                    break;
                }
                let next = *connectivity.borrow_and_update();
                if next == current {
                    continue;
                }
                current = next;

                match next {
                    Connectivity::Online => {
                        record(&journal, names::NETWORK_ONLINE);
                        let report = journal.flush_retries().await;
                        debug!(?report, "Flushed retry queue after reconnect");
                    }
                    Connectivity::Offline => {
                        record(&journal, names::NETWORK_OFFLINE);
                    }
                }
            }

            _ = ticker.tick() => {
                if current == Connectivity::Online {
                    let report = journal.flush_retries().await;
                    if report.attempted > 0 {
                        debug!(?report, "Periodic retry flush");
                    }
                }
            }
        }
    }
}

fn record(journal: &EventJournal, name: &str) {
    if let Err(e) = journal.record(name, Payload::new()) {
        warn!(event = name, error = %e, "Failed to record connectivity event");
    }
}
