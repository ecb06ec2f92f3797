//! Streaming mode: record JSON lines from stdin with background retries.

use beacon_config_and_utils::Config;
use event_journal::{
    Connectivity, DeliveryTask, EventJournal, FlushTrigger, JournalOverview, Payload,
    TriggerConfig,
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// One stdin line: an event, or a connectivity report.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InputLine {
    Connectivity { connectivity: ConnectivityInput },
    Event {
        event: String,
        #[serde(default)]
        data: Payload,
    },
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ConnectivityInput {
    Online,
    Offline,
}

impl From<ConnectivityInput> for Connectivity {
    fn from(value: ConnectivityInput) -> Self {
        match value {
            ConnectivityInput::Online => Connectivity::Online,
            ConnectivityInput::Offline => Connectivity::Offline,
        }
    }
}

/// Record stdin lines until EOF or Ctrl-C, then return the journal overview.
pub async fn run(
    journal: Arc<EventJournal>,
    config: &Config,
) -> Result<JournalOverview, Box<dyn std::error::Error>> {
    let trigger = FlushTrigger::spawn(
        journal.clone(),
        TriggerConfig {
            interval: Duration::from_secs(config.retry_interval_secs),
            initial: Connectivity::Online,
        },
    );

    let mut deliveries: Vec<DeliveryTask> = Vec::new();
    deliveries.push(journal.start_session(Payload::new())?.delivery);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                break;
            }
        };
        let Some(line) = line else { break };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<InputLine>(line) {
            Ok(InputLine::Event { event, data }) => match journal.record(&event, data) {
                Ok(recorded) => deliveries.push(recorded.delivery),
                Err(e) => warn!(error = %e, "Rejected event"),
            },
            Ok(InputLine::Connectivity { connectivity }) => {
                trigger.set_connectivity(connectivity.into());
            }
            Err(e) => warn!(error = %e, "Skipping malformed input line"),
        }

        deliveries.retain(|task| !task.is_finished());
    }

    for task in deliveries {
        task.wait().await;
    }
    trigger.shutdown().await;

    Ok(journal.overview())
}
