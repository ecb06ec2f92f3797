//! Wiring of the journal from configuration.

use beacon_config_and_utils::{Config, Paths};
use beacon_storage::KeySpace;
use event_journal::{
    DeliverySink, EventJournal, FlushPolicy, HttpSink, HttpSinkConfig, IdentityProvider,
    JournalConfig, LoggingSink, RetryStore,
};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::info;

/// Build a journal over the file store in `paths`.
pub fn build_journal(
    config: &Config,
    paths: &Paths,
) -> Result<Arc<EventJournal>, Box<dyn std::error::Error>> {
    paths.ensure_dirs()?;
    let store = beacon_storage::open_store(&paths.store_file())?;
    let keys = KeySpace::new(config.storage_namespace.as_str());

    let identity = Arc::new(IdentityProvider::new(store.clone(), &keys));
    let retry_store = Arc::new(RetryStore::new(
        store,
        &keys,
        config.retry_capacity,
        flush_policy(config),
    )?);

    let journal = EventJournal::new(
        JournalConfig {
            capacity: config.journal_capacity,
            page_url: config.page_url.clone(),
        },
        identity,
        retry_store,
        build_sink(config)?,
        Handle::current(),
    )?;
    Ok(Arc::new(journal))
}

fn flush_policy(config: &Config) -> FlushPolicy {
    if config.requeue_failed_on_flush {
        FlushPolicy::RequeueFailed
    } else {
        FlushPolicy::DropAll
    }
}

fn build_sink(config: &Config) -> Result<Arc<dyn DeliverySink>, Box<dyn std::error::Error>> {
    match config.collector_url()? {
        Some(url) => {
            info!(url = %url, "Delivering events to collector");
            let sink = HttpSink::new(HttpSinkConfig {
                endpoint: url.to_string(),
                timeout_secs: config.request_timeout_secs,
            })?;
            Ok(Arc::new(sink))
        }
        None => {
            info!("No collector configured, events are logged only");
            Ok(Arc::new(LoggingSink))
        }
    }
}
