//! HTTP collector sink.

use crate::{DeliveryFuture, DeliveryOutcome, DeliverySink, Event};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from a single collector request.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Network or transport-level error from reqwest.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Collector answered with a non-success status.
    #[error("Collector error: {status} - {body}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The response body, for debugging.
        body: String,
    },
}

/// HTTP sink configuration.
#[derive(Debug, Clone)]
pub struct HttpSinkConfig {
    /// Collector endpoint that accepts one JSON event per POST.
    pub endpoint: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl HttpSinkConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout_secs: 10,
        }
    }
}

/// Posts each event as JSON to a collector endpoint.
///
/// Any 2xx response counts as delivered; everything else, including
/// timeouts and connection errors, is a failed attempt. Retrying is the
/// retry store's job, not this sink's.
pub struct HttpSink {
    config: HttpSinkConfig,
    client: Client,
}

impl HttpSink {
    /// Create a new HTTP sink.
    pub fn new(config: HttpSinkConfig) -> Result<Self, SinkError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    async fn try_deliver(&self, event: &Event) -> Result<(), SinkError> {
        debug!(
            url = %self.config.endpoint,
            event = %event.name,
            event_id = %event.event_id,
            "Sending event"
        );

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(event)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SinkError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

impl DeliverySink for HttpSink {
    fn deliver<'a>(&'a self, event: &'a Event) -> DeliveryFuture<'a> {
        Box::pin(async move {
            match self.try_deliver(event).await {
                Ok(()) => DeliveryOutcome::Delivered,
                Err(e) => {
                    warn!(
                        event = %event.name,
                        event_id = %event.event_id,
                        error = %e,
                        "Failed to send event"
                    );
                    DeliveryOutcome::failed(e.to_string())
                }
            }
        })
    }
}
