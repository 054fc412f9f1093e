//! # Notification Service
//!
//! This module is responsible for publishing push alerts to an [ntfy](https://ntfy.sh)
//! topic. It is the single outbound alerting path: stock alerts, error-rate
//! alerts, daily reports and lifecycle notices all go through [`Notifier`].
//!
//! Every send attempt is counted in the shared [`MetricsStore`] before the
//! outcome is known, so the published counter means "alerts attempted" rather
//! than "alerts delivered".

use std::sync::Arc;

use reqwest::Client;
use url::Url;

pub mod error;

use error::NotificationError;

use crate::metrics::MetricsStore;

/// Message priority, mapped to the ntfy `Priority` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    /// Lowest priority, no notification sound.
    Min,
    /// Low priority.
    Low,
    /// Default priority.
    Default,
    /// High priority, used for error-rate alerts.
    High,
    /// Maximum priority, reserved for stock alerts.
    Max,
}

impl Priority {
    /// The ntfy header value for this priority.
    fn as_header_value(self) -> &'static str {
        match self {
            Priority::Min => "1",
            Priority::Low => "2",
            Priority::Default => "3",
            Priority::High => "4",
            Priority::Max => "5",
        }
    }
}

/// A service that publishes plain-text alerts to a single ntfy topic.
pub struct Notifier {
    client: Client,
    endpoint: Url,
    metrics: Arc<MetricsStore>,
}

impl Notifier {
    /// Creates a new `Notifier` publishing to `<base_url>/<topic>`.
    pub fn new(
        client: Client,
        base_url: &Url,
        topic: &str,
        metrics: Arc<MetricsStore>,
    ) -> Result<Self, NotificationError> {
        if topic.is_empty() {
            return Err(NotificationError::ConfigError("ntfy topic must not be empty".to_string()));
        }
        let endpoint = base_url.join(topic).map_err(|e| {
            NotificationError::ConfigError(format!("invalid ntfy endpoint for topic '{topic}': {e}"))
        })?;
        Ok(Self { client, endpoint, metrics })
    }

    /// Publishes one alert.
    ///
    /// The attempt is counted before the request is sent. A non-success status
    /// code and a transport failure both surface as an error; callers log and
    /// carry on.
    #[tracing::instrument(skip(self, body), level = "debug")]
    pub async fn send(
        &self,
        title: &str,
        body: &str,
        priority: Priority,
    ) -> Result<(), NotificationError> {
        self.metrics.record_notification();

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("Title", title)
            .header("Priority", priority.as_header_value())
            .header("Content-Type", "text/plain")
            .body(body.to_string())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotificationError::UnexpectedStatus(status));
        }
        tracing::debug!(title, "Notification published.");
        Ok(())
    }
}
