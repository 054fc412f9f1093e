//! This module provides the `SupervisorBuilder` for constructing a `Supervisor`.

use std::sync::Arc;

use crate::{
    config::AppConfig,
    http_client::build_notify_client,
    http_server::ConnectionRegistry,
    metrics::MetricsStore,
    monitor::{DailyReporter, ErrorWindow, StockChecker},
    notification::Notifier,
    providers::ProductDataSource,
};

use super::{Supervisor, SupervisorError};

/// A builder for creating a `Supervisor` instance.
#[derive(Default)]
pub struct SupervisorBuilder {
    config: Option<AppConfig>,
    data_source: Option<Box<dyn ProductDataSource>>,
}

impl SupervisorBuilder {
    /// Creates a new, empty `SupervisorBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the application configuration for the `Supervisor`.
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the product data source (e.g. the NVIDIA store API client) for
    /// the `Supervisor`.
    pub fn data_source(mut self, data_source: Box<dyn ProductDataSource>) -> Self {
        self.data_source = Some(data_source);
        self
    }

    /// Assembles and validates the components to build a `Supervisor`.
    ///
    /// This method performs the final "wiring" of the application's services.
    /// It ensures all required dependencies have been provided and then
    /// constructs the internal services, such as the `StockChecker` and the
    /// `DailyReporter`.
    pub fn build(self) -> Result<Supervisor, SupervisorError> {
        let config = self.config.ok_or(SupervisorError::MissingConfig)?;
        let data_source = self.data_source.ok_or(SupervisorError::MissingDataSource)?;
        let data_source: Arc<dyn ProductDataSource> = Arc::from(data_source);

        // Every service reports into the same metrics store and error window.
        let metrics = Arc::new(MetricsStore::new());
        let error_window =
            Arc::new(ErrorWindow::new(config.error_threshold, config.error_notify_window_secs));

        let notify_client = build_notify_client(&config.http_base_config)?;
        let notifier = Arc::new(Notifier::new(
            notify_client,
            &config.ntfy_base_url,
            &config.ntfy_topic,
            Arc::clone(&metrics),
        )?);

        // Construct the internal services.
        let checker = Arc::new(StockChecker::new(
            data_source,
            config.target.clone(),
            Arc::clone(&metrics),
            Arc::clone(&error_window),
            Arc::clone(&notifier),
        ));
        let reporter = Arc::new(DailyReporter::new(
            Arc::clone(&metrics),
            Arc::clone(&error_window),
            Arc::clone(&notifier),
        ));

        // Finally, construct the Supervisor with all its components.
        Ok(Supervisor::new(
            config,
            metrics,
            error_window,
            notifier,
            checker,
            reporter,
            Arc::new(ConnectionRegistry::new()),
        ))
    }
}
