//! The scheduling service that drives checks and the daily report.

use std::sync::Arc;

use chrono::Utc;
use tokio::{task::JoinSet, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{
    config::AppConfig,
    monitor::{checker::StockChecker, report::DailyReporter},
    notification::{Notifier, Priority},
    providers::ProductDataSource,
};

/// The Scheduler service.
///
/// Runs two independent check tickers and the daily report timer against one
/// cancellation token. Every tick spawns a full check into a `JoinSet` so a
/// slow upstream can never delay the next tick; overlapping checks are
/// permitted and race benignly on the shared metrics.
pub struct Scheduler<D: ProductDataSource + ?Sized> {
    /// Shared application configuration.
    config: Arc<AppConfig>,
    /// The checker spawned on every tick.
    checker: Arc<StockChecker<D>>,
    /// The daily report sender.
    reporter: Arc<DailyReporter>,
    /// Used for the shutdown notice once all in-flight checks have drained.
    notifier: Arc<Notifier>,
    /// A token used to signal a graceful shutdown.
    cancellation_token: CancellationToken,
}

impl<D: ProductDataSource + ?Sized + 'static> Scheduler<D> {
    /// Creates a new Scheduler instance.
    pub fn new(
        config: Arc<AppConfig>,
        checker: Arc<StockChecker<D>>,
        reporter: Arc<DailyReporter>,
        notifier: Arc<Notifier>,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self { config, checker, reporter, notifier, cancellation_token }
    }

    /// Starts the long-running scheduling loop.
    pub async fn run(self) {
        let mut checks: JoinSet<()> = JoinSet::new();

        let start = tokio::time::Instant::now();
        let mut stock_tick = tokio::time::interval_at(
            start + self.config.stock_check_interval_ms,
            self.config.stock_check_interval_ms,
        );
        stock_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut sku_tick = tokio::time::interval_at(
            start + self.config.sku_check_interval_ms,
            self.config.sku_check_interval_ms,
        );
        sku_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            stock_interval = ?self.config.stock_check_interval_ms,
            sku_interval = ?self.config.sku_check_interval_ms,
            "Starting monitoring."
        );

        loop {
            // Recomputed every iteration so the report fires at the configured
            // time of day regardless of how long the previous branch took.
            let next_report = DailyReporter::next_occurrence(Utc::now(), self.config.report_time);
            let until_report = (next_report - Utc::now()).to_std().unwrap_or_default();
            let report_delay = tokio::time::sleep(until_report);

            tokio::select! {
                biased;

                _ = self.cancellation_token.cancelled() => {
                    tracing::info!("Scheduler cancellation signal received, shutting down...");
                    break;
                }

                _ = stock_tick.tick() => self.spawn_check(&mut checks),

                _ = sku_tick.tick() => self.spawn_check(&mut checks),

                _ = report_delay => {
                    let reporter = self.reporter.clone();
                    checks.spawn(async move { reporter.send_if_due().await });
                }

                Some(result) = checks.join_next() => {
                    if let Err(e) = result {
                        tracing::error!(error = %e, "A spawned check task failed.");
                    }
                }
            }
        }

        // Let in-flight checks finish before announcing the stop.
        while let Some(result) = checks.join_next().await {
            if let Err(e) = result {
                tracing::error!(error = %e, "A spawned check task failed.");
            }
        }
        self.send_shutdown_notification().await;
        tracing::info!("Scheduler has shut down.");
    }

    fn spawn_check(&self, checks: &mut JoinSet<()>) {
        let checker = self.checker.clone();
        checks.spawn(async move {
            // Failures are already recorded in the error window by the checker.
            if let Ok(outcome) = checker.check().await {
                tracing::debug!(?outcome, "Check completed.");
            }
        });
    }

    async fn send_shutdown_notification(&self) {
        let body = format!(
            "- Locale: {}\n- GPU Model: {}",
            self.config.target.locale, self.config.target.gpu_model
        );
        match self.notifier.send("FE Tracker Stopped", &body, Priority::Default).await {
            Err(e) => tracing::error!(error = %e, "Failed to send shutdown notification."),
            Ok(()) => tracing::info!("Shutdown notification sent."),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use reqwest::Client;
    use url::Url;

    use super::*;
    use crate::{
        metrics::MetricsStore,
        models::{SearchResponse, product::SearchedProducts},
        monitor::error_window::ErrorWindow,
        providers::MockProductDataSource,
        test_helpers::AppConfigBuilder,
    };

    #[tokio::test]
    async fn test_ticks_spawn_checks_until_cancelled() {
        let mut ntfy = mockito::Server::new_async().await;
        let stopped = ntfy
            .mock("POST", "/fe-alerts")
            .match_header("Title", "FE Tracker Stopped")
            .match_header("Priority", "3")
            .match_body("- Locale: en-us\n- GPU Model: 5090")
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        let listing_calls = Arc::new(AtomicUsize::new(0));
        let mut mock = MockProductDataSource::new();
        let counter = listing_calls.clone();
        mock.expect_fetch_listing().returning(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(SearchResponse {
                searched_products: SearchedProducts { product_details: vec![] },
            })
        });

        let config = Arc::new(
            AppConfigBuilder::new()
                .product_url(
                    "https://marketplace.nvidia.com/en-us/consumer/graphics-cards/nvidia-geforce-rtx-5090/",
                )
                .stock_check_interval(50)
                .sku_check_interval(35)
                .ntfy_topic("fe-alerts")
                .build(),
        );
        let metrics = Arc::new(MetricsStore::new());
        let error_window = Arc::new(ErrorWindow::new(3, Duration::from_secs(60)));
        let base = Url::parse(&ntfy.url()).unwrap();
        let notifier =
            Arc::new(Notifier::new(Client::new(), &base, "fe-alerts", metrics.clone()).unwrap());
        let checker = Arc::new(StockChecker::new(
            Arc::new(mock),
            config.target.clone(),
            metrics.clone(),
            error_window.clone(),
            notifier.clone(),
        ));
        let reporter =
            Arc::new(DailyReporter::new(metrics.clone(), error_window, notifier.clone()));

        let token = CancellationToken::new();
        let scheduler =
            Scheduler::new(config, checker, reporter, notifier, token.clone());
        let handle = tokio::spawn(scheduler.run());

        tokio::time::sleep(Duration::from_millis(250)).await;
        token.cancel();
        handle.await.unwrap();

        stopped.assert_async().await;
        assert!(
            listing_calls.load(Ordering::SeqCst) >= 2,
            "expected both tickers to have fired at least once"
        );
        assert_eq!(metrics.snapshot().api_requests_24h, listing_calls.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_cancel_before_first_tick_still_sends_stop_notice() {
        let mut ntfy = mockito::Server::new_async().await;
        let stopped = ntfy
            .mock("POST", "/fe-alerts")
            .match_header("Title", "FE Tracker Stopped")
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        // The checker is driven through a trait object, as the supervisor
        // wires it in production.
        let data_source: Arc<dyn ProductDataSource> = Arc::new(MockProductDataSource::new());

        let config = Arc::new(AppConfigBuilder::new().ntfy_topic("fe-alerts").build());
        let metrics = Arc::new(MetricsStore::new());
        let error_window = Arc::new(ErrorWindow::new(3, Duration::from_secs(60)));
        let base = Url::parse(&ntfy.url()).unwrap();
        let notifier =
            Arc::new(Notifier::new(Client::new(), &base, "fe-alerts", metrics.clone()).unwrap());
        let checker = Arc::new(StockChecker::new(
            data_source,
            config.target.clone(),
            metrics.clone(),
            error_window.clone(),
            notifier.clone(),
        ));
        let reporter =
            Arc::new(DailyReporter::new(metrics.clone(), error_window, notifier.clone()));

        let token = CancellationToken::new();
        token.cancel();
        Scheduler::new(config, checker, reporter, notifier, token).run().await;

        stopped.assert_async().await;
        assert_eq!(metrics.snapshot().api_requests_24h, 0);
    }
}
