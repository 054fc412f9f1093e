//! The stock check pipeline: product listing, SKU match, inventory probe.

use std::sync::Arc;

use thiserror::Error;

use crate::{
    config::MonitorTarget,
    metrics::MetricsStore,
    monitor::error_window::ErrorWindow,
    notification::{Notifier, Priority},
    providers::{DataSourceError, ProductDataSource},
};

/// Custom error type for a single stock check.
#[derive(Debug, Error)]
pub enum CheckError {
    /// The product listing could not be fetched.
    #[error("Listing fetch failed: {0}")]
    Listing(#[source] DataSourceError),

    /// The inventory for the matched SKU could not be fetched.
    #[error("Inventory fetch failed: {0}")]
    Inventory(#[source] DataSourceError),
}

/// The result of a check that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// No Founders Edition entry matched the watched model.
    NoMatch,
    /// A SKU matched but is not currently purchasable.
    OutOfStock {
        /// The matched product SKU.
        sku: String,
    },
    /// The matched SKU is purchasable right now.
    InStock {
        /// The matched product SKU.
        sku: String,
        /// Direct link to the purchase page.
        purchase_url: String,
    },
}

/// Runs the stock check pipeline against a [`ProductDataSource`].
///
/// A checker is cheap to share; the scheduler clones one `Arc` per spawned
/// check so overlapping checks are permitted and race benignly
/// (last-writer-wins on the shared metrics).
pub struct StockChecker<D: ProductDataSource + ?Sized> {
    data_source: Arc<D>,
    target: MonitorTarget,
    metrics: Arc<MetricsStore>,
    error_window: Arc<ErrorWindow>,
    notifier: Arc<Notifier>,
}

impl<D: ProductDataSource + ?Sized> StockChecker<D> {
    /// Creates a new `StockChecker`.
    pub fn new(
        data_source: Arc<D>,
        target: MonitorTarget,
        metrics: Arc<MetricsStore>,
        error_window: Arc<ErrorWindow>,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self { data_source, target, metrics, error_window, notifier }
    }

    /// Performs one full check.
    ///
    /// Fetch failures are fed to the error window and surface as
    /// [`CheckError`]; the next scheduled tick is the retry. A failing stock
    /// notification is logged but does not change the outcome.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn check(&self) -> Result<CheckOutcome, CheckError> {
        self.metrics.record_api_call();
        let listing = match self.data_source.fetch_listing().await {
            Ok(listing) => listing,
            Err(e) => {
                self.report_fetch_error(&e).await;
                return Err(CheckError::Listing(e));
            }
        };

        let product = listing
            .searched_products
            .product_details
            .iter()
            .find(|p| p.is_founder_edition && p.display_name.contains(&self.target.gpu_model));
        let Some(product) = product else {
            tracing::info!(
                gpu_model = %self.target.gpu_model,
                "No matching Founders Edition card found."
            );
            return Ok(CheckOutcome::NoMatch);
        };

        let sku = product.product_sku.clone();
        self.metrics.set_current_sku(&sku);
        self.metrics.touch_activity();

        let inventory = match self.data_source.fetch_inventory(&sku, &self.target.locale).await {
            Ok(inventory) => inventory,
            Err(e) => {
                self.report_fetch_error(&e).await;
                return Err(CheckError::Inventory(e));
            }
        };

        match inventory.list_map.first() {
            Some(entry) if entry.is_purchasable() => {
                self.metrics.set_purchase_url(&entry.product_url);
                let body = format!(
                    "RTX {} IN STOCK!\nSKU: {}\n\nDirect purchase link:\n{}",
                    self.target.gpu_model, sku, entry.product_url
                );
                tracing::info!(sku = %sku, url = %entry.product_url, "Stock found.");
                if let Err(e) = self.notifier.send("STOCK FOUND!", &body, Priority::Max).await {
                    tracing::error!(error = %e, "Failed to send stock notification.");
                }
                Ok(CheckOutcome::InStock { sku, purchase_url: entry.product_url.clone() })
            }
            _ => {
                self.metrics.clear_purchase_url();
                Ok(CheckOutcome::OutOfStock { sku })
            }
        }
    }

    /// Feeds the error window and fires the throttled error-rate alert when
    /// the window calls for one.
    async fn report_fetch_error(&self, error: &DataSourceError) {
        let description = error.to_string();
        tracing::warn!(error = %description, "Fetch failed.");
        if self.error_window.add_error(&description) {
            let body = format!(
                "High error rate detected!\nLast error: {}\nTotal errors in last minute: {}",
                self.error_window.last_error().unwrap_or(description),
                self.error_window.notify_window_count(),
            );
            if let Err(e) =
                self.notifier.send("Error Threshold Reached", &body, Priority::High).await
            {
                tracing::error!(error = %e, "Failed to send error notification.");
            }
            self.error_window.mark_notified();
        }
    }
}
