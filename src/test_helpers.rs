//! A set of helpers for testing

use std::time::Duration;

use url::Url;

use crate::config::{AppConfig, MonitorTarget};

/// A builder for creating `AppConfig` instances for testing.
#[derive(Debug, Default, Clone)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    /// Creates a new `AppConfigBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the product page URL and re-derives the monitor target from it.
    pub fn product_url(mut self, url: &str) -> Self {
        self.config.product_url = Url::parse(url).expect("invalid product URL in test");
        self.config.target = MonitorTarget::from_url(&self.config.product_url).unwrap_or_default();
        self
    }

    /// Sets the interval between full stock checks, in milliseconds.
    pub fn stock_check_interval(mut self, interval_ms: u64) -> Self {
        self.config.stock_check_interval_ms = Duration::from_millis(interval_ms);
        self
    }

    /// Sets the interval between SKU refresh checks, in milliseconds.
    pub fn sku_check_interval(mut self, interval_ms: u64) -> Self {
        self.config.sku_check_interval_ms = Duration::from_millis(interval_ms);
        self
    }

    /// Sets the ntfy topic that alerts are published to.
    pub fn ntfy_topic(mut self, topic: &str) -> Self {
        self.config.ntfy_topic = topic.to_string();
        self
    }

    /// Sets the base URL of the ntfy server.
    pub fn ntfy_base_url(mut self, url: &str) -> Self {
        self.config.ntfy_base_url = Url::parse(url).expect("invalid ntfy URL in test");
        self
    }

    /// Sets the base URL of the product search API.
    pub fn search_api_base(mut self, url: &str) -> Self {
        self.config.search_api_base = Url::parse(url).expect("invalid search URL in test");
        self
    }

    /// Sets the base URL of the inventory API.
    pub fn inventory_api_base(mut self, url: &str) -> Self {
        self.config.inventory_api_base = Url::parse(url).expect("invalid inventory URL in test");
        self
    }

    /// Sets the error count that triggers an error-rate alert.
    pub fn error_threshold(mut self, threshold: usize) -> Self {
        self.config.error_threshold = threshold;
        self
    }

    /// Sets the sliding window used for the error-rate alert decision.
    pub fn error_notify_window(mut self, window: Duration) -> Self {
        self.config.error_notify_window_secs = window;
        self
    }

    /// Sets the address the status server listens on.
    pub fn listen_address(mut self, address: &str) -> Self {
        self.config.server.listen_address = address.to_string();
        self
    }

    /// Builds the `AppConfig` with the provided or default values.
    pub fn build(self) -> AppConfig {
        self.config
    }
}

/// Builds a search API response body with a single product entry.
pub fn listing_json(display_name: &str, founder_edition: bool, sku: &str) -> String {
    format!(
        r#"{{"searchedProducts":{{"productDetails":[
            {{"displayName":"{display_name}","isFounderEdition":{founder_edition},"productSKU":"{sku}"}}
        ]}}}}"#
    )
}

/// Builds an inventory API response body with a single entry.
pub fn inventory_json(is_active: &str, product_url: &str) -> String {
    format!(r#"{{"listMap":[{{"is_active":"{is_active}","product_url":"{product_url}"}}]}}"#)
}
