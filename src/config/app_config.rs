use std::time::Duration;

use chrono::NaiveTime;
use config::{Config, ConfigError, Environment, File};
use regex::Regex;
use serde::Deserialize;
use url::Url;

use super::{
    BaseHttpClientConfig, ServerConfig, deserialize_duration_from_ms,
    deserialize_duration_from_seconds, deserialize_time_of_day,
};

/// Pattern extracting the store locale and GPU model from a product page URL,
/// e.g. `https://marketplace.nvidia.com/de-de/consumer/graphics-cards/nvidia-geforce-rtx-5090/`.
/// Matched against the lowercased path; the first `rtx-NNNN` slug wins.
const PRODUCT_URL_PATTERN: &str = r"/([a-z]{2}-[a-z]{2})/.*?rtx-(\d{4})";

/// Provides the default value for ntfy_base_url.
fn default_ntfy_base_url() -> Url {
    Url::parse("https://ntfy.sh").expect("default ntfy URL is valid")
}

/// Provides the default value for search_api_base.
fn default_search_api_base() -> Url {
    Url::parse("https://api.nvidia.partners/edge/product/search")
        .expect("default search API URL is valid")
}

/// Provides the default value for inventory_api_base.
fn default_inventory_api_base() -> Url {
    Url::parse("https://api.store.nvidia.com/partner/v1/feinventory")
        .expect("default inventory API URL is valid")
}

/// Provides the default value for report_time.
fn default_report_time() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).expect("default report time is valid")
}

/// Provides the default value for error_threshold.
fn default_error_threshold() -> usize {
    3
}

/// Provides the default value for error_notify_window_secs.
fn default_error_notify_window() -> Duration {
    Duration::from_secs(60)
}

/// Provides the default value for shutdown_timeout_secs.
fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(30)
}

/// The product being watched, derived from the configured product page URL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonitorTarget {
    /// Store locale, e.g. `en-us`.
    pub locale: String,
    /// Four-digit GPU model, e.g. `5090`.
    pub gpu_model: String,
}

impl MonitorTarget {
    /// Derives the target from a product page URL.
    ///
    /// The URL must contain a `xx-xx` locale path segment and an `rtx-NNNN`
    /// model slug, in that order. Matching is case-insensitive; the derived
    /// locale and model are always lowercase.
    pub fn from_url(url: &Url) -> Result<Self, ConfigError> {
        let re = Regex::new(PRODUCT_URL_PATTERN).map_err(|e| ConfigError::Message(e.to_string()))?;
        let path = url.path().to_lowercase();
        let captures = re.captures(&path).ok_or_else(|| {
            ConfigError::Message(format!(
                "product_url '{url}' does not contain a locale and an rtx-NNNN model slug"
            ))
        })?;
        Ok(Self { locale: captures[1].to_string(), gpu_model: captures[2].to_string() })
    }
}

/// Application configuration for fewatch.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// URL of the product page being watched. The store locale and GPU model
    /// are derived from it.
    pub product_url: Url,

    /// The interval in milliseconds between full stock checks.
    #[serde(deserialize_with = "deserialize_duration_from_ms")]
    pub stock_check_interval_ms: Duration,

    /// The interval in milliseconds between SKU refresh checks.
    #[serde(deserialize_with = "deserialize_duration_from_ms")]
    pub sku_check_interval_ms: Duration,

    /// The ntfy topic that alerts are published to.
    pub ntfy_topic: String,

    /// Base URL of the ntfy server.
    #[serde(default = "default_ntfy_base_url")]
    pub ntfy_base_url: Url,

    /// Base URL of the product search API.
    #[serde(default = "default_search_api_base")]
    pub search_api_base: Url,

    /// Base URL of the inventory API.
    #[serde(default = "default_inventory_api_base")]
    pub inventory_api_base: Url,

    /// Wall-clock time of day (UTC, `HH:MM`) at which the daily status report
    /// is sent.
    #[serde(default = "default_report_time", deserialize_with = "deserialize_time_of_day")]
    pub report_time: NaiveTime,

    /// Number of errors within the notify window that triggers an error-rate
    /// alert.
    #[serde(default = "default_error_threshold")]
    pub error_threshold: usize,

    /// The sliding window in seconds used for the error-rate alert decision.
    #[serde(
        default = "default_error_notify_window",
        deserialize_with = "deserialize_duration_from_seconds"
    )]
    pub error_notify_window_secs: Duration,

    /// The maximum time in seconds to wait for graceful shutdown.
    #[serde(
        default = "default_shutdown_timeout",
        deserialize_with = "deserialize_duration_from_seconds"
    )]
    pub shutdown_timeout: Duration,

    /// Configuration for the base HTTP client.
    #[serde(default)]
    pub http_base_config: BaseHttpClientConfig,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// The watched locale and GPU model, derived from `product_url`.
    #[serde(skip_deserializing)]
    pub target: MonitorTarget,
}

impl AppConfig {
    /// Creates a new `AppConfig` by reading from the configuration directory.
    ///
    /// The file `<dir>/fewatch.yaml` is optional; environment variables with
    /// the `FEWATCH` prefix override it (`__` separates nested keys).
    pub fn new(config_dir: Option<&str>) -> Result<Self, ConfigError> {
        let config_dir_str = config_dir.unwrap_or("configs");
        let s = Config::builder()
            .add_source(File::with_name(&format!("{}/fewatch.yaml", config_dir_str)).required(false))
            .add_source(Environment::with_prefix("FEWATCH").separator("__"))
            .build()?;
        let mut config: Self = s.try_deserialize()?;

        config.target = MonitorTarget::from_url(&config.product_url)?;
        config.validate()?;

        Ok(config)
    }

    /// Validates settings that serde alone cannot check.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stock_check_interval_ms.is_zero() {
            return Err(ConfigError::Message(
                "stock_check_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.sku_check_interval_ms.is_zero() {
            return Err(ConfigError::Message(
                "sku_check_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.ntfy_topic.trim().is_empty() {
            return Err(ConfigError::Message("ntfy_topic must not be empty".to_string()));
        }
        Ok(())
    }

    /// Builds the concrete product search URL for the derived target.
    pub fn search_url(&self) -> Url {
        let mut url = self.search_api_base.clone();
        url.set_query(Some(&format!(
            "page=1&limit=12&locale={}&gpu=RTX%20{}",
            self.target.locale, self.target.gpu_model
        )));
        url
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let product_url = Url::parse(
            "https://marketplace.nvidia.com/en-us/consumer/graphics-cards/nvidia-geforce-rtx-5090/",
        )
        .expect("default product URL is valid");
        let target = MonitorTarget::from_url(&product_url).unwrap_or_default();
        Self {
            product_url,
            stock_check_interval_ms: Duration::from_secs(60),
            sku_check_interval_ms: Duration::from_secs(30),
            ntfy_topic: String::new(),
            ntfy_base_url: default_ntfy_base_url(),
            search_api_base: default_search_api_base(),
            inventory_api_base: default_inventory_api_base(),
            report_time: default_report_time(),
            error_threshold: default_error_threshold(),
            error_notify_window_secs: default_error_notify_window(),
            shutdown_timeout: default_shutdown_timeout(),
            http_base_config: BaseHttpClientConfig::default(),
            server: ServerConfig::default(),
            target,
        }
    }
}
