//! Construction of the HTTP clients used for vendor API calls and ntfy
//! publishing. Timeouts and pool settings come from `BaseHttpClientConfig`.

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, HeaderMap, HeaderValue, USER_AGENT};

use crate::config::BaseHttpClientConfig;

/// Browser-style User-Agent sent to the vendor APIs, which reject requests
/// carrying a default client identity.
const API_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Builds the client used for vendor API calls.
///
/// Every request carries browser-mimicking default headers in addition to the
/// configured connect and request timeouts.
pub fn build_api_client(config: &BaseHttpClientConfig) -> Result<reqwest::Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(API_USER_AGENT));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

    reqwest::Client::builder()
        .default_headers(headers)
        .pool_max_idle_per_host(config.max_idle_per_host)
        .pool_idle_timeout(config.idle_timeout)
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .build()
}

/// Builds the plain client used for publishing notifications.
pub fn build_notify_client(
    config: &BaseHttpClientConfig,
) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .build()
}
