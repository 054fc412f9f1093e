//! This module defines the interface for fetching product data from the
//! storefront APIs.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use thiserror::Error;

use crate::models::{InventoryResponse, SearchResponse};

/// Custom error type for data source operations.
#[derive(Error, Debug)]
pub enum DataSourceError {
    /// Error when performing the HTTP request.
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// The upstream API answered with an unexpected status code.
    #[error("Unexpected status code: {0}")]
    UnexpectedStatus(reqwest::StatusCode),

    /// The response body could not be decoded.
    #[error("Failed to decode response: {0}")]
    Decode(#[source] reqwest::Error),
}

/// A trait for a data source that can fetch storefront product data.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProductDataSource: Send + Sync {
    /// Fetches the product listing for the watched GPU model.
    async fn fetch_listing(&self) -> Result<SearchResponse, DataSourceError>;

    /// Fetches the inventory entries for a single SKU in a locale.
    async fn fetch_inventory(
        &self,
        sku: &str,
        locale: &str,
    ) -> Result<InventoryResponse, DataSourceError>;
}
