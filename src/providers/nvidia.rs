//! This module provides the `ProductDataSource` implementation backed by the
//! NVIDIA storefront search and inventory APIs.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use super::traits::{DataSourceError, ProductDataSource};
use crate::{
    config::AppConfig,
    models::{InventoryResponse, SearchResponse},
};

/// A `ProductDataSource` implementation that queries the NVIDIA storefront
/// APIs over HTTP.
pub struct NvidiaApiSource {
    client: Client,
    search_url: Url,
    inventory_api_base: Url,
}

impl NvidiaApiSource {
    /// Creates a new `NvidiaApiSource` for the configured target.
    pub fn new(client: Client, config: &AppConfig) -> Self {
        Self {
            client,
            search_url: config.search_url(),
            inventory_api_base: config.inventory_api_base.clone(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, DataSourceError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DataSourceError::UnexpectedStatus(status));
        }
        response.json::<T>().await.map_err(DataSourceError::Decode)
    }
}

#[async_trait]
impl ProductDataSource for NvidiaApiSource {
    #[tracing::instrument(skip(self), level = "debug")]
    async fn fetch_listing(&self) -> Result<SearchResponse, DataSourceError> {
        tracing::debug!(url = %self.search_url, "Fetching product listing.");
        let listing: SearchResponse = self.get_json(self.search_url.clone()).await?;
        tracing::debug!(
            product_count = listing.searched_products.product_details.len(),
            "Successfully fetched product listing."
        );
        Ok(listing)
    }

    #[tracing::instrument(skip(self), level = "debug")]
    async fn fetch_inventory(
        &self,
        sku: &str,
        locale: &str,
    ) -> Result<InventoryResponse, DataSourceError> {
        let mut url = self.inventory_api_base.clone();
        url.set_query(Some(&format!("skus={}&locale={}", urlencoding::encode(sku), locale)));
        tracing::debug!(sku, locale, "Fetching inventory.");
        let inventory: InventoryResponse = self.get_json(url).await?;
        tracing::debug!(
            entry_count = inventory.list_map.len(),
            "Successfully fetched inventory."
        );
        Ok(inventory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::AppConfigBuilder;

    fn source_for(server_url: &str) -> NvidiaApiSource {
        let config = AppConfigBuilder::new()
            .search_api_base(&format!("{server_url}/edge/product/search"))
            .inventory_api_base(&format!("{server_url}/partner/v1/feinventory"))
            .build();
        NvidiaApiSource::new(Client::new(), &config)
    }

    #[tokio::test]
    async fn test_fetch_listing_decodes_products() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/edge/product/search")
            .match_query(mockito::Matcher::UrlEncoded("gpu".into(), "RTX 5090".into()))
            .with_status(200)
            .with_body(
                r#"{"searchedProducts":{"productDetails":[
                    {"displayName":"NVIDIA RTX 5090","isFounderEdition":true,"productSKU":"NVGFT590"}
                ]}}"#,
            )
            .create_async()
            .await;

        let source = source_for(&server.url());
        let listing = source.fetch_listing().await.unwrap();

        mock.assert_async().await;
        assert_eq!(listing.searched_products.product_details.len(), 1);
        assert_eq!(listing.searched_products.product_details[0].product_sku, "NVGFT590");
    }

    #[tokio::test]
    async fn test_fetch_inventory_encodes_sku_in_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/partner/v1/feinventory")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("skus".into(), "NVGFT590 DE".into()),
                mockito::Matcher::UrlEncoded("locale".into(), "de-de".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"listMap":[{"is_active":"true","product_url":"https://store.example/buy"}]}"#,
            )
            .create_async()
            .await;

        let source = source_for(&server.url());
        let inventory = source.fetch_inventory("NVGFT590 DE", "de-de").await.unwrap();

        mock.assert_async().await;
        assert_eq!(inventory.list_map.len(), 1);
        assert!(inventory.list_map[0].is_purchasable());
    }

    #[tokio::test]
    async fn test_fetch_listing_maps_non_success_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/edge/product/search")
            .match_query(mockito::Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let source = source_for(&server.url());
        let err = source.fetch_listing().await.unwrap_err();
        assert!(matches!(err, DataSourceError::UnexpectedStatus(status) if status.as_u16() == 500));
    }

    #[tokio::test]
    async fn test_fetch_listing_maps_malformed_body_to_decode() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/edge/product/search")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let source = source_for(&server.url());
        let err = source.fetch_listing().await.unwrap_err();
        assert!(matches!(err, DataSourceError::Decode(_)));
    }
}
