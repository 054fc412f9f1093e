//! Data models for the vendor product APIs.

use serde::Deserialize;

/// Response from the product search API.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SearchResponse {
    /// The container for the listed products.
    #[serde(rename = "searchedProducts", default)]
    pub searched_products: SearchedProducts,
}

/// The list of product descriptors in a search response.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SearchedProducts {
    /// Descriptors for each listed product.
    #[serde(rename = "productDetails", default)]
    pub product_details: Vec<ProductDetail>,
}

/// One product descriptor from the search API.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProductDetail {
    /// Human-readable product name, e.g. `NVIDIA RTX 5090`.
    #[serde(rename = "displayName", default)]
    pub display_name: String,

    /// Whether this product is a Founders Edition card.
    #[serde(rename = "isFounderEdition", default)]
    pub is_founder_edition: bool,

    /// The SKU used when querying inventory.
    #[serde(rename = "productSKU", default)]
    pub product_sku: String,
}

/// Response from the inventory API.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct InventoryResponse {
    /// Inventory entries for the queried SKUs.
    #[serde(rename = "listMap", default)]
    pub list_map: Vec<InventoryEntry>,
}

/// One inventory entry for a SKU.
///
/// The upstream feed types `is_active` as a string; any value other than the
/// literal `"false"` means the product is purchasable.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct InventoryEntry {
    /// String-typed availability flag with a `"false"` sentinel.
    #[serde(default)]
    pub is_active: String,

    /// Direct purchase link for the product.
    #[serde(default)]
    pub product_url: String,
}

impl InventoryEntry {
    /// Whether this entry marks the product as purchasable.
    pub fn is_purchasable(&self) -> bool {
        self.is_active != "false"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_response_deserializes_camel_case() {
        let json = r#"{
            "searchedProducts": {
                "productDetails": [
                    {
                        "displayName": "NVIDIA RTX 5090",
                        "isFounderEdition": true,
                        "productSKU": "NVGFT590"
                    },
                    {
                        "displayName": "PARTNER RTX 5090 OC",
                        "isFounderEdition": false,
                        "productSKU": "PRT590OC"
                    }
                ]
            }
        }"#;
        let response: SearchResponse = serde_json::from_str(json).unwrap();
        let details = &response.searched_products.product_details;
        assert_eq!(details.len(), 2);
        assert_eq!(details[0].display_name, "NVIDIA RTX 5090");
        assert!(details[0].is_founder_edition);
        assert_eq!(details[0].product_sku, "NVGFT590");
        assert!(!details[1].is_founder_edition);
    }

    #[test]
    fn test_search_response_tolerates_empty_listing() {
        let json = r#"{"searchedProducts": {}}"#;
        let response: SearchResponse = serde_json::from_str(json).unwrap();
        assert!(response.searched_products.product_details.is_empty());
    }

    #[test]
    fn test_inventory_response_deserializes_snake_case() {
        let json = r#"{
            "listMap": [
                {"is_active": "true", "product_url": "https://store.example/buy/NVGFT590"}
            ]
        }"#;
        let response: InventoryResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.list_map.len(), 1);
        assert!(response.list_map[0].is_purchasable());
        assert_eq!(response.list_map[0].product_url, "https://store.example/buy/NVGFT590");
    }

    #[test]
    fn test_inventory_entry_false_sentinel() {
        let entry = InventoryEntry { is_active: "false".to_string(), product_url: String::new() };
        assert!(!entry.is_purchasable());

        // Anything that is not the literal sentinel counts as purchasable.
        let entry = InventoryEntry { is_active: "TRUE".to_string(), product_url: String::new() };
        assert!(entry.is_purchasable());
    }
}
