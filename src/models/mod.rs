//! This module contains the data models for the fewatch application.

pub mod product;
pub mod status;

pub use product::{InventoryEntry, InventoryResponse, ProductDetail, SearchResponse};
pub use status::{StatusMetrics, StatusResponse, format_uptime};
