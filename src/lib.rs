#![warn(missing_docs)]
//! Fewatch is a stock tracker for NVIDIA Founders Edition graphics cards. It
//! polls the store APIs for one product, publishes ntfy alerts the moment the
//! card becomes purchasable and serves a live status page over HTTP.

pub mod cmd;
pub mod config;
pub mod http_client;
pub mod http_server;
pub mod metrics;
pub mod models;
pub mod monitor;
pub mod notification;
pub mod providers;
pub mod supervisor;
pub mod test_helpers;
