//! Configuration module for fewatch.

mod app_config;
mod helpers;
mod http_base;
mod server;

pub use app_config::{AppConfig, MonitorTarget};
pub use helpers::{
    deserialize_duration_from_ms, deserialize_duration_from_seconds, deserialize_time_of_day,
    serialize_duration_to_ms, serialize_duration_to_seconds,
};
pub use http_base::BaseHttpClientConfig;
pub use server::ServerConfig;
