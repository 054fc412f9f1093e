use serde::Deserialize;

/// Configuration for the status API server.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Whether the HTTP server should be started.
    #[serde(default = "default_server_enabled")]
    pub enabled: bool,

    /// Address and port for the HTTP server to listen on.
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
}

/// Provides the default value for enabled.
fn default_server_enabled() -> bool {
    true
}

/// Provides the default value for listen_address.
fn default_listen_address() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { enabled: default_server_enabled(), listen_address: default_listen_address() }
    }
}
