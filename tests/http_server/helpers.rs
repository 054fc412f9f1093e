use std::{net::SocketAddr, sync::Arc, time::Duration};

use fewatch::{
    http_server::{self, ApiState, ConnectionRegistry},
    metrics::MetricsStore,
    monitor::ErrorWindow,
};
use reqwest::Client;
use tokio::task;
use tokio_util::sync::CancellationToken;

pub fn create_test_state() -> ApiState {
    ApiState {
        metrics: Arc::new(MetricsStore::new()),
        error_window: Arc::new(ErrorWindow::new(3, Duration::from_secs(60))),
        connections: Arc::new(ConnectionRegistry::new()),
        shutdown: CancellationToken::new(),
    }
}

pub struct TestServer {
    pub address: SocketAddr,
    pub state: ApiState,
    pub server_handle: task::JoinHandle<()>,
    pub client: Client,
}

impl TestServer {
    pub async fn new() -> Self {
        Self::with_state(create_test_state()).await
    }

    pub async fn with_state(state: ApiState) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get address");
        drop(listener); // Release port for the app to use

        let server_state = state.clone();
        let listen_address = addr.to_string();

        // Spawn the actual app server
        let server_handle = task::spawn(async move {
            http_server::run_server(&listen_address, server_state)
                .await
                .expect("Test server failed");
        });

        // Wait for server to start
        tokio::time::sleep(Duration::from_millis(500)).await;

        Self { address: addr, state, server_handle, client: Client::new() }
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        let url = format!("http://{}{}", self.address, path);
        self.client.get(&url).send().await.expect("Request failed")
    }

    pub fn cleanup(self) {
        self.state.shutdown.cancel();
        self.server_handle.abort();
    }
}
