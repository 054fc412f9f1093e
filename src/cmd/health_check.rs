//! The one-shot liveness probe behind the `health-check` subcommand.
//!
//! The probe observes the running tracker from the outside, over its own
//! status endpoint, and reduces the answer to an exit code for a process
//! supervisor such as a container health check.

use chrono::{DateTime, Utc};

use crate::{config::AppConfig, http_client::build_notify_client, models::StatusResponse};

/// Maximum time since the tracker's last recorded activity before it is
/// reported unhealthy.
const MAX_IDLE_SECS: i64 = 5 * 60;

/// Decides whether a tracker whose last recorded activity was at
/// `last_activity` still counts as healthy at `now`.
pub fn is_healthy(last_activity: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(last_activity) <= chrono::Duration::seconds(MAX_IDLE_SECS)
}

/// Probes the running tracker over its status endpoint.
///
/// Returns `true` when the tracker answers and reports recent activity. An
/// unreachable server, a malformed payload and a stale activity timestamp all
/// count as unhealthy.
pub async fn execute(config_dir: Option<&str>) -> bool {
    let config = match AppConfig::new(config_dir) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Health check failed: could not load configuration.");
            return false;
        }
    };

    let client = match build_notify_client(&config.http_base_config) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "Health check failed: could not build HTTP client.");
            return false;
        }
    };

    let url = format!("http://{}/status", config.server.listen_address);
    let response = match client.get(&url).send().await.and_then(|r| r.error_for_status()) {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, url, "Health check failed: status endpoint unreachable.");
            return false;
        }
    };

    let status: StatusResponse = match response.json().await {
        Ok(status) => status,
        Err(e) => {
            tracing::error!(error = %e, "Health check failed: malformed status payload.");
            return false;
        }
    };

    let now = Utc::now();
    if !is_healthy(status.metrics.last_status_check, now) {
        let idle = now.signed_duration_since(status.metrics.last_status_check);
        let minutes = idle.num_seconds() as f64 / 60.0;
        tracing::error!("Health check failed: No activity in {minutes:.1} minutes");
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StatusMetrics;

    fn status_body(last_status_check: DateTime<Utc>) -> String {
        let response = StatusResponse {
            status: "running".to_string(),
            uptime: "5m".to_string(),
            metrics: StatusMetrics {
                current_sku: "NVGFT590".to_string(),
                error_count_24h: 0,
                api_requests_24h: 10,
                ntfy_messages_sent: 1,
                start_time: Utc::now() - chrono::Duration::minutes(5),
                last_status_check,
                purchase_url: String::new(),
            },
        };
        serde_json::to_string(&response).unwrap()
    }

    fn write_config(dir: &std::path::Path, listen_address: &str) {
        let config_content = format!(
            r#"
        product_url: "https://marketplace.nvidia.com/en-us/consumer/graphics-cards/nvidia-geforce-rtx-5090/"
        stock_check_interval_ms: 60000
        sku_check_interval_ms: 30000
        ntfy_topic: "fe-alerts"
        server:
          listen_address: "{listen_address}"
        "#
        );
        std::fs::write(dir.join("fewatch.yaml"), config_content).unwrap();
    }

    #[test]
    fn test_is_healthy_within_bound() {
        let now = Utc::now();
        assert!(is_healthy(now, now));
        assert!(is_healthy(now - chrono::Duration::minutes(4), now));
        assert!(is_healthy(now - chrono::Duration::seconds(MAX_IDLE_SECS), now));
    }

    #[test]
    fn test_is_healthy_rejects_stale_activity() {
        let now = Utc::now();
        assert!(!is_healthy(now - chrono::Duration::seconds(MAX_IDLE_SECS + 1), now));
        assert!(!is_healthy(now - chrono::Duration::hours(2), now));
    }

    #[tokio::test]
    async fn test_execute_reports_healthy_for_recent_activity() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/status")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(status_body(Utc::now()))
            .create_async()
            .await;

        let temp_dir = tempfile::tempdir().unwrap();
        write_config(temp_dir.path(), &server.host_with_port());

        assert!(execute(temp_dir.path().to_str()).await);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_execute_reports_unhealthy_for_stale_activity() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/status")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(status_body(Utc::now() - chrono::Duration::minutes(10)))
            .create_async()
            .await;

        let temp_dir = tempfile::tempdir().unwrap();
        write_config(temp_dir.path(), &server.host_with_port());

        assert!(!execute(temp_dir.path().to_str()).await);
    }

    #[tokio::test]
    async fn test_execute_reports_unhealthy_when_unreachable() {
        let server = mockito::Server::new_async().await;
        let address = server.host_with_port();
        // Shut the server down so the probe has nobody to talk to.
        drop(server);

        let temp_dir = tempfile::tempdir().unwrap();
        write_config(temp_dir.path(), &address);

        assert!(!execute(temp_dir.path().to_str()).await);
    }
}
