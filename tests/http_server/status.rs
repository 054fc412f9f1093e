use crate::helpers::*;

#[tokio::test]
async fn status_endpoint_returns_status_json() {
    let server = TestServer::new().await;

    let resp = server.get("/status").await;

    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "running");
    assert_eq!(body["uptime"], "just now");
    assert_eq!(body["metrics"]["current_sku"], "");
    assert_eq!(body["metrics"]["api_requests_24h"], 0);
    assert_eq!(body["metrics"]["error_count_24h"], 0);
    assert_eq!(body["metrics"]["ntfy_messages_sent"], 0);
    assert_eq!(body["metrics"]["purchase_url"], "");
    assert!(body["metrics"]["start_time"].is_string());
    assert!(body["metrics"]["last_status_check"].is_string());

    server.cleanup();
}

#[tokio::test]
async fn status_endpoint_reflects_recorded_activity() {
    let state = create_test_state();
    state.metrics.record_api_call();
    state.metrics.record_api_call();
    state.metrics.set_current_sku("NVGFT590");
    state.metrics.set_purchase_url("https://store.nvidia.com/buy/nvgft590");
    state.metrics.record_notification();
    state.error_window.add_error("search request failed");

    let server = TestServer::with_state(state).await;

    let resp = server.get("/status").await;

    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.expect("Failed to parse JSON");
    assert_eq!(body["metrics"]["current_sku"], "NVGFT590");
    assert_eq!(body["metrics"]["api_requests_24h"], 2);
    assert_eq!(body["metrics"]["error_count_24h"], 1);
    assert_eq!(body["metrics"]["ntfy_messages_sent"], 1);
    assert_eq!(body["metrics"]["purchase_url"], "https://store.nvidia.com/buy/nvgft590");

    server.cleanup();
}

#[tokio::test]
async fn unknown_route_returns_not_found() {
    let server = TestServer::new().await;

    let resp = server.get("/nope").await;
    assert_eq!(resp.status(), 404);

    server.cleanup();
}
