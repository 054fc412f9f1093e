use std::time::Duration;

use crate::helpers::*;

/// Reads chunks off an open SSE response until `predicate` matches the
/// accumulated text, with a hard timeout per chunk.
async fn read_until(resp: &mut reqwest::Response, predicate: impl Fn(&str) -> bool) -> String {
    let mut received = String::new();
    while !predicate(&received) {
        let chunk = tokio::time::timeout(Duration::from_secs(5), resp.chunk())
            .await
            .expect("Timed out waiting for SSE data")
            .expect("SSE stream failed")
            .expect("SSE stream ended early");
        received.push_str(&String::from_utf8_lossy(&chunk));
    }
    received
}

#[tokio::test]
async fn events_endpoint_streams_connected_then_status() {
    let state = create_test_state();
    state.metrics.set_current_sku("NVGFT590");
    let server = TestServer::with_state(state).await;

    let url = format!("http://{}/events", server.address);
    let mut resp = server.client.get(&url).send().await.expect("Request failed");

    assert_eq!(resp.status(), 200);
    let content_type = resp.headers()["content-type"].to_str().expect("Invalid header");
    assert!(content_type.starts_with("text/event-stream"));
    assert_eq!(resp.headers()["cache-control"], "no-cache");
    assert_eq!(resp.headers()["access-control-allow-origin"], "*");

    // The stream opens with a connected event followed by an immediate
    // status payload.
    let received = read_until(&mut resp, |text| {
        text.contains("event: connected") && text.contains("\"current_sku\":\"NVGFT590\"")
    })
    .await;
    assert!(received.contains("{\"status\":\"connected\"}"));

    // The open stream is tracked while the client stays connected.
    assert_eq!(server.state.connections.len(), 1);

    server.cleanup();
}

#[tokio::test]
async fn events_connection_is_released_after_disconnect() {
    let server = TestServer::new().await;

    let url = format!("http://{}/events", server.address);
    let mut resp = server.client.get(&url).send().await.expect("Request failed");
    read_until(&mut resp, |text| text.contains("event: connected")).await;
    assert_eq!(server.state.connections.len(), 1);

    drop(resp);

    // The server notices the disconnect on its next push and drops the
    // connection entry.
    let mut remaining = 50;
    while !server.state.connections.is_empty() && remaining > 0 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        remaining -= 1;
    }
    assert!(server.state.connections.is_empty());

    server.cleanup();
}

#[tokio::test]
async fn events_stream_keeps_pushing_fresh_payloads() {
    let state = create_test_state();
    let server = TestServer::with_state(state).await;

    let url = format!("http://{}/events", server.address);
    let mut resp = server.client.get(&url).send().await.expect("Request failed");
    read_until(&mut resp, |text| text.contains("\"api_requests_24h\":0")).await;

    // A later payload reflects activity recorded after the stream opened.
    server.state.metrics.record_api_call();
    read_until(&mut resp, |text| text.contains("\"api_requests_24h\":1")).await;

    server.cleanup();
}
