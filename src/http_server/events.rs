//! The `/events` endpoint: a server-sent stream of status updates.

use std::{convert::Infallible, sync::Arc, time::Duration};

use async_stream::stream;
use axum::{
    extract::State,
    response::{
        IntoResponse,
        sse::{Event, Sse},
    },
};
use futures::Stream;
use tokio::time::MissedTickBehavior;

use super::{ApiState, connections::ConnectionRegistry, status::build_status_response};

/// How often a fresh status payload is pushed.
const DATA_INTERVAL: Duration = Duration::from_secs(1);

/// How often a comment heartbeat keeps intermediaries from closing the stream.
const PING_INTERVAL: Duration = Duration::from_secs(10);

/// How often the stream refreshes its own liveness entry.
const LIVENESS_INTERVAL: Duration = Duration::from_secs(30);

/// Releases the connection entry when the stream is dropped, whether by a
/// client disconnect or by server shutdown.
struct ConnectionGuard {
    registry: Arc<ConnectionRegistry>,
    id: u64,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.registry.remove(self.id);
        tracing::debug!(connection_id = self.id, "Status stream closed.");
    }
}

fn status_event(state: &ApiState) -> Event {
    let response = build_status_response(state);
    match Event::default().json_data(&response) {
        Ok(event) => event,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize status event.");
            Event::default().comment("status unavailable")
        }
    }
}

fn status_stream(state: ApiState) -> impl Stream<Item = Result<Event, Infallible>> {
    let connection_id = state.connections.register();
    tracing::debug!(connection_id, open = state.connections.len(), "Status stream opened.");

    stream! {
        let _guard = ConnectionGuard { registry: state.connections.clone(), id: connection_id };

        yield Ok(Event::default().event("connected").data("{\"status\":\"connected\"}"));
        yield Ok(status_event(&state));

        let start = tokio::time::Instant::now();
        let mut data_tick = tokio::time::interval_at(start + DATA_INTERVAL, DATA_INTERVAL);
        data_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut ping_tick = tokio::time::interval_at(start + PING_INTERVAL, PING_INTERVAL);
        ping_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut liveness_tick =
            tokio::time::interval_at(start + LIVENESS_INTERVAL, LIVENESS_INTERVAL);
        liveness_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let event = tokio::select! {
                biased;

                _ = state.shutdown.cancelled() => break,

                _ = liveness_tick.tick() => {
                    state.connections.touch(connection_id);
                    continue;
                }

                _ = ping_tick.tick() => Event::default().comment("ping"),

                _ = data_tick.tick() => status_event(&state),
            };
            yield Ok(event);
        }
    }
}

/// Opens a server-sent event stream of status updates.
///
/// Emits a `connected` event followed by an immediate status payload, then
/// keeps pushing payloads every second with periodic comment heartbeats until
/// the client disconnects or the server shuts down.
pub async fn events(State(state): State<ApiState>) -> impl IntoResponse {
    let headers = [
        ("Cache-Control", "no-cache"),
        ("Access-Control-Allow-Origin", "*"),
        ("X-Accel-Buffering", "no"),
    ];
    (headers, Sse::new(status_stream(state)))
}
