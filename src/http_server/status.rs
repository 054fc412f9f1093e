//! Represents the `/status` endpoint handler.
//! Provides application status and metrics.

use axum::{Json, extract::State, response::IntoResponse};

use super::ApiState;
use crate::models::{StatusMetrics, StatusResponse, format_uptime};

/// Builds the status payload served by `/status` and pushed over `/events`.
pub(super) fn build_status_response(state: &ApiState) -> StatusResponse {
    let snapshot = state.metrics.snapshot();
    StatusResponse {
        status: "running".to_string(),
        uptime: format_uptime(state.metrics.uptime()),
        metrics: StatusMetrics {
            current_sku: snapshot.current_sku,
            error_count_24h: state.error_window.count_24h(),
            api_requests_24h: snapshot.api_requests_24h,
            ntfy_messages_sent: snapshot.notifications_sent,
            start_time: snapshot.start_time,
            last_status_check: snapshot.last_activity,
            purchase_url: snapshot.purchase_url,
        },
    }
}

/// Retrieves application status and metrics.
pub async fn status(State(state): State<ApiState>) -> impl IntoResponse {
    Json(build_status_response(&state))
}
