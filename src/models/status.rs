//! The status payload served by `/status` and pushed over `/events`.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Top-level status document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Process state, always `running` while the server answers.
    pub status: String,
    /// Human-readable uptime, e.g. `2d 3h 4m`.
    pub uptime: String,
    /// Current monitoring metrics.
    pub metrics: StatusMetrics,
}

/// Monitoring metrics embedded in the status document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusMetrics {
    /// SKU of the matched product, empty until the first match.
    pub current_sku: String,
    /// Errors recorded in the last 24 hours.
    pub error_count_24h: usize,
    /// API calls made in the last 24 hours.
    pub api_requests_24h: usize,
    /// Notifications attempted since startup.
    pub ntfy_messages_sent: u64,
    /// When the process started.
    pub start_time: DateTime<Utc>,
    /// Timestamp of the last successful activity.
    pub last_status_check: DateTime<Utc>,
    /// Direct purchase link, empty while the product is not purchasable.
    pub purchase_url: String,
}

/// Formats an uptime duration for humans, e.g. `2d 3h 4m`.
///
/// Durations under a minute render as `just now`. Once the uptime crosses a
/// day the minutes are only shown together with a non-zero hour component.
pub fn format_uptime(uptime: Duration) -> String {
    let total_minutes = uptime.as_secs() / 60;
    let days = total_minutes / (24 * 60);
    let hours = (total_minutes / 60) % 24;
    let minutes = total_minutes % 60;

    if days > 0 {
        if hours > 0 {
            if minutes > 0 {
                return format!("{days}d {hours}h {minutes}m");
            }
            return format!("{days}d {hours}h");
        }
        return format!("{days}d");
    }

    if hours > 0 {
        if minutes > 0 {
            return format!("{hours}h {minutes}m");
        }
        return format!("{hours}h");
    }

    if minutes > 0 {
        return format!("{minutes}m");
    }

    "just now".to_string()
}
