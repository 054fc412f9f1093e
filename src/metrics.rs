//! Shared monitoring metrics.
//!
//! `MetricsStore` is the single writable record of what the monitor has done:
//! the matched SKU, the purchase URL, how many notifications were attempted
//! and a rolling log of API calls from the last 24 hours. All mutation goes
//! through its methods; readers take a `MetricsSnapshot`.

use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use chrono::{DateTime, Utc};

/// A point-in-time copy of the monitoring metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
    /// SKU of the matched product, empty until the first match.
    pub current_sku: String,
    /// Notifications attempted since startup.
    pub notifications_sent: u64,
    /// Exact count of API calls within the last 24 hours.
    pub api_requests_24h: usize,
    /// When the process started.
    pub start_time: DateTime<Utc>,
    /// Timestamp of the last successful activity.
    pub last_activity: DateTime<Utc>,
    /// Direct purchase link, empty while the product is not purchasable.
    pub purchase_url: String,
}

struct MetricsInner {
    current_sku: String,
    notifications_sent: u64,
    api_request_times: VecDeque<DateTime<Utc>>,
    last_activity: DateTime<Utc>,
    purchase_url: String,
}

/// Thread-safe store for the monitoring metrics.
///
/// Critical sections never await, so a blocking mutex is sufficient and the
/// store can be used from synchronous and asynchronous contexts alike.
pub struct MetricsStore {
    start_time: DateTime<Utc>,
    started: std::time::Instant,
    inner: Mutex<MetricsInner>,
}

impl MetricsStore {
    /// Creates an empty store anchored at the current instant.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            start_time: now,
            started: std::time::Instant::now(),
            inner: Mutex::new(MetricsInner {
                current_sku: String::new(),
                notifications_sent: 0,
                api_request_times: VecDeque::new(),
                last_activity: now,
                purchase_url: String::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MetricsInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records one API call and returns the exact rolling 24h count.
    ///
    /// Entries older than 24 hours are pruned before the new one is appended,
    /// and the last-activity timestamp advances to now.
    pub fn record_api_call(&self) -> usize {
        self.record_api_call_at(Utc::now())
    }

    pub(crate) fn record_api_call_at(&self, now: DateTime<Utc>) -> usize {
        let mut inner = self.lock();
        let cutoff = now - chrono::Duration::hours(24);
        while inner.api_request_times.front().is_some_and(|t| *t < cutoff) {
            inner.api_request_times.pop_front();
        }
        inner.api_request_times.push_back(now);
        inner.last_activity = now;
        inner.api_request_times.len()
    }

    /// Counts one notification attempt.
    pub fn record_notification(&self) {
        self.lock().notifications_sent += 1;
    }

    /// Records the SKU of the matched product.
    pub fn set_current_sku(&self, sku: &str) {
        self.lock().current_sku = sku.to_string();
    }

    /// Records the direct purchase link for an in-stock product.
    pub fn set_purchase_url(&self, url: &str) {
        self.lock().purchase_url = url.to_string();
    }

    /// Clears the purchase link when the product is not purchasable.
    pub fn clear_purchase_url(&self) {
        self.lock().purchase_url.clear();
    }

    /// Advances the last-activity timestamp to now.
    pub fn touch_activity(&self) {
        self.touch_activity_at(Utc::now());
    }

    pub(crate) fn touch_activity_at(&self, now: DateTime<Utc>) {
        self.lock().last_activity = now;
    }

    /// How long the process has been running.
    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    /// Takes a consistent snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        self.snapshot_at(Utc::now())
    }

    pub(crate) fn snapshot_at(&self, now: DateTime<Utc>) -> MetricsSnapshot {
        let inner = self.lock();
        let cutoff = now - chrono::Duration::hours(24);
        let api_requests_24h = inner.api_request_times.iter().filter(|t| **t >= cutoff).count();
        MetricsSnapshot {
            current_sku: inner.current_sku.clone(),
            notifications_sent: inner.notifications_sent,
            api_requests_24h,
            start_time: self.start_time,
            last_activity: inner.last_activity,
            purchase_url: inner.purchase_url.clone(),
        }
    }
}

impl Default for MetricsStore {
    fn default() -> Self {
        Self::new()
    }
}
