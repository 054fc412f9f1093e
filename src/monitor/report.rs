//! Daily status report.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::{
    metrics::MetricsStore,
    models::format_uptime,
    monitor::error_window::ErrorWindow,
    notification::{Notifier, Priority},
};

/// Sends a once-per-day summary of the monitoring metrics.
pub struct DailyReporter {
    metrics: Arc<MetricsStore>,
    error_window: Arc<ErrorWindow>,
    notifier: Arc<Notifier>,
    last_sent: Mutex<Option<NaiveDate>>,
}

impl DailyReporter {
    /// Creates a new `DailyReporter`.
    pub fn new(
        metrics: Arc<MetricsStore>,
        error_window: Arc<ErrorWindow>,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self { metrics, error_window, notifier, last_sent: Mutex::new(None) }
    }

    fn lock(&self) -> MutexGuard<'_, Option<NaiveDate>> {
        self.last_sent.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The next instant the report is due: today at `at`, or tomorrow if that
    /// time of day has already passed.
    pub fn next_occurrence(after: DateTime<Utc>, at: NaiveTime) -> DateTime<Utc> {
        let today = after.date_naive();
        let date = if after.time() < at {
            today
        } else {
            today.succ_opt().unwrap_or(today)
        };
        date.and_time(at).and_utc()
    }

    /// Sends the daily report unless one already went out today.
    ///
    /// The day is recorded before the send attempt, so a slow or failing
    /// transport cannot produce a duplicate report.
    pub async fn send_if_due(&self) {
        self.send_if_due_at(Utc::now()).await;
    }

    pub(crate) async fn send_if_due_at(&self, now: DateTime<Utc>) {
        let today = now.date_naive();
        {
            let mut last_sent = self.lock();
            if last_sent.is_some_and(|day| day == today) {
                return;
            }
            *last_sent = Some(today);
        }

        let snapshot = self.metrics.snapshot();
        let report = format!(
            "- Uptime: {}\n- Current SKU: {}\n- API Requests (24h): {}\n- Errors (24h): {}\n- Notifications Sent: {}",
            format_uptime(self.metrics.uptime()),
            snapshot.current_sku,
            snapshot.api_requests_24h,
            self.error_window.count_24h(),
            snapshot.notifications_sent,
        );

        if let Err(e) = self.notifier.send("Status Report", &report, Priority::Default).await {
            tracing::error!(error = %e, "Failed to send daily report.");
        } else {
            tracing::info!("Daily report sent.");
        }
    }
}
