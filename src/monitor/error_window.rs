//! Sliding-window error accumulator and alert throttle.
//!
//! `ErrorWindow` keeps a 24-hour record of fetch failures and decides when the
//! error rate justifies an alert. The decision belongs to the window; actually
//! sending the alert belongs to the caller, which reports back through
//! [`ErrorWindow::mark_notified`].

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

/// Upper bound on retained error records.
const MAX_RECORDS: usize = 1000;

/// Minimum spacing between two error-rate alerts, in seconds.
const ERROR_ALERT_COOLDOWN_SECS: i64 = 60;

struct ErrorRecord {
    at: DateTime<Utc>,
    description: String,
}

struct WindowState {
    errors: std::collections::VecDeque<ErrorRecord>,
    last_notify: Option<DateTime<Utc>>,
    last_error_notify: Option<DateTime<Utc>>,
}

impl WindowState {
    fn prune(&mut self, now: DateTime<Utc>) {
        let cutoff = now - chrono::Duration::hours(24);
        while self.errors.front().is_some_and(|r| r.at < cutoff) {
            self.errors.pop_front();
        }
    }

    fn recent_count(&self, now: DateTime<Utc>, window: chrono::Duration) -> usize {
        self.errors.iter().filter(|r| now - r.at <= window).count()
    }
}

/// Thread-safe sliding-window error accumulator feeding the alert throttle.
pub struct ErrorWindow {
    threshold: usize,
    notify_window: chrono::Duration,
    state: Mutex<WindowState>,
}

impl ErrorWindow {
    /// Creates a window with the given alert threshold and notify window.
    pub fn new(threshold: usize, notify_window: std::time::Duration) -> Self {
        let notify_window =
            chrono::Duration::from_std(notify_window).unwrap_or(chrono::Duration::MAX);
        Self {
            threshold,
            notify_window,
            state: Mutex::new(WindowState {
                errors: std::collections::VecDeque::new(),
                last_notify: None,
                last_error_notify: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, WindowState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records a failure and returns whether an error-rate alert should fire.
    ///
    /// The decision is true iff the count of errors within the notify window
    /// reached the threshold, the last alert of any kind is older than the
    /// notify window, and the last error-rate alert is older than the fixed
    /// cooldown. A true decision obliges the caller to attempt the alert and
    /// then call [`ErrorWindow::mark_notified`].
    pub fn add_error(&self, description: &str) -> bool {
        self.add_error_at(description, Utc::now())
    }

    pub(crate) fn add_error_at(&self, description: &str, now: DateTime<Utc>) -> bool {
        let mut state = self.lock();
        state.errors.push_back(ErrorRecord { at: now, description: description.to_string() });
        state.prune(now);
        while state.errors.len() > MAX_RECORDS {
            state.errors.pop_front();
        }

        let recent = state.recent_count(now, self.notify_window);
        recent >= self.threshold
            && state.last_notify.is_none_or(|t| now - t > self.notify_window)
            && state
                .last_error_notify
                .is_none_or(|t| now - t > chrono::Duration::seconds(ERROR_ALERT_COOLDOWN_SECS))
    }

    /// Records that an alert was attempted, arming the throttle.
    ///
    /// Called after the send attempt regardless of its outcome, so a failing
    /// transport cannot cause an alert storm.
    pub fn mark_notified(&self) {
        self.mark_notified_at(Utc::now());
    }

    pub(crate) fn mark_notified_at(&self, now: DateTime<Utc>) {
        let mut state = self.lock();
        state.last_notify = Some(now);
        state.last_error_notify = Some(now);
    }

    /// Number of errors recorded within the last 24 hours.
    pub fn count_24h(&self) -> usize {
        self.count_24h_at(Utc::now())
    }

    pub(crate) fn count_24h_at(&self, now: DateTime<Utc>) -> usize {
        let mut state = self.lock();
        state.prune(now);
        state.errors.len()
    }

    /// Description of the most recently recorded failure.
    pub fn last_error(&self) -> Option<String> {
        self.lock().errors.back().map(|r| r.description.clone())
    }

    /// Number of errors within the notify window, for alert bodies.
    pub fn notify_window_count(&self) -> usize {
        self.notify_window_count_at(Utc::now())
    }

    pub(crate) fn notify_window_count_at(&self, now: DateTime<Utc>) -> usize {
        let mut state = self.lock();
        state.prune(now);
        state.recent_count(now, self.notify_window)
    }
}
