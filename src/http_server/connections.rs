//! Tracking of open status stream connections.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

/// How often abandoned connections are swept.
const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Idle time after which a connection is considered abandoned, in seconds.
const STALE_AFTER_SECS: i64 = 10 * 60;

/// Registry of open status stream connections keyed by a numeric id.
///
/// Streams refresh their own entry periodically; the sweeper reclaims entries
/// whose stream went away without running its cleanup.
pub struct ConnectionRegistry {
    connections: DashMap<u64, DateTime<Utc>>,
    next_id: AtomicU64,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self { connections: DashMap::new(), next_id: AtomicU64::new(0) }
    }

    /// Registers a new connection and returns its id.
    pub fn register(&self) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.connections.insert(id, Utc::now());
        id
    }

    /// Refreshes the liveness timestamp of a connection.
    pub fn touch(&self, id: u64) {
        if let Some(mut last_seen) = self.connections.get_mut(&id) {
            *last_seen = Utc::now();
        }
    }

    /// Removes a connection from the registry.
    pub fn remove(&self, id: u64) {
        self.connections.remove(&id);
    }

    /// Number of currently registered connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Whether no connections are registered.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Drops entries that have not been refreshed recently and returns how
    /// many were removed.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Utc::now(), chrono::Duration::seconds(STALE_AFTER_SECS))
    }

    pub(crate) fn sweep_at(&self, now: DateTime<Utc>, max_idle: chrono::Duration) -> usize {
        let before = self.connections.len();
        self.connections.retain(|_, last_seen| now - *last_seen <= max_idle);
        before - self.connections.len()
    }

    /// Periodically sweeps abandoned connections until cancelled.
    pub async fn run_sweeper(self: Arc<Self>, cancellation_token: CancellationToken) {
        let mut tick = tokio::time::interval(SWEEP_INTERVAL);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first interval tick fires immediately; harmless for a sweep.
        loop {
            tokio::select! {
                biased;

                _ = cancellation_token.cancelled() => {
                    tracing::debug!("Connection sweeper cancellation signal received.");
                    break;
                }

                _ = tick.tick() => {
                    let removed = self.sweep();
                    if removed > 0 {
                        tracing::debug!(removed, open = self.len(), "Swept stale connections.");
                    }
                }
            }
        }
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_assigns_increasing_ids() {
        let registry = ConnectionRegistry::new();
        let first = registry.register();
        let second = registry.register();

        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_remove_releases_the_entry() {
        let registry = ConnectionRegistry::new();
        let id = registry.register();
        registry.remove(id);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_sweep_drops_only_stale_entries() {
        let registry = ConnectionRegistry::new();
        let stale = registry.register();
        let fresh = registry.register();

        let now = Utc::now();
        registry.connections.insert(stale, now - chrono::Duration::minutes(11));
        let removed = registry.sweep_at(now, chrono::Duration::minutes(10));

        assert_eq!(removed, 1);
        assert_eq!(registry.len(), 1);
        assert!(registry.connections.contains_key(&fresh));
        assert!(!registry.connections.contains_key(&stale));
    }

    #[test]
    fn test_touch_unknown_id_is_a_no_op() {
        let registry = ConnectionRegistry::new();
        registry.touch(42);
        assert!(registry.is_empty());
    }
}
