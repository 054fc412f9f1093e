//! The Supervisor module manages the lifecycle of the fewatch application.
//!
//! This module implements the **Supervisor Pattern**, a design pattern used to
//! manage the lifecycle of multiple, concurrent, long-running services. It acts
//! as the top-level owner of all major components of the application, such as
//! the scheduler, the status server, and the connection sweeper.
//!
//! ## Responsibilities
//!
//! - **Initialization**: The `SupervisorBuilder` constructs and "wires" all
//!   services together, injecting necessary dependencies like configuration and
//!   the shared metrics store.
//! - **Lifecycle Management**: The `Supervisor` starts all services and manages
//!   their lifetimes.
//! - **Graceful Shutdown**: It listens for shutdown signals (like Ctrl+C or
//!   SIGTERM) and orchestrates a clean shutdown of all managed services.
//! - **Task Supervision**: It monitors the health of each service. If a
//!   critical service fails (panics or returns an error), the supervisor will
//!   shut down all other services to ensure the application exits cleanly
//!   rather than continuing in a partially-functional state.

mod builder;

use std::sync::Arc;

use builder::SupervisorBuilder;
use thiserror::Error;
use tokio::signal;

use crate::{
    config::AppConfig,
    http_server::{self, ApiState, ConnectionRegistry},
    metrics::MetricsStore,
    monitor::{DailyReporter, ErrorWindow, Scheduler, StockChecker},
    notification::{Notifier, Priority, error::NotificationError},
    providers::ProductDataSource,
};

/// Represents the set of errors that can occur during the supervisor's
/// operation.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// A required configuration was not provided to the `SupervisorBuilder`.
    #[error("Missing configuration for Supervisor")]
    MissingConfig,

    /// A data source was not provided to the `SupervisorBuilder`.
    #[error("Missing data source for Supervisor")]
    MissingDataSource,

    /// An HTTP client required by one of the services could not be built.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// The notification service could not be constructed.
    #[error("Notification service error: {0}")]
    Notification(#[from] NotificationError),
}

/// The primary runtime manager for the application.
///
/// The Supervisor owns all the major components (services) and is responsible
/// for their startup, shutdown, and health monitoring. Once `run` is called, it
/// becomes the main process loop for the entire application.
pub struct Supervisor {
    /// Shared application configuration.
    config: Arc<AppConfig>,

    /// The shared monitoring metrics store.
    metrics: Arc<MetricsStore>,

    /// The rolling window of recent fetch errors.
    error_window: Arc<ErrorWindow>,

    /// The service publishing alerts to the ntfy topic.
    notifier: Arc<Notifier>,

    /// The service performing one product lookup per tick.
    checker: Arc<StockChecker<dyn ProductDataSource>>,

    /// The once-a-day status report sender.
    reporter: Arc<DailyReporter>,

    /// Registry of open status streams, swept while the server runs.
    connections: Arc<ConnectionRegistry>,

    /// A token used to signal a graceful shutdown to all supervised tasks.
    cancellation_token: tokio_util::sync::CancellationToken,

    /// A set of all spawned tasks that the supervisor is actively managing.
    join_set: tokio::task::JoinSet<()>,
}

impl Supervisor {
    /// Creates a new Supervisor instance with all its required components.
    ///
    /// This is typically called by the `SupervisorBuilder` after it has
    /// assembled all the necessary dependencies.
    pub fn new(
        config: AppConfig,
        metrics: Arc<MetricsStore>,
        error_window: Arc<ErrorWindow>,
        notifier: Arc<Notifier>,
        checker: Arc<StockChecker<dyn ProductDataSource>>,
        reporter: Arc<DailyReporter>,
        connections: Arc<ConnectionRegistry>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            metrics,
            error_window,
            notifier,
            checker,
            reporter,
            connections,
            cancellation_token: tokio_util::sync::CancellationToken::new(),
            join_set: tokio::task::JoinSet::new(),
        }
    }

    /// Starts the supervisor and all its managed services.
    ///
    /// This method is the main entry point for the application's runtime. It
    /// performs the following steps:
    /// 1. Publishes the startup notification.
    /// 2. Spawns a signal handler to listen for `SIGINT` (Ctrl+C) and
    ///    `SIGTERM`.
    /// 3. Spawns the status server and its connection sweeper (when enabled)
    ///    and the `Scheduler` as long-running background tasks.
    /// 4. Enters the main `select!` loop, which concurrently:
    ///    - Listens for the shutdown signal.
    ///    - Monitors the health of all spawned tasks via the `JoinSet`.
    /// 5. Upon shutdown, it waits for all tasks to complete within the
    ///    configured timeout and aborts any stragglers.
    pub async fn run(mut self) -> Result<(), SupervisorError> {
        // A refused startup notification is logged, not fatal.
        self.send_startup_notification().await;

        // Clone the token for the signal handler task.
        let cancellation_token = self.cancellation_token.clone();

        // Spawn a task to listen for shutdown signals.
        self.join_set.spawn(async move {
            let ctrl_c = signal::ctrl_c();
            #[cfg(unix)]
            let terminate = async {
                signal::unix::signal(signal::unix::SignalKind::terminate())
                    .expect("Failed to register SIGTERM handler")
                    .recv()
                    .await;
            };
            #[cfg(not(unix))]
            let terminate = std::future::pending::<()>();

            tokio::select! {
                _ = ctrl_c => tracing::info!("SIGINT (Ctrl+C) received, initiating graceful shutdown."),
                _ = terminate => tracing::info!("SIGTERM received, initiating graceful shutdown."),
                // The shutdown may also start elsewhere, e.g. after a task
                // failure. Exit so the final drain is not held up waiting for
                // a signal that never arrives.
                _ = cancellation_token.cancelled() => return,
            }

            // Notify all other tasks to begin shutting down.
            cancellation_token.cancel();
        });

        // Spawn the status server and its connection sweeper if enabled.
        if self.config.server.enabled {
            let state = ApiState {
                metrics: Arc::clone(&self.metrics),
                error_window: Arc::clone(&self.error_window),
                connections: Arc::clone(&self.connections),
                shutdown: self.cancellation_token.clone(),
            };
            let listen_address = self.config.server.listen_address.clone();
            let server_cancellation_token = self.cancellation_token.clone();
            self.join_set.spawn(async move {
                if let Err(e) = http_server::run_server(&listen_address, state).await {
                    tracing::error!(error = %e, "Status server failed. Initiating shutdown.");
                    server_cancellation_token.cancel();
                }
            });

            let sweeper = Arc::clone(&self.connections);
            self.join_set.spawn(sweeper.run_sweeper(self.cancellation_token.clone()));
        }

        // Spawn the Scheduler service.
        let scheduler = Scheduler::new(
            Arc::clone(&self.config),
            Arc::clone(&self.checker),
            Arc::clone(&self.reporter),
            Arc::clone(&self.notifier),
            self.cancellation_token.clone(),
        );
        self.join_set.spawn(async move {
            scheduler.run().await;
        });

        // --- Main Supervisor Loop ---
        // This loop is only responsible for monitoring task health and shutdown
        // signals.

        loop {
            tokio::select! {
                maybe_result = self.join_set.join_next() => {
                    match maybe_result {
                        Some(Ok(_)) => {
                            // Task completed successfully, continue monitoring.
                        }
                        Some(Err(e)) => {
                            tracing::error!("A critical task failed: {:?}. Initiating shutdown.", e);
                            self.cancellation_token.cancel();
                        }
                        None => {
                            // All tasks have completed.
                            break;
                        }
                    }
                }
                _ = self.cancellation_token.cancelled() => {
                    // Cancellation requested externally, break the loop.
                    break;
                }
            }
        }

        // --- Graceful Shutdown ---

        // Give the remaining tasks time to finish on their own. The scheduler
        // drains in-flight checks and publishes the shutdown notice here.
        let shutdown_timeout = self.config.shutdown_timeout;
        let join_set = &mut self.join_set;
        let drain = async {
            while let Some(result) = join_set.join_next().await {
                if let Err(e) = result {
                    tracing::error!("A supervised task failed during shutdown: {:?}", e);
                }
            }
        };

        if tokio::time::timeout(shutdown_timeout, drain).await.is_err() {
            tracing::warn!(
                "Tasks did not complete within the timeout of {:?}. Aborting the rest.",
                shutdown_timeout
            );
            self.join_set.shutdown().await;
        } else {
            tracing::info!("All supervised tasks have completed.");
        }

        tracing::info!("Supervisor shutdown complete.");
        Ok(())
    }

    /// Returns a new `SupervisorBuilder` instance.
    ///
    /// This is the public entry point for creating a supervisor.
    pub fn builder() -> SupervisorBuilder {
        SupervisorBuilder::new()
    }

    /// Publishes the startup notification describing the monitored target.
    async fn send_startup_notification(&self) {
        let body = format!(
            "- Locale: {}\n- GPU Model: {}\n- Stock Check Interval: {:?}\n- SKU Check Interval: {:?}\n- Product URL: {}",
            self.config.target.locale,
            self.config.target.gpu_model,
            self.config.stock_check_interval_ms,
            self.config.sku_check_interval_ms,
            self.config.product_url,
        );
        if let Err(e) = self.notifier.send("FE Tracker Started", &body, Priority::Default).await {
            tracing::warn!(error = %e, "Failed to send startup notification.");
        }
    }
}
