//! Error types for the notification service.

use thiserror::Error;

/// Defines the possible errors that can occur within the notification service.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// An error related to invalid or missing configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An error from the underlying `reqwest` library.
    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),

    /// The ntfy server answered with a non-success status code.
    #[error("Notification failed: server answered with status {0}")]
    UnexpectedStatus(reqwest::StatusCode),
}
