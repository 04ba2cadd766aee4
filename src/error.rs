//! Error types for boardsync
//!
//! Defines a comprehensive error enum covering all failure modes across the system.
//! Uses thiserror for ergonomic error handling.

use thiserror::Error;

/// Result type alias for boardsync operations
pub type Result<T> = std::result::Result<T, BoardSyncError>;

/// Comprehensive error type for boardsync operations
#[derive(Error, Debug)]
pub enum BoardSyncError {
    /// Configuration errors (bad period intervals, malformed service strings, ...)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A source could not be fetched; aborts that source's cycle only
    #[error("Could not fetch items from source '{source_name}': {message}")]
    Fetch { source_name: String, message: String },

    /// A single board create/archive/delete call failed
    #[error("Board mutation failed: {0}")]
    Mutation(String),

    /// The board snapshot could not be loaded; fatal to the polling run
    #[error("Could not load existing items from the board: {0}")]
    Snapshot(String),

    /// Authentication errors (bad credentials or bad webhook signature)
    #[error("Authentication error: {0}")]
    Auth(String),

    /// A notification delivery failed; collected per service, never fatal
    #[error("Could not notify service at {endpoint}: {message}")]
    Notification { endpoint: String, message: String },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),

    /// Anyhow errors (for more context)
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}
