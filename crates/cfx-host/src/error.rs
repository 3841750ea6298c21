//! Error types for the execution host and pool.

use std::time::Duration;

use thiserror::Error;

/// Error type for host and pool operations.
#[derive(Error, Debug)]
pub enum HostError {
    /// A worker thread could not be started.
    #[error("failed to spawn host thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// The pool or the reply channel has shut down.
    #[error("host channel disconnected")]
    Disconnected,

    /// No response arrived within the allowed time.
    #[error("no response within {0:?}")]
    Timeout(Duration),

    /// A filter chain panicked.
    #[error("filter chain panicked: {0}")]
    Panicked(String),

    /// A packet could not be parsed or written.
    #[error("packet json: {0}")]
    Json(#[from] serde_json::Error),

    /// The filter chain failed.
    #[error(transparent)]
    Ops(#[from] cfx_ops::OpsError),
}

/// Result type for host operations.
pub type HostResult<T> = Result<T, HostError>;
