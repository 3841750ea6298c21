//! Error types for filter operations.

use thiserror::Error;

/// Error type for filter operations.
#[derive(Error, Debug)]
pub enum OpsError {
    /// Two actions in one chain tried to cache output under the same name.
    #[error("interim buffer {name:?} already exists (raised by action {action:?})")]
    DuplicateInterim {
        /// Colliding interim name.
        name: String,
        /// Action kind that attempted the second write.
        action: String,
    },

    /// A buffer's size disagrees with the chain dimensions.
    #[error("size mismatch: {0}")]
    SizeMismatch(String),

    /// Invalid parameter value that could not be recovered locally.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Channel or buffer error from cfx-core.
    #[error(transparent)]
    Core(#[from] cfx_core::Error),
}

/// Result type for filter operations.
pub type OpsResult<T> = Result<T, OpsError>;
