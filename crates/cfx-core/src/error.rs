//! Error types for cfx-core operations.
//!
//! # Usage
//!
//! ```rust
//! use cfx_core::{Error, ImageBuffer};
//!
//! let err = ImageBuffer::new(2, 2, vec![0; 3]).unwrap_err();
//! assert!(matches!(err, Error::BufferLength { expected: 16, actual: 3, .. }));
//! ```
//!
//! # Used By
//!
//! - [`crate::image::ImageBuffer`] - Length validation
//! - [`crate::channels::ChannelSet`] - Recompose checks
//! - `cfx-ops` - Wrapped into `OpsError`

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by buffer construction and channel conversion.
#[derive(Debug, Error)]
pub enum Error {
    /// Interleaved storage does not hold exactly `width * height * 4` bytes.
    #[error("buffer length {actual} does not match {width}x{height} RGBA (expected {expected})")]
    BufferLength {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
        /// Required byte count.
        expected: usize,
        /// Byte count found.
        actual: usize,
    },

    /// Channel arrays disagree with each other or with the target image.
    #[error("channel length mismatch: expected {expected} pixels, got {actual}")]
    ChannelMismatch {
        /// Pixel count required by the target.
        expected: usize,
        /// Pixel count found in the channel set.
        actual: usize,
    },

    /// Image dimensions overflow the addressable size.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// A fraction string could not be parsed.
    #[error("invalid fraction: {0:?}")]
    InvalidFraction(String),
}
