//! # cfx-core
//!
//! Core types for the canvas filter pipeline.
//!
//! This crate provides the foundational types shared by the other cfx crates:
//!
//! - [`ImageBuffer`] - Interleaved 8-bit RGBA pixel storage
//! - [`ChannelSet`] - The same pixels split into four planar channel arrays
//! - [`Fraction`] - A 0..1 value that also parses from `"NN%"` strings
//! - [`clamp_channel`] and [`luma`] - The numeric rules every filter shares
//!
//! ## Numeric model
//!
//! Filters compute in `f64` and only round when a value is stored. Stores
//! clamp to `0..=255` and truncate toward zero, so `127.9` stores as `127`.
//! Colour values are never premultiplied by alpha.
//!
//! ```rust
//! use cfx_core::{ChannelSet, ImageBuffer};
//!
//! let mut image = ImageBuffer::new(2, 1, vec![10, 20, 30, 255, 40, 50, 60, 128]).unwrap();
//! let pair = ChannelSet::decompose(&image);
//! assert_eq!(pair.work.red, vec![10, 40]);
//! pair.work.recompose(&mut image).unwrap();
//! assert_eq!(image.data[4], 40);
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//! cfx-core (this crate)
//!    ^
//!    +-- cfx-ops (catalog, actions, compositor, convolution)
//!    +-- cfx-host (execution host and worker pool)
//!    +-- cfx-cli
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod channels;
pub mod error;
pub mod fraction;
pub mod image;

pub use channels::{Channel, ChannelPair, ChannelSet, clamp_channel, luma};
pub use error::{Error, Result};
pub use fraction::Fraction;
pub use image::ImageBuffer;
