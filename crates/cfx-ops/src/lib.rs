//! # cfx-ops
//!
//! Filter catalog, actions, compositing and convolution for canvas image
//! filters.
//!
//! # Modules
//!
//! - [`catalog`] - Method name to preprocessor registry
//! - [`actions`] - Primitive pixel operations
//! - [`compose`] - Opacity blend and interim cache
//! - [`convolve`] - Brushes, matrix kernels and the convolution engine
//! - [`chain`] - Runs a list of filters over one image
//! - [`store`] - TTL memo for kernels and tile sets
//!
//! # Example
//!
//! ```rust
//! use cfx_core::ImageBuffer;
//! use cfx_ops::{apply_filters, FilterCatalog, FilterDescriptor, Workstore};
//!
//! let catalog = FilterCatalog::standard();
//! let mut store = Workstore::default();
//! let mut image = ImageBuffer::filled(4, 4, [200, 100, 50, 255]).unwrap();
//! let mut filters: Vec<FilterDescriptor> = serde_json::from_str(
//!     r#"[{"method":"grayscale"},{"method":"brightness","level":"50%","opacity":1}]"#,
//! ).unwrap();
//!
//! let ran = apply_filters(&mut image, &mut filters, &catalog, &mut store).unwrap();
//! assert_eq!(ran, 2);
//! assert_eq!(image.pixel(0, 0), Some([58, 58, 58, 255]));
//! ```
//!
//! # Feature Flags
//!
//! - `parallel` (default) - Convolve rows in parallel with rayon

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod actions;
pub mod catalog;
pub mod chain;
pub mod compose;
pub mod convolve;
pub mod descriptor;
pub mod levels;
pub mod params;
mod presets;
pub mod store;
pub mod tiles;

pub use catalog::{FilterCatalog, Preprocessor};
pub use chain::{ChainContext, apply_filters};
pub use convolve::Kernel;
pub use descriptor::{ActionDescriptor, FilterDescriptor};
pub use error::{OpsError, OpsResult};
pub use store::Workstore;
