//! # cfx-host
//!
//! Execution host and worker pool for canvas filter chains.
//!
//! - [`FilterHost`] - Runs one packet at a time, keeping a workstore
//!   between packets
//! - [`FilterPool`] - Lazily grown set of host threads behind a job channel
//! - [`filter_image`] - Synchronous entry point on the calling thread
//!
//! # Example
//!
//! ```rust
//! use cfx_core::ImageBuffer;
//! use cfx_host::{FilterPool, Packet};
//! use cfx_ops::FilterDescriptor;
//!
//! let pool = FilterPool::new().unwrap();
//! let image = ImageBuffer::new(2, 1, vec![255, 0, 0, 255, 0, 255, 0, 255]).unwrap();
//! let packet = Packet::new(image, vec![FilterDescriptor::new("red")]).with_name("demo");
//!
//! let out = pool.run(packet).unwrap();
//! assert_eq!(out.image.unwrap().data, vec![255, 0, 0, 255, 0, 0, 0, 255]);
//! // Filters come back preprocessed and can be resent as they are.
//! assert_eq!(out.filters.unwrap()[0].actions.len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod config;
pub mod host;
pub mod packet;
pub mod pool;

pub use config::PoolConfig;
pub use error::{HostError, HostResult};
pub use host::{FilterHost, HostState, filter_image};
pub use packet::{Packet, Response};
pub use pool::{FilterPool, FilterTicket, PoolBuilder};
