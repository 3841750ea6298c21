//! The execution host: runs one chain at a time.
//!
//! A [`FilterHost`] owns a [`Workstore`] that lives as long as the host,
//! so brushes and tile sets built for one packet are reused by the next
//! packet that needs them. Each packet walks the host through
//!
//! ```text
//! Idle -> Unpacking -> Running(0..N) -> Repacking -> Idle
//! ```
//!
//! A packet whose filters expand to no actions goes straight back to
//! `Idle` with its image untouched.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use cfx_core::ImageBuffer;
use cfx_ops::{ChainContext, FilterCatalog, FilterDescriptor, OpsResult, Workstore, apply_filters};
use tracing::{debug, error, trace, warn};

use crate::packet::Packet;
use crate::{HostError, HostResult};

/// Where a host is in its per-packet cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HostState {
    /// Waiting for a packet.
    #[default]
    Idle,
    /// Expanding filters into actions and splitting the image into source
    /// and work channels.
    Unpacking,
    /// Running action `index` of `total`.
    Running {
        /// Zero-based action index.
        index: usize,
        /// Number of actions in the chain.
        total: usize,
    },
    /// Writing work back into the image.
    Repacking,
}

fn transition(state: &mut HostState, next: HostState) {
    trace!(from = ?*state, to = ?next, "host state");
    *state = next;
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Single-chain filter executor.
#[derive(Debug)]
pub struct FilterHost {
    catalog: Arc<FilterCatalog>,
    store: Workstore,
    state: HostState,
    failed_at: Option<HostState>,
    processed: u64,
}

impl FilterHost {
    /// Creates a host with the default workstore TTL.
    pub fn new(catalog: Arc<FilterCatalog>) -> Self {
        Self::with_store(catalog, Workstore::default())
    }

    /// Creates a host with a workstore whose entries expire after `ttl`.
    pub fn with_ttl(catalog: Arc<FilterCatalog>, ttl: Duration) -> Self {
        Self::with_store(catalog, Workstore::new(ttl))
    }

    /// Creates a host around an existing workstore.
    pub fn with_store(catalog: Arc<FilterCatalog>, store: Workstore) -> Self {
        Self { catalog, store, state: HostState::Idle, failed_at: None, processed: 0 }
    }

    /// Current state.
    pub fn state(&self) -> HostState {
        self.state
    }

    /// State the last packet's chain was in when it failed, if it did.
    pub fn last_failure(&self) -> Option<HostState> {
        self.failed_at
    }

    /// The host's workstore.
    pub fn store(&self) -> &Workstore {
        &self.store
    }

    /// Packets processed so far.
    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Filters one packet and returns it.
    ///
    /// Malformed packets come back unchanged. If the chain fails or
    /// panics the packet comes back with its original image; the filters
    /// keep whatever preprocessing already happened.
    pub fn process(&mut self, packet: Packet) -> Packet {
        let Packet { name, image, filters } = packet;
        trace!(name = ?name, "FilterHost::process");
        self.processed += 1;

        let (mut image, mut filters) = match (image, filters) {
            (Some(image), Some(filters)) => (image, filters),
            (image, filters) => {
                warn!(
                    name = ?name,
                    has_image = image.is_some(),
                    has_filters = filters.is_some(),
                    "malformed packet returned unchanged"
                );
                return Packet { name, image, filters };
            }
        };
        if let Err(e) = image.validate() {
            warn!(name = ?name, error = %e, "malformed image, packet returned unchanged");
            return Packet { name, image: Some(image), filters: Some(filters) };
        }

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run_chain(&mut image, &mut filters)));
        self.failed_at = match outcome {
            Ok(Ok(count)) => {
                debug!(name = ?name, actions = count, "chain complete");
                None
            }
            Ok(Err(e)) => {
                error!(name = ?name, stage = ?self.state, error = %e, "chain aborted, original image returned");
                Some(self.state)
            }
            Err(payload) => {
                let panic = panic_message(payload.as_ref());
                error!(name = ?name, stage = ?self.state, panic = %panic, "chain panicked, original image returned");
                Some(self.state)
            }
        };
        transition(&mut self.state, HostState::Idle);
        Packet { name, image: Some(image), filters: Some(filters) }
    }

    fn run_chain(&mut self, image: &mut ImageBuffer, filters: &mut [FilterDescriptor]) -> OpsResult<usize> {
        self.store.purge();
        transition(&mut self.state, HostState::Unpacking);
        self.catalog.preprocess_all(filters);
        let total: usize = filters.iter().map(|f| f.actions.len()).sum();
        if total == 0 {
            debug!("no actions, image untouched");
            return Ok(0);
        }

        let mut ctx = ChainContext::new(image, &mut self.store)?;
        for (index, step) in filters.iter().flat_map(|f| f.actions.iter()).enumerate() {
            transition(&mut self.state, HostState::Running { index, total });
            ctx.run(step)?;
        }
        transition(&mut self.state, HostState::Repacking);
        ctx.finish(image)?;
        Ok(total)
    }
}

/// Filters `image` in place on the calling thread.
///
/// Uses a throwaway workstore. On error the image is left untouched.
///
/// ```rust
/// use cfx_core::ImageBuffer;
/// use cfx_host::filter_image;
/// use cfx_ops::{FilterCatalog, FilterDescriptor};
///
/// let mut image = ImageBuffer::filled(2, 2, [255, 0, 0, 255]).unwrap();
/// let mut filters = vec![FilterDescriptor::new("grayscale")];
/// filter_image(&mut image, &mut filters, &FilterCatalog::standard()).unwrap();
/// assert_eq!(image.pixel(0, 0), Some([54, 54, 54, 255]));
/// ```
pub fn filter_image(
    image: &mut ImageBuffer,
    filters: &mut [FilterDescriptor],
    catalog: &FilterCatalog,
) -> HostResult<usize> {
    let mut store = Workstore::default();
    let mut scratch = image.clone();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| apply_filters(&mut scratch, filters, catalog, &mut store)));
    match outcome {
        Ok(Ok(count)) => {
            *image = scratch;
            Ok(count)
        }
        Ok(Err(e)) => Err(HostError::Ops(e)),
        Err(payload) => Err(HostError::Panicked(panic_message(payload.as_ref()))),
    }
}
