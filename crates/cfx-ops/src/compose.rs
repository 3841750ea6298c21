//! Opacity blending and the per-chain interim cache.
//!
//! # Blend
//!
//! [`blend`] mixes an overlay into a base at a ratio:
//!
//! | ratio | result |
//! |---|---|
//! | `>= 1` | exact copy of overlay |
//! | `0 < r < 1` | `floor(base * (1 - r) + overlay * r)` |
//! | `<= 0` | base unchanged |
//!
//! The full-strength case copies instead of computing, so no rounding
//! drift can appear at opacity 1.
//!
//! # Example
//!
//! ```rust
//! use cfx_core::ChannelSet;
//! use cfx_ops::compose::blend;
//!
//! let mut base = ChannelSet::zeroed(1);
//! let mut overlay = ChannelSet::zeroed(1);
//! overlay.red[0] = 101;
//! blend(&mut base, &overlay, 0.5).unwrap();
//! assert_eq!(base.red[0], 50);
//! ```

use std::collections::HashMap;

use cfx_core::ChannelSet;
use tracing::trace;

use crate::{OpsError, OpsResult};

/// Reserved input names that can never be used for interim results.
pub const RESERVED_LINES: [&str; 3] = ["source", "source-alpha", "work"];

/// Blends `overlay` into `base` in place.
pub fn blend(base: &mut ChannelSet, overlay: &ChannelSet, ratio: f64) -> OpsResult<()> {
    if base.len() != overlay.len() {
        return Err(OpsError::SizeMismatch(format!(
            "blend base has {} pixels, overlay {}",
            base.len(),
            overlay.len()
        )));
    }
    overlay.check_len(base.len())?;

    if ratio >= 1.0 {
        base.clone_from(overlay);
        return Ok(());
    }
    if !(ratio > 0.0) {
        return Ok(());
    }

    let keep = 1.0 - ratio;
    for (b, o) in [
        (&mut base.red, &overlay.red),
        (&mut base.green, &overlay.green),
        (&mut base.blue, &overlay.blue),
        (&mut base.alpha, &overlay.alpha),
    ] {
        for (dst, src) in b.iter_mut().zip(o.iter()) {
            *dst = (*dst as f64 * keep + *src as f64 * ratio).floor() as u8;
        }
    }
    Ok(())
}

/// Named results cached within one chain.
#[derive(Debug, Default)]
pub struct InterimCache {
    lines: HashMap<String, ChannelSet>,
}

impl InterimCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `buffer` under `name`.
    ///
    /// Reusing a name, or using a reserved one, is an error naming the
    /// offending action; the existing entry is left intact.
    pub fn insert(&mut self, name: &str, buffer: ChannelSet, action: &str) -> OpsResult<()> {
        if RESERVED_LINES.contains(&name) || self.lines.contains_key(name) {
            return Err(OpsError::DuplicateInterim { name: name.to_string(), action: action.to_string() });
        }
        trace!(name, action, "interim cached");
        self.lines.insert(name.to_string(), buffer);
        Ok(())
    }

    /// Looks up a cached result.
    pub fn get(&self, name: &str) -> Option<&ChannelSet> {
        self.lines.get(name)
    }

    /// True if `name` is taken (including reserved names).
    pub fn contains(&self, name: &str) -> bool {
        RESERVED_LINES.contains(&name) || self.lines.contains_key(name)
    }

    /// Number of cached results.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// True if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
