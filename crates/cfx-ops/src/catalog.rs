//! Filter catalog: method name to preprocessor.
//!
//! The catalog is built once and shared read-only between hosts. Looking a
//! method up and running its preprocessor turns a [`FilterDescriptor`]'s
//! free-form parameters into typed [`Action`]s.
//!
//! # Example
//!
//! ```rust
//! use cfx_ops::{FilterCatalog, FilterDescriptor};
//!
//! let catalog = FilterCatalog::standard();
//! let mut f = FilterDescriptor::new("sepia").with_opacity(0.5);
//! assert_eq!(catalog.preprocess(&mut f), 1);
//! assert_eq!(f.actions[0].action.name(), "tint-channels");
//! assert_eq!(f.actions[0].opacity.get(), 0.5);
//!
//! // Already expanded: nothing happens the second time.
//! assert_eq!(catalog.preprocess(&mut f), 0);
//! ```

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::actions::Action;
use crate::descriptor::{ActionDescriptor, FilterDescriptor};
use crate::params::Params;
use crate::presets;

/// Expands one descriptor's parameters into actions.
pub type Preprocessor = fn(&Params<'_>) -> Vec<Action>;

/// Immutable method registry.
#[derive(Clone, Default)]
pub struct FilterCatalog {
    entries: HashMap<&'static str, Preprocessor>,
}

impl std::fmt::Debug for FilterCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterCatalog").field("methods", &self.methods()).finish()
    }
}

impl FilterCatalog {
    /// A catalog with no methods.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The full standard catalog.
    pub fn standard() -> Self {
        Self::empty()
            .with("red", presets::red)
            .with("green", presets::green)
            .with("blue", presets::blue)
            .with("notred", presets::notred)
            .with("notgreen", presets::notgreen)
            .with("notblue", presets::notblue)
            .with("cyan", presets::cyan)
            .with("magenta", presets::magenta)
            .with("yellow", presets::yellow)
            .with("gray", presets::gray)
            .with("channels", presets::channels)
            .with("channelstep", presets::channelstep)
            .with("flood", presets::flood)
            .with("brightness", presets::brightness)
            .with("saturation", presets::saturation)
            .with("invert", presets::invert)
            .with("grayscale", presets::grayscale)
            .with("sepia", presets::sepia)
            .with("tint", presets::tint)
            .with("channelLevels", presets::channel_levels)
            .with("threshold", presets::threshold)
            .with("chromakey", presets::chromakey)
            .with("chroma", presets::chroma)
            .with("blur", presets::blur)
            .with("pixelate", presets::pixelate)
            .with("matrix", presets::matrix)
            .with("sharpen", presets::sharpen)
            .with("offset", presets::offset)
            .with("areaAlpha", presets::area_alpha)
            .with("channelsToAlpha", presets::channels_to_alpha)
            .with("alphaToChannels", presets::alpha_to_channels)
            .with("glassTile", presets::glass_tile)
    }

    /// Adds or replaces a method.
    pub fn with(mut self, name: &'static str, preprocessor: Preprocessor) -> Self {
        self.entries.insert(name, preprocessor);
        self
    }

    /// Looks up a method's preprocessor.
    pub fn get(&self, name: &str) -> Option<Preprocessor> {
        self.entries.get(name).copied()
    }

    /// True if `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered method names, sorted.
    pub fn methods(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Number of registered methods.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no method is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fills `filter.actions` if it is still empty.
    ///
    /// Every produced action takes the descriptor's opacity. `lineIn` is
    /// attached to the first action, `lineOut` and `out` to the last.
    /// Returns the number of actions added; unknown methods add none.
    pub fn preprocess(&self, filter: &mut FilterDescriptor) -> usize {
        if filter.is_preprocessed() {
            trace!(method = %filter.method, "already preprocessed");
            return 0;
        }
        let Some(preprocessor) = self.get(&filter.method) else {
            debug!(method = %filter.method, "unknown filter method, skipping");
            return 0;
        };

        let params = Params::new(&filter.method, &filter.params);
        let mut actions: Vec<ActionDescriptor> = preprocessor(&params)
            .into_iter()
            .map(|a| ActionDescriptor { opacity: filter.opacity, ..ActionDescriptor::new(a) })
            .collect();
        if let Some(first) = actions.first_mut() {
            first.line_in = filter.line_in.clone();
        }
        if let Some(last) = actions.last_mut() {
            last.line_out = filter.line_out.clone();
            last.out = filter.out;
        }

        let added = actions.len();
        debug!(method = %filter.method, actions = added, "preprocessed");
        filter.actions = actions;
        added
    }

    /// Preprocesses every descriptor; returns the total actions added.
    pub fn preprocess_all(&self, filters: &mut [FilterDescriptor]) -> usize {
        filters.iter_mut().map(|f| self.preprocess(f)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_methods() {
        let c = FilterCatalog::standard();
        assert_eq!(c.len(), 32);
        for name in ["red", "channelLevels", "chromakey", "blur", "glassTile", "sharpen"] {
            assert!(c.contains(name), "{name}");
        }
        let methods = c.methods();
        assert!(methods.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_unknown_method_expands_to_nothing() {
        let c = FilterCatalog::standard();
        let mut f = FilterDescriptor::new("melt");
        assert_eq!(c.preprocess(&mut f), 0);
        assert!(f.actions.is_empty());
    }

    #[test]
    fn test_preprocess_is_once() {
        let c = FilterCatalog::standard();
        let mut f = FilterDescriptor::new("grayscale");
        assert_eq!(c.preprocess(&mut f), 1);
        f.method = "invert".into();
        assert_eq!(c.preprocess(&mut f), 0);
        assert_eq!(f.actions[0].action.name(), "grayscale");
    }

    #[test]
    fn test_routing_copied() {
        let c = FilterCatalog::standard();
        let mut f = FilterDescriptor::new("invert");
        f.line_in = Some("source".into());
        f.line_out = Some("inv".into());
        c.preprocess(&mut f);
        let a = &f.actions[0];
        assert_eq!(a.line_in.as_deref(), Some("source"));
        assert_eq!(a.line_out.as_deref(), Some("inv"));
        assert!(!a.out);
    }

    #[test]
    fn test_partial_catalog() {
        let c = FilterCatalog::empty().with("g", crate::presets::grayscale);
        assert_eq!(c.methods(), vec!["g"]);
        assert!(!c.contains("grayscale"));
    }
}
