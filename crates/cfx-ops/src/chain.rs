//! Chain runner: applies a sequence of actions to one image.
//!
//! A chain decomposes the image once into an immutable `source` and a
//! mutable `work` set, runs every action against them, and recomposes
//! `work` into the image only when the whole chain has succeeded. An
//! error part way through leaves the caller's image untouched.
//!
//! # Example
//!
//! ```rust
//! use cfx_core::ImageBuffer;
//! use cfx_ops::{apply_filters, FilterCatalog, FilterDescriptor, Workstore};
//!
//! let mut image = ImageBuffer::new(2, 1, vec![255, 0, 0, 255, 0, 255, 0, 255]).unwrap();
//! let mut filters = vec![FilterDescriptor::new("red")];
//! let mut store = Workstore::default();
//! apply_filters(&mut image, &mut filters, &FilterCatalog::standard(), &mut store).unwrap();
//! assert_eq!(image.data, vec![255, 0, 0, 255, 0, 0, 0, 255]);
//! ```

use cfx_core::{ChannelSet, ImageBuffer};
use tracing::{debug, trace};

use crate::actions::ActionEnv;
use crate::catalog::FilterCatalog;
use crate::compose::{InterimCache, blend};
use crate::descriptor::{ActionDescriptor, FilterDescriptor};
use crate::store::Workstore;
use crate::OpsResult;

/// Mutable state of one running chain.
pub struct ChainContext<'s> {
    width: usize,
    height: usize,
    source: ChannelSet,
    source_alpha: Option<ChannelSet>,
    work: ChannelSet,
    cache: InterimCache,
    store: &'s mut Workstore,
}

impl std::fmt::Debug for ChainContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainContext")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("interims", &self.cache.len())
            .finish()
    }
}

fn resolve_input<'a>(
    name: Option<&str>,
    source: &'a ChannelSet,
    source_alpha: Option<&'a ChannelSet>,
    cache: &'a InterimCache,
    work: &'a ChannelSet,
) -> &'a ChannelSet {
    match name {
        None | Some("work") => work,
        Some("source") => source,
        Some("source-alpha") => source_alpha.unwrap_or(source),
        Some(other) => match cache.get(other) {
            Some(line) => line,
            None => {
                debug!(line = other, "unknown input line, reading work");
                work
            }
        },
    }
}

impl<'s> ChainContext<'s> {
    /// Decomposes `image` and starts an empty chain.
    pub fn new(image: &ImageBuffer, store: &'s mut Workstore) -> OpsResult<Self> {
        image.validate()?;
        let pair = ChannelSet::decompose(image);
        Ok(Self {
            width: image.width as usize,
            height: image.height as usize,
            source: pair.source,
            source_alpha: None,
            work: pair.work,
            cache: InterimCache::new(),
            store,
        })
    }

    /// The current work set.
    pub fn work(&self) -> &ChannelSet {
        &self.work
    }

    /// Cached interim results.
    pub fn interims(&self) -> &InterimCache {
        &self.cache
    }

    /// Runs one action and composites its output.
    pub fn run(&mut self, step: &ActionDescriptor) -> OpsResult<()> {
        let name = step.action.name();
        trace!(action = name, line_in = ?step.line_in, line_out = ?step.line_out, out = step.out, "ChainContext::run");

        if step.line_in.as_deref() == Some("source-alpha") && self.source_alpha.is_none() {
            self.source_alpha = Some(self.source.alpha_only());
        }
        let input = resolve_input(
            step.line_in.as_deref(),
            &self.source,
            self.source_alpha.as_ref(),
            &self.cache,
            &self.work,
        );
        let mut env = ActionEnv { width: self.width, height: self.height, store: &mut *self.store };
        let mut output = step.action.apply(input, &mut env)?;
        let opacity = step.opacity.get();

        if let Some(line) = &step.line_out {
            blend(&mut output, &self.work, 1.0 - opacity)?;
            self.cache.insert(line, output, name)?;
        } else if step.out {
            blend(&mut output, &self.work, 1.0 - opacity)?;
            self.work = output;
        } else {
            blend(&mut self.work, &output, opacity)?;
        }
        Ok(())
    }

    /// Writes `work` back into `image`.
    pub fn finish(self, image: &mut ImageBuffer) -> OpsResult<()> {
        self.work.recompose(image)?;
        Ok(())
    }
}

/// Preprocesses `filters` and runs all their actions over `image`.
///
/// Stale workstore entries are purged first. Returns the number of actions
/// run; with none, the image is not touched at all.
pub fn apply_filters(
    image: &mut ImageBuffer,
    filters: &mut [FilterDescriptor],
    catalog: &FilterCatalog,
    store: &mut Workstore,
) -> OpsResult<usize> {
    trace!(width = image.width, height = image.height, filters = filters.len(), "apply_filters");
    store.purge();
    catalog.preprocess_all(filters);

    let total: usize = filters.iter().map(|f| f.actions.len()).sum();
    if total == 0 {
        debug!("no actions to run");
        return Ok(0);
    }

    let mut ctx = ChainContext::new(image, store)?;
    for step in filters.iter().flat_map(|f| f.actions.iter()) {
        ctx.run(step)?;
    }
    ctx.finish(image)?;
    Ok(total)
}
