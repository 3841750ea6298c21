//! Primitive filter actions.
//!
//! An [`Action`] is one primitive pixel operation with its parameters
//! already resolved to concrete values. Preprocessors in
//! [`crate::catalog`] expand user-facing filter descriptors into lists of
//! actions; the chain runner then applies them in order.
//!
//! Every action reads one input [`ChannelSet`] and produces a fresh output
//! set of the same length. Blending the output back into the chain's work
//! buffer is the compositor's job, not the action's.
//!
//! # Serialized form
//!
//! Actions serialize as JSON objects tagged by an `action` key:
//!
//! ```rust
//! use cfx_ops::actions::Action;
//!
//! let a: Action = serde_json::from_str(r#"{"action":"brightness","level":"50%"}"#).unwrap();
//! assert_eq!(a.name(), "brightness");
//! ```
//!
//! # Transparent pixels
//!
//! Actions that only touch colour leave fully transparent input pixels
//! exactly as they were, so colours hidden under zero alpha survive the
//! filter unchanged.

mod alpha;
mod color;
mod spatial;

pub use alpha::{AlphaToChannels, AreaAlpha, ChannelsToAlpha, Chroma, ColorsToAlpha};
pub use color::{
    AverageChannels, Brightness, Flood, Grayscale, InvertChannels, LockChannelsToLevels,
    ModulateChannels, Saturation, SetChannelToValue, StepChannels, Threshold, TintChannels,
};
pub use spatial::{Blur, GlassTile, MAX_BLUR_PASSES, Matrix, Offset, Pixelate};

use cfx_core::ChannelSet;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::OpsResult;
use crate::store::Workstore;

/// Per-action execution environment.
pub struct ActionEnv<'a> {
    /// Image width in pixels.
    pub width: usize,
    /// Image height in pixels.
    pub height: usize,
    /// Host-lifetime memo of kernels and tile sets.
    pub store: &'a mut Workstore,
}

/// A primitive action with typed parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Action {
    /// Average selected colour channels, optionally zeroing others.
    AverageChannels(AverageChannels),
    /// Multiply colour channels by a level.
    Brightness(Brightness),
    /// Scale deviation from mid-grey.
    Saturation(Saturation),
    /// Replace colour with floored luma.
    Grayscale(Grayscale),
    /// Two-colour remap at a luma cutoff.
    Threshold(Threshold),
    /// `255 - v` on selected channels.
    InvertChannels(InvertChannels),
    /// Quantize channels by integer divisors.
    StepChannels(StepChannels),
    /// 3x3 colour matrix.
    TintChannels(TintChannels),
    /// Multiply each channel by its own weight.
    ModulateChannels(ModulateChannels),
    /// Overwrite one channel with a constant.
    SetChannelToValue(SetChannelToValue),
    /// Fill with a constant colour.
    Flood(Flood),
    /// Snap channels onto a list of levels.
    LockChannelsToLevels(LockChannelsToLevels),
    /// Alpha from distance to a key colour.
    ColorsToAlpha(ColorsToAlpha),
    /// Zero alpha inside RGB boxes.
    Chroma(Chroma),
    /// Alpha from averaged colour channels.
    ChannelsToAlpha(ChannelsToAlpha),
    /// Colour channels from alpha.
    AlphaToChannels(AlphaToChannels),
    /// Alpha pattern over tiles and gutters.
    AreaAlpha(AreaAlpha),
    /// Brush convolution.
    Blur(Blur),
    /// Weighted matrix convolution.
    Matrix(Matrix),
    /// Tile averaging.
    Pixelate(Pixelate),
    /// Translate the image.
    Offset(Offset),
    /// Scaled-down outer blocks per tile.
    GlassTile(GlassTile),
}

impl Action {
    /// The action's serialized tag.
    pub fn name(&self) -> &'static str {
        match self {
            Action::AverageChannels(_) => "average-channels",
            Action::Brightness(_) => "brightness",
            Action::Saturation(_) => "saturation",
            Action::Grayscale(_) => "grayscale",
            Action::Threshold(_) => "threshold",
            Action::InvertChannels(_) => "invert-channels",
            Action::StepChannels(_) => "step-channels",
            Action::TintChannels(_) => "tint-channels",
            Action::ModulateChannels(_) => "modulate-channels",
            Action::SetChannelToValue(_) => "set-channel-to-value",
            Action::Flood(_) => "flood",
            Action::LockChannelsToLevels(_) => "lock-channels-to-levels",
            Action::ColorsToAlpha(_) => "colors-to-alpha",
            Action::Chroma(_) => "chroma",
            Action::ChannelsToAlpha(_) => "channels-to-alpha",
            Action::AlphaToChannels(_) => "alpha-to-channels",
            Action::AreaAlpha(_) => "area-alpha",
            Action::Blur(_) => "blur",
            Action::Matrix(_) => "matrix",
            Action::Pixelate(_) => "pixelate",
            Action::Offset(_) => "offset",
            Action::GlassTile(_) => "glass-tile",
        }
    }

    /// Computes this action's output from `input`.
    pub fn apply(&self, input: &ChannelSet, env: &mut ActionEnv<'_>) -> OpsResult<ChannelSet> {
        trace!(action = self.name(), pixels = input.len(), "Action::apply");
        let out = match self {
            Action::AverageChannels(a) => a.apply(input),
            Action::Brightness(a) => a.apply(input),
            Action::Saturation(a) => a.apply(input),
            Action::Grayscale(a) => a.apply(input),
            Action::Threshold(a) => a.apply(input),
            Action::InvertChannels(a) => a.apply(input),
            Action::StepChannels(a) => a.apply(input),
            Action::TintChannels(a) => a.apply(input),
            Action::ModulateChannels(a) => a.apply(input),
            Action::SetChannelToValue(a) => a.apply(input),
            Action::Flood(a) => a.apply(input),
            Action::LockChannelsToLevels(a) => a.apply(input),
            Action::ColorsToAlpha(a) => a.apply(input),
            Action::Chroma(a) => a.apply(input),
            Action::ChannelsToAlpha(a) => a.apply(input),
            Action::AlphaToChannels(a) => a.apply(input),
            Action::AreaAlpha(a) => a.apply(input, env),
            Action::Blur(a) => a.apply(input, env)?,
            Action::Matrix(a) => a.apply(input, env)?,
            Action::Pixelate(a) => a.apply(input, env),
            Action::Offset(a) => a.apply(input, env),
            Action::GlassTile(a) => a.apply(input, env),
        };
        Ok(out)
    }
}

/// Maps every pixel through `f`.
///
/// With `keep_transparent`, pixels whose input alpha is 0 are copied
/// through untouched instead.
pub(crate) fn map_pixels<F>(input: &ChannelSet, keep_transparent: bool, f: F) -> ChannelSet
where
    F: Fn([u8; 4]) -> [u8; 4],
{
    let len = input.len();
    let mut out = ChannelSet::zeroed(len);
    for i in 0..len {
        let px = input.get(i);
        if keep_transparent && px[3] == 0 {
            out.set(i, px);
        } else {
            out.set(i, f(px));
        }
    }
    out
}
