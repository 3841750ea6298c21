//! Planar channel storage and the shared numeric rules.
//!
//! Filters never touch interleaved bytes directly. A chain starts by
//! decomposing its [`ImageBuffer`] into two [`ChannelSet`]s: `source`, which
//! stays untouched for the whole chain, and `work`, which every action
//! reads from and blends into. When the chain ends, `work` is recomposed
//! back into the image.
//!
//! # Storage rules
//!
//! Every value written into a channel goes through [`clamp_channel`]:
//! values are clamped to `0..=255` and truncated toward zero. NaN stores
//! as 0.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{Error, ImageBuffer, Result};

/// One of the four RGBA channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Red.
    Red,
    /// Green.
    Green,
    /// Blue.
    Blue,
    /// Alpha (straight, not premultiplied).
    #[default]
    Alpha,
}

impl Channel {
    /// All channels in storage order.
    pub const ALL: [Channel; 4] = [Channel::Red, Channel::Green, Channel::Blue, Channel::Alpha];

    /// Colour channels only.
    pub const COLOR: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];
}

/// Stores a computed value into 8-bit channel storage.
///
/// Clamps to `0..=255` and truncates toward zero; NaN becomes 0.
///
/// ```rust
/// use cfx_core::clamp_channel;
///
/// assert_eq!(clamp_channel(127.9), 127);
/// assert_eq!(clamp_channel(-4.0), 0);
/// assert_eq!(clamp_channel(300.0), 255);
/// assert_eq!(clamp_channel(f64::NAN), 0);
/// ```
#[inline]
pub fn clamp_channel(v: f64) -> u8 {
    if v.is_nan() {
        return 0;
    }
    v.clamp(0.0, 255.0) as u8
}

/// Floored Rec.709 luma: `0.2126 R + 0.7152 G + 0.0722 B`.
///
/// Computed in integer arithmetic so neutral greys map exactly onto
/// themselves (`luma(v, v, v) == v`).
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    let sum = 2126 * r as u32 + 7152 * g as u32 + 722 * b as u32;
    (sum / 10_000) as u8
}

/// Four equal-length planar channel arrays.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct ChannelSet {
    /// Red channel.
    pub red: Vec<u8>,
    /// Green channel.
    pub green: Vec<u8>,
    /// Blue channel.
    pub blue: Vec<u8>,
    /// Alpha channel.
    pub alpha: Vec<u8>,
}

/// The two buffers a chain starts from.
#[derive(Debug, Clone)]
pub struct ChannelPair {
    /// Immutable copy of the input, readable through `lineIn: "source"`.
    pub source: ChannelSet,
    /// Mutable accumulator that actions blend into.
    pub work: ChannelSet,
}

impl ChannelSet {
    /// Creates a set of `len` transparent black pixels.
    pub fn zeroed(len: usize) -> Self {
        Self {
            red: vec![0; len],
            green: vec![0; len],
            blue: vec![0; len],
            alpha: vec![0; len],
        }
    }

    /// Reads an interleaved image into planar form.
    pub fn from_image(image: &ImageBuffer) -> Self {
        let len = image.data.len() / 4;
        let mut set = Self {
            red: Vec::with_capacity(len),
            green: Vec::with_capacity(len),
            blue: Vec::with_capacity(len),
            alpha: Vec::with_capacity(len),
        };
        for px in image.data.chunks_exact(4) {
            set.red.push(px[0]);
            set.green.push(px[1]);
            set.blue.push(px[2]);
            set.alpha.push(px[3]);
        }
        set
    }

    /// Splits an image into `source` and `work` copies.
    pub fn decompose(image: &ImageBuffer) -> ChannelPair {
        trace!(width = image.width, height = image.height, "ChannelSet::decompose");
        let source = Self::from_image(image);
        let work = source.clone();
        ChannelPair { source, work }
    }

    /// Interleaves this set back into `image.data`, in place.
    ///
    /// Fails without writing anything if the channel lengths disagree with
    /// each other or with the image's pixel count.
    pub fn recompose(&self, image: &mut ImageBuffer) -> Result<()> {
        let expected = image.data.len() / 4;
        self.check_len(expected)?;
        if image.data.len() != expected * 4 {
            return Err(Error::ChannelMismatch { expected, actual: image.data.len() / 4 });
        }
        trace!(width = image.width, height = image.height, "ChannelSet::recompose");
        for (i, px) in image.data.chunks_exact_mut(4).enumerate() {
            px[0] = self.red[i];
            px[1] = self.green[i];
            px[2] = self.blue[i];
            px[3] = self.alpha[i];
        }
        Ok(())
    }

    /// Copy of this set holding only its alpha channel; colour channels are 0.
    pub fn alpha_only(&self) -> Self {
        let len = self.len();
        Self {
            red: vec![0; len],
            green: vec![0; len],
            blue: vec![0; len],
            alpha: self.alpha.clone(),
        }
    }

    /// Pixel count (length of the red channel).
    #[inline]
    pub fn len(&self) -> usize {
        self.red.len()
    }

    /// True when the set holds no pixels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.red.is_empty()
    }

    /// Verifies all four channels hold exactly `expected` pixels.
    pub fn check_len(&self, expected: usize) -> Result<()> {
        for c in Channel::ALL {
            let actual = self.channel(c).len();
            if actual != expected {
                return Err(Error::ChannelMismatch { expected, actual });
            }
        }
        Ok(())
    }

    /// Borrows one channel.
    #[inline]
    pub fn channel(&self, c: Channel) -> &[u8] {
        match c {
            Channel::Red => &self.red,
            Channel::Green => &self.green,
            Channel::Blue => &self.blue,
            Channel::Alpha => &self.alpha,
        }
    }

    /// Mutably borrows one channel.
    #[inline]
    pub fn channel_mut(&mut self, c: Channel) -> &mut Vec<u8> {
        match c {
            Channel::Red => &mut self.red,
            Channel::Green => &mut self.green,
            Channel::Blue => &mut self.blue,
            Channel::Alpha => &mut self.alpha,
        }
    }

    /// RGBA at pixel index `i`.
    #[inline]
    pub fn get(&self, i: usize) -> [u8; 4] {
        [self.red[i], self.green[i], self.blue[i], self.alpha[i]]
    }

    /// Writes RGBA at pixel index `i`.
    #[inline]
    pub fn set(&mut self, i: usize, px: [u8; 4]) {
        self.red[i] = px[0];
        self.green[i] = px[1];
        self.blue[i] = px[2];
        self.alpha[i] = px[3];
    }
}

impl std::fmt::Debug for ChannelSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelSet").field("len", &self.len()).finish()
    }
}
