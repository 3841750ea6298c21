//! Actions that derive or rewrite alpha.

use cfx_core::{ChannelSet, Fraction, clamp_channel};
use serde::{Deserialize, Serialize};

use super::{ActionEnv, map_pixels};
use crate::tiles::{AlphaGrid, alpha_tiles};

/// Maps each pixel's distance from a key colour onto alpha.
///
/// Distance is the mean absolute channel difference. Below
/// `transparent_at * max` the pixel becomes fully transparent, above
/// `opaque_at * max` fully opaque, with a linear ramp in between. `max` is
/// the largest distance any colour can have from the key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColorsToAlpha {
    /// Key red.
    pub red: f64,
    /// Key green.
    pub green: f64,
    /// Key blue.
    pub blue: f64,
    /// Fraction of the maximum distance below which alpha is 0.
    pub transparent_at: Fraction,
    /// Fraction of the maximum distance above which alpha is 255.
    pub opaque_at: Fraction,
}

impl Default for ColorsToAlpha {
    fn default() -> Self {
        Self {
            red: 0.0,
            green: 255.0,
            blue: 0.0,
            transparent_at: Fraction::ZERO,
            opaque_at: Fraction::ONE,
        }
    }
}

impl ColorsToAlpha {
    /// Alpha for one colour.
    pub fn alpha_for(&self, r: u8, g: u8, b: u8) -> u8 {
        let (kr, kg, kb) = (self.red, self.green, self.blue);
        let max = ((kr + kg + kb) / 3.0).max(((255.0 - kr) + (255.0 - kg) + (255.0 - kb)) / 3.0);
        let transparent = self.transparent_at.get() * max;
        let opaque = self.opaque_at.get() * max;
        let diff = ((kr - r as f64).abs() + (kg - g as f64).abs() + (kb - b as f64).abs()) / 3.0;

        if diff < transparent {
            0
        } else if diff > opaque {
            255
        } else {
            let range = opaque - transparent;
            if range <= 0.0 { 0 } else { clamp_channel((diff - transparent) / range * 255.0) }
        }
    }

    pub(crate) fn apply(&self, input: &ChannelSet) -> ChannelSet {
        map_pixels(input, true, |[r, g, b, _]| [r, g, b, self.alpha_for(r, g, b)])
    }
}

/// Zeroes alpha for colours inside any inclusive RGB box.
///
/// Each range is `[min_r, min_g, min_b, max_r, max_g, max_b]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Chroma {
    /// Boxes to key out.
    pub ranges: Vec<[f64; 6]>,
}

impl Chroma {
    fn keyed(&self, r: u8, g: u8, b: u8) -> bool {
        let (r, g, b) = (r as f64, g as f64, b as f64);
        self.ranges.iter().any(|&[lr, lg, lb, hr, hg, hb]| {
            r >= lr && r <= hr && g >= lg && g <= hg && b >= lb && b <= hb
        })
    }

    pub(crate) fn apply(&self, input: &ChannelSet) -> ChannelSet {
        map_pixels(input, true, |[r, g, b, a]| {
            [r, g, b, if self.keyed(r, g, b) { 0 } else { a }]
        })
    }
}

/// Alpha becomes the floored average of the included colour channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChannelsToAlpha {
    /// Red contributes.
    pub include_red: bool,
    /// Green contributes.
    pub include_green: bool,
    /// Blue contributes.
    pub include_blue: bool,
}

impl Default for ChannelsToAlpha {
    fn default() -> Self {
        Self { include_red: true, include_green: true, include_blue: true }
    }
}

impl ChannelsToAlpha {
    pub(crate) fn apply(&self, input: &ChannelSet) -> ChannelSet {
        let picks = [self.include_red, self.include_green, self.include_blue];
        let divisor = picks.iter().filter(|f| **f).count() as u32;
        map_pixels(input, false, |[r, g, b, a]| {
            if divisor == 0 {
                return [r, g, b, a];
            }
            let sum: u32 = [r, g, b]
                .iter()
                .zip(picks)
                .filter(|(_, on)| *on)
                .map(|(v, _)| *v as u32)
                .sum();
            [r, g, b, (sum / divisor) as u8]
        })
    }
}

/// Copies alpha into the included colour channels and makes the result
/// fully opaque.
///
/// Channels that are neither included nor excluded keep their colour;
/// excluded ones become 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct AlphaToChannels {
    pub include_red: bool,
    pub include_green: bool,
    pub include_blue: bool,
    pub exclude_red: bool,
    pub exclude_green: bool,
    pub exclude_blue: bool,
}

impl Default for AlphaToChannels {
    fn default() -> Self {
        Self {
            include_red: true,
            include_green: true,
            include_blue: true,
            exclude_red: false,
            exclude_green: false,
            exclude_blue: false,
        }
    }
}

impl AlphaToChannels {
    pub(crate) fn apply(&self, input: &ChannelSet) -> ChannelSet {
        let pick = |include: bool, exclude: bool, v: u8, a: u8| {
            if include {
                a
            } else if exclude {
                0
            } else {
                v
            }
        };
        map_pixels(input, false, |[r, g, b, a]| {
            [
                pick(self.include_red, self.exclude_red, r, a),
                pick(self.include_green, self.exclude_green, g, a),
                pick(self.include_blue, self.exclude_blue, b, a),
                255,
            ]
        })
    }
}

/// Writes a repeating alpha pattern over tiles and their gutters.
///
/// `area_alpha_levels` gives the alpha for, in order: the tile, the gutter
/// below it, the gutter to its right, and the corner gutter. Transparent
/// pixels stay transparent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct AreaAlpha {
    pub tile_width: u32,
    pub tile_height: u32,
    pub gutter_width: u32,
    pub gutter_height: u32,
    pub offset_x: u32,
    pub offset_y: u32,
    pub area_alpha_levels: [f64; 4],
}

impl Default for AreaAlpha {
    fn default() -> Self {
        Self {
            tile_width: 1,
            tile_height: 1,
            gutter_width: 1,
            gutter_height: 1,
            offset_x: 0,
            offset_y: 0,
            area_alpha_levels: [255.0, 0.0, 0.0, 0.0],
        }
    }
}

impl AreaAlpha {
    pub(crate) fn apply(&self, input: &ChannelSet, env: &mut ActionEnv<'_>) -> ChannelSet {
        let grid = AlphaGrid::new(
            self.tile_width,
            self.tile_height,
            self.gutter_width,
            self.gutter_height,
            self.offset_x,
            self.offset_y,
        );
        let (w, h) = (env.width, env.height);
        let tiles = env.store.tiles(&grid.key(w, h), || alpha_tiles(w, h, &grid));
        let levels = self.area_alpha_levels.map(clamp_channel);

        let mut out = input.clone();
        for (index, tile) in tiles.iter().enumerate() {
            let level = levels[index % 4];
            for &p in tile {
                if input.alpha[p] != 0 {
                    out.alpha[p] = level;
                }
            }
        }
        out
    }
}
