//! Actions that read neighbouring pixels.

use cfx_core::ChannelSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::ActionEnv;
use crate::OpsResult;
use crate::convolve::{ConvolveOptions, EdgePolicy, Kernel, convolve};
use crate::tiles::{TileGrid, image_tiles};

/// Most passes a single blur action runs.
pub const MAX_BLUR_PASSES: u32 = 64;

fn edge(wrap: bool) -> EdgePolicy {
    if wrap { EdgePolicy::Wrap } else { EdgePolicy::Exclude }
}

/// Averages each pixel over a star brush.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Blur {
    /// Horizontal brush radius.
    pub radius_x: f64,
    /// Vertical brush radius.
    pub radius_y: f64,
    /// Brush rotation in degrees.
    pub roll: f64,
    /// Number of times the brush is applied.
    pub passes: u32,
    /// Blur alpha as well as colour.
    pub include_alpha: bool,
    /// Wrap at the image edges.
    pub wrap: bool,
    /// Let transparent pixels take part.
    pub include_invisible: bool,
}

impl Default for Blur {
    fn default() -> Self {
        Self {
            radius_x: 2.0,
            radius_y: 2.0,
            roll: 0.0,
            passes: 1,
            include_alpha: false,
            wrap: false,
            include_invisible: false,
        }
    }
}

impl Blur {
    /// Workstore key for this blur's brush.
    pub fn brush_key(&self) -> String {
        format!("brush-{}-{}-{}", self.radius_x, self.radius_y, self.roll)
    }

    /// Same blur with radii no larger than the image's longer side and at
    /// most [`MAX_BLUR_PASSES`] passes.
    fn fitted(&self, width: usize, height: usize) -> Self {
        let limit = width.max(height) as f64;
        let fit = |r: f64| if r.is_nan() { r } else { r.min(limit) };
        if self.passes > MAX_BLUR_PASSES {
            debug!(passes = self.passes, cap = MAX_BLUR_PASSES, "blur passes capped");
        }
        Self {
            radius_x: fit(self.radius_x),
            radius_y: fit(self.radius_y),
            passes: self.passes.min(MAX_BLUR_PASSES),
            ..self.clone()
        }
    }

    pub(crate) fn apply(&self, input: &ChannelSet, env: &mut ActionEnv<'_>) -> OpsResult<ChannelSet> {
        let blur = self.fitted(env.width, env.height);
        let (rx, ry, roll) = (blur.radius_x, blur.radius_y, blur.roll);
        let kernel = env.store.kernel(&blur.brush_key(), || Kernel::brush(rx, ry, roll));
        let opts = ConvolveOptions {
            edge: edge(self.wrap),
            include_alpha: self.include_alpha,
            include_invisible: self.include_invisible,
            ..Default::default()
        };
        let mut out = input.clone();
        for pass in 0..blur.passes {
            let next = convolve(&kernel, &out, env.width, env.height, &opts)?;
            if next == out {
                trace!(pass, "blur settled");
                break;
            }
            out = next;
        }
        Ok(out)
    }
}

/// Convolves with a flat, row-major weight matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Matrix {
    /// Weights; padded to the next odd square.
    pub weights: Vec<f64>,
    /// Convolve red.
    pub include_red: bool,
    /// Convolve green.
    pub include_green: bool,
    /// Convolve blue.
    pub include_blue: bool,
    /// Convolve alpha.
    pub include_alpha: bool,
    /// Wrap at the image edges.
    pub wrap: bool,
    /// Let transparent pixels take part.
    pub include_invisible: bool,
}

impl Default for Matrix {
    fn default() -> Self {
        Self {
            weights: vec![1.0],
            include_red: true,
            include_green: true,
            include_blue: true,
            include_alpha: false,
            wrap: false,
            include_invisible: false,
        }
    }
}

impl Matrix {
    /// The classic 3x3 sharpen.
    pub fn sharpen() -> Self {
        Self {
            weights: vec![0.0, -1.0, 0.0, -1.0, 5.0, -1.0, 0.0, -1.0, 0.0],
            ..Default::default()
        }
    }

    /// Workstore key for this matrix's kernel.
    pub fn kernel_key(&self) -> String {
        format!("matrix-{:?}", self.weights)
    }

    pub(crate) fn apply(&self, input: &ChannelSet, env: &mut ActionEnv<'_>) -> OpsResult<ChannelSet> {
        let kernel = env
            .store
            .kernel(&self.kernel_key(), || Kernel::from_weights(&self.weights));
        let opts = ConvolveOptions {
            edge: edge(self.wrap),
            include_red: self.include_red,
            include_green: self.include_green,
            include_blue: self.include_blue,
            include_alpha: self.include_alpha,
            include_invisible: self.include_invisible,
        };
        convolve(&kernel, input, env.width, env.height, &opts)
    }
}

/// Replaces each tile with its floored per-channel average.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct Pixelate {
    pub tile_width: u32,
    pub tile_height: u32,
    pub offset_x: u32,
    pub offset_y: u32,
    pub include_red: bool,
    pub include_green: bool,
    pub include_blue: bool,
    pub include_alpha: bool,
}

impl Default for Pixelate {
    fn default() -> Self {
        Self {
            tile_width: 1,
            tile_height: 1,
            offset_x: 0,
            offset_y: 0,
            include_red: true,
            include_green: true,
            include_blue: true,
            include_alpha: false,
        }
    }
}

impl Pixelate {
    pub(crate) fn apply(&self, input: &ChannelSet, env: &mut ActionEnv<'_>) -> ChannelSet {
        let (w, h) = (env.width, env.height);
        let grid = TileGrid::new(w, h, self.tile_width, self.tile_height, self.offset_x, self.offset_y);
        let tiles = env.store.tiles(&grid.key(w, h), || image_tiles(w, h, &grid));

        let mut out = input.clone();
        let picks = [
            (self.include_red, &input.red, &mut out.red),
            (self.include_green, &input.green, &mut out.green),
            (self.include_blue, &input.blue, &mut out.blue),
            (self.include_alpha, &input.alpha, &mut out.alpha),
        ];
        for (on, src, dst) in picks {
            if !on {
                continue;
            }
            for tile in tiles.iter() {
                let sum: u64 = tile.iter().map(|&i| src[i] as u64).sum();
                let avg = (sum / tile.len() as u64) as u8;
                for &i in tile {
                    dst[i] = avg;
                }
            }
        }
        out
    }
}

/// Shifts visible pixels by `(offset_x, offset_y)`.
///
/// Pixels shifted off the image are lost and uncovered areas become
/// transparent black.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Offset {
    /// Horizontal shift; positive moves right.
    pub offset_x: i64,
    /// Vertical shift; positive moves down.
    pub offset_y: i64,
}

impl Offset {
    pub(crate) fn apply(&self, input: &ChannelSet, env: &mut ActionEnv<'_>) -> ChannelSet {
        let (w, h) = (env.width as i64, env.height as i64);
        // Anything at or past a full image size moves every pixel off.
        let (ox, oy) = (self.offset_x.clamp(-w, w), self.offset_y.clamp(-h, h));
        let mut out = ChannelSet::zeroed(input.len());
        for y in 0..h {
            for x in 0..w {
                let from = (y * w + x) as usize;
                if input.alpha[from] == 0 {
                    continue;
                }
                let (dx, dy) = (x + ox, y + oy);
                if dx >= 0 && dx < w && dy >= 0 && dy < h {
                    out.set((dy * w + dx) as usize, input.get(from));
                }
            }
        }
        out
    }
}

/// Glass-block effect: each `width x height` tile shows the
/// `outer_width x outer_height` block starting at the same corner, scaled
/// down to fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct GlassTile {
    pub width: u32,
    pub height: u32,
    pub outer_width: u32,
    pub outer_height: u32,
}

impl Default for GlassTile {
    fn default() -> Self {
        Self { width: 5, height: 5, outer_width: 8, outer_height: 8 }
    }
}

impl GlassTile {
    pub(crate) fn apply(&self, input: &ChannelSet, env: &mut ActionEnv<'_>) -> ChannelSet {
        let (w, h) = (env.width, env.height);
        let (tw, th) = (self.width.max(1) as usize, self.height.max(1) as usize);
        let (ow, oh) = (self.outer_width.max(1) as usize, self.outer_height.max(1) as usize);
        let mut out = input.clone();

        for ty in (0..h).step_by(th) {
            let src_h = oh.min(h - ty);
            for tx in (0..w).step_by(tw) {
                let src_w = ow.min(w - tx);
                for v in 0..th.min(h - ty) {
                    let sy = ty + v * src_h / th;
                    for u in 0..tw.min(w - tx) {
                        let sx = tx + u * src_w / tw;
                        out.set((ty + v) * w + tx + u, input.get(sy * w + sx));
                    }
                }
            }
        }
        out
    }
}
