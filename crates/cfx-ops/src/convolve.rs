//! Convolution kernels and their application.
//!
//! Two kinds of kernel feed the same engine:
//!
//! - [`Kernel::brush`] - unit-weight star brush used by `blur`
//! - [`Kernel::from_weights`] - flat weight array used by `matrix`
//!
//! # Edge handling
//!
//! [`convolve`] divides by the sum of the weights that actually
//! contributed, so pixels near an edge are not darkened by the missing
//! neighbours. With [`EdgePolicy::Wrap`] out-of-bounds offsets wrap to the
//! opposite edge instead of being dropped.
//!
//! # Example
//!
//! ```rust
//! use cfx_core::ChannelSet;
//! use cfx_ops::convolve::{convolve, ConvolveOptions, Kernel};
//!
//! let mut input = ChannelSet::zeroed(9);
//! input.alpha.fill(255);
//! input.red[4] = 90;
//! let out = convolve(&Kernel::from_weights(&[1.0; 9]), &input, 3, 3, &ConvolveOptions::default()).unwrap();
//! assert_eq!(out.red[4], 10);
//! ```

use cfx_core::{ChannelSet, clamp_channel};
use glam::{DMat2, DVec2};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::trace;

use crate::{OpsError, OpsResult};

const EPS: f64 = 1e-9;

/// Largest radius [`Kernel::brush`] builds; larger radii are clamped to it.
pub const MAX_BRUSH_RADIUS: f64 = 512.0;

/// One kernel tap: neighbour offset and weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KernelEntry {
    /// Horizontal offset from the centre pixel.
    pub dx: i32,
    /// Vertical offset from the centre pixel.
    pub dy: i32,
    /// Weight applied to the neighbour's value.
    pub weight: f64,
}

/// Sparse convolution kernel with an odd side length.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    entries: Vec<KernelEntry>,
    side: usize,
}

impl Kernel {
    /// Creates a kernel from explicit entries.
    ///
    /// `side` must be odd and every offset must fit within it.
    pub fn new(entries: Vec<KernelEntry>, side: usize) -> OpsResult<Self> {
        if side % 2 == 0 {
            return Err(OpsError::InvalidParameter(format!("kernel side {side} must be odd")));
        }
        let half = (side / 2) as i32;
        if let Some(e) = entries.iter().find(|e| e.dx.abs() > half || e.dy.abs() > half) {
            return Err(OpsError::InvalidParameter(format!(
                "kernel offset ({}, {}) outside {side}x{side}",
                e.dx, e.dy
            )));
        }
        Ok(Self { entries, side })
    }

    /// Single centre tap of weight 1; convolving with it changes nothing.
    pub fn identity() -> Self {
        Self { entries: vec![KernelEntry { dx: 0, dy: 0, weight: 1.0 }], side: 1 }
    }

    /// Star-shaped blur brush.
    ///
    /// The outline runs through `(±radius_x, 0)`, `(0, ±radius_y)` and the
    /// four diagonal points `(±1, ±1)`, rotated by `roll` degrees. Every
    /// integer offset inside or on the outline within a square grid of side
    /// `max(radius_x, radius_y) + 2` (raised to odd) becomes a unit tap.
    /// Non-positive or non-finite radii give the identity kernel; radii
    /// above [`MAX_BRUSH_RADIUS`] are clamped to it.
    pub fn brush(radius_x: f64, radius_y: f64, roll: f64) -> Self {
        let radius = |r: f64| if r.is_finite() { r.clamp(0.0, MAX_BRUSH_RADIUS) } else { 0.0 };
        let (rx, ry) = (radius(radius_x), radius(radius_y));
        let roll = if roll.is_finite() { roll } else { 0.0 };
        if rx.max(ry) <= 0.0 {
            return Self::identity();
        }

        let mut side = rx.max(ry).ceil() as usize + 2;
        if side % 2 == 0 {
            side += 1;
        }
        let half = (side / 2) as i32;

        let rot = DMat2::from_angle(roll.to_radians());
        let outline: Vec<DVec2> = [
            (-rx, 0.0),
            (-1.0, -1.0),
            (0.0, -ry),
            (1.0, -1.0),
            (rx, 0.0),
            (1.0, 1.0),
            (0.0, ry),
            (-1.0, 1.0),
        ]
        .into_iter()
        .map(|(x, y)| rot * DVec2::new(x, y))
        .collect();

        let mut entries = Vec::new();
        for dy in -half..=half {
            for dx in -half..=half {
                if contains_point(&outline, DVec2::new(dx as f64, dy as f64)) {
                    entries.push(KernelEntry { dx, dy, weight: 1.0 });
                }
            }
        }
        trace!(rx, ry, roll, taps = entries.len(), "Kernel::brush");
        if entries.is_empty() {
            return Self::identity();
        }
        Self { entries, side }
    }

    /// Matrix kernel from a flat row-major weight list.
    ///
    /// The list is zero-padded to an odd square (see [`pad_weights`]); each
    /// non-zero cell becomes a tap relative to the square's centre. No
    /// usable weight gives the identity kernel.
    pub fn from_weights(weights: &[f64]) -> Self {
        let padded = pad_weights(weights);
        let side = square_side(weights.len());
        let half = (side / 2) as i32;
        let entries: Vec<KernelEntry> = padded
            .iter()
            .enumerate()
            .filter(|(_, w)| w.is_finite() && **w != 0.0)
            .map(|(i, w)| KernelEntry {
                dx: (i % side) as i32 - half,
                dy: (i / side) as i32 - half,
                weight: *w,
            })
            .collect();
        if entries.is_empty() {
            return Self::identity();
        }
        Self { entries, side }
    }

    /// Taps, row-major.
    pub fn entries(&self) -> &[KernelEntry] {
        &self.entries
    }

    /// Number of taps.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True for a kernel with no taps (never produced by the constructors).
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Side length of the kernel's square.
    pub fn side(&self) -> usize {
        self.side
    }

    /// Weight at `(dx, dy)`, if there is a tap there.
    pub fn weight_at(&self, dx: i32, dy: i32) -> Option<f64> {
        self.entries.iter().find(|e| e.dx == dx && e.dy == dy).map(|e| e.weight)
    }

    /// Sum of all weights.
    pub fn total_weight(&self) -> f64 {
        self.entries.iter().map(|e| e.weight).sum()
    }

    /// Text grid of the kernel, `.` where there is no tap.
    pub fn render(&self) -> String {
        let half = (self.side / 2) as i32;
        let mut out = String::new();
        for dy in -half..=half {
            let row: Vec<String> = (-half..=half)
                .map(|dx| match self.weight_at(dx, dy) {
                    Some(w) if w == w.trunc() => format!("{w:>3}"),
                    Some(w) => format!("{w:>3.1}"),
                    None => "  .".to_string(),
                })
                .collect();
            out.push_str(row.join(" ").trim_end());
            out.push('\n');
        }
        out
    }
}

fn square_side(n: usize) -> usize {
    let mut side = (n as f64).sqrt().ceil() as usize;
    if side % 2 == 0 {
        side += 1;
    }
    side
}

/// Zero-pads `weights` to the smallest odd square that holds them.
///
/// ```rust
/// use cfx_ops::convolve::pad_weights;
///
/// assert_eq!(pad_weights(&[0.0, -1.0, 0.0, -1.0]).len(), 9);
/// assert_eq!(pad_weights(&[1.0; 10]).len(), 25);
/// ```
pub fn pad_weights(weights: &[f64]) -> Vec<f64> {
    let side = square_side(weights.len());
    let mut padded = weights.to_vec();
    padded.resize(side * side, 0.0);
    padded
}

fn on_segment(p: DVec2, a: DVec2, b: DVec2) -> bool {
    let cross = (b - a).perp_dot(p - a);
    cross.abs() <= EPS && (p - a).dot(p - b) <= EPS
}

/// Point-in-polygon, counting points on the outline as inside.
fn contains_point(outline: &[DVec2], p: DVec2) -> bool {
    let n = outline.len();
    let mut inside = false;
    for i in 0..n {
        let a = outline[i];
        let b = outline[(i + n - 1) % n];
        if on_segment(p, a, b) {
            return true;
        }
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
    }
    inside
}

/// What happens to taps that fall outside the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgePolicy {
    /// Drop the tap; its weight does not count.
    #[default]
    Exclude,
    /// Sample from the opposite edge.
    Wrap,
}

/// Options for [`convolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvolveOptions {
    /// Out-of-bounds handling.
    pub edge: EdgePolicy,
    /// Convolve red; otherwise copy it.
    pub include_red: bool,
    /// Convolve green; otherwise copy it.
    pub include_green: bool,
    /// Convolve blue; otherwise copy it.
    pub include_blue: bool,
    /// Convolve alpha; otherwise copy it.
    pub include_alpha: bool,
    /// Process fully transparent pixels and let them contribute.
    pub include_invisible: bool,
}

impl Default for ConvolveOptions {
    fn default() -> Self {
        Self {
            edge: EdgePolicy::Exclude,
            include_red: true,
            include_green: true,
            include_blue: true,
            include_alpha: false,
            include_invisible: false,
        }
    }
}

/// Applies `kernel` to every pixel of `input`.
///
/// Per pixel and channel: `sum(weight * neighbour) / sum(weight)` over the
/// taps that contributed. If no tap contributed the channel is 0; if the
/// contributing weights cancel out the raw sum is stored instead.
pub fn convolve(
    kernel: &Kernel,
    input: &ChannelSet,
    width: usize,
    height: usize,
    opts: &ConvolveOptions,
) -> OpsResult<ChannelSet> {
    let len = width.checked_mul(height).ok_or_else(|| {
        OpsError::SizeMismatch(format!("{width}x{height} overflows"))
    })?;
    input.check_len(len)?;
    trace!(width, height, taps = kernel.len(), edge = ?opts.edge, "convolve");

    let mut pixels = vec![[0u8; 4]; len];
    let fill_row = |(y, row): (usize, &mut [[u8; 4]])| {
        for (x, px) in row.iter_mut().enumerate() {
            *px = convolve_pixel(kernel, input, width, height, x, y, opts);
        }
    };

    #[cfg(feature = "parallel")]
    pixels.par_chunks_mut(width.max(1)).enumerate().for_each(fill_row);
    #[cfg(not(feature = "parallel"))]
    pixels.chunks_mut(width.max(1)).enumerate().for_each(fill_row);

    let mut out = ChannelSet::zeroed(len);
    for (i, px) in pixels.into_iter().enumerate() {
        out.set(i, px);
    }
    Ok(out)
}

fn convolve_pixel(
    kernel: &Kernel,
    input: &ChannelSet,
    width: usize,
    height: usize,
    x: usize,
    y: usize,
    opts: &ConvolveOptions,
) -> [u8; 4] {
    let here = input.get(y * width + x);
    if !opts.include_invisible && here[3] == 0 {
        return here;
    }

    let (w, h) = (width as i64, height as i64);
    let mut sum = [0.0f64; 4];
    let mut total = 0.0;
    let mut used = 0usize;

    for e in kernel.entries() {
        let mut nx = x as i64 + e.dx as i64;
        let mut ny = y as i64 + e.dy as i64;
        if nx < 0 || nx >= w || ny < 0 || ny >= h {
            match opts.edge {
                EdgePolicy::Exclude => continue,
                EdgePolicy::Wrap => {
                    nx = nx.rem_euclid(w);
                    ny = ny.rem_euclid(h);
                }
            }
        }
        let j = ny as usize * width + nx as usize;
        let a = input.alpha[j];
        if !opts.include_invisible && a == 0 {
            continue;
        }
        sum[0] += e.weight * input.red[j] as f64;
        sum[1] += e.weight * input.green[j] as f64;
        sum[2] += e.weight * input.blue[j] as f64;
        sum[3] += e.weight * a as f64;
        total += e.weight;
        used += 1;
    }

    let resolve = |s: f64| {
        if used == 0 {
            0
        } else if total.abs() <= EPS {
            clamp_channel(s)
        } else {
            clamp_channel(s / total)
        }
    };
    let pick = |on: bool, s: f64, orig: u8| if on { resolve(s) } else { orig };
    [
        pick(opts.include_red, sum[0], here[0]),
        pick(opts.include_green, sum[1], here[1]),
        pick(opts.include_blue, sum[2], here[2]),
        pick(opts.include_alpha, sum[3], here[3]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn opaque(len: usize) -> ChannelSet {
        let mut s = ChannelSet::zeroed(len);
        s.alpha.fill(255);
        s
    }

    #[test]
    fn test_pad_four_weights() {
        let p = pad_weights(&[0.0, -1.0, 0.0, -1.0]);
        assert_eq!(p, vec![0.0, -1.0, 0.0, -1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let k = Kernel::from_weights(&[0.0, -1.0, 0.0, -1.0]);
        assert_eq!(k.side(), 3);
        assert_eq!(k.weight_at(0, -1), Some(-1.0));
        assert_eq!(k.weight_at(-1, 0), Some(-1.0));
        assert_eq!(k.weight_at(0, 0), None);
        assert_eq!(k.len(), 2);
    }

    #[test]
    fn test_degenerate_kernels_are_identity() {
        assert_eq!(Kernel::from_weights(&[]), Kernel::identity());
        assert_eq!(Kernel::from_weights(&[0.0; 9]), Kernel::identity());
        assert_eq!(Kernel::brush(0.0, 0.0, 45.0), Kernel::identity());
        assert_eq!(Kernel::brush(f64::NAN, -2.0, 0.0), Kernel::identity());
    }

    #[test]
    fn test_huge_brush_radius_is_capped() {
        let capped = Kernel::brush(MAX_BRUSH_RADIUS, 2.0, 0.0);
        assert_eq!(Kernel::brush(1e20, 2.0, 0.0), capped);
        assert_eq!(capped.side(), MAX_BRUSH_RADIUS as usize + 3);
        assert_eq!(Kernel::brush(f64::MAX, f64::MAX, 30.0).side(), capped.side());
    }

    #[test]
    fn test_brush_symmetry() {
        let k = Kernel::brush(5.0, 5.0, 0.0);
        assert_eq!(k.side() % 2, 1);
        for e in k.entries() {
            for (dx, dy) in [(e.dy, -e.dx), (-e.dx, -e.dy), (-e.dy, e.dx)] {
                assert_eq!(k.weight_at(dx, dy), Some(e.weight), "missing ({dx}, {dy})");
            }
        }
        assert_eq!(k.weight_at(0, 0), Some(1.0));
        assert_eq!(k.weight_at(3, 0), Some(1.0));
        assert_eq!(k.weight_at(1, 1), Some(1.0));
        assert_eq!(k.weight_at(2, 1), None);
    }

    #[test]
    fn test_brush_roll_turns_the_star() {
        let flat = Kernel::brush(3.0, 1.0, 0.0);
        let upright = Kernel::brush(3.0, 1.0, 90.0);
        for e in flat.entries() {
            assert_eq!(upright.weight_at(-e.dy, e.dx), Some(1.0));
        }
        assert_eq!(flat.len(), upright.len());
    }

    #[test]
    fn test_new_rejects_even_side() {
        assert!(Kernel::new(vec![], 4).is_err());
        let far = KernelEntry { dx: 2, dy: 0, weight: 1.0 };
        assert!(Kernel::new(vec![far], 3).is_err());
        assert!(Kernel::new(vec![far], 5).is_ok());
    }

    #[test]
    fn test_identity_convolution_is_noop() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut input = ChannelSet::zeroed(48);
        for c in [&mut input.red, &mut input.green, &mut input.blue] {
            c.iter_mut().for_each(|v| *v = rng.r#gen());
        }
        input.alpha.fill(200);
        let out = convolve(&Kernel::identity(), &input, 8, 6, &ConvolveOptions::default()).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn test_edges_use_contributing_weight() {
        let mut input = opaque(9);
        input.red.fill(120);
        let out = convolve(&Kernel::from_weights(&[1.0; 9]), &input, 3, 3, &ConvolveOptions::default()).unwrap();
        assert!(out.red.iter().all(|&v| v == 120));
    }

    #[test]
    fn test_wrap_pulls_from_opposite_edge() {
        let mut input = opaque(3);
        input.red = vec![0, 0, 90];
        // Only the left neighbour.
        let k = Kernel::from_weights(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let exclude = convolve(&k, &input, 3, 1, &ConvolveOptions::default()).unwrap();
        assert_eq!(exclude.red[0], 0);
        let wrap = ConvolveOptions { edge: EdgePolicy::Wrap, ..Default::default() };
        let wrapped = convolve(&k, &input, 3, 1, &wrap).unwrap();
        assert_eq!(wrapped.red[0], 90);
    }

    #[test]
    fn test_zero_sum_kernel_stores_raw_sum() {
        let mut input = opaque(3);
        input.red = vec![10, 50, 20];
        let k = Kernel::from_weights(&[0.0, 0.0, 0.0, -1.0, 2.0, -1.0, 0.0, 0.0, 0.0]);
        let out = convolve(&k, &input, 3, 1, &ConvolveOptions::default()).unwrap();
        assert_eq!(out.red[1], 70);
        // Left edge: weights 2 and -1 contribute, 2 * 10 - 50 clamps to 0.
        assert_eq!(out.red[0], 0);
    }

    #[test]
    fn test_alpha_copied_unless_included() {
        let mut input = opaque(2);
        input.alpha = vec![255, 100];
        let k = Kernel::from_weights(&[1.0; 9]);
        let out = convolve(&k, &input, 2, 1, &ConvolveOptions::default()).unwrap();
        assert_eq!(out.alpha, vec![255, 100]);
        let with_alpha = ConvolveOptions { include_alpha: true, ..Default::default() };
        let out = convolve(&k, &input, 2, 1, &with_alpha).unwrap();
        assert_eq!(out.alpha, vec![177, 177]);
    }

    #[test]
    fn test_transparent_neighbours_skipped() {
        let mut input = opaque(3);
        input.red = vec![200, 40, 200];
        input.alpha = vec![0, 255, 0];
        let out = convolve(&Kernel::from_weights(&[1.0; 9]), &input, 3, 1, &ConvolveOptions::default()).unwrap();
        assert_eq!(out.red, vec![200, 40, 200]);
    }

    #[test]
    fn test_length_mismatch_errors() {
        let input = opaque(5);
        assert!(convolve(&Kernel::identity(), &input, 3, 2, &ConvolveOptions::default()).is_err());
    }

    #[test]
    fn test_render() {
        let text = Kernel::from_weights(&[0.0, -1.0, 0.0, -1.0, 5.0, -1.0, 0.0, -1.0, 0.0]).render();
        assert_eq!(text.lines().count(), 3);
        assert!(text.contains('5'));
    }
}
