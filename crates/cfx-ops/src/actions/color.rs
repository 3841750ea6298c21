//! Per-pixel colour actions.

use cfx_core::{Channel, ChannelSet, Fraction, clamp_channel, luma};
use serde::{Deserialize, Serialize};

use super::map_pixels;
use crate::levels::LevelBuckets;

/// Averages the included colour channels into every non-excluded one.
///
/// With nothing included the colour passes through, minus exclusions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AverageChannels {
    /// Red contributes to the average.
    pub include_red: bool,
    /// Green contributes to the average.
    pub include_green: bool,
    /// Blue contributes to the average.
    pub include_blue: bool,
    /// Red output forced to 0.
    pub exclude_red: bool,
    /// Green output forced to 0.
    pub exclude_green: bool,
    /// Blue output forced to 0.
    pub exclude_blue: bool,
}

impl AverageChannels {
    pub(crate) fn apply(&self, input: &ChannelSet) -> ChannelSet {
        let divisor = [self.include_red, self.include_green, self.include_blue]
            .iter()
            .filter(|f| **f)
            .count() as u32;
        map_pixels(input, true, |[r, g, b, a]| {
            let (r, g, b) = if divisor > 0 {
                let mut sum = 0u32;
                if self.include_red {
                    sum += r as u32;
                }
                if self.include_green {
                    sum += g as u32;
                }
                if self.include_blue {
                    sum += b as u32;
                }
                let avg = (sum / divisor) as u8;
                (avg, avg, avg)
            } else {
                (r, g, b)
            };
            [
                if self.exclude_red { 0 } else { r },
                if self.exclude_green { 0 } else { g },
                if self.exclude_blue { 0 } else { b },
                a,
            ]
        })
    }
}

/// Multiplies selected colour channels by `level`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Brightness {
    /// Multiplier; `1` leaves colour unchanged.
    pub level: Fraction,
    /// Apply to red.
    pub include_red: bool,
    /// Apply to green.
    pub include_green: bool,
    /// Apply to blue.
    pub include_blue: bool,
}

impl Default for Brightness {
    fn default() -> Self {
        Self { level: Fraction::ONE, include_red: true, include_green: true, include_blue: true }
    }
}

impl Brightness {
    pub(crate) fn apply(&self, input: &ChannelSet) -> ChannelSet {
        let level = self.level.get();
        let f = |on: bool, v: u8| if on { clamp_channel(v as f64 * level) } else { v };
        map_pixels(input, true, |[r, g, b, a]| {
            [f(self.include_red, r), f(self.include_green, g), f(self.include_blue, b), a]
        })
    }
}

/// Scales each selected channel's distance from 127 by `level`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Saturation {
    /// Scale factor; `0` collapses to mid-grey.
    pub level: Fraction,
    /// Apply to red.
    pub include_red: bool,
    /// Apply to green.
    pub include_green: bool,
    /// Apply to blue.
    pub include_blue: bool,
}

impl Default for Saturation {
    fn default() -> Self {
        Self { level: Fraction::ONE, include_red: true, include_green: true, include_blue: true }
    }
}

impl Saturation {
    pub(crate) fn apply(&self, input: &ChannelSet) -> ChannelSet {
        let level = self.level.get();
        let f = |on: bool, v: u8| {
            if on { clamp_channel(127.0 + (v as f64 - 127.0) * level) } else { v }
        };
        map_pixels(input, true, |[r, g, b, a]| {
            [f(self.include_red, r), f(self.include_green, g), f(self.include_blue, b), a]
        })
    }
}

/// Replaces colour with floored Rec.709 luma.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Grayscale {}

impl Grayscale {
    pub(crate) fn apply(&self, input: &ChannelSet) -> ChannelSet {
        map_pixels(input, true, |[r, g, b, a]| {
            let y = luma(r, g, b);
            [y, y, y, a]
        })
    }
}

/// Luma below `level` becomes `low`, everything else `high`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Threshold {
    /// Cutoff on the 0..255 luma scale.
    pub level: f64,
    /// Colour for luma below the cutoff.
    pub low: [u8; 3],
    /// Colour for luma at or above the cutoff.
    pub high: [u8; 3],
}

impl Default for Threshold {
    fn default() -> Self {
        Self { level: 128.0, low: [0, 0, 0], high: [255, 255, 255] }
    }
}

impl Threshold {
    pub(crate) fn apply(&self, input: &ChannelSet) -> ChannelSet {
        map_pixels(input, true, |[r, g, b, a]| {
            let [or, og, ob] = if (luma(r, g, b) as f64) < self.level { self.low } else { self.high };
            [or, og, ob, a]
        })
    }
}

/// `255 - v` on each selected channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InvertChannels {
    /// Invert red.
    pub include_red: bool,
    /// Invert green.
    pub include_green: bool,
    /// Invert blue.
    pub include_blue: bool,
    /// Invert alpha.
    pub include_alpha: bool,
}

impl Default for InvertChannels {
    fn default() -> Self {
        Self { include_red: true, include_green: true, include_blue: true, include_alpha: false }
    }
}

impl InvertChannels {
    pub(crate) fn apply(&self, input: &ChannelSet) -> ChannelSet {
        let f = |on: bool, v: u8| if on { 255 - v } else { v };
        map_pixels(input, !self.include_alpha, |[r, g, b, a]| {
            [
                f(self.include_red, r),
                f(self.include_green, g),
                f(self.include_blue, b),
                f(self.include_alpha, a),
            ]
        })
    }
}

/// Quantizes each colour channel down to a multiple of its divisor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepChannels {
    /// Red divisor.
    pub red: f64,
    /// Green divisor.
    pub green: f64,
    /// Blue divisor.
    pub blue: f64,
}

impl Default for StepChannels {
    fn default() -> Self {
        Self { red: 1.0, green: 1.0, blue: 1.0 }
    }
}

impl StepChannels {
    pub(crate) fn apply(&self, input: &ChannelSet) -> ChannelSet {
        let step = |d: f64| if d.is_finite() && d >= 1.0 { d.floor() } else { 1.0 };
        let (dr, dg, db) = (step(self.red), step(self.green), step(self.blue));
        let f = |v: u8, d: f64| clamp_channel((v as f64 / d).floor() * d);
        map_pixels(input, true, |[r, g, b, a]| [f(r, dr), f(g, dg), f(b, db), a])
    }
}

/// 3x3 colour mix. `xInY` is the share of input channel x in output y.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct TintChannels {
    pub red_in_red: f64,
    pub red_in_green: f64,
    pub red_in_blue: f64,
    pub green_in_red: f64,
    pub green_in_green: f64,
    pub green_in_blue: f64,
    pub blue_in_red: f64,
    pub blue_in_green: f64,
    pub blue_in_blue: f64,
}

impl Default for TintChannels {
    fn default() -> Self {
        Self {
            red_in_red: 1.0,
            red_in_green: 0.0,
            red_in_blue: 0.0,
            green_in_red: 0.0,
            green_in_green: 1.0,
            green_in_blue: 0.0,
            blue_in_red: 0.0,
            blue_in_green: 0.0,
            blue_in_blue: 1.0,
        }
    }
}

impl TintChannels {
    /// The fixed sepia mix.
    pub fn sepia() -> Self {
        Self {
            red_in_red: 0.393,
            red_in_green: 0.349,
            red_in_blue: 0.272,
            green_in_red: 0.769,
            green_in_green: 0.686,
            green_in_blue: 0.534,
            blue_in_red: 0.189,
            blue_in_green: 0.168,
            blue_in_blue: 0.131,
        }
    }

    pub(crate) fn apply(&self, input: &ChannelSet) -> ChannelSet {
        map_pixels(input, true, |[r, g, b, a]| {
            let (r, g, b) = (r as f64, g as f64, b as f64);
            [
                clamp_channel(r * self.red_in_red + g * self.green_in_red + b * self.blue_in_red),
                clamp_channel(r * self.red_in_green + g * self.green_in_green + b * self.blue_in_green),
                clamp_channel(r * self.red_in_blue + g * self.green_in_blue + b * self.blue_in_blue),
                a,
            ]
        })
    }
}

/// Multiplies every channel, alpha included, by its own weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModulateChannels {
    /// Red weight.
    pub red: f64,
    /// Green weight.
    pub green: f64,
    /// Blue weight.
    pub blue: f64,
    /// Alpha weight.
    pub alpha: f64,
}

impl Default for ModulateChannels {
    fn default() -> Self {
        Self { red: 1.0, green: 1.0, blue: 1.0, alpha: 1.0 }
    }
}

impl ModulateChannels {
    pub(crate) fn apply(&self, input: &ChannelSet) -> ChannelSet {
        let f = |v: u8, w: f64| clamp_channel(v as f64 * w);
        map_pixels(input, false, |[r, g, b, a]| {
            [f(r, self.red), f(g, self.green), f(b, self.blue), f(a, self.alpha)]
        })
    }
}

/// Overwrites one channel with a constant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetChannelToValue {
    /// Target channel.
    pub channel: Channel,
    /// Value stored (clamped).
    pub value: f64,
}

impl SetChannelToValue {
    pub(crate) fn apply(&self, input: &ChannelSet) -> ChannelSet {
        let mut out = input.clone();
        let v = clamp_channel(self.value);
        let target = out.channel_mut(self.channel);
        if self.channel == Channel::Alpha {
            target.fill(v);
        } else {
            for (dst, a) in target.iter_mut().zip(&input.alpha) {
                if *a != 0 {
                    *dst = v;
                }
            }
        }
        out
    }
}

/// Fills every pixel with one RGBA value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Flood {
    /// Red.
    pub red: f64,
    /// Green.
    pub green: f64,
    /// Blue.
    pub blue: f64,
    /// Alpha.
    pub alpha: f64,
}

impl Default for Flood {
    fn default() -> Self {
        Self { red: 0.0, green: 0.0, blue: 0.0, alpha: 255.0 }
    }
}

impl Flood {
    pub(crate) fn apply(&self, input: &ChannelSet) -> ChannelSet {
        let px = [
            clamp_channel(self.red),
            clamp_channel(self.green),
            clamp_channel(self.blue),
            clamp_channel(self.alpha),
        ];
        map_pixels(input, false, |_| px)
    }
}

/// Snaps each channel onto the nearest of its listed levels.
///
/// An empty list leaves that channel unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockChannelsToLevels {
    /// Red levels.
    pub red: Vec<f64>,
    /// Green levels.
    pub green: Vec<f64>,
    /// Blue levels.
    pub blue: Vec<f64>,
    /// Alpha levels.
    pub alpha: Vec<f64>,
}

impl LockChannelsToLevels {
    pub(crate) fn apply(&self, input: &ChannelSet) -> ChannelSet {
        let r = LevelBuckets::new(&self.red);
        let g = LevelBuckets::new(&self.green);
        let b = LevelBuckets::new(&self.blue);
        let alpha = LevelBuckets::new(&self.alpha);
        map_pixels(input, alpha.is_identity(), |[pr, pg, pb, pa]| {
            [r.map(pr), g.map(pg), b.map(pb), alpha.map(pa)]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::Action;
    use super::super::test_support::{run, set};
    use super::*;

    #[test]
    fn test_average_single_channel() {
        let a = Action::AverageChannels(AverageChannels {
            include_red: true,
            exclude_green: true,
            exclude_blue: true,
            ..Default::default()
        });
        let out = run(&a, &set(&[[255, 0, 0, 255], [0, 255, 0, 255]]), 2, 1);
        assert_eq!(out.get(0), [255, 0, 0, 255]);
        assert_eq!(out.get(1), [0, 0, 0, 255]);
    }

    #[test]
    fn test_average_floors() {
        let a = Action::AverageChannels(AverageChannels {
            include_red: true,
            include_green: true,
            include_blue: true,
            ..Default::default()
        });
        let out = run(&a, &set(&[[10, 20, 31, 255]]), 1, 1);
        assert_eq!(out.get(0), [20, 20, 20, 255]);
    }

    #[test]
    fn test_transparent_pixels_pass_through() {
        let a = Action::Grayscale(Grayscale {});
        let out = run(&a, &set(&[[200, 10, 10, 0]]), 1, 1);
        assert_eq!(out.get(0), [200, 10, 10, 0]);
    }

    #[test]
    fn test_grayscale_pure_red() {
        let out = run(&Action::Grayscale(Grayscale {}), &set(&[[255, 0, 0, 255]]), 1, 1);
        assert_eq!(out.get(0), [54, 54, 54, 255]);
    }

    #[test]
    fn test_brightness_clamps() {
        let a = Action::Brightness(Brightness { level: Fraction(2.0), ..Default::default() });
        let out = run(&a, &set(&[[100, 200, 0, 9]]), 1, 1);
        assert_eq!(out.get(0), [200, 255, 0, 9]);
    }

    #[test]
    fn test_saturation_zero_is_mid_grey() {
        let a = Action::Saturation(Saturation { level: Fraction(0.0), ..Default::default() });
        let out = run(&a, &set(&[[0, 255, 30, 255]]), 1, 1);
        assert_eq!(out.get(0), [127, 127, 127, 255]);
    }

    #[test]
    fn test_threshold_boundary() {
        let a = Action::Threshold(Threshold {
            low: [1, 2, 3],
            high: [250, 251, 252],
            ..Default::default()
        });
        let out = run(&a, &set(&[[127, 127, 127, 255], [128, 128, 128, 255]]), 2, 1);
        assert_eq!(out.get(0), [1, 2, 3, 255]);
        assert_eq!(out.get(1), [250, 251, 252, 255]);
    }

    #[test]
    fn test_invert_twice_is_identity() {
        let a = Action::InvertChannels(InvertChannels::default());
        let input = set(&[[0, 17, 255, 255], [90, 91, 92, 128]]);
        let once = run(&a, &input, 2, 1);
        assert_eq!(once.get(0), [255, 238, 0, 255]);
        assert_eq!(run(&a, &once, 2, 1), input);
    }

    #[test]
    fn test_step_channels_red_10() {
        let a = Action::StepChannels(StepChannels { red: 10.0, ..Default::default() });
        let px: Vec<[u8; 4]> = (0..=255u8).map(|v| [v, v, v, 255]).collect();
        let out = run(&a, &set(&px), 256, 1);
        for v in 0..=255usize {
            assert_eq!(out.red[v] as usize, v / 10 * 10);
            assert_eq!(out.green[v] as usize, v);
        }
        assert_eq!(out.red[9], 0);
        assert_eq!(out.red[19], 10);
        assert_eq!(out.red[255], 250);
    }

    #[test]
    fn test_step_divisor_below_one() {
        let a = Action::StepChannels(StepChannels { red: 0.0, green: -3.0, blue: f64::NAN });
        let input = set(&[[33, 44, 55, 255]]);
        assert_eq!(run(&a, &input, 1, 1), input);
    }

    #[test]
    fn test_sepia() {
        let a = Action::TintChannels(TintChannels::sepia());
        let out = run(&a, &set(&[[100, 100, 100, 255]]), 1, 1);
        // 100 * (0.393 + 0.769 + 0.189) = 135.1
        assert_eq!(out.get(0), [135, 120, 93, 255]);
    }

    #[test]
    fn test_tint_default_is_identity() {
        let input = set(&[[1, 2, 3, 4], [250, 128, 7, 255]]);
        assert_eq!(run(&Action::TintChannels(TintChannels::default()), &input, 2, 1), input);
    }

    #[test]
    fn test_modulate_includes_alpha() {
        let a = Action::ModulateChannels(ModulateChannels { alpha: 0.5, ..Default::default() });
        let out = run(&a, &set(&[[10, 20, 30, 255]]), 1, 1);
        assert_eq!(out.get(0), [10, 20, 30, 127]);
    }

    #[test]
    fn test_set_channel_to_value() {
        let a = Action::SetChannelToValue(SetChannelToValue { channel: Channel::Red, value: 0.0 });
        let out = run(&a, &set(&[[200, 1, 2, 255], [200, 1, 2, 0]]), 2, 1);
        assert_eq!(out.get(0), [0, 1, 2, 255]);
        assert_eq!(out.get(1), [200, 1, 2, 0]);
    }

    #[test]
    fn test_flood_defaults() {
        let out = run(&Action::Flood(Flood::default()), &set(&[[9, 9, 9, 0]; 3]), 3, 1);
        for i in 0..3 {
            assert_eq!(out.get(i), [0, 0, 0, 255]);
        }
    }

    #[test]
    fn test_lock_levels() {
        let a = Action::LockChannelsToLevels(LockChannelsToLevels {
            red: vec![0.0, 100.0, 200.0],
            ..Default::default()
        });
        let out = run(&a, &set(&[[50, 50, 50, 255], [51, 7, 7, 255], [151, 7, 7, 255]]), 3, 1);
        assert_eq!(out.get(0), [0, 50, 50, 255]);
        assert_eq!(out.get(1), [100, 7, 7, 255]);
        assert_eq!(out.get(2), [200, 7, 7, 255]);
    }
}
