//! Preprocessors for the standard catalog.
//!
//! Each function turns one descriptor's parameters into the primitive
//! actions that implement it. Parameter names are camelCase, matching the
//! serialized action fields.

use cfx_core::Channel;

use crate::actions::*;
use crate::params::Params;

fn average_only(red: bool, green: bool, blue: bool) -> Vec<Action> {
    vec![Action::AverageChannels(AverageChannels {
        include_red: red,
        include_green: green,
        include_blue: blue,
        exclude_red: !red,
        exclude_green: !green,
        exclude_blue: !blue,
    })]
}

fn zero_channel(channel: Channel) -> Vec<Action> {
    vec![Action::SetChannelToValue(SetChannelToValue { channel, value: 0.0 })]
}

pub(crate) fn red(_: &Params<'_>) -> Vec<Action> {
    average_only(true, false, false)
}

pub(crate) fn green(_: &Params<'_>) -> Vec<Action> {
    average_only(false, true, false)
}

pub(crate) fn blue(_: &Params<'_>) -> Vec<Action> {
    average_only(false, false, true)
}

pub(crate) fn notred(_: &Params<'_>) -> Vec<Action> {
    zero_channel(Channel::Red)
}

pub(crate) fn notgreen(_: &Params<'_>) -> Vec<Action> {
    zero_channel(Channel::Green)
}

pub(crate) fn notblue(_: &Params<'_>) -> Vec<Action> {
    zero_channel(Channel::Blue)
}

pub(crate) fn cyan(_: &Params<'_>) -> Vec<Action> {
    average_only(false, true, true)
}

pub(crate) fn magenta(_: &Params<'_>) -> Vec<Action> {
    average_only(true, false, true)
}

pub(crate) fn yellow(_: &Params<'_>) -> Vec<Action> {
    average_only(true, true, false)
}

pub(crate) fn gray(_: &Params<'_>) -> Vec<Action> {
    vec![Action::AverageChannels(AverageChannels {
        include_red: true,
        include_green: true,
        include_blue: true,
        ..Default::default()
    })]
}

pub(crate) fn channels(p: &Params<'_>) -> Vec<Action> {
    vec![Action::ModulateChannels(ModulateChannels {
        red: p.number("red", 1.0),
        green: p.number("green", 1.0),
        blue: p.number("blue", 1.0),
        alpha: p.number("alpha", 1.0),
    })]
}

pub(crate) fn channelstep(p: &Params<'_>) -> Vec<Action> {
    vec![Action::StepChannels(StepChannels {
        red: p.number("red", 1.0),
        green: p.number("green", 1.0),
        blue: p.number("blue", 1.0),
    })]
}

pub(crate) fn flood(p: &Params<'_>) -> Vec<Action> {
    vec![Action::Flood(Flood {
        red: p.number("red", 0.0),
        green: p.number("green", 0.0),
        blue: p.number("blue", 0.0),
        alpha: p.number("alpha", 255.0),
    })]
}

pub(crate) fn brightness(p: &Params<'_>) -> Vec<Action> {
    vec![Action::Brightness(Brightness { level: p.fraction("level", 1.0), ..Default::default() })]
}

pub(crate) fn saturation(p: &Params<'_>) -> Vec<Action> {
    vec![Action::Saturation(Saturation { level: p.fraction("level", 1.0), ..Default::default() })]
}

pub(crate) fn invert(_: &Params<'_>) -> Vec<Action> {
    vec![Action::InvertChannels(InvertChannels::default())]
}

pub(crate) fn grayscale(_: &Params<'_>) -> Vec<Action> {
    vec![Action::Grayscale(Grayscale {})]
}

pub(crate) fn sepia(_: &Params<'_>) -> Vec<Action> {
    vec![Action::TintChannels(TintChannels::sepia())]
}

pub(crate) fn tint(p: &Params<'_>) -> Vec<Action> {
    let d = TintChannels::default();
    vec![Action::TintChannels(TintChannels {
        red_in_red: p.number("redInRed", d.red_in_red),
        red_in_green: p.number("redInGreen", d.red_in_green),
        red_in_blue: p.number("redInBlue", d.red_in_blue),
        green_in_red: p.number("greenInRed", d.green_in_red),
        green_in_green: p.number("greenInGreen", d.green_in_green),
        green_in_blue: p.number("greenInBlue", d.green_in_blue),
        blue_in_red: p.number("blueInRed", d.blue_in_red),
        blue_in_green: p.number("blueInGreen", d.blue_in_green),
        blue_in_blue: p.number("blueInBlue", d.blue_in_blue),
    })]
}

pub(crate) fn channel_levels(p: &Params<'_>) -> Vec<Action> {
    vec![Action::LockChannelsToLevels(LockChannelsToLevels {
        red: p.numbers("red"),
        green: p.numbers("green"),
        blue: p.numbers("blue"),
        alpha: p.numbers("alpha"),
    })]
}

pub(crate) fn threshold(p: &Params<'_>) -> Vec<Action> {
    let d = Threshold::default();
    vec![Action::Threshold(Threshold {
        level: p.channel_level("level", d.level),
        low: p.rgb("low", "low", d.low),
        high: p.rgb("high", "high", d.high),
    })]
}

pub(crate) fn chromakey(p: &Params<'_>) -> Vec<Action> {
    let d = ColorsToAlpha::default();
    vec![Action::ColorsToAlpha(ColorsToAlpha {
        red: p.number("red", d.red),
        green: p.number("green", d.green),
        blue: p.number("blue", d.blue),
        transparent_at: p.fraction("transparentAt", d.transparent_at.get()),
        opaque_at: p.fraction("opaqueAt", d.opaque_at.get()),
    })]
}

pub(crate) fn chroma(p: &Params<'_>) -> Vec<Action> {
    vec![Action::Chroma(Chroma { ranges: p.ranges("ranges") })]
}

pub(crate) fn blur(p: &Params<'_>) -> Vec<Action> {
    let d = Blur::default();
    let radius = p.number("radius", d.radius_x);
    vec![Action::Blur(Blur {
        radius_x: p.number("radiusX", radius),
        radius_y: p.number("radiusY", radius),
        roll: p.number("roll", d.roll),
        passes: p.count("passes", d.passes),
        include_alpha: p.flag("includeAlpha", d.include_alpha),
        wrap: p.flag("wrap", d.wrap),
        include_invisible: p.flag("includeInvisible", d.include_invisible),
    })]
}

pub(crate) fn pixelate(p: &Params<'_>) -> Vec<Action> {
    let d = Pixelate::default();
    vec![Action::Pixelate(Pixelate {
        tile_width: p.count("tileWidth", d.tile_width),
        tile_height: p.count("tileHeight", d.tile_height),
        offset_x: p.count("offsetX", d.offset_x),
        offset_y: p.count("offsetY", d.offset_y),
        include_red: p.flag("includeRed", d.include_red),
        include_green: p.flag("includeGreen", d.include_green),
        include_blue: p.flag("includeBlue", d.include_blue),
        include_alpha: p.flag("includeAlpha", d.include_alpha),
    })]
}

fn matrix_from(p: &Params<'_>, weights: Vec<f64>) -> Matrix {
    let d = Matrix::default();
    Matrix {
        weights,
        include_red: p.flag("includeRed", d.include_red),
        include_green: p.flag("includeGreen", d.include_green),
        include_blue: p.flag("includeBlue", d.include_blue),
        include_alpha: p.flag("includeAlpha", d.include_alpha),
        wrap: p.flag("wrap", d.wrap),
        include_invisible: p.flag("includeInvisible", d.include_invisible),
    }
}

pub(crate) fn matrix(p: &Params<'_>) -> Vec<Action> {
    let mut weights = p.numbers("weights");
    if weights.is_empty() {
        weights = Matrix::default().weights;
    }
    vec![Action::Matrix(matrix_from(p, weights))]
}

pub(crate) fn sharpen(p: &Params<'_>) -> Vec<Action> {
    vec![Action::Matrix(matrix_from(p, Matrix::sharpen().weights))]
}

pub(crate) fn offset(p: &Params<'_>) -> Vec<Action> {
    vec![Action::Offset(Offset { offset_x: p.integer("offsetX", 0), offset_y: p.integer("offsetY", 0) })]
}

pub(crate) fn area_alpha(p: &Params<'_>) -> Vec<Action> {
    let d = AreaAlpha::default();
    let levels = p.numbers("areaAlphaLevels");
    let area_alpha_levels = match levels.as_slice() {
        [] => d.area_alpha_levels,
        [a, b, c, e] => [*a, *b, *c, *e],
        _ => {
            tracing::warn!(method = p.method(), count = levels.len(), "areaAlphaLevels needs four values, using default");
            d.area_alpha_levels
        }
    };
    vec![Action::AreaAlpha(AreaAlpha {
        tile_width: p.count("tileWidth", d.tile_width),
        tile_height: p.count("tileHeight", d.tile_height),
        gutter_width: p.count("gutterWidth", d.gutter_width),
        gutter_height: p.count("gutterHeight", d.gutter_height),
        offset_x: p.count("offsetX", d.offset_x),
        offset_y: p.count("offsetY", d.offset_y),
        area_alpha_levels,
    })]
}

pub(crate) fn channels_to_alpha(p: &Params<'_>) -> Vec<Action> {
    vec![Action::ChannelsToAlpha(ChannelsToAlpha {
        include_red: p.flag("includeRed", true),
        include_green: p.flag("includeGreen", true),
        include_blue: p.flag("includeBlue", true),
    })]
}

pub(crate) fn alpha_to_channels(p: &Params<'_>) -> Vec<Action> {
    vec![Action::AlphaToChannels(AlphaToChannels {
        include_red: p.flag("includeRed", true),
        include_green: p.flag("includeGreen", true),
        include_blue: p.flag("includeBlue", true),
        exclude_red: p.flag("excludeRed", false),
        exclude_green: p.flag("excludeGreen", false),
        exclude_blue: p.flag("excludeBlue", false),
    })]
}

pub(crate) fn glass_tile(p: &Params<'_>) -> Vec<Action> {
    let d = GlassTile::default();
    vec![Action::GlassTile(GlassTile {
        width: p.count("width", d.width),
        height: p.count("height", d.height),
        outer_width: p.count("outerWidth", d.outer_width),
        outer_height: p.count("outerHeight", d.outer_height),
    })]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, Value, json};

    fn params(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_red_includes_only_red() {
        let m = Map::new();
        match red(&Params::new("red", &m)).as_slice() {
            [Action::AverageChannels(a)] => {
                assert!(a.include_red && !a.include_green && !a.include_blue);
                assert!(!a.exclude_red && a.exclude_green && a.exclude_blue);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_cyan_excludes_red() {
        let m = Map::new();
        match cyan(&Params::new("cyan", &m)).as_slice() {
            [Action::AverageChannels(a)] => {
                assert!(a.include_green && a.include_blue && !a.include_red);
                assert!(a.exclude_red && !a.exclude_green);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_blur_radius_fans_out() {
        let m = params(json!({"radius": 4, "radiusY": 1, "wrap": true}));
        match blur(&Params::new("blur", &m)).as_slice() {
            [Action::Blur(b)] => {
                assert_eq!((b.radius_x, b.radius_y), (4.0, 1.0));
                assert!(b.wrap);
                assert_eq!(b.passes, 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_threshold_percent_and_fields() {
        let m = params(json!({"level": "50%", "lowRed": 10, "high": [1, 2, 3]}));
        match threshold(&Params::new("threshold", &m)).as_slice() {
            [Action::Threshold(t)] => {
                assert_eq!(t.level, 127.5);
                assert_eq!(t.low, [10, 0, 0]);
                assert_eq!(t.high, [1, 2, 3]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_chromakey_percent_strings() {
        let m = params(json!({"transparentAt": "10%", "opaqueAt": 0.5}));
        match chromakey(&Params::new("chromakey", &m)).as_slice() {
            [Action::ColorsToAlpha(c)] => {
                assert_eq!(c.transparent_at.get(), 0.1);
                assert_eq!(c.opaque_at.get(), 0.5);
                assert_eq!((c.red, c.green, c.blue), (0.0, 255.0, 0.0));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_matrix_empty_weights_default() {
        let m = params(json!({"weights": []}));
        match matrix(&Params::new("matrix", &m)).as_slice() {
            [Action::Matrix(x)] => assert_eq!(x.weights, vec![1.0]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_area_alpha_bad_levels_recover() {
        let m = params(json!({"areaAlphaLevels": [1, 2]}));
        match area_alpha(&Params::new("areaAlpha", &m)).as_slice() {
            [Action::AreaAlpha(a)] => assert_eq!(a.area_alpha_levels, [255.0, 0.0, 0.0, 0.0]),
            other => panic!("unexpected {other:?}"),
        }
    }
}
