//! Integration tests for cfx crates.
//!
//! This crate contains end-to-end tests that drive packets through the
//! catalog, the chain runner and the host pool together.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use approx::assert_relative_eq;
    use cfx_core::{ChannelSet, Fraction, ImageBuffer};
    use cfx_host::{FilterHost, FilterPool, Packet, filter_image};
    use cfx_ops::compose::blend;
    use cfx_ops::convolve::{ConvolveOptions, convolve, pad_weights};
    use cfx_ops::{FilterCatalog, FilterDescriptor, Kernel, Workstore};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use tempfile::tempdir;

    fn random_image(rng: &mut StdRng, w: u32, h: u32) -> ImageBuffer {
        let data = (0..w * h * 4).map(|_| rng.r#gen()).collect();
        ImageBuffer::new(w, h, data).unwrap()
    }

    fn host() -> FilterHost {
        FilterHost::new(Arc::new(FilterCatalog::standard()))
    }

    fn filter_with(image: &ImageBuffer, filters: Vec<FilterDescriptor>) -> ImageBuffer {
        host().process(Packet::new(image.clone(), filters)).image.unwrap()
    }

    /// The canonical two-pixel packet, as JSON in and JSON out.
    #[test]
    fn test_red_packet_json() {
        let json = r#"{
            "image": {"width": 2, "height": 1, "data": [255, 0, 0, 255, 0, 255, 0, 255]},
            "filters": [{"method": "red", "opacity": 1, "actions": []}]
        }"#;
        let packet = Packet::from_json(json).unwrap();
        let out = host().process(packet);
        let value: serde_json::Value = serde_json::from_str(&out.to_json().unwrap()).unwrap();
        assert_eq!(value["image"]["data"], serde_json::json!([255, 0, 0, 255, 0, 0, 0, 255]));
        assert_eq!(value["filters"][0]["actions"][0]["action"], "average-channels");
    }

    #[test]
    fn test_channels_identity_over_random_images() {
        let mut rng = StdRng::seed_from_u64(0xc0ffee);
        for _ in 0..25 {
            let (w, h) = (rng.gen_range(1..20), rng.gen_range(1..20));
            let image = random_image(&mut rng, w, h);
            let f = FilterDescriptor::new("channels")
                .with_param("red", 1)
                .with_param("green", 1)
                .with_param("blue", 1)
                .with_param("alpha", 1);
            assert_eq!(filter_with(&image, vec![f]), image);
        }
    }

    #[test]
    fn test_full_opacity_is_exact_output() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..20 {
            let image = random_image(&mut rng, 7, 3);
            let f = FilterDescriptor::new("flood")
                .with_param("red", 12)
                .with_param("green", 34)
                .with_param("blue", 56)
                .with_param("alpha", 78);
            let out = filter_with(&image, vec![f]);
            assert!(out.data.chunks(4).all(|px| px == [12, 34, 56, 78]));
        }
    }

    #[test]
    fn test_opacity_linearity_through_host() {
        let mut rng = StdRng::seed_from_u64(5);
        for method in ["sepia", "saturation", "chromakey", "pixelate", "sharpen"] {
            let image = random_image(&mut rng, 8, 8);
            let p = rng.gen_range(0.05..0.95);
            let full = filter_with(&image, vec![FilterDescriptor::new(method)]);
            let partial = filter_with(&image, vec![FilterDescriptor::new(method).with_opacity(p)]);

            let mut expected = ChannelSet::from_image(&image);
            blend(&mut expected, &ChannelSet::from_image(&full), p).unwrap();
            let actual = ChannelSet::from_image(&partial);
            for i in 0..actual.len() {
                let (a, b) = (expected.get(i), actual.get(i));
                for c in 0..4 {
                    assert!((a[c] as i32 - b[c] as i32).abs() <= 1, "{method} p={p}");
                }
            }
        }
    }

    #[test]
    fn test_grayscale_invert_threshold_scenarios() {
        let image = ImageBuffer::new(2, 1, vec![255, 0, 0, 255, 128, 128, 128, 255]).unwrap();
        let gray = filter_with(&image, vec![FilterDescriptor::new("grayscale")]);
        assert_eq!(gray.pixel(0, 0), Some([54, 54, 54, 255]));

        let twice = filter_with(&image, vec![FilterDescriptor::new("invert"), FilterDescriptor::new("invert")]);
        assert_eq!(twice, image);

        let edge = ImageBuffer::new(2, 1, vec![127, 127, 127, 255, 128, 128, 128, 255]).unwrap();
        let t = filter_with(&edge, vec![FilterDescriptor::new("threshold").with_param("level", 128)]);
        assert_eq!(t.data, vec![0, 0, 0, 255, 255, 255, 255, 255]);
    }

    #[test]
    fn test_channelstep_quantizes() {
        let data: Vec<u8> = (0..=255u8).flat_map(|v| [v, v, v, 255]).collect();
        let image = ImageBuffer::new(256, 1, data).unwrap();
        let out = filter_with(&image, vec![FilterDescriptor::new("channelstep").with_param("red", 10)]);
        for (v, px) in out.data.chunks(4).enumerate() {
            assert_eq!(px[0] as usize, v / 10 * 10);
            assert_eq!(px[1] as usize, v);
        }
    }

    #[test]
    fn test_matrix_padding_and_convolution() {
        let padded = pad_weights(&[0.0, -1.0, 0.0, -1.0]);
        assert_eq!(padded, vec![0.0, -1.0, 0.0, -1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let kernel = Kernel::from_weights(&[0.0, -1.0, 0.0, -1.0]);
        assert_eq!(kernel.side(), 3);
        assert_eq!(kernel.weight_at(0, -1), Some(-1.0));
        assert_eq!(kernel.weight_at(-1, 0), Some(-1.0));
        assert_relative_eq!(kernel.total_weight(), -2.0);

        let mut input = ChannelSet::zeroed(9);
        input.alpha.fill(255);
        input.red = vec![10, 20, 30, 40, 50, 60, 70, 80, 90];
        let out = convolve(&kernel, &input, 3, 3, &ConvolveOptions::default()).unwrap();
        // Centre: (-20 - 40) / -2 = 30.
        assert_eq!(out.red[4], 30);
    }

    #[test]
    fn test_brush_quarter_turn_symmetry() {
        let brush = Kernel::brush(5.0, 5.0, 0.0);
        for e in brush.entries() {
            assert_eq!(brush.weight_at(-e.dy, e.dx), Some(1.0), "({}, {})", e.dx, e.dy);
        }
        let turned = Kernel::brush(5.0, 5.0, 90.0);
        assert_eq!(turned.len(), brush.len());
    }

    #[test]
    fn test_alpha_to_channels_distinct_outputs() {
        let image = ImageBuffer::new(1, 1, vec![1, 2, 3, 200]).unwrap();
        let f = FilterDescriptor::new("alphaToChannels")
            .with_param("includeGreen", false)
            .with_param("includeBlue", false)
            .with_param("excludeBlue", true);
        let out = filter_with(&image, vec![f]);
        assert_eq!(out.data, vec![200, 2, 0, 255]);
    }

    fn chain_ok(image: &ImageBuffer, mut filters: Vec<FilterDescriptor>) -> ImageBuffer {
        let mut out = image.clone();
        filter_image(&mut out, &mut filters, &FilterCatalog::standard()).unwrap();
        out
    }

    /// Extreme numbers on one action must not cost the rest of the chain.
    #[test]
    fn test_extreme_parameters_keep_the_chain() {
        let mut rng = StdRng::seed_from_u64(77);
        let image = random_image(&mut rng, 4, 4);
        let invert = || FilterDescriptor::new("invert");
        let cases: [(FilterDescriptor, FilterDescriptor); 5] = [
            (
                FilterDescriptor::new("offset").with_param("offsetX", 1e30).with_param("offsetY", -1e30),
                FilterDescriptor::new("offset").with_param("offsetX", 4).with_param("offsetY", -4),
            ),
            (
                FilterDescriptor::new("areaAlpha")
                    .with_param("tileWidth", 4294967295u64)
                    .with_param("gutterWidth", 1)
                    .with_param("offsetX", 1e30),
                FilterDescriptor::new("areaAlpha")
                    .with_param("tileWidth", 4294967295u64)
                    .with_param("gutterWidth", 1)
                    .with_param("offsetX", 4294967295u64),
            ),
            (
                FilterDescriptor::new("blur").with_param("radius", 1e20).with_param("passes", 1e12),
                FilterDescriptor::new("blur").with_param("radius", 4).with_param("passes", 64),
            ),
            (
                FilterDescriptor::new("pixelate")
                    .with_param("tileWidth", 1e30)
                    .with_param("tileHeight", 1e30)
                    .with_param("offsetX", 1e30),
                FilterDescriptor::new("pixelate")
                    .with_param("tileWidth", 4)
                    .with_param("tileHeight", 4)
                    .with_param("offsetX", 3),
            ),
            (
                FilterDescriptor::new("glassTile")
                    .with_param("width", 1e30)
                    .with_param("outerWidth", 1e30),
                FilterDescriptor::new("glassTile")
                    .with_param("width", 4294967295u64)
                    .with_param("outerWidth", 4294967295u64),
            ),
        ];
        for (extreme, tame) in cases {
            let method = extreme.method.clone();
            let out = chain_ok(&image, vec![invert(), extreme]);
            assert_eq!(out, chain_ok(&image, vec![invert(), tame]), "{method}");
        }
    }

    #[test]
    fn test_extreme_offset_then_invert_still_inverts() {
        let image = ImageBuffer::filled(4, 4, [10, 20, 30, 255]).unwrap();
        let mut shifted = FilterDescriptor::new("offset").with_param("offsetX", 1e30);
        shifted.line_out = Some("gone".into());
        let out = chain_ok(&image, vec![shifted, FilterDescriptor::new("invert")]);
        assert_eq!(out.pixel(0, 0), Some([245, 235, 225, 255]));
    }

    #[test]
    fn test_duplicate_line_out_rejected() {
        let image = ImageBuffer::filled(2, 2, [40, 50, 60, 255]).unwrap();
        let mut a = FilterDescriptor::new("grayscale");
        a.line_out = Some("shared".into());
        let mut b = FilterDescriptor::new("invert");
        b.line_out = Some("shared".into());
        assert_eq!(filter_with(&image, vec![a, b]), image);
    }

    #[test]
    fn test_line_routing_with_source() {
        // Work is flooded, then the untouched source is inverted back over it.
        let image = ImageBuffer::filled(1, 1, [10, 20, 30, 255]).unwrap();
        let mut invert = FilterDescriptor::new("invert");
        invert.line_in = Some("source".into());
        let out = filter_with(&image, vec![FilterDescriptor::new("flood"), invert]);
        assert_eq!(out.data, vec![245, 235, 225, 255]);
    }

    #[test]
    fn test_percent_strings_match_numbers() {
        let f: FilterDescriptor =
            serde_json::from_str(r#"{"method":"brightness","level":"50%","opacity":"25%"}"#).unwrap();
        assert_relative_eq!(f.opacity.get(), 0.25);
        let g = FilterDescriptor::new("brightness").with_param("level", 0.5).with_opacity(0.25);

        let mut rng = StdRng::seed_from_u64(8);
        let image = random_image(&mut rng, 5, 5);
        assert_eq!(filter_with(&image, vec![f]), filter_with(&image, vec![g]));
        assert_relative_eq!("12.5%".parse::<Fraction>().unwrap().get(), 0.125);
    }

    #[test]
    fn test_workstore_expiry() {
        let mut store = Workstore::new(Duration::from_millis(3000));
        store.kernel("brush-2-2-0", || Kernel::brush(2.0, 2.0, 0.0));
        assert_eq!(store.purge_at(Instant::now() + Duration::from_millis(1000)), 0);
        assert_eq!(store.purge_at(Instant::now() + Duration::from_millis(3500)), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_packet_files_through_pool() {
        let dir = tempdir().unwrap();
        let mut rng = StdRng::seed_from_u64(21);
        let pool = FilterPool::builder().max_hosts(2).build().unwrap();

        for i in 0..4 {
            let image = random_image(&mut rng, 6, 4);
            let packet = Packet::new(image, vec![FilterDescriptor::new("blur").with_param("radius", 1)])
                .with_name(format!("frame-{i}"));
            std::fs::write(dir.path().join(format!("{i}.json")), packet.to_json().unwrap()).unwrap();
        }

        for i in 0..4 {
            let text = std::fs::read_to_string(dir.path().join(format!("{i}.json"))).unwrap();
            let packet = Packet::from_json(&text).unwrap();
            let expected = filter_with(packet.image.as_ref().unwrap(), packet.filters.clone().unwrap());
            let out = pool.run(packet).unwrap();
            assert_eq!(out.name, Some(format!("frame-{i}")));
            assert_eq!(out.image.unwrap(), expected);

            // A preprocessed packet can be resent as-is.
            let again = pool.run(Packet::new(
                Packet::from_json(&text).unwrap().image.unwrap(),
                out.filters.unwrap(),
            ));
            assert_eq!(again.unwrap().image.unwrap(), expected);
        }
    }
}
