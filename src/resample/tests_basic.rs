//! Basic resampling tests: filter and table invariants, rounding, identity
//! and constant-image behavior, argument validation.

use super::*;
use crate::raster::Raster;

/// Wang hash for deterministic pseudo-random test images
fn wang_hash(mut x: u32) -> u32 {
    x = (x ^ 61) ^ (x >> 16);
    x = x.wrapping_mul(9);
    x = x ^ (x >> 4);
    x = x.wrapping_mul(0x27d4eb2d);
    x = x ^ (x >> 15);
    x
}

fn random_raster(width: usize, height: usize, channels: usize, seed: u32) -> Raster {
    let data = (0..width * height * channels)
        .map(|i| (wang_hash(seed.wrapping_add(i as u32)) & 0xff) as u8)
        .collect();
    Raster::from_vec(width, height, channels, data).expect("valid raster")
}

fn constant_raster(width: usize, height: usize, pixel: &[u8]) -> Raster {
    let mut data = Vec::with_capacity(width * height * pixel.len());
    for _ in 0..width * height {
        data.extend_from_slice(pixel);
    }
    Raster::from_vec(width, height, pixel.len(), data).expect("valid raster")
}

#[test]
fn test_lanczos3_kernel() {
    assert_eq!(filter::lanczos3(0.0), 1.0);
    assert_eq!(filter::lanczos3(3.0), 0.0);
    assert_eq!(filter::lanczos3(-3.0), 0.0);
    assert_eq!(filter::lanczos3(4.7), 0.0);
    for i in 1..30 {
        let x = i as f32 * 0.1;
        assert!((filter::lanczos3(x) - filter::lanczos3(-x)).abs() < 1e-6);
    }
    // first negative lobe
    assert!(filter::lanczos3(1.5) < 0.0);
}

#[test]
fn test_filters_vanish_outside_radius() {
    let filters: Vec<Box<dyn ResampleFilter>> = vec![
        Box::new(BoxFilter),
        Box::new(Triangle),
        Box::new(Hermite),
        Box::new(Bell),
        Box::new(BSpline),
        Box::new(Mitchell),
        Box::new(CatmullRom),
        Box::new(Lanczos2),
        Box::new(Lanczos3),
    ];
    for filter in &filters {
        let radius = filter.sampling_radius();
        assert!(radius > 0.0);
        assert_eq!(filter.apply(radius + 0.001), 0.0);
        assert_eq!(filter.apply(-radius - 0.001), 0.0);
        // symmetric where it matters
        for i in 0..20 {
            let x = radius * i as f32 / 20.0;
            assert!((filter.apply(x) - filter.apply(-x)).abs() < 1e-6);
        }
    }
}

#[test]
fn test_to_byte_saturating_rounding() {
    assert_eq!(to_byte(-5.0), 0);
    assert_eq!(to_byte(-0.001), 0);
    assert_eq!(to_byte(0.0), 0);
    assert_eq!(to_byte(0.49), 0);
    assert_eq!(to_byte(0.5), 1);
    assert_eq!(to_byte(127.4), 127);
    assert_eq!(to_byte(127.5), 128);
    assert_eq!(to_byte(254.6), 255);
    assert_eq!(to_byte(255.0), 255);
    assert_eq!(to_byte(300.0), 255);
}

#[test]
fn test_weight_rows_sum_to_one() {
    let cases = [(100, 50), (50, 100), (400, 300), (7, 13), (13, 7), (16, 16)];
    let filters: Vec<Box<dyn ResampleFilter>> =
        vec![Box::new(Lanczos3), Box::new(Mitchell), Box::new(Triangle)];
    for filter in &filters {
        for &(src, dst) in &cases {
            let table = WeightTable::build(filter.as_ref(), src, dst).expect("valid table");
            assert_eq!(table.len(), dst);
            for p in 0..dst {
                let (picks, weights) = table.row(p);
                assert!(picks.len() <= table.num_contributors());
                let sum: f32 = weights.iter().sum();
                assert!(
                    (sum - 1.0).abs() < 1e-5,
                    "row {p} of {src}->{dst} sums to {sum}"
                );
            }
        }
    }
}

#[test]
fn test_weight_indices_stay_in_range() {
    let cases = [(4, 16), (5, 3), (3, 9), (400, 125), (64, 512)];
    for &(src, dst) in &cases {
        let table = WeightTable::build(&Lanczos3, src, dst).expect("valid table");
        for p in 0..dst {
            let (picks, _) = table.row(p);
            for &pick in picks {
                assert!(pick < src, "pick {pick} out of range for src {src}");
            }
        }
    }
}

#[test]
fn test_identity_table_is_single_tap() {
    let table = WeightTable::build(&Lanczos3, 16, 16).expect("valid table");
    for p in 0..16 {
        let (picks, weights) = table.row(p);
        let sum: f32 = weights.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);

        let mut dominant = 0;
        for (k, &w) in weights.iter().enumerate() {
            if w > weights[dominant] {
                dominant = k;
            }
        }
        assert_eq!(picks[dominant], p);
        assert!(weights[dominant] > 0.999);
    }
}

#[test]
fn test_zero_sized_axis_rejected() {
    assert!(matches!(
        WeightTable::build(&Lanczos3, 0, 10),
        Err(ResampleError::InvalidArgument(_))
    ));
    assert!(matches!(
        WeightTable::build(&Lanczos3, 10, 0),
        Err(ResampleError::InvalidArgument(_))
    ));
}

#[test]
fn test_target_below_3x3_rejected() {
    let src = constant_raster(100, 100, &[7, 7, 7]);
    let resampler = Resampler::default();
    assert!(matches!(
        resampler.resample(&src, 2, 2),
        Err(ResampleError::InvalidArgument(_))
    ));
    assert!(matches!(
        resampler.resample(&src, 2, 50),
        Err(ResampleError::InvalidArgument(_))
    ));
    assert!(resampler.resample(&src, 3, 3).is_ok());
}

#[test]
fn test_identity_preserves_pixels() {
    let src = random_raster(16, 16, 3, 0xbeef);
    let out = Resampler::default()
        .resample(&src, 16, 16)
        .expect("resample");
    for (a, b) in src.data().iter().zip(out.data()) {
        assert!(
            (*a as i32 - *b as i32).abs() <= 1,
            "identity drifted: {a} -> {b}"
        );
    }
}

#[test]
fn test_upscale_constant_color() {
    let src = constant_raster(8, 8, &[128, 64, 32]);
    let out = Resampler::default()
        .resample(&src, 16, 16)
        .expect("resample");
    assert_eq!(out.width(), 16);
    assert_eq!(out.height(), 16);
    for px in out.data().chunks_exact(3) {
        assert!((px[0] as i32 - 128).abs() <= 1);
        assert!((px[1] as i32 - 64).abs() <= 1);
        assert!((px[2] as i32 - 32).abs() <= 1);
    }
}

#[test]
fn test_constant_alpha_filtered_like_color() {
    // Alpha is filtered linearly, exactly like the color channels.
    let src = constant_raster(10, 10, &[40, 10, 20, 30]);
    let out = Resampler::default().resample(&src, 25, 5).expect("resample");
    for px in out.data().chunks_exact(4) {
        assert!((px[0] as i32 - 40).abs() <= 1);
        assert!((px[1] as i32 - 10).abs() <= 1);
        assert!((px[2] as i32 - 20).abs() <= 1);
        assert!((px[3] as i32 - 30).abs() <= 1);
    }
}

#[test]
fn test_grayscale_ramp() {
    // Horizontal gradient, upscaled in X and downscaled in Y, stays monotone
    // along X and flat along Y.
    let mut data = Vec::with_capacity(64 * 64);
    for _y in 0..64 {
        for x in 0..64usize {
            data.push((x * 255 / 63) as u8);
        }
    }
    let src = Raster::from_vec(64, 64, 1, data).expect("valid raster");
    let out = Resampler::default()
        .resample(&src, 128, 32)
        .expect("resample");

    for y in 0..32 {
        let row = out.row(y);
        for x in 1..128 {
            assert!(
                row[x] as i32 >= row[x - 1] as i32 - 1,
                "row {y} not monotone at {x}: {} then {}",
                row[x - 1],
                row[x]
            );
        }
    }
    let first = out.row(0).to_vec();
    for y in 1..32 {
        for (x, &v) in out.row(y).iter().enumerate() {
            assert!((v as i32 - first[x] as i32).abs() <= 1, "column {x} varies");
        }
    }
}

#[test]
fn test_scaled_overload_dimensions() {
    let src = constant_raster(100, 50, &[9]);
    let resampler = Resampler::default();

    let half = resampler.resample_scaled(&src, 0.5).expect("resample");
    assert_eq!((half.width(), half.height()), (50, 25));

    let up = resampler.resample_scaled(&src, 1.5).expect("resample");
    assert_eq!((up.width(), up.height()), (150, 75));

    let stretched = resampler.resample_scaled_xy(&src, 2.0, 1.0).expect("resample");
    assert_eq!((stretched.width(), stretched.height()), (200, 50));

    assert!(matches!(
        resampler.resample_scaled(&src, 0.0),
        Err(ResampleError::InvalidArgument(_))
    ));
    assert!(matches!(
        resampler.resample_scaled(&src, -1.0),
        Err(ResampleError::InvalidArgument(_))
    ));
}

#[test]
fn test_resample_into_supplied_destination() {
    let src = constant_raster(20, 20, &[50, 100, 150]);
    let resampler = Resampler::default();

    let mut dest = Raster::new(10, 10, 3).expect("valid raster");
    resampler.resample_into(&src, &mut dest).expect("resample");
    for px in dest.data().chunks_exact(3) {
        assert!((px[0] as i32 - 50).abs() <= 1);
        assert!((px[1] as i32 - 100).abs() <= 1);
        assert!((px[2] as i32 - 150).abs() <= 1);
    }

    let mut mismatched = Raster::new(10, 10, 1).expect("valid raster");
    assert!(matches!(
        resampler.resample_into(&src, &mut mismatched),
        Err(ResampleError::InvalidArgument(_))
    ));
}

#[test]
fn test_downscale_mirror_edges_hold_constant() {
    // A constant image must stay constant right up to the borders, where
    // taps reflect back into the raster.
    let src = constant_raster(64, 64, &[200]);
    let out = Resampler::default().resample(&src, 9, 9).expect("resample");
    for &v in out.data() {
        assert!((v as i32 - 200).abs() <= 1, "border drifted to {v}");
    }
}

#[test]
fn test_other_filters_resample_constant() {
    let src = constant_raster(17, 11, &[33, 66, 99]);
    let filters: Vec<Box<dyn ResampleFilter>> = vec![
        Box::new(Triangle),
        Box::new(Hermite),
        Box::new(Bell),
        Box::new(BSpline),
        Box::new(Mitchell),
        Box::new(CatmullRom),
        Box::new(Lanczos2),
        Box::new(BoxFilter),
    ];
    for filter in filters {
        let resampler = Resampler::default().with_filter_boxed(filter);
        let out = resampler.resample(&src, 23, 7).expect("resample");
        for px in out.data().chunks_exact(3) {
            assert!((px[0] as i32 - 33).abs() <= 1);
            assert!((px[1] as i32 - 66).abs() <= 1);
            assert!((px[2] as i32 - 99).abs() <= 1);
        }
    }
}
