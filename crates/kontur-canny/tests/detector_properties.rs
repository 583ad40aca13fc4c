use kontur_canny::{detect, sobel_preview, CannyPipeline};
use kontur_core::{CannyConfig, HysteresisMode, PixelBuffer};

/// Left half black, right half white, hard vertical transition at width/2.
fn step_edge_buffer(width: u32, height: u32) -> PixelBuffer {
    let mut buf = PixelBuffer::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let v = if x >= width / 2 { 255 } else { 0 };
            buf.set_pixel(x, y, [v, v, v, 255]);
        }
    }
    buf
}

/// Deterministic curved ramps with wraparound cliffs; edge content at
/// several scales without any randomness.
fn textured_buffer(width: u32, height: u32) -> PixelBuffer {
    let mut buf = PixelBuffer::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let v = ((x * x + y * y) % 256) as u8;
            buf.set_pixel(x, y, [v, v, v, 255]);
        }
    }
    buf
}

fn edge_pixel_count(buf: &PixelBuffer) -> usize {
    buf.data.chunks_exact(4).filter(|px| px[0] == 255).count()
}

#[test]
fn test_property_01_output_dimensions_equal_input() {
    for (w, h) in [(33, 21), (8, 8), (64, 3)] {
        let out = detect(&textured_buffer(w, h), 20, 60).unwrap();
        assert_eq!((out.width, out.height), (w, h));
        assert_eq!(out.byte_size(), (w * h * 4) as usize);
    }
}

#[test]
fn test_property_02_output_is_opaque_grayscale() {
    for input in [textured_buffer(32, 24), step_edge_buffer(16, 16)] {
        let out = detect(&input, 20, 60).unwrap();
        for px in out.data.chunks_exact(4) {
            assert_eq!(px[0], px[1]);
            assert_eq!(px[1], px[2]);
            assert_eq!(px[3], 255);
        }
    }
}

#[test]
fn test_property_03_max_thresholds_yield_empty_map() {
    // No scaled magnitude reaches 255 on smoothed 8-bit input, so
    // low = high = 255 must label nothing at all.
    for input in [textured_buffer(48, 48), step_edge_buffer(32, 32)] {
        let out = detect(&input, 255, 255).unwrap();
        assert_eq!(edge_pixel_count(&out), 0);
        for px in out.data.chunks_exact(4) {
            assert_eq!(px[0], 0);
        }
    }
}

#[test]
fn test_property_04_threshold_monotonicity() {
    let input = textured_buffer(48, 48);
    let pairs = [(10u8, 30u8), (30, 80), (80, 160), (160, 255)];
    let mut previous = usize::MAX;
    for (low, high) in pairs {
        let count = edge_pixel_count(&detect(&input, low, high).unwrap());
        assert!(
            count <= previous,
            "raising thresholds to ({low}, {high}) grew the edge count: {count} > {previous}"
        );
        previous = count;
    }
}

#[test]
fn test_property_05_uniform_input_yields_empty_map() {
    let input = PixelBuffer::solid(24, 24, [180, 90, 45, 255]);
    for (low, high) in [(1u8, 1u8), (50, 100)] {
        let out = detect(&input, low, high).unwrap();
        assert_eq!(edge_pixel_count(&out), 0);
    }
}

#[test]
fn test_property_06_step_edge_is_concentrated_at_transition() {
    // Blur radius 2 spreads the transition over a short ramp; suppression
    // keeps the plateau columns around x = 8 and nothing else.
    let input = step_edge_buffer(16, 8);
    let out = detect(&input, 10, 30).unwrap();
    assert!(edge_pixel_count(&out) > 0);
    for y in 0..8 {
        for x in 0..16 {
            let px = out.get_pixel(x, y).unwrap();
            if px[0] == 255 {
                assert!(
                    (6..=9).contains(&x),
                    "edge pixel at ({x}, {y}) outside the transition band"
                );
            }
        }
    }
}

#[test]
fn test_property_06b_unblurred_step_edge_is_two_columns() {
    let input = step_edge_buffer(16, 8);
    let pipeline = CannyPipeline::new(CannyConfig {
        low_threshold: 10,
        high_threshold: 30,
        blur_radius: 0,
        hysteresis: HysteresisMode::SinglePass,
    })
    .unwrap();
    let out = pipeline.run(&input).unwrap();
    for y in 1..7 {
        for x in 0..16 {
            let expected = if x == 7 || x == 8 { 255 } else { 0 };
            assert_eq!(out.get_pixel(x, y).unwrap()[0], expected, "at ({x}, {y})");
        }
    }
}

#[test]
fn test_property_07_sobel_preview_peaks_at_255() {
    let out = sobel_preview(&textured_buffer(32, 32));
    let max = out.data.chunks_exact(4).map(|px| px[0]).max().unwrap();
    assert_eq!(max, 255);
    for px in out.data.chunks_exact(4) {
        assert_eq!(px[0], px[1]);
        assert_eq!(px[1], px[2]);
        assert_eq!(px[3], 255);
    }
}

#[test]
fn test_property_08_flood_fill_never_finds_fewer_edges() {
    let input = textured_buffer(48, 48);
    let base = CannyConfig {
        low_threshold: 15,
        high_threshold: 70,
        ..Default::default()
    };
    let single = CannyPipeline::new(base).unwrap().run(&input).unwrap();
    let flood = CannyPipeline::new(CannyConfig {
        hysteresis: HysteresisMode::FloodFill,
        ..base
    })
    .unwrap()
    .run(&input)
    .unwrap();
    assert!(edge_pixel_count(&flood) >= edge_pixel_count(&single));
}
