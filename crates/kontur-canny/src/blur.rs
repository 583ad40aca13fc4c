use kontur_core::PixelBuffer;
use rayon::prelude::*;

/// Stage 1: noise reduction via a box mean.
///
/// Averages the (2r+1)x(2r+1) neighborhood of every pixel per channel.
/// Out-of-range coordinates are clamped to the nearest edge pixel, not
/// wrapped or zero-padded. The box mean is a simplification of a true
/// Gaussian blur: it suppresses noise without a weighted kernel. Radius 0
/// returns an unchanged copy.
pub fn box_blur(input: &PixelBuffer, radius: u32) -> PixelBuffer {
    if radius == 0 || input.width == 0 || input.height == 0 {
        return input.clone();
    }

    let width = input.width as i64;
    let height = input.height as i64;
    // Beyond the largest dimension the window already covers the whole
    // frame, so a bigger radius only inflates the loop.
    let r = i64::from(radius).min(width.max(height));
    let side = (2 * r + 1) as u64;
    let window = side * side;
    let stride = (input.width as usize) * 4;

    let mut out = PixelBuffer::new(input.width, input.height);
    out.data
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as i64;
            for x in 0..width {
                let mut sum = [0u64; 4];
                for dy in -r..=r {
                    let sy = (y + dy).clamp(0, height - 1) as usize;
                    let row_base = sy * (width as usize) * 4;
                    for dx in -r..=r {
                        let sx = (x + dx).clamp(0, width - 1) as usize;
                        let offset = row_base + sx * 4;
                        sum[0] += u64::from(input.data[offset]);
                        sum[1] += u64::from(input.data[offset + 1]);
                        sum[2] += u64::from(input.data[offset + 2]);
                        sum[3] += u64::from(input.data[offset + 3]);
                    }
                }
                let offset = (x as usize) * 4;
                row[offset] = (sum[0] / window) as u8;
                row[offset + 1] = (sum[1] / window) as u8;
                row[offset + 2] = (sum[2] / window) as u8;
                row[offset + 3] = (sum[3] / window) as u8;
            }
        });
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radius_zero_is_identity() {
        let mut input = PixelBuffer::new(4, 4);
        input.set_pixel(2, 1, [10, 20, 30, 255]);
        let out = box_blur(&input, 0);
        assert_eq!(out, input);
    }

    #[test]
    fn test_uniform_input_stays_uniform() {
        let input = PixelBuffer::solid(8, 8, [90, 120, 200, 255]);
        let out = box_blur(&input, 2);
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(out.get_pixel(x, y), Some([90, 120, 200, 255]));
            }
        }
    }

    #[test]
    fn test_interior_mean() {
        // A single bright pixel spreads into a (2r+1)^2 window mean.
        let mut input = PixelBuffer::new(5, 5);
        for px in input.data.chunks_exact_mut(4) {
            px[3] = 255;
        }
        input.set_pixel(2, 2, [90, 90, 90, 255]);
        let out = box_blur(&input, 1);
        // Center window holds one 90 and eight 0s: mean = 10.
        assert_eq!(out.get_pixel(2, 2), Some([10, 10, 10, 255]));
        // A window not touching the bright pixel stays black.
        assert_eq!(out.get_pixel(0, 0).map(|p| p[0]), Some(0));
    }

    #[test]
    fn test_corner_clamps_to_edge() {
        // Left half 0, right half 240, width 4: the (0,0) corner window
        // clamps entirely onto the dark half and stays 0.
        let mut input = PixelBuffer::new(4, 4);
        for y in 0..4 {
            for x in 0..4 {
                let v = if x >= 2 { 240 } else { 0 };
                input.set_pixel(x, y, [v, v, v, 255]);
            }
        }
        let out = box_blur(&input, 1);
        assert_eq!(out.get_pixel(0, 0).map(|p| p[0]), Some(0));
        // The (1,y) window spans columns 0..=2: one bright column of three.
        assert_eq!(out.get_pixel(1, 1).map(|p| p[0]), Some(80));
        // The right edge clamps onto the bright half and stays 240.
        assert_eq!(out.get_pixel(3, 1).map(|p| p[0]), Some(240));
    }

    #[test]
    fn test_dimensions_preserved() {
        let input = PixelBuffer::new(13, 7);
        let out = box_blur(&input, 3);
        assert_eq!((out.width, out.height), (13, 7));
        assert_eq!(out.byte_size(), input.byte_size());
    }
}
