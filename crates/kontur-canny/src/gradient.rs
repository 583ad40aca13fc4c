use kontur_core::{GradientField, GrayBuffer};
use rayon::prelude::*;

/// Folds the raw Sobel range onto 0-255: the operator's theoretical maximum
/// on 8-bit input is 4 * sqrt(2) * 255, which this maps to exactly 255.
/// Real images never reach it, so the threshold domain covers the whole
/// magnitude domain.
const MAGNITUDE_SCALE: f32 = 0.176_776_7; // 1 / (4 * sqrt(2))

/// Stage 3: gradient computation with the 3x3 Sobel operator.
///
/// For every interior pixel, applies Sobel-X [-1,0,1; -2,0,2; -1,0,1] and
/// Sobel-Y [-1,-2,-1; 0,0,0; 1,2,1] to the grayscale neighborhood.
/// Magnitude is sqrt(gx^2 + gy^2) scaled by [`MAGNITUDE_SCALE`]; direction
/// is atan2(gy, gx) in (-pi, pi]. The 1-pixel border keeps zero magnitude
/// and is never flagged as an edge.
pub fn sobel(gray: &GrayBuffer) -> GradientField {
    let width = gray.width as usize;
    let height = gray.height as usize;
    let mut field = GradientField::new(gray.width, gray.height);
    if width < 3 || height < 3 {
        return field;
    }

    let GradientField {
        magnitude,
        direction,
        ..
    } = &mut field;

    magnitude
        .par_chunks_mut(width)
        .zip(direction.par_chunks_mut(width))
        .enumerate()
        .skip(1)
        .take(height - 2)
        .for_each(|(y, (mag_row, dir_row))| {
            let above = (y - 1) * width;
            let mid = y * width;
            let below = (y + 1) * width;
            for x in 1..width - 1 {
                let tl = i32::from(gray.data[above + x - 1]);
                let tc = i32::from(gray.data[above + x]);
                let tr = i32::from(gray.data[above + x + 1]);
                let ml = i32::from(gray.data[mid + x - 1]);
                let mr = i32::from(gray.data[mid + x + 1]);
                let bl = i32::from(gray.data[below + x - 1]);
                let bc = i32::from(gray.data[below + x]);
                let br = i32::from(gray.data[below + x + 1]);

                let gx = ((tr + 2 * mr + br) - (tl + 2 * ml + bl)) as f32;
                let gy = ((bl + 2 * bc + br) - (tl + 2 * tc + tr)) as f32;

                mag_row[x] = (gx * gx + gy * gy).sqrt() * MAGNITUDE_SCALE;
                dir_row[x] = gy.atan2(gx);
            }
        });
    field
}
