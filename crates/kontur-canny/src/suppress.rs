use kontur_core::GradientField;
use rayon::prelude::*;

/// Quantize a gradient direction (degrees) into one of the four 45-degree
/// orientation bins: 0, 45, 90 or 135. The angle is folded onto [0, 180)
/// first, so opposite directions share a bin and the wraparound at
/// +-180 / +-157.5 lands in the 0 bin.
fn orientation_bin(angle_deg: f32) -> u32 {
    let mut a = angle_deg % 180.0;
    if a < 0.0 {
        a += 180.0;
    }
    if !(22.5..157.5).contains(&a) {
        0
    } else if a < 67.5 {
        45
    } else if a < 112.5 {
        90
    } else {
        135
    }
}

/// Offset to one of the two neighbors along the gradient axis for a bin;
/// the other neighbor is the negation. Image coordinates are y-down.
fn axis_offset(bin: u32) -> (i64, i64) {
    match bin {
        0 => (1, 0),
        45 => (1, 1),
        90 => (0, 1),
        _ => (-1, 1),
    }
}

/// Stage 4: non-maximum suppression.
///
/// Every interior pixel keeps its magnitude only if it is >= both neighbors
/// along the gradient axis for its orientation bin; otherwise the magnitude
/// is zeroed. Comparisons read the stage-3 field, never partially
/// suppressed values. Border pixels are excluded from iteration and pass
/// through at their stage-3 value (zero when stage 3 produced the field).
pub fn non_maximum(field: &GradientField) -> GradientField {
    let width = field.width as usize;
    let height = field.height as usize;
    let mut out = field.clone();
    if width < 3 || height < 3 {
        return out;
    }

    out.magnitude
        .par_chunks_mut(width)
        .enumerate()
        .skip(1)
        .take(height - 2)
        .for_each(|(y, mag_row)| {
            for x in 1..width - 1 {
                let idx = y * width + x;
                let m = field.magnitude[idx];
                let bin = orientation_bin(field.direction[idx].to_degrees());
                let (dx, dy) = axis_offset(bin);
                let ahead = (y as i64 + dy) as usize * width + (x as i64 + dx) as usize;
                let behind = (y as i64 - dy) as usize * width + (x as i64 - dx) as usize;
                if m < field.magnitude[ahead] || m < field.magnitude[behind] {
                    mag_row[x] = 0.0;
                }
            }
        });
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_5x5() -> GradientField {
        GradientField::new(5, 5)
    }

    #[test]
    fn test_orientation_bins() {
        assert_eq!(orientation_bin(0.0), 0);
        assert_eq!(orientation_bin(10.0), 0);
        assert_eq!(orientation_bin(-10.0), 0);
        assert_eq!(orientation_bin(170.0), 0);
        assert_eq!(orientation_bin(-170.0), 0);
        assert_eq!(orientation_bin(180.0), 0);
        assert_eq!(orientation_bin(44.0), 45);
        assert_eq!(orientation_bin(22.5), 45);
        assert_eq!(orientation_bin(-157.5), 45);
        assert_eq!(orientation_bin(90.0), 90);
        assert_eq!(orientation_bin(-80.0), 90);
        assert_eq!(orientation_bin(135.0), 135);
        assert_eq!(orientation_bin(-45.0), 135);
    }

    #[test]
    fn test_isolated_peak_survives() {
        let mut field = field_5x5();
        let idx = field.index(2, 2);
        field.magnitude[idx] = 10.0;
        let out = non_maximum(&field);
        assert_eq!(out.magnitude_at(2, 2), Some(10.0));
    }

    #[test]
    fn test_weaker_flanks_are_zeroed() {
        // Horizontal gradient (bin 0): flanks lose to the center peak.
        let mut field = field_5x5();
        for (x, m) in [(1u32, 5.0f32), (2, 10.0), (3, 6.0)] {
            let idx = field.index(x, 2);
            field.magnitude[idx] = m;
        }
        let out = non_maximum(&field);
        assert_eq!(out.magnitude_at(1, 2), Some(0.0));
        assert_eq!(out.magnitude_at(2, 2), Some(10.0));
        assert_eq!(out.magnitude_at(3, 2), Some(0.0));
    }

    #[test]
    fn test_plateau_survives() {
        // Equal neighbors along the axis: >= keeps the whole plateau.
        let mut field = field_5x5();
        for x in 1..4 {
            let idx = field.index(x, 2);
            field.magnitude[idx] = 10.0;
        }
        let out = non_maximum(&field);
        for x in 1..4 {
            assert_eq!(out.magnitude_at(x, 2), Some(10.0));
        }
    }

    #[test]
    fn test_vertical_axis_comparison() {
        // Direction pi/2 selects the up/down neighbors.
        let mut field = field_5x5();
        for (y, m) in [(1u32, 4.0f32), (2, 9.0), (3, 5.0)] {
            let idx = field.index(2, y);
            field.magnitude[idx] = m;
            field.direction[idx] = std::f32::consts::FRAC_PI_2;
        }
        let out = non_maximum(&field);
        assert_eq!(out.magnitude_at(2, 1), Some(0.0));
        assert_eq!(out.magnitude_at(2, 2), Some(9.0));
        assert_eq!(out.magnitude_at(2, 3), Some(0.0));
    }

    #[test]
    fn test_diagonal_axis_comparison() {
        // Direction pi/4 (bin 45) compares the down-right/up-left pair.
        let mut field = field_5x5();
        let center = field.index(2, 2);
        field.magnitude[center] = 10.0;
        field.direction[center] = std::f32::consts::FRAC_PI_4;
        let down_right = field.index(3, 3);
        field.magnitude[down_right] = 12.0;
        let out = non_maximum(&field);
        assert_eq!(out.magnitude_at(2, 2), Some(0.0));
    }

    #[test]
    fn test_border_passes_through() {
        let mut field = field_5x5();
        let idx = field.index(0, 3);
        field.magnitude[idx] = 7.0;
        let out = non_maximum(&field);
        assert_eq!(out.magnitude_at(0, 3), Some(7.0));
    }
}
