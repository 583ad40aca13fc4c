use std::collections::VecDeque;

use kontur_core::{EdgeMap, GradientField, HysteresisMode};

/// Stage 5a: double threshold classification.
///
/// STRONG for magnitude >= high, WEAK for low <= magnitude < high, NONE
/// below low. Equal thresholds leave the weak band empty.
pub fn classify(field: &GradientField, low: u8, high: u8) -> EdgeMap {
    let low = f32::from(low);
    let high = f32::from(high);
    let mut map = EdgeMap::new(field.width, field.height);
    for (label, &m) in map.labels.iter_mut().zip(field.magnitude.iter()) {
        *label = if m >= high {
            EdgeMap::STRONG
        } else if m >= low {
            EdgeMap::WEAK
        } else {
            EdgeMap::NONE
        };
    }
    map
}

/// Stage 5b: hysteresis resolution of weak candidates.
///
/// Afterwards the map contains only NONE and STRONG labels.
pub fn resolve(map: &EdgeMap, mode: HysteresisMode) -> EdgeMap {
    match mode {
        HysteresisMode::SinglePass => resolve_single_pass(map),
        HysteresisMode::FloodFill => resolve_flood_fill(map),
    }
}

/// One raster scan over an evolving copy of the map. A weak pixel is
/// promoted only if one of its 8-neighbors is strong at the moment the scan
/// reaches it, and demoted to NONE otherwise. Promotions made earlier in
/// the same scan count, so weak runs extending right or down of a strong
/// pixel cascade, while runs extending left or up do not. Deliberately not
/// a transitive closure; see [`resolve_flood_fill`] for that.
fn resolve_single_pass(map: &EdgeMap) -> EdgeMap {
    let mut out = map.clone();
    let width = out.width as usize;
    let height = out.height as usize;
    for y in 0..height {
        for x in 0..width {
            let idx = y * width + x;
            if out.labels[idx] != EdgeMap::WEAK {
                continue;
            }
            out.labels[idx] = if has_strong_neighbor(&out, x, y) {
                EdgeMap::STRONG
            } else {
                EdgeMap::NONE
            };
        }
    }
    out
}

/// Textbook Canny edge tracking: a worklist seeded with every strong pixel
/// promotes 8-connected weak pixels transitively, then every unreached weak
/// pixel is demoted to NONE.
fn resolve_flood_fill(map: &EdgeMap) -> EdgeMap {
    let mut out = map.clone();
    let width = out.width as usize;
    let height = out.height as usize;

    let mut frontier: VecDeque<(usize, usize)> = VecDeque::new();
    for y in 0..height {
        for x in 0..width {
            if out.labels[y * width + x] == EdgeMap::STRONG {
                frontier.push_back((x, y));
            }
        }
    }

    while let Some((x, y)) = frontier.pop_front() {
        for (nx, ny) in neighbors_8(x, y, width, height) {
            let idx = ny * width + nx;
            if out.labels[idx] == EdgeMap::WEAK {
                out.labels[idx] = EdgeMap::STRONG;
                frontier.push_back((nx, ny));
            }
        }
    }

    for label in out.labels.iter_mut() {
        if *label == EdgeMap::WEAK {
            *label = EdgeMap::NONE;
        }
    }
    out
}

fn has_strong_neighbor(map: &EdgeMap, x: usize, y: usize) -> bool {
    let width = map.width as usize;
    let height = map.height as usize;
    neighbors_8(x, y, width, height)
        .any(|(nx, ny)| map.labels[ny * width + nx] == EdgeMap::STRONG)
}

/// In-bounds 8-connected neighbors of a pixel.
fn neighbors_8(
    x: usize,
    y: usize,
    width: usize,
    height: usize,
) -> impl Iterator<Item = (usize, usize)> {
    const OFFSETS: [(i64, i64); 8] = [
        (-1, -1),
        (0, -1),
        (1, -1),
        (-1, 0),
        (1, 0),
        (-1, 1),
        (0, 1),
        (1, 1),
    ];
    OFFSETS.into_iter().filter_map(move |(dx, dy)| {
        let nx = x as i64 + dx;
        let ny = y as i64 + dy;
        if nx >= 0 && ny >= 0 && nx < width as i64 && ny < height as i64 {
            Some((nx as usize, ny as usize))
        } else {
            None
        }
    })
}
