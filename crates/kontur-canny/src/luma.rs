use kontur_core::{GrayBuffer, PixelBuffer};

/// Stage 2: grayscale conversion with ITU-R BT.601 luma weights.
///
/// luminance = 0.299 R + 0.587 G + 0.114 B, per pixel, alpha discarded.
/// The result is clamped into 0-255 and truncated to 8 bits.
pub fn to_gray(input: &PixelBuffer) -> GrayBuffer {
    let mut gray = GrayBuffer::new(input.width, input.height);
    for (l, px) in gray.data.iter_mut().zip(input.data.chunks_exact(4)) {
        let luma =
            0.299 * f32::from(px[0]) + 0.587 * f32::from(px[1]) + 0.114 * f32::from(px[2]);
        *l = luma.min(255.0) as u8;
    }
    gray
}
