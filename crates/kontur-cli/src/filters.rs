//! CPU filter fallbacks, used when no GPU adapter is available or the
//! user asks for them with `--cpu`. These match the shader effects in
//! intent, not bit-for-bit: the GPU edge effect clamps its magnitude
//! while the CPU preview normalizes against the observed maximum.

use kontur_canny::{luma, sobel_preview};
use kontur_core::PixelBuffer;
use kontur_gpu::EffectKind;

pub fn apply_cpu(frame: &PixelBuffer, effect: EffectKind) -> PixelBuffer {
    match effect {
        EffectKind::Original => frame.clone(),
        EffectKind::Grayscale => luma::to_gray(frame).to_frame(),
        EffectKind::Edge => sobel_preview(frame),
        EffectKind::Invert => invert(frame),
    }
}

fn invert(frame: &PixelBuffer) -> PixelBuffer {
    let mut out = frame.clone();
    for px in out.data.chunks_exact_mut(4) {
        px[0] = 255 - px[0];
        px[1] = 255 - px[1];
        px[2] = 255 - px[2];
    }
    out
}
