use std::time::Instant;

use kontur_core::{CannyConfig, KonturResult, PixelBuffer};

use crate::{blur, gradient, luma, suppress, threshold};

/// The five-stage Canny edge detector.
///
/// Pure and synchronous: [`run`](CannyPipeline::run) executes every stage on
/// the calling thread and returns only once the final buffer is produced.
/// Instances hold no mutable state, so concurrent `run` calls on different
/// buffers are safe and each call is independently reentrant.
#[derive(Debug, Clone, Default)]
pub struct CannyPipeline {
    config: CannyConfig,
}

impl CannyPipeline {
    /// Create a pipeline, validating the threshold ordering up front.
    pub fn new(config: CannyConfig) -> KonturResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Pipeline with default blur radius and hysteresis, custom thresholds.
    pub fn with_thresholds(low: u8, high: u8) -> KonturResult<Self> {
        Self::new(CannyConfig {
            low_threshold: low,
            high_threshold: high,
            ..Default::default()
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &CannyConfig {
        &self.config
    }

    /// Run all five stages over `input` and return the edge image.
    ///
    /// The output has the input's dimensions; every pixel is white on black
    /// (R = G = B) with alpha 255. A threshold ordering violation returns
    /// `KonturError::Config` before any stage executes: the input is never
    /// mutated and no partial output is produced. Validation runs here as
    /// well as in `new` because the configuration is plain data the caller
    /// may have rebuilt since construction.
    pub fn run(&self, input: &PixelBuffer) -> KonturResult<PixelBuffer> {
        self.config.validate()?;

        let mut stage = Instant::now();
        let blurred = blur::box_blur(input, self.config.blur_radius);
        tracing::debug!(
            "blur stage (radius {}): {:.1}ms",
            self.config.blur_radius,
            stage.elapsed().as_secs_f64() * 1000.0
        );

        stage = Instant::now();
        let gray = luma::to_gray(&blurred);
        tracing::debug!(
            "grayscale stage: {:.1}ms",
            stage.elapsed().as_secs_f64() * 1000.0
        );

        stage = Instant::now();
        let field = gradient::sobel(&gray);
        tracing::debug!(
            "sobel stage: {:.1}ms",
            stage.elapsed().as_secs_f64() * 1000.0
        );

        stage = Instant::now();
        let thinned = suppress::non_maximum(&field);
        tracing::debug!(
            "suppression stage: {:.1}ms",
            stage.elapsed().as_secs_f64() * 1000.0
        );

        stage = Instant::now();
        let classified = threshold::classify(
            &thinned,
            self.config.low_threshold,
            self.config.high_threshold,
        );
        let resolved = threshold::resolve(&classified, self.config.hysteresis);
        tracing::debug!(
            "threshold stage ({}): {:.1}ms",
            self.config.hysteresis,
            stage.elapsed().as_secs_f64() * 1000.0
        );

        Ok(resolved.to_frame())
    }
}

/// One-shot Canny detection with default blur and hysteresis settings.
pub fn detect(input: &PixelBuffer, low: u8, high: u8) -> KonturResult<PixelBuffer> {
    CannyPipeline::with_thresholds(low, high)?.run(input)
}

/// Single-stage Sobel preview.
///
/// Grayscale, then Sobel magnitude, then linear normalization against the
/// buffer's maximum observed magnitude, encoded white on black. No
/// suppression and no thresholds; a fast low-fidelity preview of where the
/// full pipeline will find edges. A flat input comes back all black.
pub fn sobel_preview(input: &PixelBuffer) -> PixelBuffer {
    let gray = luma::to_gray(input);
    let field = gradient::sobel(&gray);
    let max = field.max_magnitude();

    let mut out = PixelBuffer::new(input.width, input.height);
    if max <= 0.0 {
        for px in out.data.chunks_exact_mut(4) {
            px[3] = 255;
        }
        return out;
    }
    for (px, &m) in out.data.chunks_exact_mut(4).zip(field.magnitude.iter()) {
        let v = (m / max * 255.0) as u8;
        px[0] = v;
        px[1] = v;
        px[2] = v;
        px[3] = 255;
    }
    out
}
