use crate::frame::PixelBuffer;

/// Gradient magnitude and direction for every pixel of an image.
///
/// Two parallel width*height arrays. Magnitude is scaled so the theoretical
/// Sobel maximum on 8-bit input maps to 255.0; direction is in radians in
/// (-pi, pi]. Both are defined only for interior pixels: the 1-pixel border
/// stays at zero because the 3x3 operator needs neighbors on all sides.
#[derive(Debug, Clone)]
pub struct GradientField {
    /// Gradient strength per pixel, >= 0.
    pub magnitude: Vec<f32>,
    /// Gradient orientation per pixel, radians in (-pi, pi].
    pub direction: Vec<f32>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl GradientField {
    /// Create a zero field (no gradient anywhere).
    pub fn new(width: u32, height: u32) -> Self {
        let size = (width as usize) * (height as usize);
        Self {
            magnitude: vec![0.0; size],
            direction: vec![0.0; size],
            width,
            height,
        }
    }

    /// Linear index of a pixel coordinate.
    pub fn index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }

    /// Magnitude at a coordinate. Returns None if out of bounds.
    pub fn magnitude_at(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.magnitude[self.index(x, y)])
    }

    /// Largest magnitude in the field, 0.0 for an empty or flat field.
    pub fn max_magnitude(&self) -> f32 {
        self.magnitude.iter().fold(0.0f32, |acc, &m| acc.max(m))
    }
}

/// Per-pixel edge classification produced by double thresholding.
///
/// Labels are restricted to [`EdgeMap::NONE`], [`EdgeMap::WEAK`] and
/// [`EdgeMap::STRONG`] at all times; after hysteresis resolution only
/// `NONE` and `STRONG` remain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeMap {
    /// One label per pixel, length = width * height.
    pub labels: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl EdgeMap {
    /// Label for a pixel that is not part of any edge.
    pub const NONE: u8 = 0;
    /// Label for a candidate pixel awaiting hysteresis resolution.
    pub const WEAK: u8 = 128;
    /// Label for a confirmed edge pixel.
    pub const STRONG: u8 = 255;

    /// Create an edge map with every pixel labeled `NONE`.
    pub fn new(width: u32, height: u32) -> Self {
        let size = (width as usize) * (height as usize);
        Self {
            labels: vec![Self::NONE; size],
            width,
            height,
        }
    }

    /// Linear index of a pixel coordinate.
    pub fn index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }

    /// Label at a coordinate. Returns None if out of bounds.
    pub fn label_at(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.labels[self.index(x, y)])
    }

    /// Number of pixels labeled `STRONG`.
    pub fn strong_count(&self) -> usize {
        self.labels.iter().filter(|&&l| l == Self::STRONG).count()
    }

    /// Render the map as a white-on-black RGBA frame.
    ///
    /// Each pixel's R, G and B channels are set to its label value and
    /// alpha is fixed at 255.
    pub fn to_frame(&self) -> PixelBuffer {
        let mut out = PixelBuffer::new(self.width, self.height);
        for (px, &label) in out.data.chunks_exact_mut(4).zip(self.labels.iter()) {
            px[0] = label;
            px[1] = label;
            px[2] = label;
            px[3] = 255;
        }
        out
    }
}
