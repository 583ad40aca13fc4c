use crate::error::{KonturError, KonturResult};

/// A raw interleaved RGBA image, 8 bits per channel, row-major.
///
/// Every pipeline stage consumes one buffer and produces a new one; the
/// input is never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    /// Raw pixel data, length = width * height * 4.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl PixelBuffer {
    /// Create a new pixel buffer filled with zeros (transparent black).
    pub fn new(width: u32, height: u32) -> Self {
        let size = (width as usize) * (height as usize) * 4;
        Self {
            data: vec![0u8; size],
            width,
            height,
        }
    }

    /// Create a pixel buffer filled with a solid RGBA color.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixel_count = (width as usize) * (height as usize);
        let mut data = Vec::with_capacity(pixel_count * 4);
        for _ in 0..pixel_count {
            data.extend_from_slice(&rgba);
        }
        Self {
            data,
            width,
            height,
        }
    }

    /// Wrap raw RGBA bytes, checking that the length matches the dimensions.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> KonturResult<Self> {
        let expected = (width as usize) * (height as usize) * 4;
        if data.len() != expected {
            return Err(KonturError::config(format!(
                "pixel data length {} does not match {}x{} RGBA ({} bytes)",
                data.len(),
                width,
                height,
                expected
            )));
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Total number of pixels.
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Total byte size of the pixel data.
    pub fn byte_size(&self) -> usize {
        self.data.len()
    }

    /// Get the RGBA value at a pixel coordinate. Returns None if out of bounds.
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        Some([
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
            self.data[offset + 3],
        ])
    }

    /// Set the RGBA value at a pixel coordinate. No-op if out of bounds.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let offset = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        self.data[offset..offset + 4].copy_from_slice(&rgba);
    }
}

/// A single-channel luminance image derived from a [`PixelBuffer`].
///
/// Read-only once produced; gradient stages sample it but never write it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayBuffer {
    /// Luminance samples, length = width * height.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl GrayBuffer {
    /// Create a new gray buffer filled with zeros (black).
    pub fn new(width: u32, height: u32) -> Self {
        let size = (width as usize) * (height as usize);
        Self {
            data: vec![0u8; size],
            width,
            height,
        }
    }

    /// Get the luminance at a pixel coordinate. Returns None if out of bounds.
    pub fn value(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.data[(y as usize) * (self.width as usize) + (x as usize)])
    }

    /// Expand back to an RGBA frame with R = G = B = luminance, alpha 255.
    pub fn to_frame(&self) -> PixelBuffer {
        let mut frame = PixelBuffer::new(self.width, self.height);
        for (px, &l) in frame.data.chunks_exact_mut(4).zip(self.data.iter()) {
            px.copy_from_slice(&[l, l, l, 255]);
        }
        frame
    }
}
