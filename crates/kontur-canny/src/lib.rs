//! # kontur-canny
//!
//! The CPU-side Canny edge detector: five ordered numeric stages over dense
//! pixel arrays (box blur, grayscale, Sobel gradients, non-maximum
//! suppression, double threshold with hysteresis), plus a single-stage
//! Sobel preview. Every stage is a pure function; stages 1, 3 and 4 are
//! parallelized across rows without changing per-pixel results.

pub mod blur;
pub mod gradient;
pub mod luma;
pub mod pipeline;
pub mod suppress;
pub mod threshold;

pub use pipeline::{detect, sobel_preview, CannyPipeline};
