//! # kontur-core
//!
//! Core types and primitives for the Kontur edge-detection engine.
//! This crate contains the data model shared by the CPU pipeline and the
//! GPU renderer: pixel buffers, gradient fields, edge maps, pipeline
//! configuration, and error types.

pub mod config;
pub mod error;
pub mod field;
pub mod frame;

pub use config::{CannyConfig, HysteresisMode};
pub use error::{KonturError, KonturResult};
pub use field::{EdgeMap, GradientField};
pub use frame::{GrayBuffer, PixelBuffer};
