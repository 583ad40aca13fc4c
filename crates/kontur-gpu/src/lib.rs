//! # kontur-gpu
//!
//! GPU preview renderer. Compiles a fixed set of fragment effects and
//! draws a loaded texture through them on a full-screen quad, offscreen.
//! Context creation fails cleanly on machines without a usable adapter
//! so callers can fall back to the CPU pipeline in `kontur-canny`.

pub mod context;
pub mod effect;
pub mod renderer;

pub use context::GpuContext;
pub use effect::EffectKind;
pub use renderer::ShaderRenderer;
