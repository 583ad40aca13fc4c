/// Core error types for the Kontur engine.
use std::path::PathBuf;

/// A specialized Result type for Kontur operations.
pub type KonturResult<T> = Result<T, KonturError>;

/// Top-level error type encompassing both the CPU and GPU paths.
#[derive(Debug, thiserror::Error)]
pub enum KonturError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("GPU device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("shader compile error for '{effect}': {message}")]
    ShaderCompile { effect: String, message: String },

    #[error("renderer used after dispose")]
    Disposed,

    #[error("asset error: {message} ({path:?})")]
    Asset { message: String, path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl KonturError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        KonturError::Config(message.into())
    }

    /// Create an asset error.
    pub fn asset(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        KonturError::Asset {
            message: message.into(),
            path: path.into(),
        }
    }

    /// Create a shader compile error for a named effect.
    pub fn shader_compile(effect: impl Into<String>, message: impl Into<String>) -> Self {
        KonturError::ShaderCompile {
            effect: effect.into(),
            message: message.into(),
        }
    }
}
