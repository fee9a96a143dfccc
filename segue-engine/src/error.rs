//! Error types for segue-engine
//!
//! Defines module-specific error types using thiserror for clear error
//! propagation. Background tasks (monitor, preload, end-of-media listeners)
//! swallow errors at the boundary after logging them; only synchronous
//! commands surface a `Result` to the caller.

use thiserror::Error;

/// Main error type for segue-engine
#[derive(Error, Debug)]
pub enum Error {
    /// Media resource could not be loaded (bad path, unsupported codec)
    #[error("Media load error: {0}")]
    MediaLoad(String),

    /// Underlying pipeline backend failure
    #[error("Pipeline error: {0}")]
    Pipeline(String),

    /// Operation invalid in the current engine state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type using segue-engine Error
pub type Result<T> = std::result::Result<T, Error>;
