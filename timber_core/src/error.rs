//! Error types for the timber_core library.

use std::io;
use std::path::PathBuf;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for timber_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A file write stream is already open and must be closed first
    #[error("A write stream is already open for {0:?}, close it before creating a new one")]
    StreamAlreadyOpen(PathBuf),

    /// The log path exists but is a directory or special file
    #[error("Path is not a regular file: {0:?}")]
    NotAFile(PathBuf),

    /// Compression codec failure
    #[error("{codec} compression failed: {message}")]
    Compression {
        codec: &'static str,
        message: String,
    },

    /// Caller-supplied rotation failed
    #[error("Rotation error: {0}")]
    Rotate(String),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
