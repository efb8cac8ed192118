//! Error types for playback transport

use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// No audio session is currently loaded
    #[error("no audio session loaded")]
    NoSessionLoaded,

    /// The audio source could not be opened or decoded
    #[error("audio source error: {0}")]
    Source(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
