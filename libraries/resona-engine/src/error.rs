//! Engine errors

use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Engine errors
#[derive(Debug, Error)]
pub enum EngineError {
    /// No audio output device available
    #[error("audio output device not found")]
    DeviceNotFound,

    /// Failed to build the output stream
    #[error("failed to build output stream: {0}")]
    StreamBuild(String),

    /// Failed to start the output stream
    #[error("failed to start output stream: {0}")]
    StreamPlay(String),

    /// The audio source could not be opened or decoded
    #[error("audio source error: {0}")]
    Source(String),
}

impl From<cpal::BuildStreamError> for EngineError {
    fn from(err: cpal::BuildStreamError) -> Self {
        EngineError::StreamBuild(err.to_string())
    }
}

impl From<cpal::PlayStreamError> for EngineError {
    fn from(err: cpal::PlayStreamError) -> Self {
        EngineError::StreamPlay(err.to_string())
    }
}

impl From<cpal::DefaultStreamConfigError> for EngineError {
    fn from(err: cpal::DefaultStreamConfigError) -> Self {
        EngineError::StreamBuild(err.to_string())
    }
}

impl From<resona_playback::PlaybackError> for EngineError {
    fn from(err: resona_playback::PlaybackError) -> Self {
        EngineError::Source(err.to_string())
    }
}
