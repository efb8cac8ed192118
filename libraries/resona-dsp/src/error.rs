//! Error types for the equalizer DSP

use thiserror::Error;

/// Equalizer errors
#[derive(Debug, Error)]
pub enum EqError {
    /// The requested activation priority was rejected
    #[error("equalizer activation rejected: priority {0} is not valid")]
    PriorityRejected(i32),
}

/// Result type for equalizer operations
pub type Result<T> = std::result::Result<T, EqError>;
