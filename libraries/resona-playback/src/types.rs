//! Core types for playback transport

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Transport state of the playback controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportState {
    /// No session loaded
    Idle,

    /// Session loaded, not yet started
    Loaded,

    /// Currently rendering audio
    Playing,

    /// Paused mid-session (position retained)
    Paused,
}

/// The currently loaded audio session
///
/// Exactly one session exists at a time; loading a new source replaces it
/// and stopping discards it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Path the session was opened from
    pub source_path: PathBuf,

    /// Frames rendered since the session started
    pub position_frames: u64,
}

/// Configuration for the playback controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Number of equalizer bands the engine runs (default: 5)
    pub band_count: usize,

    /// Fade-in length applied on start/resume, in milliseconds (default: 30)
    pub fade_in_ms: u32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            band_count: resona_dsp::UI_BAND_COUNT,
            fade_in_ms: 30,
        }
    }
}
