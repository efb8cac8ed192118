//! Engine configuration

use resona_playback::PlaybackConfig;
use serde::{Deserialize, Serialize};

/// Configuration for the engine facade
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Equalizer priority requested first on activation (default: 1000,
    /// high enough to win over competing effect owners)
    pub preferred_eq_priority: i32,

    /// Priority used when the preferred activation is rejected (default: 0)
    pub fallback_eq_priority: i32,

    /// Capacity of the control-to-render command channel (default: 32)
    pub command_capacity: usize,

    /// Transport configuration
    pub playback: PlaybackConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            preferred_eq_priority: 1000,
            fallback_eq_priority: 0,
            command_capacity: 32,
            playback: PlaybackConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.preferred_eq_priority, 1000);
        assert_eq!(config.fallback_eq_priority, 0);
        assert_eq!(config.command_capacity, 32);
        assert_eq!(config.playback.band_count, 5);
    }
}
