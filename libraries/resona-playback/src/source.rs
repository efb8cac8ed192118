//! Platform-agnostic audio source trait
//!
//! Abstracts decoded audio delivery so the controller can run against any
//! backend (a symphonia file source on desktop, a test tone in tests).

use crate::error::Result;
use std::time::Duration;

/// Provider of decoded audio samples
///
/// Samples are interleaved stereo f32 in the [-1.0, 1.0] range.
pub trait AudioSource: Send {
    /// Read the next chunk of samples into `buffer`.
    ///
    /// Returns the number of samples written; 0 means the source is
    /// exhausted. May return fewer samples than the buffer holds near the
    /// end of the source.
    fn read_samples(&mut self, buffer: &mut [f32]) -> Result<usize>;

    /// Total source duration
    fn duration(&self) -> Duration;

    /// Current read position from the start of the source
    fn position(&self) -> Duration;

    /// Whether the source has no more samples to deliver
    fn is_finished(&self) -> bool;
}

/// Silent source for exercising the transport in tests
#[cfg(test)]
pub struct SilenceSource {
    duration: Duration,
    position: Duration,
    sample_rate: u32,
}

#[cfg(test)]
impl SilenceSource {
    pub fn new(duration: Duration, sample_rate: u32) -> Self {
        Self {
            duration,
            position: Duration::ZERO,
            sample_rate,
        }
    }
}

#[cfg(test)]
impl AudioSource for SilenceSource {
    fn read_samples(&mut self, buffer: &mut [f32]) -> Result<usize> {
        let samples_per_second = u64::from(self.sample_rate) * 2;
        let total = (self.duration.as_secs_f64() * samples_per_second as f64) as u64;
        let current = (self.position.as_secs_f64() * samples_per_second as f64) as u64;

        let remaining = (total.saturating_sub(current)) as usize;
        let to_read = remaining.min(buffer.len());

        buffer[..to_read].fill(0.0);
        self.position += Duration::from_secs_f64(to_read as f64 / samples_per_second as f64);

        Ok(to_read)
    }

    fn duration(&self) -> Duration {
        self.duration
    }

    fn position(&self) -> Duration {
        self.position
    }

    fn is_finished(&self) -> bool {
        self.position >= self.duration
    }
}
