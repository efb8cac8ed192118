//! Multiband equalizer bank
//!
//! Owns a fixed set of stereo peaking sections and maps the caller-facing
//! five-band index space onto however many bands the bank actually runs.
//! All filters are pre-allocated so the audio path never allocates.

use crate::biquad::{BiquadFilter, Coefficients};
use crate::error::{EqError, Result};

/// Maximum number of bands the bank can run
pub const MAX_BANDS: usize = 8;

/// Number of bands callers address, independent of the bank's actual count
pub const UI_BAND_COUNT: usize = 5;

/// Default center frequencies in Hz. The first `band_count` slots are live;
/// the remaining entries are spares used when the bank runs more bands.
pub const DEFAULT_CENTER_FREQUENCIES: [f32; MAX_BANDS] = [
    60.0, 250.0, 1000.0, 4000.0, 16000.0, 500.0, 2000.0, 8000.0,
];

/// Default bell width in octaves
pub const DEFAULT_BANDWIDTH_OCTAVES: f32 = 1.0;

/// Band level range accepted by [`EqualizerBank::set_band_level`], in millibels
pub const BAND_LEVEL_RANGE_MILLIBELS: (i32, i32) = (-1500, 1500);

/// Convert a band level in millibels to decibels (the engine's canonical
/// gain unit). Input is clamped to [`BAND_LEVEL_RANGE_MILLIBELS`].
pub fn db_from_millibels(level_millibels: i32) -> f32 {
    let (lo, hi) = BAND_LEVEL_RANGE_MILLIBELS;
    level_millibels.clamp(lo, hi) as f32 / 100.0
}

/// Convert a [0, 1] slider position to decibels, centered at 0.5 and
/// spanning ±12dB.
pub fn db_from_slider(value: f32) -> f32 {
    (value.clamp(0.0, 1.0) - 0.5) * 24.0
}

/// Map a caller band index (always addressed as five bands) onto a bank
/// running `band_count` bands: `floor(caller_index / 5 * band_count)`.
///
/// Returns `None` when the rescaled index lands outside the live bands.
/// For caller indices in `[0, 5)` the result is always in range; only an
/// out-of-contract caller index (>= 5) can miss.
pub fn rescale_band_index(caller_index: usize, band_count: usize) -> Option<usize> {
    let index = caller_index * band_count / UI_BAND_COUNT;
    (index < band_count).then_some(index)
}

/// One EQ band's parameters
#[derive(Debug, Clone, Copy)]
pub struct Band {
    /// Center frequency in Hz
    pub frequency: f32,
    /// Gain in dB, clamped to [-24, +24]
    gain_db: f32,
    /// Bell width in octaves, clamped to [0.1, 4.0]
    bandwidth_octaves: f32,
}

impl Band {
    /// Create a band at the given frequency with the given gain
    pub fn new(frequency: f32, gain_db: f32, bandwidth_octaves: f32) -> Self {
        Self {
            frequency,
            gain_db: gain_db.clamp(-24.0, 24.0),
            bandwidth_octaves: bandwidth_octaves.clamp(0.1, 4.0),
        }
    }

    /// Gain in dB
    pub fn gain_db(&self) -> f32 {
        self.gain_db
    }

    /// Set the gain in dB (clamped to [-24, +24])
    pub fn set_gain_db(&mut self, gain_db: f32) {
        self.gain_db = gain_db.clamp(-24.0, 24.0);
    }

    /// Bell width in octaves
    pub fn bandwidth_octaves(&self) -> f32 {
        self.bandwidth_octaves
    }
}

/// Result of a band level update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandUpdate {
    /// The update landed on the given live band index
    Applied(usize),
    /// The rescaled index fell outside the live bands; nothing was written
    Ignored,
}

/// One band's stereo filter pair
#[derive(Debug, Clone, Copy)]
struct StereoStage {
    left: BiquadFilter,
    right: BiquadFilter,
}

impl StereoStage {
    fn new() -> Self {
        Self {
            left: BiquadFilter::new(),
            right: BiquadFilter::new(),
        }
    }

    fn set_target(&mut self, coeffs: Coefficients) {
        self.left.set_target(coeffs);
        self.right.set_target(coeffs);
    }

    fn set_to_identity(&mut self) {
        self.left.set_to_identity();
        self.right.set_to_identity();
    }

    fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
    }
}

/// Cascade of peaking sections with a caller-facing five-band index space.
///
/// The bank pre-allocates [`MAX_BANDS`] stereo stages; only the first
/// `band_count` are live. Band parameters are applied as smoothed
/// coefficient targets, so updates are click-free and the processing path
/// stays allocation-free.
pub struct EqualizerBank {
    stages: [StereoStage; MAX_BANDS],
    bands: [Band; MAX_BANDS],
    band_count: usize,
    enabled: bool,
    sample_rate: u32,
    priority: Option<i32>,
    needs_update: bool,
}

impl EqualizerBank {
    /// Create a bank with the default five-band layout
    pub fn new(sample_rate: u32) -> Self {
        Self::with_band_count(sample_rate, UI_BAND_COUNT)
    }

    /// Create a bank running `band_count` bands (clamped to 1..=MAX_BANDS)
    pub fn with_band_count(sample_rate: u32, band_count: usize) -> Self {
        let bands = std::array::from_fn(|i| {
            Band::new(
                DEFAULT_CENTER_FREQUENCIES[i],
                0.0,
                DEFAULT_BANDWIDTH_OCTAVES,
            )
        });

        Self {
            stages: std::array::from_fn(|_| StereoStage::new()),
            bands,
            band_count: band_count.clamp(1, MAX_BANDS),
            enabled: false,
            sample_rate,
            priority: None,
            needs_update: true,
        }
    }

    /// Activate the bank at the given priority.
    ///
    /// Activation releases whatever filter state existed and brings every
    /// live band back up at unity gain, so calling it again is equivalent to
    /// tearing the bank down and recreating it. Negative priorities are
    /// rejected; the caller is expected to retry with a default priority.
    pub fn activate(&mut self, priority: i32) -> Result<i32> {
        if priority < 0 {
            return Err(EqError::PriorityRejected(priority));
        }

        for (stage, band) in self.stages.iter_mut().zip(self.bands.iter_mut()) {
            band.set_gain_db(0.0);
            stage.set_to_identity();
            stage.reset();
        }

        self.priority = Some(priority);
        self.enabled = true;
        self.needs_update = true;

        tracing::debug!(priority, band_count = self.band_count, "equalizer activated");
        Ok(priority)
    }

    /// Whether the bank has been activated
    pub fn is_active(&self) -> bool {
        self.priority.is_some()
    }

    /// Priority the bank was activated with, if any
    pub fn priority(&self) -> Option<i32> {
        self.priority
    }

    /// Number of live bands
    pub fn band_count(&self) -> usize {
        self.band_count
    }

    /// A live band's parameters, or `None` past the live range
    pub fn band(&self, index: usize) -> Option<Band> {
        if index < self.band_count {
            Some(self.bands[index])
        } else {
            None
        }
    }

    /// Set a band's gain from a caller index and a level in millibels.
    ///
    /// The caller index is rescaled into the live band range; an index that
    /// rescales out of range is ignored rather than treated as an error,
    /// matching the tolerant posture of the external contract.
    pub fn set_band_level(&mut self, caller_index: usize, level_millibels: i32) -> BandUpdate {
        self.set_band_gain_db(caller_index, db_from_millibels(level_millibels))
    }

    /// Set a band's gain from a caller index and a gain in dB.
    pub fn set_band_gain_db(&mut self, caller_index: usize, gain_db: f32) -> BandUpdate {
        match rescale_band_index(caller_index, self.band_count) {
            Some(index) => {
                self.bands[index].set_gain_db(gain_db);
                self.needs_update = true;
                BandUpdate::Applied(index)
            }
            None => {
                tracing::warn!(
                    caller_index,
                    band_count = self.band_count,
                    "band index rescaled out of range, update ignored"
                );
                BandUpdate::Ignored
            }
        }
    }

    /// Bypass or re-engage the cascade without touching filter state
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Whether the cascade is currently engaged
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Update the sample rate. Filter state is reset when the rate changes.
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        if self.sample_rate != sample_rate {
            self.sample_rate = sample_rate;
            for stage in &mut self.stages {
                stage.reset();
            }
            self.needs_update = true;
        }
    }

    /// Push pending band parameters down into filter coefficient targets
    fn update_filters(&mut self) {
        if !self.needs_update {
            return;
        }

        let sr = self.sample_rate as f32;
        for i in 0..self.band_count {
            let band = &self.bands[i];
            self.stages[i].set_target(Coefficients::peaking(
                sr,
                band.frequency,
                band.bandwidth_octaves,
                band.gain_db,
            ));
        }

        self.needs_update = false;
    }

    /// Run an interleaved stereo block through the live cascade in band
    /// order. Bounded, allocation-free, safe to call from the render path.
    pub fn process_block(&mut self, buffer: &mut [f32]) {
        if !self.enabled {
            return;
        }

        self.update_filters();

        for frame in buffer.chunks_exact_mut(2) {
            let mut left = frame[0];
            let mut right = frame[1];

            for stage in &mut self.stages[..self.band_count] {
                left = stage.left.process(left);
                right = stage.right.process(right);
            }

            frame[0] = left;
            frame[1] = right;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(frequency: f32, sample_rate: u32, seconds: f32) -> Vec<f32> {
        let frames = (sample_rate as f32 * seconds) as usize;
        let mut buffer = Vec::with_capacity(frames * 2);
        for n in 0..frames {
            let t = n as f32 / sample_rate as f32;
            let s = (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.5;
            buffer.push(s);
            buffer.push(s);
        }
        buffer
    }

    fn rms(buffer: &[f32]) -> f32 {
        (buffer.iter().map(|s| s * s).sum::<f32>() / buffer.len() as f32).sqrt()
    }

    #[test]
    fn default_layout() {
        let bank = EqualizerBank::new(44100);
        assert_eq!(bank.band_count(), 5);
        assert_eq!(bank.band(0).unwrap().frequency, 60.0);
        assert_eq!(bank.band(4).unwrap().frequency, 16000.0);
        assert!(bank.band(5).is_none());
        assert!(!bank.is_active());
    }

    #[test]
    fn rescale_arithmetic() {
        // Five live bands: caller space maps straight through
        for i in 0..5 {
            assert_eq!(rescale_band_index(i, 5), Some(i));
        }

        // Three live bands: floor(4/5*3) = 2, still in range
        assert_eq!(rescale_band_index(4, 3), Some(2));
        assert_eq!(rescale_band_index(0, 3), Some(0));
        assert_eq!(rescale_band_index(2, 3), Some(1));

        // Ten live bands
        assert_eq!(rescale_band_index(4, 10), Some(8));

        // Out-of-contract caller index misses
        assert_eq!(rescale_band_index(5, 5), None);
        assert_eq!(rescale_band_index(7, 3), None);
    }

    #[test]
    fn set_band_level_applies_and_ignores() {
        let mut bank = EqualizerBank::with_band_count(44100, 3);
        bank.activate(0).unwrap();

        assert_eq!(bank.set_band_level(4, 500), BandUpdate::Applied(2));
        assert!((bank.band(2).unwrap().gain_db() - 5.0).abs() < 1e-6);

        assert_eq!(bank.set_band_level(9, 500), BandUpdate::Ignored);
    }

    #[test]
    fn set_band_level_with_five_bands_targets_last_band() {
        let mut bank = EqualizerBank::new(44100);
        bank.activate(0).unwrap();

        assert_eq!(bank.set_band_level(4, 500), BandUpdate::Applied(4));
        assert!((bank.band(4).unwrap().gain_db() - 5.0).abs() < 1e-6);
    }

    #[test]
    fn level_is_clamped_to_range() {
        let mut bank = EqualizerBank::new(44100);
        bank.activate(0).unwrap();

        bank.set_band_level(0, 99_999);
        assert!((bank.band(0).unwrap().gain_db() - 15.0).abs() < 1e-6);

        bank.set_band_level(0, -99_999);
        assert!((bank.band(0).unwrap().gain_db() + 15.0).abs() < 1e-6);
    }

    #[test]
    fn activation_is_idempotent_and_resets_gains() {
        let mut bank = EqualizerBank::new(44100);
        bank.activate(1000).unwrap();
        bank.set_band_level(1, 900);
        assert!(bank.band(1).unwrap().gain_db() > 0.0);

        bank.activate(1000).unwrap();
        assert_eq!(bank.band_count(), 5);
        for i in 0..5 {
            assert_eq!(bank.band(i).unwrap().gain_db(), 0.0);
        }
        assert!(bank.is_enabled());
        assert_eq!(bank.priority(), Some(1000));
    }

    #[test]
    fn negative_priority_is_rejected() {
        let mut bank = EqualizerBank::new(44100);
        let err = bank.activate(-1).unwrap_err();
        assert!(matches!(err, EqError::PriorityRejected(-1)));
        assert!(!bank.is_active());
    }

    #[test]
    fn disabled_bank_is_bypassed() {
        let mut bank = EqualizerBank::new(44100);
        bank.activate(0).unwrap();
        bank.set_band_level(2, 1500);
        bank.set_enabled(false);

        let mut buffer = sine(1000.0, 44100, 0.1);
        let original = buffer.clone();
        bank.process_block(&mut buffer);

        assert_eq!(buffer, original);
    }

    #[test]
    fn boost_raises_level_at_center_frequency() {
        let mut bank = EqualizerBank::new(44100);
        bank.activate(0).unwrap();
        // Caller band 2 is the 1kHz band in the default layout
        bank.set_band_level(2, 1200);

        // Let coefficient smoothing settle, then measure
        let mut warmup = sine(1000.0, 44100, 1.0);
        bank.process_block(&mut warmup);

        let mut buffer = sine(1000.0, 44100, 0.5);
        let input_rms = rms(&buffer);
        bank.process_block(&mut buffer);
        let output_rms = rms(&buffer);

        assert!(
            output_rms > input_rms * 2.0,
            "expected +12dB boost, got {:.2}x",
            output_rms / input_rms
        );
    }

    #[test]
    fn unit_conversions() {
        assert!((db_from_millibels(500) - 5.0).abs() < 1e-6);
        assert!((db_from_millibels(-1500) + 15.0).abs() < 1e-6);
        assert!((db_from_slider(0.5)).abs() < 1e-6);
        assert!((db_from_slider(1.0) - 12.0).abs() < 1e-6);
        assert!((db_from_slider(0.0) + 12.0).abs() < 1e-6);
    }

    #[test]
    fn process_output_stays_finite() {
        let mut bank = EqualizerBank::new(48000);
        bank.activate(0).unwrap();
        for i in 0..5 {
            bank.set_band_level(i, if i % 2 == 0 { 1500 } else { -1500 });
        }

        let mut buffer = sine(440.0, 48000, 0.5);
        bank.process_block(&mut buffer);
        assert!(buffer.iter().all(|s| s.is_finite()));
    }
}
