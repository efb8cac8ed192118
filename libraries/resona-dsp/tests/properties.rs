//! Property-based tests for the equalizer DSP
//!
//! Uses proptest to verify invariants across many random inputs.

use proptest::prelude::*;
use resona_dsp::{rescale_band_index, BiquadFilter, Coefficients, EqualizerBank, UI_BAND_COUNT};

proptest! {
    /// Property: peaking sections are stable for the full supported gain
    /// and frequency range - the impulse response never diverges.
    #[test]
    fn peaking_filter_is_stable(
        gain_db in -24.0f32..=24.0,
        frequency in 20.0f32..20000.0,
        bandwidth in 0.1f32..=4.0,
    ) {
        let mut filter = BiquadFilter::new();
        filter.set_target(Coefficients::peaking(44100.0, frequency, bandwidth, gain_db));
        filter.reset();

        let mut peak = filter.process(1.0).abs();
        for _ in 0..4096 {
            let out = filter.process(0.0);
            prop_assert!(out.is_finite(), "impulse response produced non-finite output");
            peak = peak.max(out.abs());
        }

        // +24dB is a gain of ~15.8x; anything wildly above that means the
        // section has gone unstable
        prop_assert!(peak < 100.0, "impulse response peak too large: {}", peak);
    }

    /// Property: the caller-index rescale is monotonic non-decreasing and
    /// never lands outside the live band range for in-contract indices.
    #[test]
    fn rescale_is_monotonic_and_in_range(band_count in 1usize..=10) {
        let mut previous = 0;
        for caller_index in 0..UI_BAND_COUNT {
            let index = rescale_band_index(caller_index, band_count)
                .expect("in-contract caller index must rescale in range");
            prop_assert!(index < band_count);
            prop_assert!(index >= previous, "rescale must be monotonic");
            previous = index;
        }
    }

    /// Property: out-of-contract caller indices either rescale in range or
    /// are reported as a miss - never an out-of-bounds band write.
    #[test]
    fn rescale_never_overflows(caller_index in 0usize..64, band_count in 1usize..=10) {
        if let Some(index) = rescale_band_index(caller_index, band_count) {
            prop_assert!(index < band_count);
        }
    }

    /// Property: whatever levels are thrown at it, the bank never produces
    /// non-finite samples.
    #[test]
    fn bank_output_is_always_finite(
        levels in prop::collection::vec(-1500i32..=1500, UI_BAND_COUNT),
        samples in prop::collection::vec(-1.0f32..1.0, 64..512),
    ) {
        let mut bank = EqualizerBank::new(44100);
        bank.activate(0).unwrap();
        for (i, level) in levels.into_iter().enumerate() {
            bank.set_band_level(i, level);
        }

        let mut buffer = samples;
        bank.process_block(&mut buffer);
        prop_assert!(buffer.iter().all(|s| s.is_finite()));
    }
}
