//! Resona - Equalizer DSP
//!
//! Parametric equalizer building blocks for the Resona engine:
//!
//! - [`BiquadFilter`] - one second-order peaking section with click-free,
//!   smoothed coefficient updates
//! - [`EqualizerBank`] - a pre-allocated cascade of stereo sections with a
//!   caller-facing five-band index space rescaled onto the live band count
//!
//! All gains are expressed in decibels internally. Conversions from the two
//! caller conventions (millibel levels, [0, 1] slider positions spanning
//! ±12dB) live next to the bank.
//!
//! # Example
//!
//! ```rust
//! use resona_dsp::{BandUpdate, EqualizerBank};
//!
//! let mut bank = EqualizerBank::new(44100);
//! bank.activate(1000).unwrap();
//!
//! // Caller band 2 is the 1kHz band; +5dB
//! assert_eq!(bank.set_band_level(2, 500), BandUpdate::Applied(2));
//!
//! let mut block = vec![0.0f32; 512];
//! bank.process_block(&mut block);
//! ```

mod bank;
mod biquad;
mod error;

pub use bank::{
    db_from_millibels, db_from_slider, rescale_band_index, Band, BandUpdate, EqualizerBank,
    BAND_LEVEL_RANGE_MILLIBELS, DEFAULT_BANDWIDTH_OCTAVES, DEFAULT_CENTER_FREQUENCIES, MAX_BANDS,
    UI_BAND_COUNT,
};
pub use biquad::{BiquadFilter, Coefficients};
pub use error::{EqError, Result};
