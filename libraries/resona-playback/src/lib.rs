//! Resona - Playback Transport
//!
//! Platform-agnostic playback transport for the Resona engine:
//!
//! - [`PlaybackController`] - transport state machine (`Idle`, `Loaded`,
//!   `Playing`, `Paused`) that drives decoded audio through the equalizer
//!   cascade from the render path
//! - [`AudioSource`] - trait abstracting decoded audio delivery, so the
//!   controller works against any decoder backend
//!
//! This crate has no dependency on any audio backend; platform code (file
//! decoding, output streams) is provided by `resona-engine`.
//!
//! # Example
//!
//! ```rust
//! use resona_playback::{AudioSource, PlaybackConfig, PlaybackController, Result};
//! use std::path::PathBuf;
//! use std::time::Duration;
//!
//! // A one-second test tone
//! struct Tone {
//!     remaining: usize,
//! }
//!
//! impl AudioSource for Tone {
//!     fn read_samples(&mut self, buffer: &mut [f32]) -> Result<usize> {
//!         let n = self.remaining.min(buffer.len());
//!         buffer[..n].fill(0.25);
//!         self.remaining -= n;
//!         Ok(n)
//!     }
//!
//!     fn duration(&self) -> Duration {
//!         Duration::from_secs(1)
//!     }
//!
//!     fn position(&self) -> Duration {
//!         Duration::ZERO
//!     }
//!
//!     fn is_finished(&self) -> bool {
//!         self.remaining == 0
//!     }
//! }
//!
//! let mut controller = PlaybackController::new(&PlaybackConfig::default(), 44100);
//! controller.load(Box::new(Tone { remaining: 88200 }), PathBuf::from("/tone.wav"));
//!
//! assert!(controller.play_pause().unwrap());
//!
//! let mut block = vec![0.0f32; 512];
//! controller.process_block(&mut block);
//! ```

mod controller;
mod error;
mod source;
pub mod types;

pub use controller::PlaybackController;
pub use error::{PlaybackError, Result};
pub use source::AudioSource;
pub use types::{PlaybackConfig, SessionInfo, TransportState};
