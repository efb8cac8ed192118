//! Resona - Engine
//!
//! Platform integration and composition root for the Resona parametric
//! equalizer and playback engine:
//!
//! - [`EngineFacade`] - the handful of operations the engine exposes:
//!   activate the EQ, set band levels, query the output route name, and
//!   drive play/pause/stop
//! - [`FileSource`] - streaming Symphonia decoder with automatic
//!   resampling to the output device rate
//! - [`route`] - output route classification with a fixed device priority
//!   order (USB over Bluetooth over wired over built-in speaker)
//!
//! The facade owns a CPAL output stream; its callback is the render
//! context. Equalizer updates travel control-to-render over a bounded
//! channel, transport and queries go through the shared controller.
//!
//! # Example
//!
//! ```rust,no_run
//! use resona_engine::{EngineConfig, EngineFacade};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = EngineFacade::new(EngineConfig::default())?;
//!
//! println!("{}", engine.activate_eq_preferred());
//! println!("output: {}", engine.device_name());
//!
//! engine.play("/music/track.flac")?;
//! engine.set_band_level(2, 500);
//!
//! let still_playing = engine.play_pause();
//! assert!(!still_playing);
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod facade;
mod file_source;
pub mod route;

pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use facade::EngineFacade;
pub use file_source::FileSource;
pub use route::{classify, DeviceDescriptor, DeviceKind, DeviceQuery, DEFAULT_DEVICE_NAME};
