//! Engine facade - composition root
//!
//! Wires the playback controller, the equalizer bank, and the device route
//! classifier behind the handful of operations the engine exposes, and owns
//! the CPAL output stream whose callback is the render context.
//!
//! Two execution contexts meet here. Control operations run on the caller's
//! thread; equalizer parameter changes are published to the render context
//! through a bounded channel and applied at block start, so the render path
//! always sees fully-formed band parameters and never waits on a caller.
//! Transport changes and queries go through the controller mutex, which the
//! callback holds only for the duration of one block.

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::file_source::FileSource;
use crate::route::{classify, CpalDeviceQuery, DeviceQuery, DEFAULT_DEVICE_NAME};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::Stream;
use crossbeam_channel::{bounded, Receiver, Sender};
use resona_dsp::db_from_slider;
use resona_playback::{PlaybackController, TransportState};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Equalizer commands published from the control context to the render
/// context
#[derive(Debug, Clone)]
enum EqCommand {
    /// Set a band level from a caller index and millibels
    SetBandLevel {
        caller_index: usize,
        level_millibels: i32,
    },

    /// Set a band gain from a caller index and decibels
    SetBandGainDb { caller_index: usize, gain_db: f32 },

    /// Engage or bypass the cascade
    SetEnabled(bool),
}

/// Scratch buffer size for non-stereo devices (frames)
const SCRATCH_FRAMES: usize = 8192;

/// Composition root for the Resona engine
///
/// Owns the output stream for its whole lifetime; dropping the facade tears
/// the stream down.
pub struct EngineFacade {
    controller: Arc<Mutex<PlaybackController>>,
    command_tx: Sender<EqCommand>,
    device_query: Box<dyn DeviceQuery>,
    config: EngineConfig,
    sample_rate: u32,
    _stream: Stream,
}

// SAFETY: every field except the CPAL stream is Send + Sync. The stream is
// only a handle; CPAL drives the callback from its own audio thread and the
// handle itself is never touched after construction except to drop it.
#[allow(unsafe_code)]
unsafe impl Send for EngineFacade {}

#[allow(unsafe_code)]
unsafe impl Sync for EngineFacade {}

impl EngineFacade {
    /// Create an engine on the default output device
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_device_query(config, Box::new(CpalDeviceQuery))
    }

    /// Create an engine with a custom device-query collaborator
    pub fn with_device_query(
        config: EngineConfig,
        device_query: Box<dyn DeviceQuery>,
    ) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(EngineError::DeviceNotFound)?;

        let stream_config: cpal::StreamConfig = device.default_output_config()?.into();
        let sample_rate = stream_config.sample_rate;
        let channels = stream_config.channels as usize;

        let controller = Arc::new(Mutex::new(PlaybackController::new(
            &config.playback,
            sample_rate,
        )));

        let (command_tx, command_rx) = bounded(config.command_capacity);

        let stream = Self::build_stream(&device, &stream_config, channels, &controller, command_rx)?;
        stream.play()?;

        tracing::debug!(sample_rate, channels, "engine started");

        Ok(Self {
            controller,
            command_tx,
            device_query,
            config,
            sample_rate,
            _stream: stream,
        })
    }

    /// Build the output stream whose callback is the render context
    fn build_stream(
        device: &cpal::Device,
        stream_config: &cpal::StreamConfig,
        channels: usize,
        controller: &Arc<Mutex<PlaybackController>>,
        command_rx: Receiver<EqCommand>,
    ) -> Result<Stream> {
        let controller = Arc::clone(controller);
        let mut scratch = vec![0.0f32; SCRATCH_FRAMES * 2];

        let stream = device.build_output_stream(
            stream_config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let mut controller = match controller.lock() {
                    Ok(guard) => guard,
                    Err(_) => {
                        data.fill(0.0);
                        return;
                    }
                };

                // Apply pending equalizer updates before rendering the block
                while let Ok(command) = command_rx.try_recv() {
                    apply_command(&mut controller, &command);
                }

                if channels == 2 {
                    controller.process_block(data);
                } else {
                    render_non_stereo(&mut controller, data, channels, &mut scratch);
                }
            },
            |err| tracing::error!(error = %err, "audio stream error"),
            None,
        )?;

        Ok(stream)
    }

    // ===== Equalizer =====

    /// Activate the equalizer, preferring the configured high priority and
    /// falling back to the default priority when the preferred activation is
    /// rejected. Degrades instead of failing: the caller always gets a
    /// status string.
    pub fn activate_eq(&self, priority_hint: i32) -> String {
        let mut controller = self.lock_controller();
        let fallback = self.config.fallback_eq_priority;
        let bank = controller.bank_mut();

        match bank.activate(priority_hint) {
            Ok(priority) => format!("eq active (priority {priority})"),
            Err(e) => {
                tracing::warn!(error = %e, fallback, "preferred eq activation rejected");
                match bank.activate(fallback) {
                    Ok(priority) => format!("eq active (fallback priority {priority})"),
                    Err(e) => {
                        tracing::warn!(error = %e, "fallback eq activation rejected");
                        "eq unavailable".to_string()
                    }
                }
            }
        }
    }

    /// Activate the equalizer with the configured preferred priority
    pub fn activate_eq_preferred(&self) -> String {
        self.activate_eq(self.config.preferred_eq_priority)
    }

    /// Set a band level from a caller band index and a level in millibels.
    ///
    /// The update is published to the render context; an index that rescales
    /// out of the live band range is dropped there without error. Always
    /// reports `"OK"`.
    pub fn set_band_level(&self, band_index: usize, level_millibels: i32) -> String {
        self.publish(EqCommand::SetBandLevel {
            caller_index: band_index,
            level_millibels,
        });
        "OK".to_string()
    }

    /// Set a band gain from a caller band index and a [0, 1] slider
    /// position (±12dB around the midpoint).
    pub fn set_band_slider(&self, band_index: usize, value: f32) -> String {
        self.publish(EqCommand::SetBandGainDb {
            caller_index: band_index,
            gain_db: db_from_slider(value),
        });
        "OK".to_string()
    }

    /// Engage or bypass the equalizer cascade
    pub fn set_eq_enabled(&self, enabled: bool) {
        self.publish(EqCommand::SetEnabled(enabled));
    }

    fn publish(&self, command: EqCommand) {
        if let Err(e) = self.command_tx.send(command) {
            tracing::warn!(error = %e, "render context gone, eq command dropped");
        }
    }

    // ===== Device route =====

    /// Display name of the current output route.
    ///
    /// Never fails: an unavailable device query yields the default name.
    pub fn device_name(&self) -> String {
        match self.device_query.output_devices() {
            Ok(devices) => classify(&devices),
            Err(e) => {
                tracing::warn!(error = %e, "device query failed, using default name");
                DEFAULT_DEVICE_NAME.to_string()
            }
        }
    }

    // ===== Transport =====

    /// Open `path`, install it as the active session, and start playback.
    ///
    /// This is the one operation that surfaces hard errors: an unreadable or
    /// undecodable file is reported to the caller.
    pub fn play(&self, path: impl AsRef<Path>) -> Result<String> {
        let path = path.as_ref();
        let source = FileSource::open(path, self.sample_rate)?;

        let mut controller = self.lock_controller();
        controller.load(Box::new(source), path.to_path_buf());
        controller.play().map_err(EngineError::from)?;

        Ok("PLAYING".to_string())
    }

    /// Flip between playing and paused; returns the resulting playing
    /// state. With no session loaded this is a no-op reporting `false`.
    pub fn play_pause(&self) -> bool {
        let mut controller = self.lock_controller();
        match controller.play_pause() {
            Ok(is_playing) => is_playing,
            Err(e) => {
                tracing::warn!(error = %e, "play/pause ignored");
                false
            }
        }
    }

    /// Alias for [`play_pause`](Self::play_pause): the external pause call
    /// has toggle semantics.
    pub fn pause(&self) -> bool {
        self.play_pause()
    }

    /// Stop and discard the session. Safe from any state; the render
    /// context outputs silence from the next block on.
    pub fn stop(&self) {
        self.lock_controller().stop();
    }

    // ===== Queries =====

    /// Current transport state
    pub fn state(&self) -> TransportState {
        self.lock_controller().state()
    }

    /// Whether the engine is currently rendering audio
    pub fn is_playing(&self) -> bool {
        self.lock_controller().is_playing()
    }

    /// Frames rendered since the session started
    pub fn position_frames(&self) -> u64 {
        self.lock_controller().position_frames()
    }

    /// Output sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn lock_controller(&self) -> std::sync::MutexGuard<'_, PlaybackController> {
        // A poisoned controller means the render thread panicked; the state
        // itself is still sound for control operations
        match self.controller.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Apply one published equalizer command on the render context
fn apply_command(controller: &mut PlaybackController, command: &EqCommand) {
    match *command {
        EqCommand::SetBandLevel {
            caller_index,
            level_millibels,
        } => {
            controller.bank_mut().set_band_level(caller_index, level_millibels);
        }
        EqCommand::SetBandGainDb {
            caller_index,
            gain_db,
        } => {
            controller.bank_mut().set_band_gain_db(caller_index, gain_db);
        }
        EqCommand::SetEnabled(enabled) => controller.bank_mut().set_enabled(enabled),
    }
}

/// Render a stereo block into a mono or multi-channel device buffer.
///
/// The controller always renders stereo; mono devices get the averaged
/// channels, wider layouts get the stereo pair in the first two channels
/// and silence in the rest.
fn render_non_stereo(
    controller: &mut PlaybackController,
    data: &mut [f32],
    channels: usize,
    scratch: &mut [f32],
) {
    let frames = (data.len() / channels).min(scratch.len() / 2);
    let stereo = &mut scratch[..frames * 2];
    controller.process_block(stereo);
    data[frames * channels..].fill(0.0);

    if channels == 1 {
        for frame in 0..frames {
            data[frame] = (stereo[frame * 2] + stereo[frame * 2 + 1]) * 0.5;
        }
    } else {
        for frame in 0..frames {
            let base = frame * channels;
            data[base] = stereo[frame * 2];
            data[base + 1] = stereo[frame * 2 + 1];
            for channel in 2..channels {
                data[base + channel] = 0.0;
            }
        }
    }
}
