//! Playback controller - transport state machine and render entry point
//!
//! Owns the audio source and the equalizer bank, and drives decoded frames
//! through the cascade from the render path. Control operations mutate the
//! transport state; the render path only ever reads it at block start, so
//! a pause or stop is heard within one buffer period.

use crate::error::{PlaybackError, Result};
use crate::source::AudioSource;
use crate::types::{PlaybackConfig, SessionInfo, TransportState};
use resona_dsp::EqualizerBank;
use std::path::PathBuf;

/// Short fade-in applied when playback starts or resumes.
///
/// A raised-cosine ramp over a few tens of milliseconds prevents the click
/// that a hard start would produce. Pause and stop do not fade: the render
/// path outputs silence from the next block on, which bounds the stop
/// guarantee at one buffer period.
#[derive(Debug)]
struct StartFade {
    active: bool,
    position_samples: usize,
    duration_samples: usize,
    fade_ms: u32,
}

impl StartFade {
    fn new(sample_rate: u32, fade_ms: u32) -> Self {
        Self {
            active: false,
            position_samples: 0,
            duration_samples: Self::duration_samples(sample_rate, fade_ms),
            fade_ms,
        }
    }

    /// Stereo samples covered by `fade_ms` at `sample_rate`
    fn duration_samples(sample_rate: u32, fade_ms: u32) -> usize {
        ((u64::from(sample_rate) * u64::from(fade_ms) * 2) / 1000) as usize
    }

    fn start(&mut self) {
        self.active = self.duration_samples > 0;
        self.position_samples = 0;
    }

    fn set_sample_rate(&mut self, sample_rate: u32) {
        self.duration_samples = Self::duration_samples(sample_rate, self.fade_ms);
    }

    /// Apply the ramp in place over an interleaved stereo buffer
    fn process(&mut self, buffer: &mut [f32]) {
        if !self.active {
            return;
        }

        for frame in buffer.chunks_exact_mut(2) {
            if self.position_samples >= self.duration_samples {
                self.active = false;
                return;
            }

            let progress = self.position_samples as f32 / self.duration_samples as f32;
            // Raised cosine: smooth at both ends of the ramp
            let gain = (1.0 - (std::f32::consts::PI * progress).cos()) * 0.5;
            frame[0] *= gain;
            frame[1] *= gain;
            self.position_samples += 2;
        }
    }
}

/// Transport state machine over a single audio session
///
/// ```text
/// Idle --load--> Loaded --play--> Playing <--play/pause--> Paused
///   ^                                |
///   +------------- stop -------------+
/// ```
///
/// Exactly one session is live at a time; `load` replaces it and `stop`
/// discards it together with the playback position.
pub struct PlaybackController {
    state: TransportState,
    session: Option<SessionInfo>,
    source: Option<Box<dyn AudioSource>>,
    bank: EqualizerBank,
    start_fade: StartFade,
    sample_rate: u32,
}

impl PlaybackController {
    /// Create a controller rendering at `sample_rate`
    pub fn new(config: &PlaybackConfig, sample_rate: u32) -> Self {
        Self {
            state: TransportState::Idle,
            session: None,
            source: None,
            bank: EqualizerBank::with_band_count(sample_rate, config.band_count),
            start_fade: StartFade::new(sample_rate, config.fade_in_ms),
            sample_rate,
        }
    }

    // ===== Transport =====

    /// Install a new audio session, replacing any existing one.
    ///
    /// The previous source and position are discarded. The controller ends
    /// up in `Loaded`; call [`play`](Self::play) to start rendering.
    pub fn load(&mut self, source: Box<dyn AudioSource>, source_path: PathBuf) {
        self.source = Some(source);
        self.session = Some(SessionInfo {
            source_path,
            position_frames: 0,
        });
        self.state = TransportState::Loaded;
        tracing::debug!(state = ?self.state, "session loaded");
    }

    /// Start or resume rendering
    pub fn play(&mut self) -> Result<()> {
        match self.state {
            TransportState::Loaded | TransportState::Paused => {
                self.state = TransportState::Playing;
                self.start_fade.start();
                tracing::debug!("playback started");
                Ok(())
            }
            TransportState::Playing => Ok(()),
            TransportState::Idle => Err(PlaybackError::NoSessionLoaded),
        }
    }

    /// Pause rendering, keeping the position
    pub fn pause(&mut self) {
        if self.state == TransportState::Playing {
            self.state = TransportState::Paused;
            tracing::debug!("playback paused");
        }
    }

    /// Flip between playing and paused.
    ///
    /// Returns the resulting playing state, mirroring the boolean-toggle
    /// contract of the external callers.
    pub fn play_pause(&mut self) -> Result<bool> {
        match self.state {
            TransportState::Playing => {
                self.pause();
                Ok(false)
            }
            TransportState::Loaded | TransportState::Paused => {
                self.play()?;
                Ok(true)
            }
            TransportState::Idle => Err(PlaybackError::NoSessionLoaded),
        }
    }

    /// Stop and discard the session. Safe to call from any state.
    pub fn stop(&mut self) {
        self.state = TransportState::Idle;
        self.session = None;
        self.source = None;
        tracing::debug!("playback stopped");
    }

    // ===== Queries =====

    /// Current transport state
    pub fn state(&self) -> TransportState {
        self.state
    }

    /// Whether the controller is currently rendering
    pub fn is_playing(&self) -> bool {
        self.state == TransportState::Playing
    }

    /// The live session, if any
    pub fn session(&self) -> Option<&SessionInfo> {
        self.session.as_ref()
    }

    /// Frames rendered since the session started
    pub fn position_frames(&self) -> u64 {
        self.session.as_ref().map_or(0, |s| s.position_frames)
    }

    /// Output sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    // ===== Equalizer access =====

    /// The equalizer bank
    pub fn bank(&self) -> &EqualizerBank {
        &self.bank
    }

    /// Mutable access to the equalizer bank
    pub fn bank_mut(&mut self) -> &mut EqualizerBank {
        &mut self.bank
    }

    // ===== Render path =====

    /// Update the output sample rate (filter state is reset on change)
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate;
        self.bank.set_sample_rate(sample_rate);
        self.start_fade.set_sample_rate(sample_rate);
    }

    /// Fill one output block. Render-path entry point.
    ///
    /// Pulls decoded samples, runs them through the equalizer cascade, and
    /// applies the start fade. Outputs silence unless `Playing`. Never
    /// propagates an error into the render path: a failing source parks the
    /// transport in `Paused` and the block degrades to silence.
    ///
    /// Returns the number of source samples rendered into `output`.
    pub fn process_block(&mut self, output: &mut [f32]) -> usize {
        if self.state != TransportState::Playing {
            output.fill(0.0);
            return 0;
        }

        let Some(source) = self.source.as_mut() else {
            output.fill(0.0);
            return 0;
        };

        let read = match source.read_samples(output) {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(error = %e, "source read failed, rendering silence");
                self.state = TransportState::Paused;
                output.fill(0.0);
                return 0;
            }
        };

        if read == 0 {
            // Source exhausted: park at the end with the position retained
            self.state = TransportState::Paused;
            tracing::debug!("source exhausted, transport paused at end");
            output.fill(0.0);
            return 0;
        }

        self.start_fade.process(&mut output[..read]);
        self.bank.process_block(&mut output[..read]);

        if read < output.len() {
            output[read..].fill(0.0);
        }

        if let Some(session) = self.session.as_mut() {
            session.position_frames += (read / 2) as u64;
        }

        read
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SilenceSource;
    use std::time::Duration;

    fn controller_with_session() -> PlaybackController {
        let mut controller = PlaybackController::new(&PlaybackConfig::default(), 44100);
        controller.load(
            Box::new(SilenceSource::new(Duration::from_secs(2), 44100)),
            PathBuf::from("/music/test.wav"),
        );
        controller
    }

    #[test]
    fn starts_idle() {
        let controller = PlaybackController::new(&PlaybackConfig::default(), 44100);
        assert_eq!(controller.state(), TransportState::Idle);
        assert!(!controller.is_playing());
        assert!(controller.session().is_none());
    }

    #[test]
    fn play_without_session_fails() {
        let mut controller = PlaybackController::new(&PlaybackConfig::default(), 44100);
        assert!(matches!(
            controller.play(),
            Err(PlaybackError::NoSessionLoaded)
        ));
        assert!(matches!(
            controller.play_pause(),
            Err(PlaybackError::NoSessionLoaded)
        ));
    }

    #[test]
    fn load_play_pause_cycle() {
        let mut controller = controller_with_session();
        assert_eq!(controller.state(), TransportState::Loaded);

        controller.play().unwrap();
        assert_eq!(controller.state(), TransportState::Playing);

        controller.pause();
        assert_eq!(controller.state(), TransportState::Paused);

        controller.play().unwrap();
        assert_eq!(controller.state(), TransportState::Playing);
    }

    #[test]
    fn play_pause_toggles_from_loaded() {
        let mut controller = controller_with_session();

        assert!(controller.play_pause().unwrap());
        assert_eq!(controller.state(), TransportState::Playing);

        assert!(!controller.play_pause().unwrap());
        assert_eq!(controller.state(), TransportState::Paused);
    }

    #[test]
    fn pause_outside_playing_is_a_no_op() {
        let mut controller = controller_with_session();
        controller.pause();
        assert_eq!(controller.state(), TransportState::Loaded);
    }

    #[test]
    fn stop_discards_session_from_any_state() {
        let mut controller = controller_with_session();
        controller.play().unwrap();
        controller.stop();
        assert_eq!(controller.state(), TransportState::Idle);
        assert!(controller.session().is_none());
        assert_eq!(controller.position_frames(), 0);

        // Stop again from Idle is fine
        controller.stop();
        assert_eq!(controller.state(), TransportState::Idle);
    }

    #[test]
    fn load_replaces_session_and_resets_position() {
        let mut controller = controller_with_session();
        controller.play().unwrap();

        let mut block = vec![0.0f32; 512];
        controller.process_block(&mut block);
        assert!(controller.position_frames() > 0);

        controller.load(
            Box::new(SilenceSource::new(Duration::from_secs(1), 44100)),
            PathBuf::from("/music/other.wav"),
        );
        assert_eq!(controller.state(), TransportState::Loaded);
        assert_eq!(controller.position_frames(), 0);
        assert_eq!(
            controller.session().unwrap().source_path,
            PathBuf::from("/music/other.wav")
        );
    }

    #[test]
    fn silence_when_not_playing() {
        let mut controller = controller_with_session();

        let mut block = vec![1.0f32; 256];
        let rendered = controller.process_block(&mut block);
        assert_eq!(rendered, 0);
        assert!(block.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn silence_immediately_after_pause() {
        let mut controller = controller_with_session();
        controller.play().unwrap();

        let mut block = vec![0.0f32; 256];
        controller.process_block(&mut block);

        controller.pause();

        let mut block = vec![1.0f32; 256];
        controller.process_block(&mut block);
        assert!(block.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn position_advances_while_playing() {
        let mut controller = controller_with_session();
        controller.play().unwrap();

        let mut block = vec![0.0f32; 1024];
        controller.process_block(&mut block);
        assert_eq!(controller.position_frames(), 512);

        controller.process_block(&mut block);
        assert_eq!(controller.position_frames(), 1024);
    }

    #[test]
    fn exhausted_source_parks_paused() {
        let mut controller = PlaybackController::new(&PlaybackConfig::default(), 44100);
        controller.load(
            Box::new(SilenceSource::new(Duration::from_millis(1), 44100)),
            PathBuf::from("/music/short.wav"),
        );
        controller.play().unwrap();

        let mut block = vec![0.0f32; 4096];
        // Drain the tiny source
        controller.process_block(&mut block);
        controller.process_block(&mut block);

        assert_eq!(controller.state(), TransportState::Paused);
        // Position is retained at the end of the source
        assert!(controller.position_frames() > 0);
    }
}
