//! File-backed audio source using a streaming Symphonia decoder
//!
//! Opens a local audio file (MP3, FLAC, OGG, WAV, AAC, ...), decodes it
//! packet by packet on demand, converts every sample format to interleaved
//! stereo f32, and resamples to the output device rate when the file rate
//! differs. Only metadata and the first packets are touched at open time,
//! so `play(path)` returns quickly; all subsequent decoding happens as the
//! render path drains the ring buffer.

use resona_playback::{AudioSource, PlaybackError, Result};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use std::collections::VecDeque;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;
use symphonia::core::audio::{AudioBufferRef, Signal};
use symphonia::core::codecs::{Decoder, DecoderOptions};
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Ring buffer depth in seconds of stereo audio
const RING_BUFFER_SECONDS: usize = 5;

/// Resampler chunk length as a fraction of a second of source audio
const RESAMPLE_CHUNK_DIVISOR: usize = 10;

/// Streaming audio source for local files
pub struct FileSource {
    path: PathBuf,
    source_sample_rate: u32,
    target_sample_rate: u32,

    reader: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,

    /// Decoded, converted, resampled samples awaiting the render path
    ring: VecDeque<f32>,
    ring_capacity: usize,

    /// Source-rate samples waiting for a full resampler chunk
    pending: Vec<f32>,
    resampler: Option<SincFixedIn<f32>>,

    samples_read: usize,
    total_duration: Duration,
    is_eof: bool,
}

impl FileSource {
    /// Open a file for streaming playback at `target_sample_rate`.
    pub fn open(path: impl AsRef<Path>, target_sample_rate: u32) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let file = File::open(&path)
            .map_err(|e| PlaybackError::Source(format!("failed to open file: {}", e)))?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| PlaybackError::Source(format!("failed to probe file: {}", e)))?;

        let reader = probed.format;
        let track = reader
            .default_track()
            .ok_or_else(|| PlaybackError::Source("no audio tracks found".into()))?;

        let source_sample_rate = track.codec_params.sample_rate.unwrap_or(44100);
        let track_id = track.id;

        let total_duration = track
            .codec_params
            .n_frames
            .map(|frames| Duration::from_secs_f64(frames as f64 / f64::from(source_sample_rate)))
            .unwrap_or_default();

        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| PlaybackError::Source(format!("failed to create decoder: {}", e)))?;

        let resampler = if source_sample_rate == target_sample_rate {
            None
        } else {
            let params = SincInterpolationParameters {
                sinc_len: 256,
                f_cutoff: 0.95,
                interpolation: SincInterpolationType::Linear,
                oversampling_factor: 256,
                window: WindowFunction::BlackmanHarris2,
            };
            let chunk_frames = source_sample_rate as usize / RESAMPLE_CHUNK_DIVISOR;

            let resampler = SincFixedIn::<f32>::new(
                f64::from(target_sample_rate) / f64::from(source_sample_rate),
                2.0,
                params,
                chunk_frames,
                2,
            )
            .map_err(|e| PlaybackError::Source(format!("failed to create resampler: {}", e)))?;
            Some(resampler)
        };

        tracing::debug!(
            path = %path.display(),
            source_sample_rate,
            target_sample_rate,
            resampling = resampler.is_some(),
            "file source opened"
        );

        let ring_capacity = RING_BUFFER_SECONDS * target_sample_rate as usize * 2;

        Ok(Self {
            path,
            source_sample_rate,
            target_sample_rate,
            reader,
            decoder,
            track_id,
            ring: VecDeque::with_capacity(ring_capacity),
            ring_capacity,
            pending: Vec::new(),
            resampler,
            samples_read: 0,
            total_duration,
            is_eof: false,
        })
    }

    /// Path the source was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Output sample rate
    pub fn sample_rate(&self) -> u32 {
        self.target_sample_rate
    }

    /// The file's native sample rate
    pub fn source_sample_rate(&self) -> u32 {
        self.source_sample_rate
    }

    /// Decode the next packet into the ring buffer.
    ///
    /// Returns false once the stream is exhausted.
    fn decode_next_packet(&mut self) -> Result<bool> {
        if self.is_eof {
            return Ok(false);
        }

        let packet = match self.reader.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                self.is_eof = true;
                self.flush_resampler()?;
                return Ok(false);
            }
            Err(e) => {
                return Err(PlaybackError::Source(format!("error reading packet: {}", e)));
            }
        };

        if packet.track_id() != self.track_id {
            return Ok(true);
        }

        let decoded = self
            .decoder
            .decode(&packet)
            .map_err(|e| PlaybackError::Source(format!("decode error: {}", e)))?;

        let samples = convert_to_stereo_f32(&decoded);

        if self.resampler.is_some() {
            self.pending.extend_from_slice(&samples);
            self.drain_pending(false)?;
        } else {
            self.push_to_ring(&samples);
        }

        Ok(true)
    }

    /// Run as many full resampler chunks as `pending` holds; with `flush`
    /// set, also push the final partial chunk through.
    fn drain_pending(&mut self, flush: bool) -> Result<()> {
        let Some(resampler) = self.resampler.as_mut() else {
            return Ok(());
        };

        let chunk_frames = resampler.input_frames_next();
        let mut offset = 0;

        while self.pending.len() / 2 - offset >= chunk_frames {
            let mut planar = [
                Vec::with_capacity(chunk_frames),
                Vec::with_capacity(chunk_frames),
            ];
            for frame in 0..chunk_frames {
                let base = (offset + frame) * 2;
                planar[0].push(self.pending[base]);
                planar[1].push(self.pending[base + 1]);
            }

            let resampled = resampler
                .process(&planar[..], None)
                .map_err(|e| PlaybackError::Source(format!("resampling error: {}", e)))?;

            let out_frames = resampled[0].len();
            for frame in 0..out_frames {
                self.ring.push_back(resampled[0][frame]);
                self.ring.push_back(resampled[1][frame]);
            }

            offset += chunk_frames;
        }

        self.pending.drain(..offset * 2);

        if flush && !self.pending.is_empty() {
            let frames = self.pending.len() / 2;
            let mut planar = [Vec::with_capacity(frames), Vec::with_capacity(frames)];
            for frame in 0..frames {
                planar[0].push(self.pending[frame * 2]);
                planar[1].push(self.pending[frame * 2 + 1]);
            }

            let resampled = resampler
                .process_partial(Some(&planar[..]), None)
                .map_err(|e| PlaybackError::Source(format!("resampling error: {}", e)))?;

            let out_frames = resampled[0].len();
            for frame in 0..out_frames {
                self.ring.push_back(resampled[0][frame]);
                self.ring.push_back(resampled[1][frame]);
            }

            self.pending.clear();
        }

        Ok(())
    }

    /// Push the trailing partial chunk through the resampler at end of file
    fn flush_resampler(&mut self) -> Result<()> {
        self.drain_pending(true)
    }

    fn push_to_ring(&mut self, samples: &[f32]) {
        for &sample in samples {
            self.ring.push_back(sample);
            if self.ring.len() > self.ring_capacity {
                self.ring.pop_front();
            }
        }
    }
}

impl AudioSource for FileSource {
    fn read_samples(&mut self, output: &mut [f32]) -> Result<usize> {
        let mut written = 0;

        while written < output.len() {
            if self.ring.len() < output.len() - written && !self.is_eof {
                while self.ring.len() < self.ring_capacity && !self.is_eof {
                    if !self.decode_next_packet()? {
                        break;
                    }
                }
            }

            let available = self.ring.len().min(output.len() - written);
            if available == 0 {
                break;
            }

            for slot in output[written..written + available].iter_mut() {
                *slot = self.ring.pop_front().unwrap_or(0.0);
            }
            written += available;
        }

        self.samples_read += written;

        if written < output.len() {
            output[written..].fill(0.0);
        }

        Ok(written)
    }

    fn duration(&self) -> Duration {
        self.total_duration
    }

    fn position(&self) -> Duration {
        let frames = self.samples_read / 2;
        Duration::from_secs_f64(frames as f64 / f64::from(self.target_sample_rate))
    }

    fn is_finished(&self) -> bool {
        self.is_eof && self.ring.is_empty()
    }
}

/// Convert any decoded Symphonia buffer to interleaved stereo f32.
///
/// Mono is duplicated to both channels; multi-channel audio keeps its first
/// two channels. Integer formats are normalized symmetrically, unsigned
/// formats are centered around zero.
fn convert_to_stereo_f32(decoded: &AudioBufferRef) -> Vec<f32> {
    fn interleave<T, F>(buf: &symphonia::core::audio::AudioBuffer<T>, normalize: F) -> Vec<f32>
    where
        T: symphonia::core::sample::Sample,
        F: Fn(T) -> f32,
    {
        let channels = buf.spec().channels.count();
        let frames = buf.frames();
        let mut output = Vec::with_capacity(frames * 2);

        for frame in 0..frames {
            let left = normalize(buf.chan(0)[frame]);
            let right = if channels > 1 {
                normalize(buf.chan(1)[frame])
            } else {
                left
            };
            output.push(left);
            output.push(right);
        }

        output
    }

    match decoded {
        AudioBufferRef::F32(buf) => interleave(buf, |s| s),
        AudioBufferRef::F64(buf) => interleave(buf, |s| s as f32),
        AudioBufferRef::S8(buf) => interleave(buf, |s| f32::from(s) / 128.0),
        AudioBufferRef::S16(buf) => interleave(buf, |s| f32::from(s) / 32768.0),
        AudioBufferRef::S24(buf) => interleave(buf, |s| s.inner() as f32 / 8388608.0),
        AudioBufferRef::S32(buf) => interleave(buf, |s| s as f32 / 2147483648.0),
        AudioBufferRef::U8(buf) => interleave(buf, |s| (f32::from(s) / 255.0) * 2.0 - 1.0),
        AudioBufferRef::U16(buf) => interleave(buf, |s| (f32::from(s) / 65535.0) * 2.0 - 1.0),
        AudioBufferRef::U24(buf) => interleave(buf, |s| (s.inner() as f32 / 16777215.0) * 2.0 - 1.0),
        AudioBufferRef::U32(buf) => interleave(buf, |s| (s as f32 / u32::MAX as f32) * 2.0 - 1.0),
    }
}
