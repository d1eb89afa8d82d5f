//! Backing-track playback: decodes a WAV file off the RT thread, publishes
//! the decoded buffer via `ArcSwap`, and lets the RT thread mix fixed-size
//! slices into the engine's output with no locking.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use crate::error::BackingTrackError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlaybackState {
    Stopped,
    Playing,
    Paused,
}

impl PlaybackState {
    const STOPPED: u8 = 0;
    const PLAYING: u8 = 1;
    const PAUSED: u8 = 2;

    const fn to_tag(self) -> u8 {
        match self {
            PlaybackState::Stopped => Self::STOPPED,
            PlaybackState::Playing => Self::PLAYING,
            PlaybackState::Paused => Self::PAUSED,
        }
    }

    const fn from_tag(tag: u8) -> Self {
        match tag {
            Self::PLAYING => PlaybackState::Playing,
            Self::PAUSED => PlaybackState::Paused,
            _ => PlaybackState::Stopped,
        }
    }
}

/// The decoded backing track buffer, immutable once published.
struct Decoded {
    left: Vec<f32>,
    right: Vec<f32>,
    sample_rate: u32,
}

/// Snapshot of playback status, suitable for `getBackingTrackStatus`.
#[derive(Debug, Clone)]
pub struct BackingTrackStatus {
    pub loaded: bool,
    pub path: Option<PathBuf>,
    pub playing: bool,
    pub paused: bool,
    pub looping: bool,
    pub volume: f32,
    pub position_frames: u64,
    pub total_frames: u64,
}

/// Loads and plays a stereo backing track alongside the live signal chain.
pub struct BackingTrack {
    buffer: ArcSwap<Option<Decoded>>,
    path: Mutex<Option<PathBuf>>,
    state: AtomicU8,
    loading: AtomicBool,
    position: AtomicU64,
    looping: AtomicBool,
    volume_bits: AtomicU32,
    start_position_frames: AtomicU64,
    stop_position_frames: AtomicU64,
}

impl BackingTrack {
    pub fn new() -> Self {
        Self {
            buffer: ArcSwap::from_pointee(None),
            path: Mutex::new(None),
            state: AtomicU8::new(PlaybackState::Stopped.to_tag()),
            loading: AtomicBool::new(false),
            position: AtomicU64::new(0),
            looping: AtomicBool::new(false),
            volume_bits: AtomicU32::new(1.0f32.to_bits()),
            start_position_frames: AtomicU64::new(0),
            stop_position_frames: AtomicU64::new(u64::MAX),
        }
    }

    fn state(&self) -> PlaybackState {
        PlaybackState::from_tag(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: PlaybackState) {
        self.state.store(state.to_tag(), Ordering::Release);
    }

    pub fn is_playing(&self) -> bool {
        self.state() == PlaybackState::Playing
    }

    /// Non-RT: decodes `path` (WAV via `hoopipi_io`, or MP3 via `symphonia`)
    /// and publishes it. Refuses a reload while a track is already playing,
    /// per §4.6.
    pub fn load(&self, path: &Path) -> Result<(), BackingTrackError> {
        if self.is_playing() {
            return Err(BackingTrackError::StillPlaying);
        }
        self.loading.store(true, Ordering::Release);

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let decoded = if extension == "mp3" {
            decode_mp3(path)?
        } else {
            let (samples, spec) = hoopipi_io::read_wav_stereo(path)
                .map_err(|source| BackingTrackError::Decode { path: path.to_path_buf(), source })?;
            Decoded {
                left: samples.left,
                right: samples.right,
                sample_rate: spec.sample_rate,
            }
        };

        let total_frames = decoded.left.len() as u64;
        self.buffer.store(Arc::new(Some(decoded)));
        *self.path.lock() = Some(path.to_path_buf());
        self.position.store(0, Ordering::Release);
        self.stop_position_frames.store(total_frames, Ordering::Release);
        self.set_state(PlaybackState::Stopped);
        self.loading.store(false, Ordering::Release);

        tracing::info!(path = %path.display(), "backing track loaded");
        Ok(())
    }

    pub fn play(&self) {
        if self.buffer.load().is_some() {
            self.set_state(PlaybackState::Playing);
        }
    }

    pub fn pause(&self) {
        if self.state() == PlaybackState::Playing {
            self.set_state(PlaybackState::Paused);
        }
    }

    pub fn stop(&self) {
        self.set_state(PlaybackState::Stopped);
        self.position
            .store(self.start_position_frames.load(Ordering::Relaxed), Ordering::Release);
    }

    pub fn set_loop(&self, looping: bool) {
        self.looping.store(looping, Ordering::Relaxed);
    }

    pub fn set_volume(&self, volume: f32) {
        self.volume_bits.store(volume.clamp(0.0, 2.0).to_bits(), Ordering::Relaxed);
    }

    pub fn set_start_position_frames(&self, frames: u64) {
        self.start_position_frames.store(frames, Ordering::Relaxed);
    }

    pub fn set_stop_position_frames(&self, frames: u64) {
        self.stop_position_frames.store(frames, Ordering::Relaxed);
    }

    pub fn status(&self) -> BackingTrackStatus {
        let guard = self.buffer.load();
        let total_frames = guard.as_ref().as_ref().map_or(0, |d| d.left.len() as u64);
        BackingTrackStatus {
            loaded: guard.is_some(),
            path: self.path.lock().clone(),
            playing: self.state() == PlaybackState::Playing,
            paused: self.state() == PlaybackState::Paused,
            looping: self.looping.load(Ordering::Relaxed),
            volume: f32::from_bits(self.volume_bits.load(Ordering::Relaxed)),
            position_frames: self.position.load(Ordering::Acquire),
            total_frames,
        }
    }

    /// RT-safe: mixes up to `left.len()` frames of the backing track into
    /// `left`/`right` at the configured volume, advancing position and
    /// handling loop/stop bounds. A no-op when stopped, paused, or unloaded.
    #[inline]
    pub fn fill(&self, left: &mut [f32], right: &mut [f32]) {
        if self.state() != PlaybackState::Playing {
            return;
        }
        let guard = self.buffer.load();
        let Some(decoded) = guard.as_ref() else { return };

        let total_frames = decoded.left.len() as u64;
        if total_frames == 0 {
            return;
        }
        let volume = f32::from_bits(self.volume_bits.load(Ordering::Relaxed));
        let stop_frame = self.stop_position_frames.load(Ordering::Relaxed).min(total_frames);
        // Clamp so a stale/out-of-range start position (e.g. set against a
        // previously loaded, longer track) can't index past the buffer on
        // loop wraparound below.
        let start_frame = self.start_position_frames.load(Ordering::Relaxed).min(total_frames - 1);
        let looping = self.looping.load(Ordering::Relaxed);

        let mut pos = self.position.load(Ordering::Relaxed);
        let n = left.len();
        for i in 0..n {
            if pos >= stop_frame {
                if looping {
                    pos = start_frame;
                } else {
                    self.set_state(PlaybackState::Stopped);
                    break;
                }
            }
            let idx = pos as usize;
            left[i] += decoded.left[idx] * volume;
            right[i] += decoded.right[idx] * volume;
            pos += 1;
        }
        self.position.store(pos, Ordering::Release);
    }
}

impl Default for BackingTrack {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_mp3(path: &Path) -> Result<Decoded, BackingTrackError> {
    use symphonia::core::audio::SampleBuffer;
    use symphonia::core::codecs::DecoderOptions;
    use symphonia::core::formats::FormatOptions;
    use symphonia::core::io::MediaSourceStream;
    use symphonia::core::meta::MetadataOptions;
    use symphonia::core::probe::Hint;

    let file = std::fs::File::open(path)
        .map_err(|_| BackingTrackError::UnsupportedFormat(path.display().to_string()))?;
    let source = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    hint.with_extension("mp3");

    let probed = symphonia::default::get_probe()
        .format(&hint, source, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|_| BackingTrackError::UnsupportedFormat(path.display().to_string()))?;

    let mut format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .ok_or_else(|| BackingTrackError::UnsupportedFormat("no decodable track".into()))?;
    let track_id = track.id;
    let sample_rate = track.codec_params.sample_rate.unwrap_or(44_100);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|_| BackingTrackError::UnsupportedFormat("unsupported codec".into()))?;

    let mut left = Vec::new();
    let mut right = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(_) => break,
        };
        if packet.track_id() != track_id {
            continue;
        }
        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(_) => continue,
        };
        let spec = *decoded.spec();
        let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        let channels = spec.channels.count().max(1);
        let samples = sample_buf.samples();
        if channels >= 2 {
            for frame in samples.chunks_exact(channels) {
                left.push(frame[0]);
                right.push(frame[1]);
            }
        } else {
            for &s in samples {
                left.push(s);
                right.push(s);
            }
        }
    }

    Ok(Decoded { left, right, sample_rate })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_test_wav(path: &Path, frames: usize) {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 48_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..frames {
            let value = ((i % 100) as f32 / 100.0 - 0.5) * 2.0;
            writer.write_sample((value * 32767.0) as i16).unwrap();
            writer.write_sample((value * 32767.0) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn load_then_play_fills_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track.wav");
        write_test_wav(&path, 1000);

        let track = BackingTrack::new();
        track.load(&path).unwrap();
        track.play();

        let mut left = vec![0.0f32; 500];
        let mut right = vec![0.0f32; 500];
        track.fill(&mut left, &mut right);
        assert!(left.iter().any(|&s| s != 0.0));
        assert_eq!(track.status().position_frames, 500);
    }

    #[test]
    fn reload_while_playing_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track.wav");
        write_test_wav(&path, 100);

        let track = BackingTrack::new();
        track.load(&path).unwrap();
        track.play();
        assert!(matches!(track.load(&path), Err(BackingTrackError::StillPlaying)));
    }

    #[test]
    fn non_looping_track_stops_at_end() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track.wav");
        write_test_wav(&path, 10);

        let track = BackingTrack::new();
        track.load(&path).unwrap();
        track.play();

        let mut left = vec![0.0f32; 50];
        let mut right = vec![0.0f32; 50];
        track.fill(&mut left, &mut right);
        assert!(!track.is_playing());
    }

    #[test]
    fn looping_track_with_out_of_range_start_position_does_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track.wav");
        write_test_wav(&path, 10);

        let track = BackingTrack::new();
        track.load(&path).unwrap();
        track.set_loop(true);
        track.set_start_position_frames(5_000);
        track.play();

        let mut left = vec![0.0f32; 25];
        let mut right = vec![0.0f32; 25];
        track.fill(&mut left, &mut right);
        assert!(track.is_playing());
    }

    #[test]
    fn looping_track_wraps_around() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track.wav");
        write_test_wav(&path, 10);

        let track = BackingTrack::new();
        track.load(&path).unwrap();
        track.set_loop(true);
        track.play();

        let mut left = vec![0.0f32; 25];
        let mut right = vec![0.0f32; 25];
        track.fill(&mut left, &mut right);
        assert!(track.is_playing());
        assert_eq!(track.status().position_frames, 5);
    }
}
