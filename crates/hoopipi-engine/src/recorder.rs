//! SPSC ring buffer recorder: the RT thread pushes interleaved stereo
//! frames, a writer thread batches and flushes them to a 16-bit PCM WAV.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::RecorderError;

/// Ring buffer capacity in samples (interleaved L/R), per §3: ~10 s stereo
/// at 48 kHz.
const RING_CAPACITY: usize = 960_000;
/// Writer thread batch size in samples, ~341 ms stereo at 48 kHz.
const BATCH_SIZE: usize = 32_768;
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Single-producer single-consumer ring buffer of `f32` samples. The
/// producer (RT thread) never blocks: if the ring is full it drops frames
/// and counts them instead of waiting on the consumer.
///
/// Each slot is its own `AtomicU32` holding a bit-cast `f32` (the same
/// trick [`hoopipi_core::ParamCell`] uses), so the buffer itself is `Sync`
/// without an `unsafe impl` — every HoopiPi crate denies `unsafe_code`
/// workspace-wide, so the ring's cross-thread sharing has to come from safe
/// atomics all the way down rather than a raw-pointer write guarded only by
/// the free-space accounting.
struct Ring {
    buf: Box<[AtomicU32]>,
    write_index: AtomicUsize,
    read_index: AtomicUsize,
}

impl Ring {
    fn new() -> Self {
        let buf = (0..RING_CAPACITY).map(|_| AtomicU32::new(0)).collect();
        Self {
            buf,
            write_index: AtomicUsize::new(0),
            read_index: AtomicUsize::new(0),
        }
    }

    fn reset(&self) {
        self.write_index.store(0, Ordering::Release);
        self.read_index.store(0, Ordering::Release);
    }

    fn free_space(&self, write: usize, read: usize) -> usize {
        RING_CAPACITY - (write.wrapping_sub(read))
    }

    /// Pushes `samples` (already interleaved) into the ring. Returns the
    /// number of samples actually written; fewer than `samples.len()` means
    /// the caller should count the remainder as dropped.
    fn push(&self, samples: &[f32]) -> usize {
        let write = self.write_index.load(Ordering::Relaxed);
        let read = self.read_index.load(Ordering::Acquire);
        let free = self.free_space(write, read);
        let to_write = samples.len().min(free);
        for (i, &s) in samples[..to_write].iter().enumerate() {
            let idx = (write + i) % RING_CAPACITY;
            self.buf[idx].store(s.to_bits(), Ordering::Relaxed);
        }
        self.write_index.store(write.wrapping_add(to_write), Ordering::Release);
        to_write
    }

    /// Pops up to `out.len()` samples into `out`, returning the count
    /// popped.
    fn pop(&self, out: &mut [f32]) -> usize {
        let read = self.read_index.load(Ordering::Relaxed);
        let write = self.write_index.load(Ordering::Acquire);
        let available = write.wrapping_sub(read);
        let to_read = out.len().min(available);
        for (i, slot) in out[..to_read].iter_mut().enumerate() {
            let idx = (read + i) % RING_CAPACITY;
            *slot = f32::from_bits(self.buf[idx].load(Ordering::Relaxed));
        }
        self.read_index.store(read.wrapping_add(to_read), Ordering::Release);
        to_read
    }
}

/// Snapshot of the recorder's current state, suitable for `getStatus`.
#[derive(Debug, Clone)]
pub enum RecorderState {
    Idle,
    Capturing {
        path: PathBuf,
        sample_rate: u32,
        dropped_frames: u64,
    },
}

/// Records the engine's stereo output to a 16-bit PCM WAV file via an SPSC
/// ring buffer and a dedicated writer thread.
pub struct Recorder {
    ring: Arc<Ring>,
    recording: Arc<AtomicBool>,
    dropped_frames: Arc<AtomicU64>,
    sample_rate: AtomicUsize,
    path: Mutex<Option<PathBuf>>,
    writer: Mutex<Option<JoinHandle<()>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self {
            ring: Arc::new(Ring::new()),
            recording: Arc::new(AtomicBool::new(false)),
            dropped_frames: Arc::new(AtomicU64::new(0)),
            sample_rate: AtomicUsize::new(48_000),
            path: Mutex::new(None),
            writer: Mutex::new(None),
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::Acquire)
    }

    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames.load(Ordering::Relaxed)
    }

    pub fn state(&self) -> RecorderState {
        if self.is_recording() {
            RecorderState::Capturing {
                path: self.path.lock().clone().unwrap_or_default(),
                sample_rate: self.sample_rate.load(Ordering::Relaxed) as u32,
                dropped_frames: self.dropped_frames(),
            }
        } else {
            RecorderState::Idle
        }
    }

    /// Non-RT: starts a capture session. `filename`, if empty, is derived
    /// from `now` as `recording-YYYY-MM-DD-HHMMSS.wav` (the caller supplies
    /// `now` since this crate avoids wall-clock calls internally).
    pub fn start(
        &self,
        directory: &Path,
        filename: &str,
        sample_rate: u32,
        now: &str,
    ) -> Result<PathBuf, RecorderError> {
        if self.is_recording() {
            return Err(RecorderError::AlreadyRecording);
        }
        std::fs::create_dir_all(directory)
            .map_err(|_| RecorderError::DirectoryNotWritable(directory.to_path_buf()))?;

        let stem = if filename.is_empty() {
            format!("recording-{now}")
        } else {
            filename.to_string()
        };
        let path = directory.join(format!("{stem}.wav"));

        let spec = hound::WavSpec {
            channels: 2,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let writer = hound::WavWriter::create(&path, spec)
            .map_err(|source| RecorderError::FileOpen { path: path.clone(), source })?;

        self.ring.reset();
        self.dropped_frames.store(0, Ordering::Relaxed);
        self.sample_rate.store(sample_rate as usize, Ordering::Relaxed);
        *self.path.lock() = Some(path.clone());
        self.recording.store(true, Ordering::Release);

        let ring = Arc::clone(&self.ring);
        let recording = Arc::clone(&self.recording);
        let handle = std::thread::spawn(move || writer_loop(ring, recording, writer));
        *self.writer.lock() = Some(handle);

        tracing::info!(path = %path.display(), "recording started");
        Ok(path)
    }

    /// Non-RT: stops the capture session and joins the writer thread, which
    /// flushes any remaining buffered samples and finalises the WAV header.
    pub fn stop(&self) {
        if !self.recording.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(handle) = self.writer.lock().take() {
            let _ = handle.join();
        }
        tracing::info!("recording stopped");
    }

    /// RT-safe: pushes `n` interleaved stereo frames (`2n` samples). Drops
    /// the whole frame count into `dropped_frames` if the ring doesn't have
    /// `2n` free slots — never partially writes a frame pair.
    #[inline]
    pub fn push(&self, left: &[f32], right: &[f32], n: usize) {
        if !self.recording.load(Ordering::Relaxed) {
            return;
        }
        let mut interleaved = [0.0f32; 2];
        let write = self.ring.write_index.load(Ordering::Relaxed);
        let read = self.ring.read_index.load(Ordering::Acquire);
        let free = self.ring.free_space(write, read);
        if free < 2 * n {
            self.dropped_frames.fetch_add(n as u64, Ordering::Relaxed);
            return;
        }
        for i in 0..n {
            interleaved[0] = left[i];
            interleaved[1] = right[i];
            self.ring.push(&interleaved);
        }
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}

fn writer_loop(
    ring: Arc<Ring>,
    recording: Arc<AtomicBool>,
    mut writer: hound::WavWriter<std::io::BufWriter<std::fs::File>>,
) {
    let mut batch = vec![0.0f32; BATCH_SIZE];
    loop {
        let popped = ring.pop(&mut batch);
        if popped == 0 {
            if !recording.load(Ordering::Acquire) {
                break;
            }
            std::thread::sleep(POLL_INTERVAL);
            continue;
        }
        for &sample in &batch[..popped] {
            let clipped = sample.clamp(-1.0, 1.0);
            let quantized = (clipped * 32767.0) as i16;
            if writer.write_sample(quantized).is_err() {
                tracing::error!("recorder writer thread failed to write sample");
                return;
            }
        }
    }
    // Drain any tail left by a push that raced the final `recording` check.
    loop {
        let popped = ring.pop(&mut batch);
        if popped == 0 {
            break;
        }
        for &sample in &batch[..popped] {
            let clipped = sample.clamp(-1.0, 1.0);
            let quantized = (clipped * 32767.0) as i16;
            let _ = writer.write_sample(quantized);
        }
    }
    if let Err(err) = writer.finalize() {
        tracing::error!(error = %err, "failed to finalize recording WAV header");
    }
}
