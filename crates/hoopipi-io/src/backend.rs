//! Pluggable audio backend abstraction.
//!
//! This module defines the [`AudioBackend`] trait, which decouples HoopiPi's audio
//! processing pipeline from any specific platform audio API. The default implementation
//! wraps [cpal](https://crates.io/crates/cpal) (feature `"cpal-backend"`), but the
//! trait is designed so that alternative backends can be swapped in:
//!
//! - **Desktop**: cpal (ALSA, CoreAudio, WASAPI) — the default
//! - **Plugin hosts**: Host-provided buffers (CLAP/VST3) — no backend needed
//! - **Embedded**: DMA/I2S interrupt-driven I/O
//! - **WASM**: WebAudio AudioWorklet
//! - **Testing**: Deterministic mock backend for CI
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────┐
//! │         Application code         │
//! │  (CLI, GUI, embedded main loop)  │
//! └──────────────┬───────────────────┘
//!                │ uses AudioBackend trait
//!                ▼
//! ┌──────────────────────────────────┐
//! │        AudioBackend trait         │
//! │  list_devices / build_streams    │
//! └──────────────┬───────────────────┘
//!                │ implemented by
//!        ┌───────┴────────┐
//!        ▼                ▼
//! ┌─────────────┐  ┌─────────────┐
//! │ CpalBackend │  │ (future)    │
//! │  (default)  │  │ AlsaDirect, │
//! │             │  │ Mock, etc.  │
//! └─────────────┘  └─────────────┘
//! ```
//!
//! ## Design Rationale (ADR-023)
//!
//! The trait uses boxed closures for callbacks rather than generic parameters, making
//! `AudioBackend` object-safe and enabling runtime backend selection. Stream handles
//! are returned as [`StreamHandle`], a type-erased wrapper that automatically stops
//! playback on drop. This keeps platform-specific types out of application code.

use crate::Result;
use std::sync::{Arc, Mutex};

/// Audio device information surfaced by [`AudioBackend::list_devices`].
#[derive(Debug, Clone)]
pub struct AudioDevice {
    /// Device name as reported by the platform audio API.
    pub name: String,
    /// True if the device supports audio input (capture).
    pub is_input: bool,
    /// True if the device supports audio output (playback).
    pub is_output: bool,
    /// The device's default sample rate in Hz.
    pub default_sample_rate: u32,
}

/// Configuration for building an audio stream.
///
/// ## Fields
///
/// - `sample_rate`: Requested sample rate in Hz (default: 48000)
/// - `buffer_size`: Preferred buffer size in frames (default: 256)
/// - `channels`: Number of audio channels (default: 2, stereo)
/// - `device_name`: Optional device name filter (uses default device if `None`)
#[derive(Debug, Clone)]
pub struct BackendStreamConfig {
    /// Requested sample rate in Hz.
    pub sample_rate: u32,
    /// Preferred buffer size in frames.
    pub buffer_size: u32,
    /// Number of audio channels.
    pub channels: u16,
    /// Optional device name (uses system default if `None`).
    pub device_name: Option<String>,
}

impl Default for BackendStreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            buffer_size: 256,
            channels: 2,
            device_name: None,
        }
    }
}

/// Type-erased audio stream handle.
///
/// Wraps a backend-specific stream object. The stream is active while this handle
/// exists; dropping it stops playback/capture. This design ensures RAII cleanup
/// regardless of which backend produced the stream.
///
/// The inner value is `Box<dyn Send>`, keeping backend types out of application code.
pub struct StreamHandle {
    /// The backend-specific stream object, kept alive via RAII.
    _inner: Box<dyn Send>,
}

impl StreamHandle {
    /// Create a new stream handle wrapping a backend-specific stream object.
    ///
    /// The wrapped value is kept alive until this handle is dropped.
    /// The type `T` must be `Send + 'static` so it can be safely moved
    /// between threads.
    pub fn new<T: Send + 'static>(stream: T) -> Self {
        Self {
            _inner: Box::new(stream),
        }
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle").finish_non_exhaustive()
    }
}

/// Audio output callback signature.
///
/// Called by the audio backend on the real-time audio thread. The callback receives
/// a mutable buffer of interleaved f32 samples that it must fill with output audio.
///
/// ## Buffer Layout
///
/// For stereo (2-channel) output, samples are interleaved: `[L0, R0, L1, R1, ...]`.
/// The buffer length is `frames * channels`.
///
/// ## Real-Time Safety
///
/// This callback runs on the audio thread. Implementations must not allocate,
/// lock mutexes, or perform I/O. Use lock-free structures (atomic, ring buffers)
/// to communicate with other threads.
pub type OutputCallback = Box<dyn FnMut(&mut [f32]) + Send>;

/// Audio input callback signature.
///
/// Called by the audio backend on the real-time audio thread with captured input
/// samples. The buffer contains interleaved f32 samples.
///
/// ## Buffer Layout
///
/// Same interleaved layout as [`OutputCallback`]: `[L0, R0, L1, R1, ...]`.
pub type InputCallback = Box<dyn FnMut(&[f32]) + Send>;

/// Error callback signature.
///
/// Called when the audio backend encounters an error during streaming.
/// The callback receives a human-readable error message.
pub type ErrorCallback = Box<dyn FnMut(&str) + Send>;

/// Duplex period callback: captured interleaved input, buffer to fill with output.
///
/// Both slices have the same frame count. This is the shape the engine's own
/// `process_stereo` period callback expects (§6 of the engine contract):
/// interleaved float input in, interleaved float output out, same length.
pub type DuplexCallback = Box<dyn FnMut(&[f32], &mut [f32]) + Send>;

/// Pluggable audio backend trait.
///
/// Abstracts over platform-specific audio APIs (cpal, ALSA, CoreAudio, WASAPI,
/// AAudio, WebAudio, etc.) to provide a uniform interface for device enumeration
/// and stream construction.
///
/// ## Object Safety
///
/// This trait is object-safe, enabling runtime backend selection via
/// `Box<dyn AudioBackend>`. All callbacks use boxed closures, and stream handles
/// are type-erased.
///
/// ## Implementing a Custom Backend
///
/// ```rust,ignore
/// use hoopipi_io::backend::{AudioBackend, BackendStreamConfig, StreamHandle,
///                          OutputCallback, InputCallback, ErrorCallback};
/// use hoopipi_io::{AudioDevice, Result};
///
/// struct MyBackend { /* ... */ }
///
/// impl AudioBackend for MyBackend {
///     fn name(&self) -> &str { "my-backend" }
///
///     fn list_devices(&self) -> Result<Vec<AudioDevice>> {
///         // Enumerate hardware devices
///         todo!()
///     }
///
///     fn default_output_device(&self) -> Result<Option<AudioDevice>> {
///         // Return system default
///         todo!()
///     }
///
///     fn default_input_device(&self) -> Result<Option<AudioDevice>> {
///         todo!()
///     }
///
///     fn build_output_stream(
///         &self,
///         config: &BackendStreamConfig,
///         callback: OutputCallback,
///         error_callback: ErrorCallback,
///     ) -> Result<StreamHandle> {
///         // Set up platform-specific output stream
///         todo!()
///     }
///
///     fn build_input_stream(
///         &self,
///         config: &BackendStreamConfig,
///         callback: InputCallback,
///         error_callback: ErrorCallback,
///     ) -> Result<StreamHandle> {
///         // Set up platform-specific input stream
///         todo!()
///     }
/// }
/// ```
pub trait AudioBackend: Send {
    /// Human-readable name of this backend (e.g., "cpal", "alsa-direct", "mock").
    fn name(&self) -> &str;

    /// List all available audio devices.
    fn list_devices(&self) -> Result<Vec<AudioDevice>>;

    /// Get the default output device, if any.
    fn default_output_device(&self) -> Result<Option<AudioDevice>>;

    /// Get the default input device, if any.
    fn default_input_device(&self) -> Result<Option<AudioDevice>>;

    /// Build an output-only audio stream.
    ///
    /// The `callback` is invoked on the audio thread with a mutable buffer
    /// of interleaved f32 samples that must be filled with output audio.
    ///
    /// The returned [`StreamHandle`] keeps the stream alive. Dropping it stops
    /// playback.
    ///
    /// ## Arguments
    ///
    /// - `config`: Stream configuration (sample rate, buffer size, channels, device)
    /// - `callback`: Called per audio buffer to generate output samples
    /// - `error_callback`: Called when the backend encounters a streaming error
    fn build_output_stream(
        &self,
        config: &BackendStreamConfig,
        callback: OutputCallback,
        error_callback: ErrorCallback,
    ) -> Result<StreamHandle>;

    /// Build an input-only audio stream.
    ///
    /// The `callback` is invoked on the audio thread with a buffer of captured
    /// interleaved f32 samples.
    ///
    /// The returned [`StreamHandle`] keeps the stream alive. Dropping it stops
    /// capture.
    ///
    /// ## Arguments
    ///
    /// - `config`: Stream configuration (sample rate, buffer size, channels, device)
    /// - `callback`: Called per audio buffer with captured input samples
    /// - `error_callback`: Called when the backend encounters a streaming error
    fn build_input_stream(
        &self,
        config: &BackendStreamConfig,
        callback: InputCallback,
        error_callback: ErrorCallback,
    ) -> Result<StreamHandle>;

    /// Query the actual sample rate the backend will use for the given config.
    ///
    /// Some backends may not support the exact requested sample rate and will
    /// use the closest available rate. This method returns what would actually
    /// be used. Default implementation returns the requested rate unchanged.
    fn actual_sample_rate(&self, config: &BackendStreamConfig) -> u32 {
        config.sample_rate
    }

    /// Build a duplex (input-driven, output-producing) stream pair.
    ///
    /// Most consumer audio APIs, cpal included, expose input and output as two
    /// independent callback-driven streams rather than one true duplex
    /// callback. This default implementation bridges the two with a small
    /// latest-period handoff buffer: the input stream copies each captured
    /// period into the handoff slot, and the output stream's callback reads
    /// the most recently handed-off period and passes it to `process` before
    /// writing the result to the device. If the output callback runs before
    /// the input side has produced a period (stream startup), it is handed
    /// silence.
    ///
    /// Backends with genuine single-callback duplex I/O should override this
    /// with a native implementation; the handoff buffer here costs one extra
    /// period of latency in the worst case, acceptable for the CLI/demo host
    /// but not a substitute for a platform-native duplex path in a shipping
    /// product.
    fn build_duplex_stream(
        &self,
        config: &BackendStreamConfig,
        mut process: DuplexCallback,
        error_callback: ErrorCallback,
    ) -> Result<(StreamHandle, StreamHandle)> {
        let period_frames = config.buffer_size as usize * config.channels as usize;
        let handoff: Arc<Mutex<Vec<f32>>> = Arc::new(Mutex::new(vec![0.0; period_frames]));
        let shared_error: Arc<Mutex<ErrorCallback>> = Arc::new(Mutex::new(error_callback));

        let handoff_in = Arc::clone(&handoff);
        let error_in = Arc::clone(&shared_error);
        let input_stream = self.build_input_stream(
            config,
            Box::new(move |data: &[f32]| {
                if let Ok(mut buf) = handoff_in.lock() {
                    buf.clear();
                    buf.extend_from_slice(data);
                }
            }),
            Box::new(move |msg| {
                if let Ok(mut cb) = error_in.lock() {
                    cb(msg);
                }
            }),
        )?;

        let handoff_out = Arc::clone(&handoff);
        let error_out = Arc::clone(&shared_error);
        let mut scratch_in = vec![0.0f32; period_frames];
        let output_stream = self.build_output_stream(
            config,
            Box::new(move |out: &mut [f32]| {
                scratch_in.clear();
                scratch_in.resize(out.len(), 0.0);
                if let Ok(buf) = handoff_out.lock() {
                    let n = buf.len().min(out.len());
                    scratch_in[..n].copy_from_slice(&buf[..n]);
                }
                process(&scratch_in, out);
            }),
            Box::new(move |msg| {
                if let Ok(mut cb) = error_out.lock() {
                    cb(msg);
                }
            }),
        )?;

        Ok((input_stream, output_stream))
    }
}
